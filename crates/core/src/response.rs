//! Shared response envelope types for the HTTP services.
//!
//! All successful API responses use a `{ "data": ... }` envelope.

use serde::{Deserialize, Serialize};

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}
