use std::sync::Arc;

use crate::classifier::WindowClassifier;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Windowed classification engine, shared by every ingestion request.
    pub classifier: Arc<WindowClassifier>,
}
