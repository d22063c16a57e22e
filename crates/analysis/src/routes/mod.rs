pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// POST /ingest        validate, window and classify one reading
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/ingest", post(handlers::ingest::ingest_reading))
}
