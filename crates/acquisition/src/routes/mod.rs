pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::control;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// POST /control/start                 start replay (opens the source)
/// POST /control/pause                 pause emission
/// POST /control/resume                resume emission
/// POST /control/stop                  stop replay
/// POST /control/interval?seconds=     change the emission interval
/// GET  /control/status                current phase and counters
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/control/start", post(control::start))
        .route("/control/pause", post(control::pause))
        .route("/control/resume", post(control::resume))
        .route("/control/stop", post(control::stop))
        .route("/control/interval", post(control::set_interval))
        .route("/control/status", get(control::status))
}
