use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Readings kept per window.
    pub window_size: usize,
    /// Number of `(machine_id, actuator_id)` windows seen so far.
    pub active_windows: usize,
    /// Where samples and diagnoses go.
    pub storage: String,
    /// Configured history service, `null` when results stay in memory.
    pub history_url: Option<String>,
}

/// GET /health -- returns service status and window statistics.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        window_size: state.classifier.window_size(),
        active_windows: state.classifier.active_windows().await,
        storage: state.classifier.storage(),
        history_url: state.config.history_url.clone(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
