use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::controller::ReplayStatus;
use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Replay phase and counters.
    pub replay: ReplayStatus,
    /// Where records are read from.
    pub source: String,
    /// Where readings are delivered.
    pub ingest_url: String,
    /// Configured base URL of the analysis service.
    pub analysis_url: String,
    pub autostart: bool,
    /// Bounds applied by `POST /api/v1/control/interval`.
    pub min_interval_secs: f64,
    pub max_interval_secs: f64,
}

/// GET /health -- returns service status and replay state.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let limits = state.controller.limits();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        replay: state.controller.status().await,
        source: state.controller.source_description(),
        ingest_url: state.controller.sink_description(),
        analysis_url: state.config.analysis_url.clone(),
        autostart: state.config.autostart,
        min_interval_secs: limits.min_secs(),
        max_interval_secs: limits.max_secs(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
