//! Handlers for the replay control endpoints.
//!
//! Every endpoint answers with the resulting [`ControlOutcome`]; a
//! transition that does not apply is a successful no-op, not an error.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use motorwatch_core::response::DataResponse;

use crate::controller::{ControlOutcome, ReplayStatus};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

type OutcomeResponse = Json<DataResponse<ControlOutcome>>;

/// Query parameters for the interval endpoint.
#[derive(Debug, Deserialize)]
pub struct IntervalQuery {
    pub seconds: f64,
}

/// POST /control/start
pub async fn start(State(state): State<AppState>) -> AppResult<OutcomeResponse> {
    let outcome = state.controller.start().await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /control/pause
pub async fn pause(State(state): State<AppState>) -> OutcomeResponse {
    Json(DataResponse {
        data: state.controller.pause().await,
    })
}

/// POST /control/resume
pub async fn resume(State(state): State<AppState>) -> OutcomeResponse {
    Json(DataResponse {
        data: state.controller.resume().await,
    })
}

/// POST /control/stop
pub async fn stop(State(state): State<AppState>) -> OutcomeResponse {
    Json(DataResponse {
        data: state.controller.stop().await,
    })
}

/// POST /control/interval?seconds=<f64>
///
/// Out-of-range values are clamped; non-finite values are rejected.
pub async fn set_interval(
    State(state): State<AppState>,
    query: Result<Query<IntervalQuery>, QueryRejection>,
) -> AppResult<OutcomeResponse> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let outcome = state.controller.set_interval(query.seconds).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// GET /control/status
pub async fn status(State(state): State<AppState>) -> Json<DataResponse<ReplayStatus>> {
    Json(DataResponse {
        data: state.controller.status().await,
    })
}
