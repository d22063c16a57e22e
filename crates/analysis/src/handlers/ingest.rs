//! Handler for the reading ingestion endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use motorwatch_core::classify::{ReasonCode, Severity};
use motorwatch_core::diagnosis::MetricsSnapshot;
use motorwatch_core::reading::RawReading;
use motorwatch_core::response::DataResponse;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Result of one accepted reading.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub accepted: bool,
    pub severity: Severity,
    pub reasons: Vec<ReasonCode>,
    pub metrics: MetricsSnapshot,
}

/// POST /ingest
///
/// Validate one reading, fold it into its window and return the diagnosis.
/// Field-level problems are reported as 422; a body that is not a JSON
/// object at all is a 400.
pub async fn ingest_reading(
    State(state): State<AppState>,
    body: Result<Json<RawReading>, JsonRejection>,
) -> AppResult<Json<DataResponse<IngestResponse>>> {
    let Json(raw) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let diagnosis = state.classifier.ingest(&raw).await?;

    Ok(Json(DataResponse {
        data: IngestResponse {
            accepted: true,
            severity: diagnosis.severity,
            reasons: diagnosis.reasons,
            metrics: diagnosis.metrics,
        },
    }))
}
