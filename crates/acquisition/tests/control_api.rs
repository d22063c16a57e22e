//! Integration tests for the `/api/v1/control/*` endpoints and `/health`.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{body_json, build_test_app, controller, get, post, three_records, RecordingSink};
use motorwatch_acquisition::source::CsvFileSource;

fn app() -> (axum::Router, Arc<motorwatch_acquisition::controller::ReplayController>) {
    let controller = Arc::new(controller(three_records(), Arc::new(RecordingSink::default())));
    (build_test_app(controller.clone()), controller)
}

// ---------------------------------------------------------------------------
// Test: no-op transitions succeed and say so
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pause_when_stopped_is_a_successful_noop() {
    let (app, _controller) = app();

    let response = post(app, "/api/v1/control/pause").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["changed"], false);
    assert_eq!(json["data"]["status"]["phase"], "stopped");
    assert_eq!(json["data"]["message"], "not running, nothing to pause");
}

// ---------------------------------------------------------------------------
// Test: start / pause / resume / stop walk through the phases
// ---------------------------------------------------------------------------

#[tokio::test]
async fn control_endpoints_drive_the_phase() {
    let (app, controller) = app();

    let json = body_json(post(app.clone(), "/api/v1/control/start").await).await;
    assert_eq!(json["data"]["changed"], true);
    assert_eq!(json["data"]["status"]["phase"], "running");

    let json = body_json(post(app.clone(), "/api/v1/control/pause").await).await;
    assert_eq!(json["data"]["status"]["phase"], "paused");

    let json = body_json(post(app.clone(), "/api/v1/control/resume").await).await;
    assert_eq!(json["data"]["status"]["phase"], "running");

    let json = body_json(post(app.clone(), "/api/v1/control/stop").await).await;
    assert_eq!(json["data"]["changed"], true);
    assert_eq!(json["data"]["status"]["phase"], "stopped");

    let json = body_json(get(app, "/api/v1/control/status").await).await;
    assert_eq!(json["data"]["phase"], "stopped");
    assert_eq!(controller.live_loops(), 0);
}

// ---------------------------------------------------------------------------
// Test: interval endpoint clamps and validates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn interval_is_clamped_into_limits() {
    let (app, _controller) = app();

    let json = body_json(post(app.clone(), "/api/v1/control/interval?seconds=0.01").await).await;
    assert_eq!(json["data"]["status"]["interval_secs"], 0.2);

    let json = body_json(post(app, "/api/v1/control/interval?seconds=100").await).await;
    assert_eq!(json["data"]["status"]["interval_secs"], 30.0);
}

#[tokio::test]
async fn interval_must_be_a_number() {
    let (app, _controller) = app();

    let response = post(app.clone(), "/api/v1/control/interval?seconds=soon").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");

    let response = post(app, "/api/v1/control/interval?seconds=NaN").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Test: a missing source is reported and replay stays stopped
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_with_missing_source_returns_503() {
    let controller = Arc::new(controller(
        CsvFileSource::new("/no/such/actuator_data.csv"),
        Arc::new(RecordingSink::default()),
    ));
    let app = build_test_app(controller.clone());

    let response = post(app.clone(), "/api/v1/control/start").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["code"], "SOURCE_UNAVAILABLE");

    let health = body_json(get(app, "/health").await).await;
    assert_eq!(health["replay"]["phase"], "stopped");
}

// ---------------------------------------------------------------------------
// Test: health reports replay state and collaborators
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_replay_status() {
    let (app, _controller) = app();

    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["replay"]["phase"], "stopped");
    assert_eq!(json["replay"]["emitted_count"], 0);
    assert_eq!(json["replay"]["interval_secs"], 3.0);
    assert_eq!(json["source"], "memory (3 records)");
    assert_eq!(json["ingest_url"], "recording");
    assert_eq!(json["analysis_url"], "http://127.0.0.1:9");
    assert_eq!(json["autostart"], false);
    assert_eq!(json["min_interval_secs"], 0.2);
    assert_eq!(json["max_interval_secs"], 30.0);
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let (app, _controller) = app();
    let response = get(app, "/health").await;
    assert!(response.headers().get("x-request-id").is_some());
}
