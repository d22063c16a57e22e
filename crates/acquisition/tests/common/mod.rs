#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::Mutex;
use tower::ServiceExt;

use motorwatch_acquisition::config::ServerConfig;
use motorwatch_acquisition::controller::ReplayController;
use motorwatch_acquisition::router::build_app_router;
use motorwatch_acquisition::sender::{DeliveryError, IngestSink};
use motorwatch_acquisition::source::{MemorySource, RecordSource};
use motorwatch_acquisition::state::AppState;
use motorwatch_core::reading::Reading;
use motorwatch_core::replay::IntervalLimits;

pub const HEADER: &str = "ts,machine_id,actuator_id,motor_temp_c,motor_rpm,motor_vibration_rms";

/// Three valid records `t1`..`t3` for one actuator.
pub fn three_records() -> MemorySource {
    MemorySource::from_csv(&format!(
        "{HEADER}\n\
         t1,arm_01,base,40,1000,0.10\n\
         t2,arm_01,base,41,1010,0.11\n\
         t3,arm_01,base,42,1020,0.12\n"
    ))
    .unwrap()
}

/// Sink that records every reading and optionally fails every delivery.
#[derive(Default)]
pub struct RecordingSink {
    pub fail: bool,
    delivered: Mutex<Vec<Reading>>,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn count(&self) -> usize {
        self.delivered.lock().await.len()
    }

    pub async fn timestamps(&self) -> Vec<String> {
        self.delivered.lock().await.iter().map(|r| r.ts.clone()).collect()
    }
}

#[async_trait]
impl IngestSink for RecordingSink {
    async fn deliver(&self, reading: &Reading) -> Result<(), DeliveryError> {
        self.delivered.lock().await.push(reading.clone());
        if self.fail {
            return Err(DeliveryError::HttpStatus(503));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "recording".to_string()
    }
}

pub fn controller(source: impl RecordSource + 'static, sink: Arc<RecordingSink>) -> ReplayController {
    ReplayController::new(Arc::new(source), sink, IntervalLimits::default(), 3.0).unwrap()
}

/// Poll until `sink` has seen `n` deliveries. Works with paused time.
pub async fn wait_for_deliveries(sink: &RecordingSink, n: usize) {
    for _ in 0..10_000 {
        if sink.count().await >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("expected {n} deliveries, got {}", sink.count().await);
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:8501".to_string()],
        request_timeout_secs: 30,
        analysis_url: "http://127.0.0.1:9".to_string(),
        source_path: "unused.csv".to_string(),
        interval_secs: 3.0,
        interval_limits: IntervalLimits::default(),
        ingest_timeout: Duration::from_secs(5),
        autostart: false,
    }
}

/// Build the full application router around `controller`.
pub fn build_test_app(controller: Arc<ReplayController>) -> Router {
    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        controller,
    };
    build_app_router(state, &config).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri).await
}

async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
