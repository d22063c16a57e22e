#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use motorwatch_analysis::classifier::WindowClassifier;
use motorwatch_analysis::config::ServerConfig;
use motorwatch_analysis::router::build_app_router;
use motorwatch_analysis::state::AppState;
use motorwatch_analysis::storage::{DiagnosisStore, MemoryStore, StorageError};
use motorwatch_core::diagnosis::Diagnosis;
use motorwatch_core::reading::Reading;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:8501".to_string()],
        request_timeout_secs: 30,
        history_url: None,
        storage_timeout: Duration::from_secs(5),
        window_size: 8,
    }
}

/// Build the full application router around `store`.
///
/// Uses the same builder as `main.rs`, so tests exercise the production
/// middleware stack.
pub fn build_test_app_with(store: Arc<dyn DiagnosisStore>, window_size: usize) -> Router {
    let mut config = test_config();
    config.window_size = window_size;

    let state = AppState {
        config: Arc::new(config.clone()),
        classifier: Arc::new(WindowClassifier::new(window_size, store)),
    };
    build_app_router(state, &config).unwrap()
}

/// Build the app with an in-memory store that tests can inspect.
pub fn build_test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    (build_test_app_with(store.clone(), 8), store)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn reading_json(machine: &str, actuator: &str, temp: f64, rpm: f64, vib: f64) -> serde_json::Value {
    serde_json::json!({
        "ts": "2024-05-01T10:00:00Z",
        "machine_id": machine,
        "actuator_id": actuator,
        "motor_temp_c": temp,
        "motor_rpm": rpm,
        "motor_vibration_rms": vib,
    })
}

/// Store that rejects every diagnosis but accepts samples.
#[derive(Default)]
pub struct FailingDiagnosisStore {
    pub samples: MemoryStore,
}

#[async_trait]
impl DiagnosisStore for FailingDiagnosisStore {
    async fn store_sample(&self, reading: &Reading) -> Result<(), StorageError> {
        self.samples.store_sample(reading).await
    }

    async fn store_diagnosis(&self, _diagnosis: &Diagnosis) -> Result<(), StorageError> {
        Err(StorageError::HttpStatus(503))
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}
