//! Storage collaborator interface.
//!
//! [`DiagnosisStore`] is how the classifier hands off raw samples and
//! diagnoses. [`HttpHistoryStore`] posts them to the history service;
//! [`MemoryStore`] keeps a bounded in-process copy and is used when no
//! history service is configured, and by tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use motorwatch_core::diagnosis::{Diagnosis, MetricsSnapshot};
use motorwatch_core::reading::Reading;

/// Default HTTP timeout for a single storage call.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of entries [`MemoryStore`] keeps per kind.
pub const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The history service returned a non-2xx status code.
    #[error("History service returned HTTP {0}")]
    HttpStatus(u16),

    /// The store refused the write for another reason.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Accepts samples and diagnoses for later retrieval by the dashboard.
#[async_trait]
pub trait DiagnosisStore: Send + Sync {
    async fn store_sample(&self, reading: &Reading) -> Result<(), StorageError>;

    async fn store_diagnosis(&self, diagnosis: &Diagnosis) -> Result<(), StorageError>;

    /// Short human-readable description for health output.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// HTTP history service
// ---------------------------------------------------------------------------

/// Diagnosis in the history service's schema (`state` rather than `severity`).
#[derive(Debug, Serialize)]
struct DiagnosisRecord<'a> {
    ts: &'a str,
    machine_id: &'a str,
    actuator_id: &'a str,
    state: &'static str,
    reasons: Vec<&'static str>,
    metrics: &'a MetricsSnapshot,
}

impl<'a> From<&'a Diagnosis> for DiagnosisRecord<'a> {
    fn from(d: &'a Diagnosis) -> Self {
        Self {
            ts: &d.ts,
            machine_id: &d.entity_id,
            actuator_id: &d.channel_id,
            state: d.severity.as_str(),
            reasons: d.reasons.iter().map(|r| r.as_str()).collect(),
            metrics: &d.metrics,
        }
    }
}

/// Posts samples and diagnoses to the history service over HTTP.
pub struct HttpHistoryStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHistoryStore {
    /// Create a store with its own HTTP client bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a store reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a single POST request and check the response status.
    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), StorageError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl DiagnosisStore for HttpHistoryStore {
    async fn store_sample(&self, reading: &Reading) -> Result<(), StorageError> {
        self.post("/api/v1/samples", reading).await
    }

    async fn store_diagnosis(&self, diagnosis: &Diagnosis) -> Result<(), StorageError> {
        self.post("/api/v1/diagnostics", &DiagnosisRecord::from(diagnosis))
            .await
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Keeps the most recent samples and diagnoses in memory.
pub struct MemoryStore {
    capacity: usize,
    samples: Mutex<VecDeque<Reading>>,
    diagnoses: Mutex<VecDeque<Diagnosis>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: Mutex::new(VecDeque::new()),
            diagnoses: Mutex::new(VecDeque::new()),
        }
    }

    /// Stored samples, oldest first.
    pub async fn samples(&self) -> Vec<Reading> {
        self.samples.lock().await.iter().cloned().collect()
    }

    /// Stored diagnoses, oldest first.
    pub async fn diagnoses(&self) -> Vec<Diagnosis> {
        self.diagnoses.lock().await.iter().cloned().collect()
    }
}

fn push_bounded<T>(queue: &mut VecDeque<T>, item: T, capacity: usize) {
    if queue.len() == capacity {
        queue.pop_front();
    }
    queue.push_back(item);
}

#[async_trait]
impl DiagnosisStore for MemoryStore {
    async fn store_sample(&self, reading: &Reading) -> Result<(), StorageError> {
        push_bounded(&mut *self.samples.lock().await, reading.clone(), self.capacity);
        Ok(())
    }

    async fn store_diagnosis(&self, diagnosis: &Diagnosis) -> Result<(), StorageError> {
        push_bounded(
            &mut *self.diagnoses.lock().await,
            diagnosis.clone(),
            self.capacity,
        );
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
