//! Per-key windowed classification.
//!
//! [`WindowClassifier`] owns one [`Window`] per `(entity, channel)` key. Each
//! ingested reading is appended to its window, the metrics are recomputed
//! from the whole window, classified, and both the sample and the diagnosis
//! are handed to the [`DiagnosisStore`].
//!
//! Locking: the key map sits behind an `RwLock` that is only held for the
//! lookup (or the insert of a new key). Each window has its own `Mutex`, so
//! readings for different keys never wait on each other while readings for
//! the same key are applied one at a time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use motorwatch_core::classify::Thresholds;
use motorwatch_core::diagnosis::Diagnosis;
use motorwatch_core::error::ReadingError;
use motorwatch_core::reading::{RawReading, Reading, WindowKey};
use motorwatch_core::window::{Window, DEFAULT_WINDOW_SIZE};

use crate::storage::{DiagnosisStore, StorageError};

/// Which storage call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoragePart {
    Sample,
    Diagnosis,
}

impl fmt::Display for StoragePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoragePart::Sample => f.write_str("sample"),
            StoragePart::Diagnosis => f.write_str("diagnosis"),
        }
    }
}

/// Why an ingestion did not complete.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The reading was rejected before touching any window.
    #[error("Invalid reading: {0}")]
    Invalid(#[from] ReadingError),

    /// The window was updated but persisting failed for `failed` parts.
    /// `source` is the first failure encountered.
    #[error("Failed to store {}: {source}", join_parts(.failed))]
    Storage {
        failed: Vec<StoragePart>,
        diagnosis: Box<Diagnosis>,
        #[source]
        source: StorageError,
    },
}

fn join_parts(parts: &[StoragePart]) -> String {
    parts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Windowed classification engine shared across request handlers.
pub struct WindowClassifier {
    window_size: usize,
    thresholds: Thresholds,
    windows: RwLock<HashMap<WindowKey, Arc<Mutex<Window>>>>,
    store: Arc<dyn DiagnosisStore>,
}

impl WindowClassifier {
    /// Create a classifier with the default thresholds.
    pub fn new(window_size: usize, store: Arc<dyn DiagnosisStore>) -> Self {
        Self::with_thresholds(window_size, Thresholds::default(), store)
    }

    pub fn with_thresholds(
        window_size: usize,
        thresholds: Thresholds,
        store: Arc<dyn DiagnosisStore>,
    ) -> Self {
        Self {
            window_size: window_size.max(1),
            thresholds,
            windows: RwLock::new(HashMap::new()),
            store,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Description of the storage collaborator, for health output.
    pub fn storage(&self) -> String {
        self.store.describe()
    }

    /// Number of keys seen so far.
    pub async fn active_windows(&self) -> usize {
        self.windows.read().await.len()
    }

    /// Current window contents for `key`, oldest first.
    pub async fn window_contents(&self, key: &WindowKey) -> Option<Vec<Reading>> {
        let window = self.windows.read().await.get(key).cloned()?;
        let guard = window.lock().await;
        Some(guard.readings().cloned().collect())
    }

    /// Validate, classify and persist one reading.
    ///
    /// Both storage calls are attempted even if the first fails. The window
    /// keeps the reading regardless of the storage outcome.
    pub async fn ingest(&self, raw: &RawReading) -> Result<Diagnosis, IngestError> {
        let reading = raw.validate().inspect_err(|e| {
            tracing::debug!(error = %e, "Rejected reading");
        })?;

        let diagnosis = self.observe(reading.clone()).await;

        tracing::debug!(
            machine_id = %diagnosis.entity_id,
            actuator_id = %diagnosis.channel_id,
            severity = %diagnosis.severity,
            window_size = diagnosis.metrics.window_size,
            "Reading classified"
        );

        self.persist(&reading, diagnosis).await
    }

    /// Append to the key's window and classify the refreshed metrics.
    async fn observe(&self, reading: Reading) -> Diagnosis {
        let window = self.window_for(reading.key()).await;
        let mut window = window.lock().await;
        window.push(reading.clone());
        let metrics = window.metrics();
        Diagnosis::evaluate(&reading, metrics, &self.thresholds)
    }

    /// Look up the window for `key`, creating it on first use.
    async fn window_for(&self, key: WindowKey) -> Arc<Mutex<Window>> {
        if let Some(window) = self.windows.read().await.get(&key) {
            return Arc::clone(window);
        }

        let mut windows = self.windows.write().await;
        let window = windows.entry(key).or_insert_with_key(|key| {
            tracing::info!(
                machine_id = %key.entity_id,
                actuator_id = %key.channel_id,
                capacity = self.window_size,
                "Created window"
            );
            Arc::new(Mutex::new(Window::new(self.window_size)))
        });
        Arc::clone(window)
    }

    async fn persist(&self, reading: &Reading, diagnosis: Diagnosis) -> Result<Diagnosis, IngestError> {
        let sample_result = self.store.store_sample(reading).await;
        let diagnosis_result = self.store.store_diagnosis(&diagnosis).await;

        let mut failed = Vec::new();
        let mut first_error = None;

        for (part, result) in [
            (StoragePart::Sample, sample_result),
            (StoragePart::Diagnosis, diagnosis_result),
        ] {
            if let Err(e) = result {
                tracing::warn!(
                    part = %part,
                    machine_id = %reading.entity_id,
                    actuator_id = %reading.channel_id,
                    error = %e,
                    "Failed to store"
                );
                failed.push(part);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            None => Ok(diagnosis),
            Some(source) => Err(IngestError::Storage {
                failed,
                diagnosis: Box::new(diagnosis),
                source,
            }),
        }
    }
}

impl Default for WindowClassifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_WINDOW_SIZE,
            Arc::new(crate::storage::MemoryStore::default()),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
