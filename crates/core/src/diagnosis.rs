//! Derived metrics and the per-reading diagnosis.

use serde::{Deserialize, Serialize};

use crate::classify::{classify_with, ReasonCode, Severity, Thresholds};
use crate::reading::Reading;

/// Aggregates recomputed from a window's full contents on every ingestion.
///
/// Field names match the history service's `diagnostics` columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub temp_mean: f64,
    pub temp_std: f64,
    pub rpm_mean: f64,
    pub rpm_std: f64,
    pub vib_rms: f64,
    /// Number of readings the snapshot was computed from.
    pub window_size: usize,
}

/// Classification of one ingested reading in the context of its window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub ts: String,
    #[serde(rename = "machine_id")]
    pub entity_id: String,
    #[serde(rename = "actuator_id")]
    pub channel_id: String,
    pub severity: Severity,
    pub reasons: Vec<ReasonCode>,
    pub metrics: MetricsSnapshot,
}

impl Diagnosis {
    /// Classify `metrics` and attach the identity of `reading`.
    pub fn evaluate(reading: &Reading, metrics: MetricsSnapshot, thresholds: &Thresholds) -> Self {
        let verdict = classify_with(&metrics, thresholds);
        Self {
            ts: reading.ts.clone(),
            entity_id: reading.entity_id.clone(),
            channel_id: reading.channel_id.clone(),
            severity: verdict.severity,
            reasons: verdict.reasons,
            metrics,
        }
    }
}
