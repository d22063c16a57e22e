//! Threshold classification of a metrics snapshot.
//!
//! Pure logic: the same snapshot always yields the same severity and the
//! same ordered reason list. Temperature and vibration are single-sided;
//! speed is checked on its low and high side independently.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diagnosis::MetricsSnapshot;

/// Health verdict for one diagnosis. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a snapshot was flagged. Each signal contributes at most one code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    TempHigh,
    TempCritical,
    VibHigh,
    VibCritical,
    SpeedLow,
    SpeedCriticalLow,
    SpeedHigh,
    SpeedCriticalHigh,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::TempHigh => "temp_high",
            ReasonCode::TempCritical => "temp_critical",
            ReasonCode::VibHigh => "vib_high",
            ReasonCode::VibCritical => "vib_critical",
            ReasonCode::SpeedLow => "speed_low",
            ReasonCode::SpeedCriticalLow => "speed_critical_low",
            ReasonCode::SpeedHigh => "speed_high",
            ReasonCode::SpeedCriticalHigh => "speed_critical_high",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            ReasonCode::TempCritical
            | ReasonCode::VibCritical
            | ReasonCode::SpeedCriticalLow
            | ReasonCode::SpeedCriticalHigh => Severity::Critical,
            ReasonCode::TempHigh
            | ReasonCode::VibHigh
            | ReasonCode::SpeedLow
            | ReasonCode::SpeedHigh => Severity::Warning,
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Band limits for every signal.
///
/// Temperature and vibration bands trigger on `>=`, the high speed bands on
/// `>`. The low speed warning band triggers on `<`, while the low speed
/// critical band includes its limit (`<=`).
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub temp_warning: f64,
    pub temp_critical: f64,
    pub vib_warning: f64,
    pub vib_critical: f64,
    pub speed_low_warning: f64,
    /// Inclusive bound: a mean of exactly this speed is critical. The other
    /// speed bands are strict, and a `<` here would rate 200 rpm as a warning.
    pub speed_low_critical: f64,
    pub speed_high_warning: f64,
    pub speed_high_critical: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temp_warning: 55.0,
            temp_critical: 70.0,
            vib_warning: 0.30,
            vib_critical: 0.65,
            speed_low_warning: 400.0,
            speed_low_critical: 200.0,
            speed_high_warning: 1800.0,
            speed_high_critical: 2200.0,
        }
    }
}

/// Result of classifying one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub severity: Severity,
    pub reasons: Vec<ReasonCode>,
}

/// Classify against the default thresholds.
pub fn classify(metrics: &MetricsSnapshot) -> Verdict {
    classify_with(metrics, &Thresholds::default())
}

/// Classify against explicit thresholds.
pub fn classify_with(metrics: &MetricsSnapshot, thresholds: &Thresholds) -> Verdict {
    let mut reasons = Vec::with_capacity(4);

    let temp = metrics.temp_mean;
    if temp >= thresholds.temp_critical {
        reasons.push(ReasonCode::TempCritical);
    } else if temp >= thresholds.temp_warning {
        reasons.push(ReasonCode::TempHigh);
    }

    let vib = metrics.vib_rms;
    if vib >= thresholds.vib_critical {
        reasons.push(ReasonCode::VibCritical);
    } else if vib >= thresholds.vib_warning {
        reasons.push(ReasonCode::VibHigh);
    }

    let speed = metrics.rpm_mean;
    if speed <= thresholds.speed_low_critical {
        reasons.push(ReasonCode::SpeedCriticalLow);
    } else if speed < thresholds.speed_low_warning {
        reasons.push(ReasonCode::SpeedLow);
    }

    if speed > thresholds.speed_high_critical {
        reasons.push(ReasonCode::SpeedCriticalHigh);
    } else if speed > thresholds.speed_high_warning {
        reasons.push(ReasonCode::SpeedHigh);
    }

    let severity = reasons
        .iter()
        .map(|r| r.severity())
        .max()
        .unwrap_or(Severity::Normal);

    Verdict { severity, reasons }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(temp: f64, vib: f64, rpm: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            temp_mean: temp,
            temp_std: 0.0,
            rpm_mean: rpm,
            rpm_std: 0.0,
            vib_rms: vib,
            window_size: 1,
        }
    }

    #[test]
    fn nominal_values_are_normal() {
        let verdict = classify(&snapshot(54.9, 0.1, 1000.0));
        assert_eq!(verdict.severity, Severity::Normal);
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn temperature_at_critical_boundary() {
        let verdict = classify(&snapshot(70.0, 0.1, 1000.0));
        assert_eq!(verdict.reasons, vec![ReasonCode::TempCritical]);
        assert_eq!(verdict.severity, Severity::Critical);
    }

    #[test]
    fn temperature_at_warning_boundary() {
        let verdict = classify(&snapshot(55.0, 0.1, 1000.0));
        assert_eq!(verdict.reasons, vec![ReasonCode::TempHigh]);
        assert_eq!(verdict.severity, Severity::Warning);
    }

    #[test]
    fn vibration_bands() {
        assert_eq!(
            classify(&snapshot(20.0, 0.30, 1000.0)).reasons,
            vec![ReasonCode::VibHigh]
        );
        assert_eq!(
            classify(&snapshot(20.0, 0.65, 1000.0)).reasons,
            vec![ReasonCode::VibCritical]
        );
        assert!(classify(&snapshot(20.0, 0.2999, 1000.0)).reasons.is_empty());
    }

    #[test]
    fn low_speed_boundaries_are_exact() {
        assert!(classify(&snapshot(20.0, 0.1, 400.0)).reasons.is_empty());
        assert_eq!(
            classify(&snapshot(20.0, 0.1, 399.999)).reasons,
            vec![ReasonCode::SpeedLow]
        );
        assert_eq!(
            classify(&snapshot(20.0, 0.1, 200.001)).reasons,
            vec![ReasonCode::SpeedLow]
        );
        assert_eq!(
            classify(&snapshot(20.0, 0.1, 200.0)).reasons,
            vec![ReasonCode::SpeedCriticalLow]
        );
    }

    #[test]
    fn high_speed_boundaries_are_exact() {
        assert!(classify(&snapshot(20.0, 0.1, 1800.0)).reasons.is_empty());
        assert_eq!(
            classify(&snapshot(20.0, 0.1, 1800.001)).reasons,
            vec![ReasonCode::SpeedHigh]
        );
        assert_eq!(
            classify(&snapshot(20.0, 0.1, 2200.0)).reasons,
            vec![ReasonCode::SpeedHigh]
        );
        assert_eq!(
            classify(&snapshot(20.0, 0.1, 2200.5)).reasons,
            vec![ReasonCode::SpeedCriticalHigh]
        );
    }

    #[test]
    fn single_critical_reason_dominates() {
        let verdict = classify(&snapshot(20.0, 0.9, 1000.0));
        assert_eq!(verdict.severity, Severity::Critical);

        let verdict = classify(&snapshot(60.0, 0.9, 1900.0));
        assert_eq!(verdict.severity, Severity::Critical);
        assert_eq!(verdict.reasons.len(), 3);
    }

    #[test]
    fn reasons_follow_evaluation_order() {
        let verdict = classify(&snapshot(75.0, 0.4, 100.0));
        assert_eq!(
            verdict.reasons,
            vec![
                ReasonCode::TempCritical,
                ReasonCode::VibHigh,
                ReasonCode::SpeedCriticalLow
            ]
        );
    }

    #[test]
    fn low_and_high_side_can_fire_together() {
        let thresholds = Thresholds {
            speed_low_warning: 1000.0,
            speed_high_warning: 500.0,
            ..Thresholds::default()
        };
        let verdict = classify_with(&snapshot(20.0, 0.1, 700.0), &thresholds);
        assert_eq!(
            verdict.reasons,
            vec![ReasonCode::SpeedLow, ReasonCode::SpeedHigh]
        );
        assert_eq!(verdict.severity, Severity::Warning);
    }

    #[test]
    fn classification_is_deterministic() {
        let snap = snapshot(58.0, 0.7, 1900.0);
        assert_eq!(classify(&snap), classify(&snap));
    }

    #[test]
    fn reason_codes_serialize_as_wire_strings() {
        let json = serde_json::to_value(ReasonCode::SpeedCriticalLow).unwrap();
        assert_eq!(json, ReasonCode::SpeedCriticalLow.as_str());
        assert_eq!(serde_json::to_value(Severity::Warning).unwrap(), "warning");
    }
}
