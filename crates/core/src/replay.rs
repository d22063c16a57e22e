//! Replay control primitives shared by the acquisition service and its
//! clients: the control phase and interval clamping.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default seconds between emissions.
pub const DEFAULT_INTERVAL_SECS: f64 = 3.0;

/// Default lower bound for the emission interval.
pub const DEFAULT_MIN_INTERVAL_SECS: f64 = 0.2;

/// Default upper bound for the emission interval.
pub const DEFAULT_MAX_INTERVAL_SECS: f64 = 30.0;

/// Phase of the replay state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayPhase {
    Stopped,
    Running,
    Paused,
}

impl ReplayPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplayPhase::Stopped => "stopped",
            ReplayPhase::Running => "running",
            ReplayPhase::Paused => "paused",
        }
    }

    /// Whether a replay loop is attached (running or paused).
    pub fn is_active(self) -> bool {
        !matches!(self, ReplayPhase::Stopped)
    }
}

impl fmt::Display for ReplayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive bounds for the emission interval, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalLimits {
    min_secs: f64,
    max_secs: f64,
}

impl Default for IntervalLimits {
    fn default() -> Self {
        Self {
            min_secs: DEFAULT_MIN_INTERVAL_SECS,
            max_secs: DEFAULT_MAX_INTERVAL_SECS,
        }
    }
}

impl IntervalLimits {
    /// Both bounds must be finite, positive and ordered.
    pub fn new(min_secs: f64, max_secs: f64) -> Result<Self, CoreError> {
        if !min_secs.is_finite() || !max_secs.is_finite() {
            return Err(CoreError::Validation(
                "interval limits must be finite".to_string(),
            ));
        }
        if min_secs <= 0.0 {
            return Err(CoreError::Validation(format!(
                "minimum interval must be positive, got {min_secs}"
            )));
        }
        if min_secs > max_secs {
            return Err(CoreError::Validation(format!(
                "minimum interval {min_secs} exceeds maximum {max_secs}"
            )));
        }
        Ok(Self { min_secs, max_secs })
    }

    pub fn min_secs(&self) -> f64 {
        self.min_secs
    }

    pub fn max_secs(&self) -> f64 {
        self.max_secs
    }

    /// Clamp a requested interval into the bounds.
    ///
    /// Non-finite requests are rejected rather than clamped.
    pub fn clamp(&self, secs: f64) -> Result<Duration, CoreError> {
        if !secs.is_finite() {
            return Err(CoreError::Validation(format!(
                "interval must be a finite number of seconds, got {secs}"
            )));
        }
        Ok(Duration::from_secs_f64(secs.clamp(self.min_secs, self.max_secs)))
    }
}
