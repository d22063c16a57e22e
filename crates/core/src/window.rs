//! Bounded FIFO history of readings for one `(entity, channel)` key.

use std::collections::VecDeque;

use crate::diagnosis::MetricsSnapshot;
use crate::reading::Reading;
use crate::stats::{mean, population_std_dev, rms};

/// Default number of readings kept per key.
pub const DEFAULT_WINDOW_SIZE: usize = 8;

/// The last `capacity` readings of a single key, oldest first.
///
/// Order is arrival order; the `ts` field is never used to reorder.
#[derive(Debug, Clone)]
pub struct Window {
    capacity: usize,
    readings: VecDeque<Reading>,
}

impl Window {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            readings: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a reading, evicting the oldest one when full.
    ///
    /// Returns the evicted reading, if any.
    pub fn push(&mut self, reading: Reading) -> Option<Reading> {
        let evicted = if self.readings.len() == self.capacity {
            self.readings.pop_front()
        } else {
            None
        };
        self.readings.push_back(reading);
        evicted
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn readings(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    /// Recompute the metrics snapshot from the full current contents.
    pub fn metrics(&self) -> MetricsSnapshot {
        let temps: Vec<f64> = self.readings.iter().map(|r| r.temperature_c).collect();
        let speeds: Vec<f64> = self.readings.iter().map(|r| r.speed_rpm).collect();
        let vibrations: Vec<f64> = self.readings.iter().map(|r| r.vibration_rms).collect();

        MetricsSnapshot {
            temp_mean: mean(&temps),
            temp_std: population_std_dev(&temps),
            rpm_mean: mean(&speeds),
            rpm_std: population_std_dev(&speeds),
            vib_rms: rms(&vibrations),
            window_size: self.readings.len(),
        }
    }
}
