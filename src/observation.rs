//! Raw time-indexed sensor observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One reading of the monitored machine.
///
/// `last_maintenance` is expected to be at or before `timestamp`, but nothing
/// enforces it; the deriver applies its formulas literally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub pressure: f64,
    pub operation_hours: u64,
    pub failure: bool,
    pub last_maintenance: DateTime<Utc>,
}

impl Observation {
    pub fn failure_indicator(&self) -> f64 {
        if self.failure {
            1.0
        } else {
            0.0
        }
    }

    /// Seconds elapsed since the last maintenance event, microsecond precision.
    pub fn seconds_since_maintenance(&self) -> f64 {
        let gap = self.timestamp - self.last_maintenance;
        match gap.num_microseconds() {
            Some(micros) => micros as f64 / 1_000_000.0,
            // beyond ~292k years of microseconds
            None => gap.num_milliseconds() as f64 / 1_000.0,
        }
    }
}

/// Index of every row whose timestamp is earlier than its predecessor's.
pub fn ordering_violations(observations: &[Observation]) -> Vec<usize> {
    observations
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1].timestamp < pair[0].timestamp)
        .map(|(idx, _)| idx + 1)
        .collect()
}
