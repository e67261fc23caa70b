//! Counters collected during a fill run.

use std::time::Duration;

/// Metrics from a populate operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulateMetrics {
    /// Entries drawn from the generator and submitted.
    pub entries_attempted: u64,
    /// Puts acknowledged by the cluster.
    pub entries_stored: u64,
    /// Acknowledged puts that replaced an existing value.
    pub entries_overwritten: u64,
    /// Puts that failed and were skipped.
    pub put_failures: u64,
    /// Size queries issued.
    pub size_queries: u64,
    /// Size queries that failed.
    pub size_failures: u64,
    /// Most recent size reading.
    pub last_size: Option<u64>,
    /// Total time taken.
    pub total_duration: Duration,
}

impl PopulateMetrics {
    /// Calculate acknowledged puts per second.
    pub fn entries_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.entries_stored as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }
}
