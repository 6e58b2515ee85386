//! Detector-wide statistics helpers.
//!
//! This module defines the `PipelineStats` structure used to track how many
//! pages a [`ZoneDetector`](super::ZoneDetector) has processed and the
//! `StatsManager` helper that coordinates thread-safe updates to it.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// How a single run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every stage completed.
    Success,
    /// A stage failed and the full-page recovery zone was returned.
    Recovered,
    /// Both the pipeline and the recovery failed.
    Failed,
}

/// Statistics for the zone detector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    /// The total number of pages processed.
    pub total_processed: usize,
    /// Runs where every stage completed.
    pub successful_runs: usize,
    /// Runs answered by the degraded recovery path.
    pub recovered_runs: usize,
    /// Runs reported as failed.
    pub failed_runs: usize,
    /// The average processing time per page in milliseconds.
    pub average_processing_time_ms: f64,
}

impl PipelineStats {
    /// Creates a new PipelineStats instance with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the success rate as a percentage (0.0 to 100.0).
    pub fn success_rate(&self) -> f64 {
        self.percentage(self.successful_runs)
    }

    /// Returns the recovery rate as a percentage (0.0 to 100.0).
    pub fn recovery_rate(&self) -> f64 {
        self.percentage(self.recovered_runs)
    }

    /// Returns the failure rate as a percentage (0.0 to 100.0).
    pub fn failure_rate(&self) -> f64 {
        self.percentage(self.failed_runs)
    }

    /// Returns the average processing speed in pages per second.
    pub fn pages_per_second(&self) -> f64 {
        if self.average_processing_time_ms == 0.0 {
            0.0
        } else {
            1000.0 / self.average_processing_time_ms
        }
    }

    fn percentage(&self, count: usize) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            (count as f64 / self.total_processed as f64) * 100.0
        }
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Zone Detection Statistics:")?;
        writeln!(f, "  Total processed: {}", self.total_processed)?;
        writeln!(
            f,
            "  Successful: {} ({:.1}%)",
            self.successful_runs,
            self.success_rate()
        )?;
        writeln!(
            f,
            "  Recovered: {} ({:.1}%)",
            self.recovered_runs,
            self.recovery_rate()
        )?;
        writeln!(
            f,
            "  Failed: {} ({:.1}%)",
            self.failed_runs,
            self.failure_rate()
        )?;
        writeln!(
            f,
            "  Average processing time: {:.2} ms",
            self.average_processing_time_ms
        )?;
        writeln!(
            f,
            "  Processing speed: {:.2} pages/sec",
            self.pages_per_second()
        )?;
        Ok(())
    }
}

/// Thread-safe manager for updating statistics across detector runs.
#[derive(Debug, Default)]
pub struct StatsManager {
    /// Shared statistics state guarded by a mutex.
    stats: Mutex<PipelineStats>,
}

impl StatsManager {
    /// Creates a new `StatsManager` instance with zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// A poisoned lock only means another run panicked mid-update; the
    /// counters are still usable.
    fn lock(&self) -> MutexGuard<'_, PipelineStats> {
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns a copy of the current statistics snapshot.
    pub fn get_stats(&self) -> PipelineStats {
        self.lock().clone()
    }

    /// Records one finished run.
    pub fn record(&self, outcome: RunOutcome, processing_time_ms: f64) {
        let mut stats = self.lock();

        let previous_total = stats.total_processed;
        let new_total = previous_total + 1;
        let accumulated_time = stats.average_processing_time_ms * previous_total as f64;

        stats.total_processed = new_total;
        match outcome {
            RunOutcome::Success => stats.successful_runs += 1,
            RunOutcome::Recovered => stats.recovered_runs += 1,
            RunOutcome::Failed => stats.failed_runs += 1,
        }
        stats.average_processing_time_ms =
            (accumulated_time + processing_time_ms) / new_total as f64;
    }

    /// Resets the tracked statistics to their default state.
    pub fn reset_stats(&self) {
        *self.lock() = PipelineStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::{PipelineStats, RunOutcome, StatsManager};

    #[test]
    fn rates_handle_zero_processed() {
        let stats = PipelineStats::default();
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(stats.recovery_rate(), 0.0);
        assert_eq!(stats.failure_rate(), 0.0);
        assert_eq!(stats.pages_per_second(), 0.0);
    }

    #[test]
    fn display_formats_metrics() {
        let stats = PipelineStats {
            total_processed: 10,
            successful_runs: 7,
            recovered_runs: 2,
            failed_runs: 1,
            average_processing_time_ms: 125.0,
        };

        let display = stats.to_string();
        assert!(display.contains("Total processed: 10"));
        assert!(display.contains("Successful: 7 (70.0%)"));
        assert!(display.contains("Recovered: 2 (20.0%)"));
        assert!(display.contains("Failed: 1 (10.0%)"));
        assert!(display.contains("Average processing time: 125.00 ms"));
        assert!(display.contains("Processing speed: 8.00 pages/sec"));
    }

    #[test]
    fn stats_manager_updates_counters_and_average() {
        let manager = StatsManager::new();

        manager.record(RunOutcome::Success, 100.0);
        manager.record(RunOutcome::Recovered, 200.0);
        let stats = manager.get_stats();
        assert_eq!(stats.total_processed, 2);
        assert_eq!(stats.successful_runs, 1);
        assert_eq!(stats.recovered_runs, 1);
        assert_eq!(stats.failed_runs, 0);
        assert!((stats.average_processing_time_ms - 150.0).abs() < f64::EPSILON);

        manager.reset_stats();
        assert_eq!(manager.get_stats(), PipelineStats::default());
    }
}
