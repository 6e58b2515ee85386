//! Shared types for pipeline stages.

use crate::core::ProcessingStage;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Result wrapper for stage processing operations.
///
/// Every stage returns its output together with the metrics describing how
/// many items went in and came out.
#[derive(Debug, Clone)]
pub struct StageResult<T> {
    /// The processed data from the stage
    pub data: T,
    /// Counts and timing for the stage
    pub metrics: StageMetrics,
}

impl<T> StageResult<T> {
    /// Create a new stage result with the given data and metrics
    pub fn new(data: T, metrics: StageMetrics) -> Self {
        Self { data, metrics }
    }

    /// Splits the result into its data and metrics.
    pub fn into_parts(self) -> (T, StageMetrics) {
        (self.data, self.metrics)
    }
}

/// Metrics collected during stage processing.
#[derive(Debug, Clone)]
pub struct StageMetrics {
    pub stage: ProcessingStage,
    /// Time taken to process the stage
    pub processing_time: Option<Duration>,
    /// Number of items the stage received
    pub input_count: usize,
    /// Number of items the stage produced
    pub output_count: usize,
    /// Additional stage-specific metrics
    pub additional_info: BTreeMap<String, String>,
}

impl StageMetrics {
    /// Create new metrics with the given counts
    pub fn new(stage: ProcessingStage, input_count: usize, output_count: usize) -> Self {
        Self {
            stage,
            processing_time: None,
            input_count,
            output_count,
            additional_info: BTreeMap::new(),
        }
    }

    /// Set the processing time
    pub fn with_processing_time(mut self, duration: Duration) -> Self {
        self.processing_time = Some(duration);
        self
    }

    /// Add additional information to the metrics
    pub fn with_info<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.additional_info.insert(key.into(), value.to_string());
        self
    }

    /// Items dropped by the stage; zero when the stage produced more than it received.
    pub fn removed_count(&self) -> usize {
        self.input_count.saturating_sub(self.output_count)
    }
}

impl fmt::Display for StageMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.stage, self.input_count, self.output_count)?;
        if let Some(time) = self.processing_time {
            write!(f, " in {:.2} ms", time.as_secs_f64() * 1000.0)?;
        }
        for (key, value) in &self.additional_info {
            write!(f, ", {}={}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_display_and_removed_count() {
        let metrics = StageMetrics::new(ProcessingStage::Validation, 5, 3)
            .with_info("fallback", false)
            .with_processing_time(Duration::from_millis(2));
        assert_eq!(metrics.removed_count(), 2);
        let text = metrics.to_string();
        assert!(text.starts_with("validation: 5 -> 3 in 2.00 ms"));
        assert!(text.ends_with("fallback=false"));
    }

    #[test]
    fn test_removed_count_saturates() {
        let metrics = StageMetrics::new(ProcessingStage::CandidateDetection, 0, 1);
        assert_eq!(metrics.removed_count(), 0);
    }
}
