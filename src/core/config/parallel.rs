//! Parallel processing configuration for the recognition fan-out.

use serde::{Deserialize, Serialize};

/// Controls when per-zone recognition calls run on the rayon thread pool.
///
/// Classification of one box never depends on another, so the calls may be
/// spread over worker threads; results are always reassembled in box order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelPolicy {
    /// Maximum number of threads to use for parallel recognition.
    /// If None, rayon's global pool is used.
    #[serde(default)]
    pub max_threads: Option<usize>,

    /// Number of boxes to classify sequentially (<= this uses sequential).
    /// Default: 4
    #[serde(default = "ParallelPolicy::default_zone_threshold")]
    pub zone_threshold: usize,
}

impl ParallelPolicy {
    /// Create a new ParallelPolicy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a policy that never parallelizes.
    pub fn sequential() -> Self {
        Self {
            max_threads: None,
            zone_threshold: usize::MAX,
        }
    }

    /// Set the maximum number of threads.
    pub fn with_max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Set the zone threshold.
    pub fn with_zone_threshold(mut self, threshold: usize) -> Self {
        self.zone_threshold = threshold;
        self
    }

    /// Returns true if `count` boxes should be classified in parallel.
    pub fn should_parallelize(&self, count: usize) -> bool {
        count > self.zone_threshold
    }

    fn default_zone_threshold() -> usize {
        4
    }
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            max_threads: None,
            zone_threshold: Self::default_zone_threshold(),
        }
    }
}
