//! The zone detection pipeline.
//!
//! This module wires the stages in [`stages`] into the [`ZoneDetector`] and
//! the [`detect_and_classify`] entry point, and defines the boundary
//! [`DetectionResult`].

mod detector;
mod result;
#[cfg(test)]
mod scenario_tests;
pub mod stages;
mod stats;

pub use detector::{
    ZoneDetector, detect_and_classify, detect_and_classify_path, recovery_zone,
};
pub use result::{DetectionResult, ZoneRecord};
pub use stages::{StageMetrics, StageResult};
pub use stats::{PipelineStats, RunOutcome, StatsManager};
