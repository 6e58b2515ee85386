//! Configuration management for the zone detection pipeline.
//!
//! This module provides the validation trait shared by all stage configurations
//! and the parallel processing policy.

pub mod errors;
pub mod parallel;

pub use errors::{ConfigError, ConfigValidator, ConfigValidatorExt};
pub use parallel::ParallelPolicy;
