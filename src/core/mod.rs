//! The core module of the zone detection pipeline.
//!
//! This module contains the fundamental components shared by every stage:
//! - Configuration validation and the parallel policy
//! - Constants used throughout the pipeline
//! - Error handling

pub mod config;
pub mod constants;
pub mod errors;

pub use config::{ConfigError, ConfigValidator, ConfigValidatorExt, ParallelPolicy};
pub use constants::*;
pub use errors::{ImageProcessError, OCRError, OcrResult, ProcessingStage};
