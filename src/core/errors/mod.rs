//! Error types for the zone detection pipeline.
//!
//! This module provides the crate-wide error enum, the stage identifiers used to
//! attribute failures, and helper constructors.
//!
//! # Usage
//!
//! ```rust
//! use oar_zones::core::errors::{OCRError, ProcessingStage};
//!
//! let config_error = OCRError::config_error("merge distance ratio must be positive");
//! let stage_error = OCRError::stage_message(ProcessingStage::ReadingOrder, "empty input");
//! # let _ = (config_error, stage_error);
//! ```

pub mod constructors;
pub mod types;

pub use constructors::StageMessage;
pub use types::{ImageProcessError, OCRError, ProcessingStage};

/// Convenient result alias for pipeline operations.
pub type OcrResult<T> = Result<T, OCRError>;
