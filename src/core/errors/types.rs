//! Core error types for the zone detection pipeline.
//!
//! This module defines the fundamental error types used throughout the crate,
//! including the main [`OCRError`] enum and the [`ProcessingStage`] enum that
//! names the pipeline stage an error came from.

use thiserror::Error;

/// Errors that can occur during image region operations.
#[derive(Debug, Error)]
pub enum ImageProcessError {
    /// The requested region has a zero dimension.
    #[error("Invalid crop size")]
    InvalidCropSize,
    /// The crop coordinates are out of bounds.
    #[error(
        "Crop region ({x}, {y}, {width}, {height}) is outside the image ({image_width}, {image_height})"
    )]
    CropOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
}

/// Enum representing the stages of the zone detection pipeline.
///
/// Used to identify which stage an error occurred in, providing context for
/// logging and for the degraded recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Candidate region detection.
    CandidateDetection,
    /// Geometric noise filtering.
    GeometricFiltering,
    /// Semantic classification.
    Classification,
    /// Zone merging.
    Merging,
    /// Reading order assignment.
    ReadingOrder,
    /// Final validation and fallback.
    Validation,
    /// Degraded full-image recovery.
    Recovery,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::CandidateDetection => write!(f, "candidate detection"),
            ProcessingStage::GeometricFiltering => write!(f, "geometric filtering"),
            ProcessingStage::Classification => write!(f, "classification"),
            ProcessingStage::Merging => write!(f, "merging"),
            ProcessingStage::ReadingOrder => write!(f, "reading order"),
            ProcessingStage::Validation => write!(f, "validation"),
            ProcessingStage::Recovery => write!(f, "recovery"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Enum representing the errors that can occur in the zone detection pipeline.
#[derive(Error, Debug)]
pub enum OCRError {
    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred inside a pipeline stage.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The text recognition collaborator failed.
    #[error("recognition failed: {context}")]
    Recognition {
        /// Additional context about the failure.
        context: String,
        /// The underlying error, if the collaborator reported one.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("json")]
    Json(#[from] serde_json::Error),
}

impl From<image::ImageError> for OCRError {
    /// Converts an image::ImageError to OCRError::ImageLoad.
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl From<crate::core::config::ConfigError> for OCRError {
    /// Converts a ConfigError to OCRError::ConfigError.
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

impl From<ImageProcessError> for OCRError {
    /// Converts an ImageProcessError to OCRError::Processing.
    fn from(error: ImageProcessError) -> Self {
        Self::Processing {
            kind: ProcessingStage::Generic,
            context: "Image processing failed".to_string(),
            source: Box::new(error),
        }
    }
}
