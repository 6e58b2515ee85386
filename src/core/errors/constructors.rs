//! Error constructor utilities for the zone detection pipeline.
//!
//! These helpers keep error creation terse at call sites:
//!
//! ```rust
//! use oar_zones::core::{OCRError, ProcessingStage};
//!
//! let error = OCRError::stage_failure(
//!     ProcessingStage::Merging,
//!     "cluster fusion produced an empty box",
//!     std::io::Error::new(std::io::ErrorKind::InvalidData, "empty"),
//! );
//! assert!(error.to_string().starts_with("merging failed"));
//! ```

use super::types::{OCRError, ProcessingStage};

/// Simple string error used when a stage fails without an underlying source.
#[derive(Debug)]
pub struct StageMessage(pub String);

impl std::fmt::Display for StageMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for StageMessage {}

impl OCRError {
    /// Creates an error for a failure inside a pipeline stage.
    ///
    /// # Arguments
    ///
    /// * `kind` - The stage in which the failure happened.
    /// * `context` - Additional context about the error.
    /// * `error` - The underlying error that caused this error.
    pub fn stage_failure(
        kind: ProcessingStage,
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a stage failure from a plain message.
    pub fn stage_message(kind: ProcessingStage, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Processing {
            kind,
            context: message.clone(),
            source: Box::new(StageMessage(message)),
        }
    }

    /// Creates an error for a failed call to the recognition collaborator.
    pub fn recognition_failure(
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Recognition {
            context: context.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Creates a recognition error without an underlying source.
    pub fn recognition_message(context: impl Into<String>) -> Self {
        Self::Recognition {
            context: context.into(),
            source: None,
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a configuration error for invalid field values.
    ///
    /// # Arguments
    ///
    /// * `field` - The name of the field with an invalid value
    /// * `expected` - Description of what was expected
    /// * `actual` - Description of what was actually provided
    pub fn invalid_field(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ConfigError {
            message: format!(
                "invalid value for field '{}': expected {}, got {}",
                field.into(),
                expected.into(),
                actual.into()
            ),
        }
    }

    /// Returns the pipeline stage this error is attributed to, if any.
    pub fn stage(&self) -> Option<ProcessingStage> {
        match self {
            Self::Processing { kind, .. } => Some(*kind),
            Self::Recognition { .. } => Some(ProcessingStage::Classification),
            _ => None,
        }
    }
}
