//! Configuration error types and validation traits.

use thiserror::Error;

/// Errors that can occur during configuration validation.
///
/// This enum represents the errors raised when a document profile or one of
/// its stage configurations carries values the pipeline cannot work with.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Error indicating that a resource limit has been exceeded.
    #[error("resource limit exceeded: {message}")]
    ResourceLimitExceeded { message: String },
}

/// A trait for validating configuration parameters.
///
/// Stage configurations implement `validate` and may reuse the provided range
/// helpers for their individual fields.
pub trait ConfigValidator {
    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// A Result indicating success or a ConfigError if validation fails.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Returns the default configuration.
    fn get_defaults() -> Self
    where
        Self: Sized;

    /// Validates a float value is within a specified range.
    ///
    /// # Arguments
    ///
    /// * `value` - The value to validate.
    /// * `min` - The minimum allowed value (inclusive).
    /// * `max` - The maximum allowed value (inclusive).
    /// * `field_name` - The name of the field being validated.
    fn validate_f32_range(
        &self,
        value: f32,
        min: f32,
        max: f32,
        field_name: &str,
    ) -> Result<(), ConfigError> {
        if !(min..=max).contains(&value) {
            Err(ConfigError::InvalidConfig {
                message: format!(
                    "{} must be between {} and {}, got {}",
                    field_name, min, max, value
                ),
            })
        } else {
            Ok(())
        }
    }

    /// Validates a float value is positive.
    fn validate_positive_f32(&self, value: f32, field_name: &str) -> Result<(), ConfigError> {
        if value <= 0.0 || value.is_nan() {
            Err(ConfigError::InvalidConfig {
                message: format!("{} must be greater than 0, got {}", field_name, value),
            })
        } else {
            Ok(())
        }
    }

    /// Validates a u32 value is positive.
    fn validate_positive_u32(&self, value: u32, field_name: &str) -> Result<(), ConfigError> {
        if value == 0 {
            Err(ConfigError::InvalidConfig {
                message: format!("{} must be greater than 0, got {}", field_name, value),
            })
        } else {
            Ok(())
        }
    }

    /// Validates that a `(min, max)` pair is ordered.
    fn validate_ordered_f32(
        &self,
        min: f32,
        max: f32,
        field_name: &str,
    ) -> Result<(), ConfigError> {
        if min > max {
            Err(ConfigError::InvalidConfig {
                message: format!(
                    "{}: minimum {} is greater than maximum {}",
                    field_name, min, max
                ),
            })
        } else {
            Ok(())
        }
    }

    /// Validates a neighborhood size used for local thresholding.
    ///
    /// Block sizes must be odd and at least 3 so the window has a center pixel.
    fn validate_block_size(&self, value: u32, field_name: &str) -> Result<(), ConfigError> {
        if value < 3 || value % 2 == 0 {
            Err(ConfigError::InvalidConfig {
                message: format!("{} must be an odd value >= 3, got {}", field_name, value),
            })
        } else {
            Ok(())
        }
    }

    /// Validates thread count.
    fn validate_thread_count(&self, thread_count: usize) -> Result<(), ConfigError> {
        const MAX_REASONABLE_THREADS: usize = 256;

        if thread_count == 0 {
            Err(ConfigError::InvalidConfig {
                message: "Thread count must be greater than 0".to_string(),
            })
        } else if thread_count > MAX_REASONABLE_THREADS {
            Err(ConfigError::ResourceLimitExceeded {
                message: format!(
                    "Thread count {} exceeds reasonable maximum of {}",
                    thread_count, MAX_REASONABLE_THREADS
                ),
            })
        } else {
            Ok(())
        }
    }
}

/// Extension trait that wraps validation errors into [`crate::core::OCRError`].
pub trait ConfigValidatorExt: ConfigValidator {
    /// Validates configuration and wraps any errors into `OCRError::ConfigError`.
    fn validate_and_wrap_ocr_error(self) -> Result<Self, crate::core::errors::OCRError>
    where
        Self: Sized,
    {
        self.validate()?;
        Ok(self)
    }
}

impl<T: ConfigValidator> ConfigValidatorExt for T {}
