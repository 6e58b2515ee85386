//! The text recognition seam.
//!
//! The pipeline never talks to an OCR engine directly. Callers inject a
//! [`ZoneRecognizer`], which turns a cropped region into text and a score.
//! Any closure with the right signature is a recognizer, which keeps stubs
//! in tests short.

use crate::core::OcrResult;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::warn;

/// Text recognized in one region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    pub text: String,
    /// Engine score in `[0, 100]`.
    pub confidence: f32,
}

impl Recognition {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }

    /// The value used when recognition fails: no text, zero confidence.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Turns a cropped region into text.
pub trait ZoneRecognizer: Send + Sync {
    fn recognize(&self, region: &RgbImage) -> OcrResult<Recognition>;
}

impl<F> ZoneRecognizer for F
where
    F: Fn(&RgbImage) -> OcrResult<Recognition> + Send + Sync,
{
    fn recognize(&self, region: &RgbImage) -> OcrResult<Recognition> {
        self(region)
    }
}

/// Calls the recognizer and degrades every failure to [`Recognition::empty`].
///
/// Errors and panics raised by the recognizer are logged and swallowed. The
/// returned confidence is clamped to `[0, 100]`; a non-finite score becomes 0.
pub fn recognize_guarded<R>(recognizer: &R, region: &RgbImage) -> Recognition
where
    R: ZoneRecognizer + ?Sized,
{
    match catch_unwind(AssertUnwindSafe(|| recognizer.recognize(region))) {
        Ok(Ok(mut recognition)) => {
            recognition.confidence = if recognition.confidence.is_finite() {
                recognition.confidence.clamp(0.0, 100.0)
            } else {
                0.0
            };
            recognition
        }
        Ok(Err(err)) => {
            warn!("Recognition failed, continuing with empty text: {}", err);
            Recognition::empty()
        }
        Err(_) => {
            warn!("Recognizer panicked, continuing with empty text");
            Recognition::empty()
        }
    }
}
