//! Recognition adapters.
//!
//! Adapters bridge external OCR engines to the [`ZoneRecognizer`] seam used by
//! the classifier.
//!
//! [`ZoneRecognizer`]: crate::domain::ZoneRecognizer

pub mod tesseract_adapter;

pub use tesseract_adapter::{TesseractRecognizer, estimate_confidence};
