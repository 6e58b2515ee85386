//! # OAR Zones
//!
//! A Rust library that partitions scanned or photographed document images
//! into semantic zones: headers, dates, prices, addresses, signatures,
//! paragraphs and so on. Each zone carries a bounding box, a type, the
//! recognized text, a confidence score, and a position in reading order.
//!
//! ## Pipeline
//!
//! 1. **Candidate detection**: contrast normalization, multi-scale adaptive
//!    thresholding and morphological closing turn the page into boxes.
//! 2. **Geometric filtering**: boxes whose pixels look like noise or solid
//!    shapes are dropped.
//! 3. **Semantic classification**: an injected recognizer reads each box;
//!    text patterns, then position and shape, decide its type.
//! 4. **Merging**: adjacent zones of the same type fuse.
//! 5. **Reading order**: zones are sorted by type priority and row bands.
//! 6. **Validation**: weak zones are pruned; the result is never empty for
//!    a non-empty page.
//!
//! ## Modules
//!
//! * [`core`] - Error handling, configuration validation and constants
//! * [`domain`] - Zones, profiles, pattern tables and the recognizer seam
//! * [`pipeline`] - The stages and the detection entry points
//! * [`processors`] - Image processing building blocks
//! * [`utils`] - Image loading, cropping, export and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oar_zones::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let profile = DocumentTypeProfile::for_category(DocumentCategory::Invoice);
//! let recognizer = TesseractRecognizer::new().with_languages("fra+eng");
//!
//! let image = load_image(Path::new("invoice.png"))?;
//! let result = detect_and_classify(&image, &profile, &recognizer);
//! for zone in &result.zones {
//!     println!("{} {} {:?}", zone.reading_order, zone.zone_type, zone.content);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Any closure from `&RgbImage` to `OcrResult<Recognition>` is a recognizer,
//! which keeps tests free of an OCR engine:
//!
//! ```rust
//! use oar_zones::prelude::*;
//! use image::{Rgb, RgbImage};
//!
//! let image = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
//! let stub = |_: &RgbImage| -> OcrResult<Recognition> { Ok(Recognition::new("", 0.0)) };
//! let result = detect_and_classify(&image, &DocumentTypeProfile::default(), &stub);
//! assert!(result.success);
//! assert_eq!(result.zones.len(), 1);
//! ```

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use oar_zones::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{ConfigValidator, OCRError, OcrResult, ParallelPolicy};
    pub use crate::domain::{
        DocumentCategory, DocumentTypeProfile, PatternLanguage, Recognition, TesseractRecognizer,
        Zone, ZoneRecognizer, ZoneType,
    };
    pub use crate::pipeline::{
        DetectionResult, ZoneDetector, ZoneRecord, detect_and_classify, detect_and_classify_path,
    };
    pub use crate::processors::BoundingBox;
    pub use crate::utils::load_image;
}
