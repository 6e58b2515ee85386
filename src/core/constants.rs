//! Constants used throughout the zone detection pipeline.
//!
//! These values are fixed parts of the pipeline contract. Tunable thresholds
//! live in [`crate::domain::DocumentTypeProfile`] instead.

/// Margin in pixels added around a box before it is handed to the recognizer.
pub const RECOGNITION_CROP_MARGIN: u32 = 5;

/// Margin in pixels added around a zone when exporting its crop.
pub const EXPORT_CROP_MARGIN: u32 = 10;

/// Height in pixels of the bands used to group rows for reading order.
pub const READING_ORDER_BAND: u32 = 50;

/// Reading order priority for tags without an explicit rank.
pub const DEFAULT_TYPE_PRIORITY: u8 = 15;

/// Confidence assigned to the full-image zone built by the degraded recovery path.
pub const RECOVERY_ZONE_CONFIDENCE: f32 = 0.5;

/// Overlap ratio above which boxes from different extraction strategies are duplicates.
pub const DUPLICATE_OVERLAP_RATIO: f32 = 0.7;
