//! Domain-level structures shared across the zone pipeline.
//!
//! This module groups the zone entity and its type tags, the document-type
//! profiles that tune every stage, the ordered pattern tables used for
//! classification, and the recognition seam with its adapters.

pub mod adapters;
pub mod patterns;
pub mod profile;
pub mod recognizer;
pub mod zone;

pub use adapters::TesseractRecognizer;
pub use patterns::{PatternLanguage, PatternRule, PatternTable};
pub use profile::{
    CandidateDetectionConfig, ClassificationConfig, DocumentCategory, DocumentTypeProfile,
    GeometricFilterConfig, KernelSize, MergeConfig, SmoothingConfig, ThresholdScale,
    ValidationConfig,
};
pub use recognizer::{Recognition, ZoneRecognizer, recognize_guarded};
pub use zone::{FeatureValue, Zone, ZoneFeatures, ZoneType};
