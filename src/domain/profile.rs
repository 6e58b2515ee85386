//! Document-type profiles: the tunable thresholds consumed by every stage.
//!
//! A [`DocumentTypeProfile`] is selected per [`DocumentCategory`] and owned by
//! the caller. Every field has a default, so a profile file only needs to name
//! the values it overrides.

use crate::core::config::{ConfigError, ConfigValidator, ConfigValidatorExt, ParallelPolicy};
use crate::core::{OCRError, OcrResult};
use crate::domain::patterns::{PatternLanguage, PatternRule, PatternTable};
use crate::domain::zone::ZoneType;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Size of a rectangular structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSize {
    pub width: u32,
    pub height: u32,
}

impl KernelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Local thresholding parameters for one neighborhood scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdScale {
    /// Odd neighborhood size in pixels.
    pub block_size: u32,
    /// Amount subtracted from the local mean.
    pub offset: f32,
}

impl ThresholdScale {
    pub const fn new(block_size: u32, offset: f32) -> Self {
        Self { block_size, offset }
    }
}

/// Bilateral smoothing applied before thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter window in pixels; 1 or less disables smoothing.
    pub window_size: u32,
    /// Spread of the intensity weights.
    pub sigma_color: f32,
    /// Spread of the distance weights.
    pub sigma_spatial: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            sigma_color: 50.0,
            sigma_spatial: 50.0,
        }
    }
}

/// Parameters of the candidate detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateDetectionConfig {
    pub clahe_clip_limit: f32,
    pub clahe_grid: u32,
    pub smoothing: SmoothingConfig,
    pub fine_threshold: ThresholdScale,
    pub standard_threshold: ThresholdScale,
    pub large_threshold: ThresholdScale,
    /// Closing kernel that bridges glyphs into words.
    pub horizontal_kernel: KernelSize,
    /// Closing kernel that bridges words into lines.
    pub vertical_kernel: KernelSize,
    /// Chebyshev radius of the dilation used by the second extraction strategy.
    pub dilation_radius: u8,
    pub min_area_ratio: f32,
    pub max_area_ratio: f32,
    pub min_width: u32,
    pub min_height: u32,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    /// Overlap (intersection over smaller area) above which boxes are duplicates.
    pub duplicate_overlap: f32,
}

impl Default for CandidateDetectionConfig {
    fn default() -> Self {
        Self {
            clahe_clip_limit: 3.0,
            clahe_grid: 8,
            smoothing: SmoothingConfig::default(),
            fine_threshold: ThresholdScale::new(11, 8.0),
            standard_threshold: ThresholdScale::new(15, 10.0),
            large_threshold: ThresholdScale::new(21, 12.0),
            horizontal_kernel: KernelSize::new(15, 1),
            vertical_kernel: KernelSize::new(1, 8),
            dilation_radius: 1,
            min_area_ratio: 0.0003,
            max_area_ratio: 0.7,
            min_width: 15,
            min_height: 8,
            min_aspect_ratio: 0.02,
            max_aspect_ratio: 50.0,
            duplicate_overlap: crate::core::DUPLICATE_OVERLAP_RATIO,
        }
    }
}

impl ConfigValidator for CandidateDetectionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_positive_f32(self.clahe_clip_limit, "clahe_clip_limit")?;
        self.validate_positive_u32(self.clahe_grid, "clahe_grid")?;
        self.validate_positive_f32(self.smoothing.sigma_color, "smoothing.sigma_color")?;
        self.validate_positive_f32(self.smoothing.sigma_spatial, "smoothing.sigma_spatial")?;
        for (scale, name) in [
            (&self.fine_threshold, "fine_threshold.block_size"),
            (&self.standard_threshold, "standard_threshold.block_size"),
            (&self.large_threshold, "large_threshold.block_size"),
        ] {
            self.validate_block_size(scale.block_size, name)?;
        }
        self.validate_positive_u32(self.horizontal_kernel.width, "horizontal_kernel.width")?;
        self.validate_positive_u32(self.horizontal_kernel.height, "horizontal_kernel.height")?;
        self.validate_positive_u32(self.vertical_kernel.width, "vertical_kernel.width")?;
        self.validate_positive_u32(self.vertical_kernel.height, "vertical_kernel.height")?;
        self.validate_f32_range(self.min_area_ratio, 0.0, 1.0, "min_area_ratio")?;
        self.validate_f32_range(self.max_area_ratio, 0.0, 1.0, "max_area_ratio")?;
        self.validate_ordered_f32(self.min_area_ratio, self.max_area_ratio, "area_ratio")?;
        self.validate_positive_f32(self.max_aspect_ratio, "max_aspect_ratio")?;
        self.validate_ordered_f32(self.min_aspect_ratio, self.max_aspect_ratio, "aspect_ratio")?;
        self.validate_f32_range(self.duplicate_overlap, 0.0, 1.0, "duplicate_overlap")?;
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Parameters of the geometric noise filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometricFilterConfig {
    /// Boxes larger than this fraction of the image are rejected.
    pub max_area_ratio: f32,
    pub min_density: f32,
    pub max_density: f32,
    /// Regions with a lower intensity standard deviation are uniform fills.
    pub min_std_dev: f32,
}

impl Default for GeometricFilterConfig {
    fn default() -> Self {
        Self {
            max_area_ratio: 0.5,
            min_density: 0.02,
            max_density: 0.98,
            min_std_dev: 5.0,
        }
    }
}

impl ConfigValidator for GeometricFilterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_f32_range(self.max_area_ratio, 0.0, 1.0, "filter.max_area_ratio")?;
        self.validate_f32_range(self.min_density, 0.0, 1.0, "min_density")?;
        self.validate_f32_range(self.max_density, 0.0, 1.0, "max_density")?;
        self.validate_ordered_f32(self.min_density, self.max_density, "density")?;
        self.validate_f32_range(self.min_std_dev, 0.0, 255.0, "min_std_dev")?;
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Parameters of the semantic classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub language: PatternLanguage,
    /// Replaces the language table when non-empty.
    pub custom_patterns: Vec<PatternRule>,
    /// Trimmed texts shorter than this that match no pattern are `Unknown`.
    pub min_text_length: usize,
    /// Boxes whose top edge lies above this fraction of the height are in the top band.
    pub top_band_ratio: f32,
    /// Boxes whose top edge lies below this fraction of the height are in the bottom band.
    pub bottom_band_ratio: f32,
    /// Minimum width fraction for a top-band box to be a header.
    pub header_min_width_ratio: f32,
    /// Bottom-band boxes shorter than this are footers, taller ones signatures.
    pub footer_max_height: u32,
    pub price_digit_ratio: f32,
    pub paragraph_aspect_ratio: f32,
    pub typical_min_area_ratio: f32,
    pub typical_max_area_ratio: f32,
    /// Magnitude of the size bonus or penalty.
    pub size_bonus: f32,
    pub confidence_floor: f32,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            language: PatternLanguage::Default,
            custom_patterns: Vec::new(),
            min_text_length: 2,
            top_band_ratio: 0.15,
            bottom_band_ratio: 0.8,
            header_min_width_ratio: 0.5,
            footer_max_height: 50,
            price_digit_ratio: 0.3,
            paragraph_aspect_ratio: 5.0,
            typical_min_area_ratio: 0.001,
            typical_max_area_ratio: 0.3,
            size_bonus: 0.1,
            confidence_floor: 0.1,
        }
    }
}

impl ClassificationConfig {
    /// Returns the pattern table this configuration selects.
    pub fn pattern_table(&self) -> OcrResult<Cow<'static, PatternTable>> {
        if self.custom_patterns.is_empty() {
            Ok(Cow::Borrowed(PatternTable::for_language(self.language)))
        } else {
            PatternTable::from_rules(&self.custom_patterns).map(Cow::Owned)
        }
    }
}

impl ConfigValidator for ClassificationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_f32_range(self.top_band_ratio, 0.0, 1.0, "top_band_ratio")?;
        self.validate_f32_range(self.bottom_band_ratio, 0.0, 1.0, "bottom_band_ratio")?;
        self.validate_ordered_f32(self.top_band_ratio, self.bottom_band_ratio, "band_ratio")?;
        self.validate_f32_range(
            self.header_min_width_ratio,
            0.0,
            1.0,
            "header_min_width_ratio",
        )?;
        self.validate_f32_range(self.price_digit_ratio, 0.0, 1.0, "price_digit_ratio")?;
        self.validate_positive_f32(self.paragraph_aspect_ratio, "paragraph_aspect_ratio")?;
        self.validate_ordered_f32(
            self.typical_min_area_ratio,
            self.typical_max_area_ratio,
            "typical_area_ratio",
        )?;
        self.validate_f32_range(self.size_bonus, 0.0, 1.0, "size_bonus")?;
        self.validate_f32_range(self.confidence_floor, 0.0, 1.0, "confidence_floor")?;
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Parameters of the zone merger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Zones merge when their center distance is below this multiple of their average size.
    pub distance_ratio: f32,
    pub max_confidence_gap: f32,
    /// Type pairs that never merge, in either order.
    pub incompatible_pairs: Vec<(ZoneType, ZoneType)>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            distance_ratio: 0.8,
            max_confidence_gap: 0.3,
            incompatible_pairs: vec![
                (ZoneType::Header, ZoneType::Footer),
                (ZoneType::Signature, ZoneType::Price),
                (ZoneType::Logo, ZoneType::Paragraph),
            ],
        }
    }
}

impl MergeConfig {
    /// Returns true if the pair is listed as incompatible, in either order.
    pub fn is_incompatible(&self, a: ZoneType, b: ZoneType) -> bool {
        self.incompatible_pairs
            .iter()
            .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
    }
}

impl ConfigValidator for MergeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_positive_f32(self.distance_ratio, "distance_ratio")?;
        self.validate_f32_range(self.max_confidence_gap, 0.0, 1.0, "max_confidence_gap")?;
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Parameters of the final validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_confidence: f32,
    pub min_area_ratio: f32,
    pub max_area_ratio: f32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.1,
            min_area_ratio: 0.0001,
            max_area_ratio: 0.9,
        }
    }
}

impl ConfigValidator for ValidationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_f32_range(self.min_confidence, 0.0, 1.0, "min_confidence")?;
        self.validate_f32_range(self.min_area_ratio, 0.0, 1.0, "validation.min_area_ratio")?;
        self.validate_f32_range(self.max_area_ratio, 0.0, 1.0, "validation.max_area_ratio")?;
        self.validate_ordered_f32(
            self.min_area_ratio,
            self.max_area_ratio,
            "validation.area_ratio",
        )?;
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Document categories with tuned presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    #[default]
    Default,
    Invoice,
    Form,
    Newspaper,
    Handwritten,
    Table,
    Photo,
}

impl DocumentCategory {
    pub const ALL: [DocumentCategory; 7] = [
        DocumentCategory::Default,
        DocumentCategory::Invoice,
        DocumentCategory::Form,
        DocumentCategory::Newspaper,
        DocumentCategory::Handwritten,
        DocumentCategory::Table,
        DocumentCategory::Photo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Default => "default",
            DocumentCategory::Invoice => "invoice",
            DocumentCategory::Form => "form",
            DocumentCategory::Newspaper => "newspaper",
            DocumentCategory::Handwritten => "handwritten",
            DocumentCategory::Table => "table",
            DocumentCategory::Photo => "photo",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentCategory {
    type Err = OCRError;

    /// Accepts English names and French aliases, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(DocumentCategory::Default),
            "invoice" | "facture" => Ok(DocumentCategory::Invoice),
            "form" | "formulaire" => Ok(DocumentCategory::Form),
            "newspaper" | "journal" => Ok(DocumentCategory::Newspaper),
            "handwritten" | "manuscrit" => Ok(DocumentCategory::Handwritten),
            "table" | "tableau" => Ok(DocumentCategory::Table),
            "photo" => Ok(DocumentCategory::Photo),
            other => Err(OCRError::invalid_input(format!(
                "unknown document category '{}'",
                other
            ))),
        }
    }
}

/// Every threshold the pipeline consumes, grouped by stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentTypeProfile {
    pub category: DocumentCategory,
    pub candidates: CandidateDetectionConfig,
    pub filter: GeometricFilterConfig,
    pub classification: ClassificationConfig,
    pub merge: MergeConfig,
    pub validation: ValidationConfig,
    pub parallel: ParallelPolicy,
}

impl DocumentTypeProfile {
    /// Builds the preset for a category.
    pub fn for_category(category: DocumentCategory) -> Self {
        let mut profile = Self {
            category,
            ..Self::default()
        };
        let candidates = &mut profile.candidates;

        match category {
            DocumentCategory::Default => {}
            DocumentCategory::Invoice => {
                candidates.min_area_ratio = 0.0002;
                candidates.min_width = 12;
                candidates.min_height = 6;
                profile.classification.confidence_floor = 0.15;
                profile.validation.min_confidence = 0.15;
            }
            DocumentCategory::Form => {
                candidates.min_area_ratio = 0.0001;
                candidates.min_width = 10;
                candidates.min_height = 5;
                candidates.horizontal_kernel = KernelSize::new(10, 1);
                profile.merge.distance_ratio = 0.5;
            }
            DocumentCategory::Newspaper => {
                candidates.min_aspect_ratio = 0.3;
                candidates.max_aspect_ratio = 15.0;
                candidates.vertical_kernel = KernelSize::new(1, 12);
            }
            DocumentCategory::Handwritten => {
                candidates.fine_threshold.block_size = 17;
                candidates.standard_threshold.block_size = 21;
                candidates.horizontal_kernel = KernelSize::new(20, 1);
                profile.filter.min_std_dev = 15.0;
            }
            DocumentCategory::Table => {
                candidates.min_aspect_ratio = 0.1;
                candidates.max_aspect_ratio = 20.0;
                candidates.horizontal_kernel = KernelSize::new(8, 1);
                candidates.vertical_kernel = KernelSize::new(1, 4);
                profile.merge.distance_ratio = 0.3;
            }
            DocumentCategory::Photo => {
                candidates.min_area_ratio = 0.001;
                candidates.fine_threshold.block_size = 15;
                candidates.standard_threshold.block_size = 19;
                candidates.large_threshold.block_size = 25;
                profile.filter.min_density = 0.15;
                profile.filter.min_std_dev = 25.0;
            }
        }

        profile
    }

    /// Sets the pattern language.
    pub fn with_language(mut self, language: PatternLanguage) -> Self {
        self.classification.language = language;
        self
    }

    /// Sets the parallel policy used for recognition.
    pub fn with_parallel_policy(mut self, policy: ParallelPolicy) -> Self {
        self.parallel = policy;
        self
    }

    /// Parses and validates a profile from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> OcrResult<Self> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate_and_wrap_ocr_error()
    }

    /// Reads, parses and validates a profile file.
    pub fn from_json_file(path: &Path) -> OcrResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

impl ConfigValidator for DocumentTypeProfile {
    fn validate(&self) -> Result<(), ConfigError> {
        self.candidates.validate()?;
        self.filter.validate()?;
        self.classification.validate()?;
        self.merge.validate()?;
        self.validation.validate()?;
        if let Some(threads) = self.parallel.max_threads {
            self.validate_thread_count(threads)?;
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_is_valid() {
        for category in DocumentCategory::ALL {
            let profile = DocumentTypeProfile::for_category(category);
            assert!(profile.validate().is_ok(), "{category} preset is invalid");
            assert_eq!(profile.category, category);
        }
    }

    #[test]
    fn test_french_aliases() {
        assert_eq!(
            "facture".parse::<DocumentCategory>().unwrap(),
            DocumentCategory::Invoice
        );
        assert_eq!(
            "Tableau".parse::<DocumentCategory>().unwrap(),
            DocumentCategory::Table
        );
        assert!("brochure".parse::<DocumentCategory>().is_err());
    }

    #[test]
    fn test_invoice_preset_overrides() {
        let profile = DocumentTypeProfile::for_category(DocumentCategory::Invoice);
        assert_eq!(profile.candidates.min_width, 12);
        assert_eq!(profile.classification.confidence_floor, 0.15);
        assert_eq!(profile.candidates.horizontal_kernel, KernelSize::new(15, 1));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "category": "table",
            "candidates": { "min_width": 4 },
            "classification": { "language": "english" }
        }"#;
        let profile = DocumentTypeProfile::from_json_str(json).unwrap();
        assert_eq!(profile.category, DocumentCategory::Table);
        assert_eq!(profile.candidates.min_width, 4);
        assert_eq!(profile.candidates.min_height, 8);
        assert_eq!(profile.classification.language, PatternLanguage::English);
        assert_eq!(profile.merge, MergeConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let profile = DocumentTypeProfile::for_category(DocumentCategory::Handwritten);
        let json = serde_json::to_string(&profile).unwrap();
        let parsed = DocumentTypeProfile::from_json_str(&json).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let json = r#"{ "candidates": { "fine_threshold": { "block_size": 10, "offset": 8.0 } } }"#;
        let err = DocumentTypeProfile::from_json_str(json).unwrap_err();
        assert!(matches!(err, OCRError::ConfigError { .. }));

        let mut profile = DocumentTypeProfile::default();
        profile.filter.min_density = 0.9;
        profile.filter.max_density = 0.1;
        assert!(profile.validate().is_err());

        let mut profile = DocumentTypeProfile::default();
        profile.candidates.smoothing.sigma_color = 0.0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_partial_smoothing_override() {
        let json = r#"{ "candidates": { "smoothing": { "window_size": 3 } } }"#;
        let profile = DocumentTypeProfile::from_json_str(json).unwrap();
        assert_eq!(profile.candidates.smoothing.window_size, 3);
        assert_eq!(profile.candidates.smoothing.sigma_color, 50.0);
    }

    #[test]
    fn test_incompatible_pairs_are_symmetric() {
        let merge = MergeConfig::default();
        assert!(merge.is_incompatible(ZoneType::Footer, ZoneType::Header));
        assert!(merge.is_incompatible(ZoneType::Signature, ZoneType::Price));
        assert!(!merge.is_incompatible(ZoneType::Unknown, ZoneType::Unknown));
    }

    #[test]
    fn test_pattern_table_selection() {
        let mut config = ClassificationConfig::default();
        assert!(matches!(config.pattern_table().unwrap(), Cow::Borrowed(_)));

        config.custom_patterns = vec![PatternRule {
            zone_type: ZoneType::Title,
            patterns: vec!["^chapitre".to_string()],
        }];
        let table = config.pattern_table().unwrap();
        assert_eq!(table.classify("Chapitre 1"), Some(ZoneType::Title));
    }
}
