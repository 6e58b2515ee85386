//! Semantic classification of filtered zones.
//!
//! Each zone is cropped with a small margin and sent to the recognizer. The
//! recognized text is matched against the ordered pattern table; when no
//! pattern matches, the zone's position and shape decide its type. Zones are
//! independent of each other at this stage, so recognition may fan out over
//! the rayon pool; the output keeps the input order.

use super::types::{StageMetrics, StageResult};
use crate::core::{OCRError, OcrResult, ParallelPolicy, ProcessingStage, RECOGNITION_CROP_MARGIN};
use crate::domain::{
    ClassificationConfig, PatternTable, Zone, ZoneFeatures, ZoneRecognizer, ZoneType,
    recognize_guarded,
};
use crate::processors::{BoundingBox, component_count, intensity_stats, otsu_binarize};
use crate::utils::{crop_gray, crop_with_margin};
use image::{GrayImage, RgbImage, imageops};
use rayon::prelude::*;
use std::time::Instant;
use tracing::debug;

/// Symbols that, together with enough digits, mark an amount.
const PRICE_SYMBOLS: [char; 6] = ['€', '$', '£', '%', ',', '.'];

/// Classifies zones using recognized text, position and shape.
#[derive(Debug)]
pub struct SemanticClassifier<'a> {
    config: &'a ClassificationConfig,
    patterns: &'a PatternTable,
    parallel: &'a ParallelPolicy,
}

impl<'a> SemanticClassifier<'a> {
    pub fn new(
        config: &'a ClassificationConfig,
        patterns: &'a PatternTable,
        parallel: &'a ParallelPolicy,
    ) -> Self {
        Self {
            config,
            patterns,
            parallel,
        }
    }

    /// Recognizes and classifies every zone.
    ///
    /// `image` is the color page handed to the recognizer and `gray` its
    /// grayscale version used for region statistics. Recognition failures
    /// never fail the stage; they leave the zone with empty text.
    pub fn classify<R>(
        &self,
        zones: Vec<Zone>,
        image: &RgbImage,
        gray: &GrayImage,
        recognizer: &R,
    ) -> OcrResult<StageResult<Vec<Zone>>>
    where
        R: ZoneRecognizer + ?Sized,
    {
        let start = Instant::now();
        let input_count = zones.len();
        let use_parallel = self.parallel.should_parallelize(input_count);
        debug!(
            "Classifying {} zones (parallel: {})",
            input_count, use_parallel
        );

        let classified: Vec<Zone> = if use_parallel {
            let run = || -> OcrResult<Vec<Zone>> {
                zones
                    .into_par_iter()
                    .map(|zone| self.classify_zone(zone, image, gray, recognizer))
                    .collect()
            };
            match self.parallel.max_threads {
                Some(threads) => rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| {
                        OCRError::stage_failure(
                            ProcessingStage::Classification,
                            "failed to build recognition thread pool",
                            e,
                        )
                    })?
                    .install(run)?,
                None => run()?,
            }
        } else {
            zones
                .into_iter()
                .map(|zone| self.classify_zone(zone, image, gray, recognizer))
                .collect::<OcrResult<_>>()?
        };

        let recognized = classified.iter().filter(|zone| zone.has_content()).count();
        let output_count = classified.len();
        let metrics = StageMetrics::new(ProcessingStage::Classification, input_count, output_count)
            .with_info("with_text", recognized)
            .with_info("parallel", use_parallel)
            .with_processing_time(start.elapsed());
        Ok(StageResult::new(classified, metrics))
    }

    fn classify_zone<R>(
        &self,
        mut zone: Zone,
        image: &RgbImage,
        gray: &GrayImage,
        recognizer: &R,
    ) -> OcrResult<Zone>
    where
        R: ZoneRecognizer + ?Sized,
    {
        let (width, height) = image.dimensions();
        let crop = crop_with_margin(image, &zone.bbox, RECOGNITION_CROP_MARGIN).map_err(|e| {
            OCRError::stage_failure(
                ProcessingStage::Classification,
                format!("cannot crop zone {}", zone.id),
                e,
            )
        })?;

        let recognition = recognize_guarded(recognizer, &crop);
        let text = recognition.text.trim().to_string();

        let zone_type = self.zone_type(&text, &zone.bbox, width, height);
        zone.confidence =
            self.confidence(&text, recognition.confidence, zone_type, &zone.bbox, width, height);
        zone.features = self.features(&text, &zone.bbox, gray)?;
        zone.zone_type = zone_type;
        zone.ocr_confidence = recognition.confidence;
        zone.content = text;

        Ok(zone)
    }

    /// Pattern match first, then the positional and shape fallbacks.
    pub fn zone_type(
        &self,
        text: &str,
        bbox: &BoundingBox,
        image_width: u32,
        image_height: u32,
    ) -> ZoneType {
        if let Some(zone_type) = self.patterns.classify(text) {
            return zone_type;
        }

        let trimmed = text.trim();
        if trimmed.chars().count() < self.config.min_text_length {
            return ZoneType::Unknown;
        }

        let config = self.config;
        let (w, h) = (image_width as f32, image_height as f32);
        let top = bbox.y as f32;

        if top < h * config.top_band_ratio {
            return if bbox.width as f32 >= w * config.header_min_width_ratio {
                ZoneType::Header
            } else {
                ZoneType::Reference
            };
        }

        if top > h * config.bottom_band_ratio {
            return if bbox.height < config.footer_max_height {
                ZoneType::Footer
            } else {
                ZoneType::Signature
            };
        }

        if digit_ratio(trimmed) > config.price_digit_ratio
            && trimmed.chars().any(|c| PRICE_SYMBOLS.contains(&c))
        {
            return ZoneType::Price;
        }

        if bbox.aspect_ratio() > config.paragraph_aspect_ratio {
            return ZoneType::Paragraph;
        }

        ZoneType::Unknown
    }

    /// Composite confidence clamped to `[confidence_floor, 1.0]`.
    pub fn confidence(
        &self,
        text: &str,
        ocr_confidence: f32,
        zone_type: ZoneType,
        bbox: &BoundingBox,
        image_width: u32,
        image_height: u32,
    ) -> f32 {
        let config = self.config;
        let base = ocr_confidence / 100.0;

        let area_ratio = bbox.area_ratio(image_width, image_height);
        let size_bonus = if (config.typical_min_area_ratio..=config.typical_max_area_ratio)
            .contains(&area_ratio)
        {
            config.size_bonus
        } else {
            -config.size_bonus
        };

        let raw = base + length_bonus(text) + size_bonus + zone_type.confidence_bonus();
        raw.clamp(config.confidence_floor, 1.0)
    }

    fn features(
        &self,
        text: &str,
        bbox: &BoundingBox,
        gray: &GrayImage,
    ) -> OcrResult<ZoneFeatures> {
        let mut features = ZoneFeatures::new();
        let char_count = text.chars().count();
        let uppercase = text.chars().filter(|c| c.is_uppercase()).count();

        features.insert("text_length".into(), char_count.into());
        features.insert("word_count".into(), text.split_whitespace().count().into());
        features.insert("digit_ratio".into(), digit_ratio(text).into());
        features.insert("uppercase_ratio".into(), ratio(uppercase, char_count).into());
        features.insert("aspect_ratio".into(), bbox.aspect_ratio().into());
        features.insert("area".into(), bbox.area().into());
        features.insert("position_x".into(), bbox.x.into());
        features.insert("position_y".into(), bbox.y.into());
        features.insert("width".into(), bbox.width.into());
        features.insert("height".into(), bbox.height.into());

        let region = crop_gray(gray, bbox).map_err(|e| {
            OCRError::stage_failure(
                ProcessingStage::Classification,
                "cannot crop region for statistics",
                e,
            )
        })?;
        let stats = intensity_stats(&region);
        let (mut ink, _) = otsu_binarize(&region);
        imageops::invert(&mut ink);

        features.insert("mean_intensity".into(), stats.mean.into());
        features.insert("std_intensity".into(), stats.std_dev.into());
        features.insert("component_count".into(), component_count(&ink).into());

        Ok(features)
    }
}

fn ratio(part: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        part as f32 / total as f32
    }
}

fn digit_ratio(text: &str) -> f32 {
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    ratio(digits, text.chars().count())
}

/// Saturating bonus for longer recognized text.
fn length_bonus(text: &str) -> f32 {
    match text.trim().chars().count() {
        n if n >= 50 => 0.20,
        n if n >= 20 => 0.15,
        n if n >= 10 => 0.10,
        n if n >= 3 => 0.05,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureValue, PatternLanguage, Recognition};
    use image::{Luma, Rgb};

    const W: u32 = 1000;
    const H: u32 = 1000;

    fn classifier_parts() -> (ClassificationConfig, ParallelPolicy) {
        (ClassificationConfig::default(), ParallelPolicy::sequential())
    }

    fn table() -> &'static PatternTable {
        PatternTable::for_language(PatternLanguage::Default)
    }

    fn page() -> (RgbImage, GrayImage) {
        (
            RgbImage::from_pixel(W, H, Rgb([255, 255, 255])),
            GrayImage::from_pixel(W, H, Luma([255])),
        )
    }

    fn fixed(text: &'static str, confidence: f32) -> impl ZoneRecognizer {
        move |_: &RgbImage| -> OcrResult<Recognition> { Ok(Recognition::new(text, confidence)) }
    }

    #[test]
    fn test_invoice_heading_is_header_by_pattern() {
        let (config, parallel) = classifier_parts();
        let classifier = SemanticClassifier::new(&config, table(), &parallel);
        let (image, gray) = page();
        let zone = Zone::candidate(1, BoundingBox::new(100, 10, 600, 40));

        let result = classifier
            .classify(vec![zone], &image, &gray, &fixed("FACTURE N° 2024-01", 90.0))
            .unwrap();
        let zone = &result.data[0];
        assert_eq!(zone.zone_type, ZoneType::Header);
        assert_eq!(zone.content, "FACTURE N° 2024-01");
        assert_eq!(zone.ocr_confidence, 90.0);
    }

    #[test]
    fn test_amount_is_price() {
        let (config, parallel) = classifier_parts();
        let classifier = SemanticClassifier::new(&config, table(), &parallel);
        let (image, gray) = page();
        let zone = Zone::candidate(4, BoundingBox::new(450, 500, 80, 20));

        let result = classifier
            .classify(vec![zone], &image, &gray, &fixed("123,45 €", 80.0))
            .unwrap();
        assert_eq!(result.data[0].zone_type, ZoneType::Price);
    }

    #[test]
    fn test_positional_fallbacks() {
        let (config, parallel) = classifier_parts();
        let classifier = SemanticClassifier::new(&config, table(), &parallel);
        let text = "lorem ipsum";

        let wide_top = BoundingBox::new(0, 50, 600, 30);
        assert_eq!(classifier.zone_type(text, &wide_top, W, H), ZoneType::Header);

        let narrow_top = BoundingBox::new(0, 50, 200, 30);
        assert_eq!(classifier.zone_type(text, &narrow_top, W, H), ZoneType::Reference);

        let thin_bottom = BoundingBox::new(0, 900, 300, 30);
        assert_eq!(classifier.zone_type(text, &thin_bottom, W, H), ZoneType::Footer);

        let tall_bottom = BoundingBox::new(0, 850, 300, 80);
        assert_eq!(classifier.zone_type(text, &tall_bottom, W, H), ZoneType::Signature);

        let long_line = BoundingBox::new(0, 400, 600, 30);
        assert_eq!(classifier.zone_type(text, &long_line, W, H), ZoneType::Paragraph);

        let square = BoundingBox::new(0, 400, 100, 100);
        assert_eq!(classifier.zone_type(text, &square, W, H), ZoneType::Unknown);

        let amount = BoundingBox::new(0, 400, 100, 100);
        assert_eq!(classifier.zone_type("12 34 56 $", &amount, W, H), ZoneType::Price);
    }

    #[test]
    fn test_short_text_is_unknown_even_in_header_band() {
        let (config, parallel) = classifier_parts();
        let classifier = SemanticClassifier::new(&config, table(), &parallel);
        let wide_top = BoundingBox::new(0, 10, 800, 30);
        assert_eq!(classifier.zone_type("x", &wide_top, W, H), ZoneType::Unknown);
        assert_eq!(classifier.zone_type("", &wide_top, W, H), ZoneType::Unknown);
    }

    #[test]
    fn test_confidence_is_clamped_to_floor_and_one() {
        let (config, parallel) = classifier_parts();
        let classifier = SemanticClassifier::new(&config, table(), &parallel);
        let bbox = BoundingBox::new(0, 0, 100, 100);

        let low = classifier.confidence("", 0.0, ZoneType::Noise, &bbox, W, H);
        assert_eq!(low, config.confidence_floor);

        let high = classifier.confidence(&"a".repeat(60), 100.0, ZoneType::Price, &bbox, W, H);
        assert_eq!(high, 1.0);

        // 0.5 base + 0.05 length + 0.1 size - 0.1 unknown
        let mid = classifier.confidence("abcd", 50.0, ZoneType::Unknown, &bbox, W, H);
        assert!((mid - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_recognizer_failure_degrades_to_empty_text() {
        let (config, parallel) = classifier_parts();
        let classifier = SemanticClassifier::new(&config, table(), &parallel);
        let (image, gray) = page();
        let failing = |_: &RgbImage| -> OcrResult<Recognition> { panic!("engine crashed") };

        let zone = Zone::candidate(1, BoundingBox::new(100, 400, 200, 30));
        let result = classifier.classify(vec![zone], &image, &gray, &failing).unwrap();
        let zone = &result.data[0];
        assert_eq!(zone.content, "");
        assert_eq!(zone.ocr_confidence, 0.0);
        assert_eq!(zone.zone_type, ZoneType::Unknown);
        assert!(zone.confidence >= config.confidence_floor);
    }

    #[test]
    fn test_parallel_classification_keeps_order() {
        let config = ClassificationConfig::default();
        let parallel = ParallelPolicy::new()
            .with_zone_threshold(0)
            .with_max_threads(Some(2));
        let classifier = SemanticClassifier::new(&config, table(), &parallel);
        let (image, gray) = page();
        let zones: Vec<Zone> = (0..12)
            .map(|i| Zone::candidate(i + 1, BoundingBox::new(10, 60 + i * 70, 300, 30)))
            .collect();

        let echo_height = |region: &RgbImage| -> OcrResult<Recognition> {
            Ok(Recognition::new(format!("row {}", region.height()), 70.0))
        };
        let result = classifier.classify(zones, &image, &gray, &echo_height).unwrap();

        let ids: Vec<u32> = result.data.iter().map(|z| z.id).collect();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
        assert_eq!(result.metrics.additional_info["parallel"], "true");
    }

    #[test]
    fn test_features_are_recorded() {
        let (config, parallel) = classifier_parts();
        let classifier = SemanticClassifier::new(&config, table(), &parallel);
        let (image, mut gray) = page();
        for x in 110..130 {
            for y in 410..420 {
                gray.put_pixel(x, y, Luma([0]));
            }
        }

        let zone = Zone::candidate(1, BoundingBox::new(100, 400, 50, 30));
        let result = classifier
            .classify(vec![zone], &image, &gray, &fixed("AB 12", 60.0))
            .unwrap();
        let features = &result.data[0].features;
        assert_eq!(features["text_length"], FeatureValue::Int(5));
        assert_eq!(features["word_count"], FeatureValue::Int(2));
        assert_eq!(features["area"], FeatureValue::Int(1500));
        assert_eq!(features["position_y"], FeatureValue::Int(400));
        assert_eq!(features["component_count"], FeatureValue::Int(1));
        assert_eq!(features["uppercase_ratio"], FeatureValue::Float(0.4f32 as f64));
    }
}
