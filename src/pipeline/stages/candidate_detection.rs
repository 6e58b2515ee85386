//! Candidate region detection.
//!
//! Turns a grayscale page into deduplicated boxes around probable text. The
//! page is contrast-normalized and smoothed, binarized at three neighborhood
//! scales, and closed with a horizontal then a vertical kernel so glyphs join
//! into words and words into lines. Boxes come from two extraction strategies
//! whose near-duplicates are fused.

use super::types::{StageMetrics, StageResult};
use crate::core::{OCRError, OcrResult, ProcessingStage};
use crate::domain::{CandidateDetectionConfig, Zone};
use crate::processors::{
    BoundingBox, adaptive_threshold_inv, clahe, close_rect, combine_masks, component_boxes,
    dilate_square, external_contour_boxes, merge_duplicate_boxes, smooth,
};
use image::GrayImage;
use std::time::Instant;
use tracing::{debug, warn};

/// Candidate zones produced for one page.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    /// Unclassified zones with 1-based ids in detection order.
    pub zones: Vec<Zone>,
    /// True when nothing survived filtering and the set holds the full-page box.
    pub used_fallback: bool,
}

/// Detects candidate text regions.
#[derive(Debug)]
pub struct CandidateDetector<'a> {
    config: &'a CandidateDetectionConfig,
}

impl<'a> CandidateDetector<'a> {
    pub fn new(config: &'a CandidateDetectionConfig) -> Self {
        Self { config }
    }

    /// Runs detection on a grayscale page.
    ///
    /// Never returns an empty set: when no box passes the size and shape
    /// filters, a single box covering the page is emitted instead.
    ///
    /// # Errors
    ///
    /// Fails for an image with a zero dimension.
    pub fn detect(&self, gray: &GrayImage) -> OcrResult<StageResult<CandidateSet>> {
        let start = Instant::now();
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(OCRError::stage_message(
                ProcessingStage::CandidateDetection,
                format!("cannot detect zones in a {}x{} image", width, height),
            ));
        }

        let mask = self.foreground_mask(gray)?;
        let raw = self.extract_boxes(&mask);
        let raw_count = raw.len();
        let deduplicated = merge_duplicate_boxes(raw, self.config.duplicate_overlap);
        let deduplicated_count = deduplicated.len();

        let kept: Vec<BoundingBox> = deduplicated
            .into_iter()
            .filter(|bbox| self.accepts(bbox, width, height))
            .collect();

        let used_fallback = kept.is_empty();
        let boxes = if used_fallback {
            warn!("No candidate zone survived filtering, using the full page");
            vec![BoundingBox::full_image(width, height)]
        } else {
            kept
        };

        let zones: Vec<Zone> = boxes
            .into_iter()
            .enumerate()
            .map(|(index, bbox)| Zone::candidate(index as u32 + 1, bbox))
            .collect();
        debug!("Candidate zones detected: {}", zones.len());

        let metrics =
            StageMetrics::new(ProcessingStage::CandidateDetection, raw_count, zones.len())
                .with_info("deduplicated", deduplicated_count)
                .with_info("fallback", used_fallback)
                .with_processing_time(start.elapsed());

        Ok(StageResult::new(
            CandidateSet {
                zones,
                used_fallback,
            },
            metrics,
        ))
    }

    /// Builds the closed foreground mask of the page.
    fn foreground_mask(&self, gray: &GrayImage) -> OcrResult<GrayImage> {
        let config = self.config;
        let enhanced = clahe(gray, config.clahe_clip_limit, config.clahe_grid);
        let smoothing = config.smoothing;
        let smoothed = smooth(
            &enhanced,
            smoothing.window_size,
            smoothing.sigma_color,
            smoothing.sigma_spatial,
        );

        let masks: Vec<GrayImage> = [
            config.fine_threshold,
            config.standard_threshold,
            config.large_threshold,
        ]
        .iter()
        .map(|scale| adaptive_threshold_inv(&smoothed, scale.block_size, scale.offset))
        .collect();

        let combined = combine_masks(&masks).ok_or_else(|| {
            OCRError::stage_message(
                ProcessingStage::CandidateDetection,
                "threshold masks have mismatched sizes",
            )
        })?;

        let horizontal = config.horizontal_kernel;
        let vertical = config.vertical_kernel;
        let words = close_rect(&combined, horizontal.width, horizontal.height);
        Ok(close_rect(&words, vertical.width, vertical.height))
    }

    /// Collects boxes from external contours and from dilated components.
    fn extract_boxes(&self, mask: &GrayImage) -> Vec<BoundingBox> {
        let mut boxes = external_contour_boxes(mask);
        let contour_count = boxes.len();

        let dilated = dilate_square(mask, self.config.dilation_radius);
        boxes.extend(component_boxes(&dilated));

        debug!(
            "Extracted {} contour boxes and {} component boxes",
            contour_count,
            boxes.len() - contour_count
        );
        boxes
    }

    fn accepts(&self, bbox: &BoundingBox, image_width: u32, image_height: u32) -> bool {
        let config = self.config;
        let area_ratio = bbox.area_ratio(image_width, image_height);
        let aspect_ratio = bbox.aspect_ratio();

        (config.min_area_ratio..=config.max_area_ratio).contains(&area_ratio)
            && bbox.width >= config.min_width
            && bbox.height >= config.min_height
            && (config.min_aspect_ratio..=config.max_aspect_ratio).contains(&aspect_ratio)
    }
}
