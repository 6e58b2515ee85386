//! Geometric noise filtering.
//!
//! Removes candidates whose pixels cannot plausibly hold text: page-sized
//! boxes, near-empty or near-solid regions, and uniform fills. Zones are only
//! dropped here, never modified.

use super::candidate_detection::CandidateSet;
use super::types::{StageMetrics, StageResult};
use crate::core::{OCRError, OcrResult, ProcessingStage};
use crate::domain::{GeometricFilterConfig, Zone};
use crate::processors::{foreground_density, intensity_stats, otsu_binarize};
use crate::utils::crop_gray;
use image::GrayImage;
use std::time::Instant;
use tracing::{debug, trace};

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooLarge,
    Density,
    Uniform,
}

/// Filters candidates on pixel statistics.
#[derive(Debug)]
pub struct GeometricFilter<'a> {
    config: &'a GeometricFilterConfig,
}

impl<'a> GeometricFilter<'a> {
    pub fn new(config: &'a GeometricFilterConfig) -> Self {
        Self { config }
    }

    /// Keeps the candidates that may contain text, in their original order.
    ///
    /// A set holding only the detector's full-page fallback box is passed
    /// through unchanged.
    pub fn filter(
        &self,
        candidates: CandidateSet,
        gray: &GrayImage,
    ) -> OcrResult<StageResult<Vec<Zone>>> {
        let start = Instant::now();
        let input_count = candidates.zones.len();

        if candidates.used_fallback {
            debug!("Keeping the full-page fallback candidate");
            let metrics =
                StageMetrics::new(ProcessingStage::GeometricFiltering, input_count, input_count)
                    .with_info("fallback", true)
                    .with_processing_time(start.elapsed());
            return Ok(StageResult::new(candidates.zones, metrics));
        }

        let mut kept = Vec::with_capacity(input_count);
        let (mut too_large, mut density, mut uniform) = (0usize, 0usize, 0usize);
        for zone in candidates.zones {
            match self.check(&zone, gray)? {
                None => kept.push(zone),
                Some(reason) => {
                    trace!("Rejected zone {} ({:?})", zone.id, reason);
                    match reason {
                        Rejection::TooLarge => too_large += 1,
                        Rejection::Density => density += 1,
                        Rejection::Uniform => uniform += 1,
                    }
                }
            }
        }
        debug!("Zones after geometric filtering: {}", kept.len());

        let metrics =
            StageMetrics::new(ProcessingStage::GeometricFiltering, input_count, kept.len())
                .with_info("too_large", too_large)
                .with_info("density", density)
                .with_info("uniform", uniform)
                .with_processing_time(start.elapsed());
        Ok(StageResult::new(kept, metrics))
    }

    /// Returns the rejection reason for a zone, or `None` if it is kept.
    pub fn check(&self, zone: &Zone, gray: &GrayImage) -> OcrResult<Option<Rejection>> {
        let (width, height) = gray.dimensions();
        if zone.bbox.area_ratio(width, height) > self.config.max_area_ratio {
            return Ok(Some(Rejection::TooLarge));
        }

        let region = crop_gray(gray, &zone.bbox).map_err(|e| {
            OCRError::stage_failure(
                ProcessingStage::GeometricFiltering,
                format!("cannot crop zone {}", zone.id),
                e,
            )
        })?;

        let (binary, _) = otsu_binarize(&region);
        let density = foreground_density(&binary);
        if density < self.config.min_density || density > self.config.max_density {
            return Ok(Some(Rejection::Density));
        }

        if intensity_stats(&region).std_dev < self.config.min_std_dev {
            return Ok(Some(Rejection::Uniform));
        }

        Ok(None)
    }
}
