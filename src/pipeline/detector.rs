//! The zone detection entry points.
//!
//! [`ZoneDetector`] holds a validated profile and its compiled pattern
//! table, so it can be built once and reused across pages. Every run goes
//! through one top-level handler: a stage error or a panic inside a stage
//! triggers the degraded recovery, which answers with a single full-page
//! zone. Only when that also fails is the result marked unsuccessful.

use super::result::DetectionResult;
use super::stages::{
    CandidateDetector, GeometricFilter, ReadingOrderResolver, SemanticClassifier, StageMetrics,
    StageResult, Validator, ZoneMerger,
};
use super::stats::{PipelineStats, RunOutcome, StatsManager};
use crate::core::{
    ConfigValidator, OCRError, OcrResult, ProcessingStage, RECOVERY_ZONE_CONFIDENCE,
};
use crate::domain::{
    DocumentTypeProfile, PatternTable, Zone, ZoneRecognizer, ZoneType, recognize_guarded,
};
use crate::processors::BoundingBox;
use crate::utils::{load_image, rgb_to_gray};
use image::RgbImage;
use std::any::Any;
use std::borrow::Cow;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs the six stages with one profile.
#[derive(Debug)]
pub struct ZoneDetector {
    profile: DocumentTypeProfile,
    patterns: Cow<'static, PatternTable>,
    stats: StatsManager,
}

impl ZoneDetector {
    /// Validates the profile and compiles its pattern table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an invalid profile or a custom pattern that
    /// does not compile.
    pub fn new(profile: DocumentTypeProfile) -> OcrResult<Self> {
        profile.validate()?;
        let patterns = profile.classification.pattern_table()?;
        info!(
            "Zone detector ready: profile={}, pattern rules={}",
            profile.category,
            patterns.len()
        );
        Ok(Self {
            profile,
            patterns,
            stats: StatsManager::new(),
        })
    }

    pub fn profile(&self) -> &DocumentTypeProfile {
        &self.profile
    }

    /// Returns a snapshot of the run statistics.
    pub fn stats(&self) -> PipelineStats {
        self.stats.get_stats()
    }

    pub fn reset_stats(&self) {
        self.stats.reset_stats();
    }

    /// Detects and classifies the zones of one page.
    ///
    /// Never panics and never returns an error: failures are reported
    /// through [`DetectionResult::success`] and [`DetectionResult::error`].
    pub fn detect<R>(&self, image: &RgbImage, recognizer: &R) -> DetectionResult
    where
        R: ZoneRecognizer + ?Sized,
    {
        self.detect_with(image, recognizer, || self.run_stages(image, recognizer))
    }

    /// Runs `stages` under the top-level handler and records the outcome.
    fn detect_with<R, F>(&self, image: &RgbImage, recognizer: &R, stages: F) -> DetectionResult
    where
        R: ZoneRecognizer + ?Sized,
        F: FnOnce() -> OcrResult<Vec<Zone>>,
    {
        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(stages)).unwrap_or_else(|payload| {
            Err(OCRError::stage_message(
                ProcessingStage::Generic,
                format!("pipeline panicked: {}", panic_message(payload.as_ref())),
            ))
        });

        let (result, run_outcome) = match outcome {
            Ok(zones) => (DetectionResult::from_zones(&zones), RunOutcome::Success),
            Err(err) => {
                let result = recover(image, recognizer, &err);
                let run_outcome = if result.success {
                    RunOutcome::Recovered
                } else {
                    RunOutcome::Failed
                };
                (result, run_outcome)
            }
        };

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.stats.record(run_outcome, elapsed_ms);
        info!(
            "Detected {} zones in {:.2} ms ({:?})",
            result.zone_count(),
            elapsed_ms,
            run_outcome
        );
        result
    }

    /// Loads an image from disk, then runs [`detect`](Self::detect).
    ///
    /// # Errors
    ///
    /// Returns `ImageLoad` when the file cannot be read or decoded; no
    /// recovery is attempted in that case.
    pub fn detect_path<R>(&self, path: &Path, recognizer: &R) -> OcrResult<DetectionResult>
    where
        R: ZoneRecognizer + ?Sized,
    {
        let image = load_image(path)?;
        debug!(
            "Loaded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(self.detect(&image, recognizer))
    }

    /// Runs the stages in order and returns the final zones.
    pub fn run_stages<R>(&self, image: &RgbImage, recognizer: &R) -> OcrResult<Vec<Zone>>
    where
        R: ZoneRecognizer + ?Sized,
    {
        let profile = &self.profile;
        let (width, height) = image.dimensions();
        let gray = rgb_to_gray(image);

        let candidates = log_stage(CandidateDetector::new(&profile.candidates).detect(&gray)?);
        let filtered =
            log_stage(GeometricFilter::new(&profile.filter).filter(candidates, &gray)?);
        let classified = log_stage(
            SemanticClassifier::new(&profile.classification, &self.patterns, &profile.parallel)
                .classify(filtered, image, &gray, recognizer)?,
        );
        let merged = log_stage(ZoneMerger::new(&profile.merge).merge(classified));
        let ordered = log_stage(ReadingOrderResolver::default().resolve(merged));
        let validated =
            log_stage(Validator::new(&profile.validation).validate(ordered, width, height));

        Ok(validated)
    }
}

fn log_stage<T>(result: StageResult<T>) -> T {
    let (data, metrics): (T, StageMetrics) = result.into_parts();
    debug!("{}", metrics);
    data
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Builds the single full-page zone used when the pipeline fails.
///
/// The recognizer is called once on the whole page; its failures degrade to
/// empty text like everywhere else.
pub fn recovery_zone<R>(image: &RgbImage, recognizer: &R) -> OcrResult<Zone>
where
    R: ZoneRecognizer + ?Sized,
{
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(OCRError::stage_message(
            ProcessingStage::Recovery,
            format!("cannot recover zones from a {}x{} image", width, height),
        ));
    }

    let recognition = recognize_guarded(recognizer, image);
    Ok(Zone {
        zone_type: ZoneType::Unknown,
        confidence: RECOVERY_ZONE_CONFIDENCE,
        content: recognition.text.trim().to_string(),
        ocr_confidence: recognition.confidence,
        reading_order: 1,
        ..Zone::candidate(1, BoundingBox::full_image(width, height))
    })
}

fn recover<R>(image: &RgbImage, recognizer: &R, cause: &OCRError) -> DetectionResult
where
    R: ZoneRecognizer + ?Sized,
{
    warn!("Zone detection failed, recovering with a full-page zone: {}", cause);
    match recovery_zone(image, recognizer) {
        Ok(zone) => DetectionResult::from_zones(&[zone]).into_recovered(),
        Err(recovery_error) => {
            error!("Recovery failed: {}", recovery_error);
            DetectionResult::failure(format!("{}; {}", cause, recovery_error))
        }
    }
}

/// Detects and classifies the zones of `image` with `profile`.
///
/// An invalid profile is handled like any other pipeline failure: the
/// full-page recovery zone is returned.
pub fn detect_and_classify<R>(
    image: &RgbImage,
    profile: &DocumentTypeProfile,
    recognizer: &R,
) -> DetectionResult
where
    R: ZoneRecognizer + ?Sized,
{
    match ZoneDetector::new(profile.clone()) {
        Ok(detector) => detector.detect(image, recognizer),
        Err(err) => recover(image, recognizer, &err),
    }
}

/// Loads an image and runs [`detect_and_classify`].
///
/// # Errors
///
/// Returns `ImageLoad` when the file cannot be read or decoded.
pub fn detect_and_classify_path<R>(
    path: &Path,
    profile: &DocumentTypeProfile,
    recognizer: &R,
) -> OcrResult<DetectionResult>
where
    R: ZoneRecognizer + ?Sized,
{
    let image = load_image(path)?;
    Ok(detect_and_classify(&image, profile, recognizer))
}
