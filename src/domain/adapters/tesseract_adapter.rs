//! Tesseract Recognition Adapter
//!
//! Implements [`ZoneRecognizer`] by piping each region, PNG encoded, through
//! the `tesseract` command line tool.

use crate::core::{OCRError, OcrResult};
use crate::domain::recognizer::{Recognition, ZoneRecognizer};
use crate::processors::intensity_stats;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use imageproc::contrast::equalize_histogram;
use std::io::{self, Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Crops with a lower intensity standard deviation are equalized first.
const LOW_CONTRAST_STD_DEV: f32 = 30.0;

/// Share of special characters above which the score is reduced.
const SPECIAL_CHAR_RATIO: f32 = 0.3;

/// Characters that do not count as special symbols.
const PLAIN_PUNCTUATION: &str = " .,;:!?()-";

/// Recognizer backed by the `tesseract` executable.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    /// Executable to run.
    binary: PathBuf,
    /// Language models, `+`-separated.
    languages: String,
    /// Page segmentation mode.
    psm: u8,
    /// Overrides `TESSDATA_PREFIX` when set.
    tessdata_dir: Option<PathBuf>,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            languages: "fra+eng".to_string(),
            psm: 6,
            tessdata_dir: None,
        }
    }
}

impl TesseractRecognizer {
    /// Creates a recognizer for French and English with a uniform block layout.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_languages(mut self, languages: impl Into<String>) -> Self {
        self.languages = languages.into();
        self
    }

    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = psm;
        self
    }

    pub fn with_tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata_dir = Some(dir.into());
        self
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }

    fn encode_png(region: &RgbImage) -> OcrResult<Vec<u8>> {
        let prepared = prepare_region(region);
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(prepared)
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| OCRError::recognition_failure("failed to encode region", e))?;
        Ok(buffer.into_inner())
    }

    fn run(&self, png: &[u8]) -> OcrResult<String> {
        let mut command = Command::new(&self.binary);
        command
            .args(["stdin", "stdout", "-l", &self.languages, "--psm"])
            .arg(self.psm.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.tessdata_dir {
            command.env("TESSDATA_PREFIX", dir);
        }

        let mut child = command.spawn().map_err(|e| {
            OCRError::recognition_failure(
                format!("failed to start {}", self.binary.display()),
                e,
            )
        })?;

        // stdin is written while stdout and stderr are being drained.
        let stdin = child.stdin.take();
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || -> io::Result<()> {
                if let Some(mut stdin) = stdin {
                    stdin.write_all(png)?;
                }
                Ok(())
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("region writer panicked")));
            (written, output)
        });
        let output =
            output.map_err(|e| OCRError::recognition_failure("tesseract did not finish", e))?;

        if !output.status.success() {
            return Err(OCRError::recognition_message(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        written.map_err(|e| OCRError::recognition_failure("failed to write region", e))?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ZoneRecognizer for TesseractRecognizer {
    fn recognize(&self, region: &RgbImage) -> OcrResult<Recognition> {
        if region.width() == 0 || region.height() == 0 {
            return Ok(Recognition::empty());
        }

        let png = Self::encode_png(region)?;
        let raw = self.run(&png)?;
        let text = raw.trim().to_string();
        let confidence = estimate_confidence(&text);
        debug!(
            "tesseract recognized {} chars (confidence {:.0})",
            text.chars().count(),
            confidence
        );

        Ok(Recognition::new(text, confidence))
    }
}

/// Converts to grayscale and equalizes low-contrast crops.
fn prepare_region(region: &RgbImage) -> GrayImage {
    let gray = DynamicImage::ImageRgb8(region.clone()).into_luma8();
    if intensity_stats(&gray).std_dev < LOW_CONTRAST_STD_DEV {
        equalize_histogram(&gray)
    } else {
        gray
    }
}

/// Heuristic score for engines that do not report one.
///
/// Longer text scores higher; text dominated by symbols is penalized.
pub fn estimate_confidence(text: &str) -> f32 {
    let trimmed = text.trim();
    let length = trimmed.chars().count();
    if length == 0 {
        return 0.0;
    }

    let base: f32 = if length > 10 {
        85.0
    } else if length > 5 {
        80.0
    } else {
        70.0
    };

    let special = trimmed
        .chars()
        .filter(|c| !c.is_alphanumeric() && !PLAIN_PUNCTUATION.contains(*c))
        .count();
    if special as f32 / length as f32 > SPECIAL_CHAR_RATIO {
        base * 0.8
    } else {
        base
    }
}
