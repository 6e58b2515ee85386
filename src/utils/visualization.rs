//! Visualization and export of detection results.
//!
//! This module writes what a caller usually keeps from a run: one cropped
//! image per zone, an annotated overview of the page, and a metadata JSON
//! file with the full [`DetectionResult`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use oar_zones::utils::visualization::{VisualizationConfig, export_zones};
//! // let result = detect_and_classify(&image, &profile, &recognizer);
//! // let config = VisualizationConfig::with_system_font();
//! // export_zones(&image, &result, "invoice", "scan", output_dir, &config)?;
//! ```

use crate::core::{EXPORT_CROP_MARGIN, OCRError, OcrResult, ProcessingStage};
use crate::pipeline::{DetectionResult, ZoneRecord};
use crate::processors::BoundingBox;
use crate::utils::crop_with_margin;

use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Colors cycled through by zone id.
pub const ZONE_PALETTE: [Rgb<u8>; 8] = [
    Rgb([220, 40, 40]),
    Rgb([40, 160, 40]),
    Rgb([40, 80, 220]),
    Rgb([230, 180, 0]),
    Rgb([200, 0, 200]),
    Rgb([0, 170, 190]),
    Rgb([240, 120, 0]),
    Rgb([120, 60, 180]),
];

const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const LABEL_PADDING: i32 = 4;

/// Configuration for the annotated overview.
pub struct VisualizationConfig {
    /// The font used for zone labels. If None, labels are skipped.
    pub font: Option<FontVec>,

    /// The scale factor for the font. Defaults to 16.0.
    pub font_scale: f32,

    /// The thickness of zone outlines. Defaults to 2.
    pub bbox_thickness: u32,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            font: None,
            font_scale: 16.0,
            bbox_thickness: 2,
        }
    }
}

impl VisualizationConfig {
    /// Creates a VisualizationConfig with a font loaded from the specified path.
    pub fn with_font_path(font_path: &Path) -> OcrResult<Self> {
        let font_data = std::fs::read(font_path)?;
        let font = FontVec::try_from_vec(font_data).map_err(|_| {
            OCRError::invalid_input(format!(
                "Failed to parse font file: {}",
                font_path.display()
            ))
        })?;

        Ok(Self {
            font: Some(font),
            ..Self::default()
        })
    }

    /// Creates a VisualizationConfig with a system font.
    ///
    /// This function attempts to load a system font from common locations.
    /// If no system font is found, it falls back to the default configuration.
    pub fn with_system_font() -> Self {
        let font_paths = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/System/Library/Fonts/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ];

        for path in &font_paths {
            if let Ok(font_data) = std::fs::read(path)
                && let Ok(font) = FontVec::try_from_vec(font_data)
            {
                info!("Loaded system font: {}", path);
                return Self {
                    font: Some(font),
                    ..Self::default()
                };
            }
        }

        debug!("No system font found, zone labels will be skipped");
        Self::default()
    }
}

/// Outline color of a zone.
pub fn zone_color(zone_id: u32) -> Rgb<u8> {
    ZONE_PALETTE[zone_id as usize % ZONE_PALETTE.len()]
}

/// Overview label of a zone, e.g. `"1: header"`.
pub fn zone_label(record: &ZoneRecord) -> String {
    format!("{}: {}", record.reading_order, record.zone_type)
}

/// File name of a zone crop, e.g. `scan_intelligent_zone_03_price.png`.
pub fn zone_crop_filename(basename: &str, record: &ZoneRecord) -> String {
    format!(
        "{}_intelligent_zone_{:02}_{}.png",
        basename, record.zone_id, record.zone_type
    )
}

/// Draws every zone outline and label on a copy of the page.
pub fn create_zone_overview(
    image: &RgbImage,
    result: &DetectionResult,
    config: &VisualizationConfig,
) -> RgbImage {
    let mut overview = image.clone();
    for record in &result.zones {
        let color = zone_color(record.zone_id);
        draw_zone_outline(&mut overview, &record.bbox, color, config.bbox_thickness);
        if let Some(font) = &config.font {
            draw_zone_label(&mut overview, record, color, font, config.font_scale);
        }
    }
    overview
}

fn draw_zone_outline(img: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>, thickness: u32) {
    for inset in 0..thickness {
        if bbox.width <= 2 * inset || bbox.height <= 2 * inset {
            break;
        }
        let rect = Rect::at((bbox.x + inset) as i32, (bbox.y + inset) as i32)
            .of_size(bbox.width - 2 * inset, bbox.height - 2 * inset);
        draw_hollow_rect_mut(img, rect, color);
    }
}

/// Draws the label on a filled box just above the zone, or inside its top
/// edge when there is no room above.
fn draw_zone_label(
    img: &mut RgbImage,
    record: &ZoneRecord,
    color: Rgb<u8>,
    font: &FontVec,
    scale: f32,
) {
    let text = zone_label(record);
    let text_width = measure_text_width(&text, font, scale);
    let box_width = (text_width as i32 + 2 * LABEL_PADDING).max(1) as u32;
    let box_height = (scale as i32 + LABEL_PADDING).max(1) as u32;

    let x = record.bbox.x as i32;
    let above = record.bbox.y as i32 - box_height as i32;
    let y = if above >= 0 { above } else { record.bbox.y as i32 };

    draw_filled_rect_mut(img, Rect::at(x, y).of_size(box_width, box_height), color);
    draw_text_mut(
        img,
        LABEL_TEXT_COLOR,
        x + LABEL_PADDING,
        y + LABEL_PADDING / 2,
        scale,
        font,
        &text,
    );
}

/// Measures the width of text when rendered with a specific font and scale.
fn measure_text_width(text: &str, font: &FontVec, scale: f32) -> f32 {
    use ab_glyph::{Font, ScaleFont};

    let scaled_font = font.as_scaled(scale);
    text.chars()
        .map(|ch| scaled_font.h_advance(scaled_font.scaled_glyph(ch).id))
        .sum()
}

/// Files written by [`export_zones`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFiles {
    pub crops: Vec<PathBuf>,
    pub overview: PathBuf,
    pub metadata: PathBuf,
}

#[derive(Serialize)]
struct ExportedZone<'a> {
    #[serde(flatten)]
    record: &'a ZoneRecord,
    filename: String,
}

#[derive(Serialize)]
struct ExportMetadata<'a> {
    document_type: &'a str,
    success: bool,
    zones: Vec<ExportedZone<'a>>,
    reading_order: &'a [u32],
    zone_type_counts: &'a BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    recovered: bool,
    annotated_image: String,
}

fn save_failure(path: &Path, err: image::ImageError) -> OCRError {
    OCRError::stage_failure(
        ProcessingStage::Generic,
        format!("failed to save {}", path.display()),
        err,
    )
}

/// Writes zone crops, the annotated overview and the metadata JSON.
///
/// Files are named after `basename` inside `output_dir`, which is created
/// when missing. Crops include a margin of
/// [`EXPORT_CROP_MARGIN`](crate::core::EXPORT_CROP_MARGIN) pixels.
pub fn export_zones(
    image: &RgbImage,
    result: &DetectionResult,
    document_type: &str,
    basename: &str,
    output_dir: &Path,
    config: &VisualizationConfig,
) -> OcrResult<ExportedFiles> {
    std::fs::create_dir_all(output_dir)?;

    let mut crops = Vec::with_capacity(result.zones.len());
    let mut zones = Vec::with_capacity(result.zones.len());
    for record in &result.zones {
        let filename = zone_crop_filename(basename, record);
        let path = output_dir.join(&filename);
        let crop = crop_with_margin(image, &record.bbox, EXPORT_CROP_MARGIN)?;
        crop.save(&path).map_err(|e| save_failure(&path, e))?;
        debug!("Saved zone {} to {}", record.zone_id, path.display());
        crops.push(path);
        zones.push(ExportedZone { record, filename });
    }

    let overview_name = format!("{}_intelligent_annotated.png", basename);
    let overview = output_dir.join(&overview_name);
    create_zone_overview(image, result, config)
        .save(&overview)
        .map_err(|e| save_failure(&overview, e))?;

    let metadata_doc = ExportMetadata {
        document_type,
        success: result.success,
        zones,
        reading_order: &result.reading_order,
        zone_type_counts: &result.zone_type_counts,
        error: result.error.as_deref(),
        recovered: result.recovered,
        annotated_image: overview_name,
    };
    let metadata = output_dir.join(format!("{}_intelligent_metadata.json", basename));
    std::fs::write(&metadata, serde_json::to_string_pretty(&metadata_doc)?)?;

    info!(
        "Exported {} zones to {}",
        crops.len(),
        output_dir.display()
    );
    Ok(ExportedFiles {
        crops,
        overview,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Zone, ZoneType};

    fn sample_result() -> DetectionResult {
        let header = Zone {
            zone_type: ZoneType::Header,
            content: "FACTURE".to_string(),
            confidence: 0.9,
            reading_order: 1,
            ..Zone::candidate(3, BoundingBox::new(10, 10, 60, 20))
        };
        let price = Zone {
            zone_type: ZoneType::Price,
            content: "12,00 €".to_string(),
            confidence: 0.8,
            reading_order: 2,
            ..Zone::candidate(12, BoundingBox::new(50, 60, 40, 15))
        };
        DetectionResult::from_zones(&[header, price])
    }

    #[test]
    fn test_names_and_labels() {
        let result = sample_result();
        assert_eq!(zone_label(&result.zones[1]), "2: price");
        assert_eq!(
            zone_crop_filename("scan", &result.zones[0]),
            "scan_intelligent_zone_03_header.png"
        );
        assert_eq!(
            zone_crop_filename("scan", &result.zones[1]),
            "scan_intelligent_zone_12_price.png"
        );
        assert_eq!(zone_color(3), zone_color(11));
    }

    #[test]
    fn test_overview_draws_outlines() {
        let image = RgbImage::from_pixel(120, 100, Rgb([255, 255, 255]));
        let result = sample_result();
        let overview = create_zone_overview(&image, &result, &VisualizationConfig::default());

        assert_eq!(overview.dimensions(), image.dimensions());
        assert_eq!(overview.get_pixel(10, 10), &zone_color(3));
        assert_eq!(overview.get_pixel(11, 11), &zone_color(3));
        assert_eq!(overview.get_pixel(30, 20), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_export_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbImage::from_pixel(120, 100, Rgb([255, 255, 255]));
        let result = sample_result();

        let files = export_zones(
            &image,
            &result,
            "invoice",
            "scan",
            dir.path(),
            &VisualizationConfig::default(),
        )
        .unwrap();

        assert_eq!(files.crops.len(), 2);
        assert!(files.crops.iter().all(|path| path.exists()));
        assert!(files.overview.ends_with("scan_intelligent_annotated.png"));
        assert!(files.overview.exists());

        let crop = image::open(&files.crops[0]).unwrap();
        assert_eq!((crop.width(), crop.height()), (80, 40));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&files.metadata).unwrap()).unwrap();
        assert_eq!(json["document_type"], "invoice");
        assert_eq!(json["zones"][0]["filename"], "scan_intelligent_zone_03_header.png");
        assert_eq!(json["zones"][1]["type"], "price");
        assert_eq!(json["reading_order"], serde_json::json!([3, 12]));
    }
}
