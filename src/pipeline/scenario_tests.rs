//! End-to-end checks of the detection pipeline on synthetic pages.

use super::{DetectionResult, ZoneDetector, detect_and_classify};
use crate::core::{OcrResult, ParallelPolicy};
use crate::domain::{DocumentCategory, DocumentTypeProfile, Recognition};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// White page with dark glyph-sized blocks laid out as text lines.
fn synthetic_page(width: u32, height: u32, lines: &[(i32, i32, u32)]) -> RgbImage {
    let mut page = RgbImage::from_pixel(width, height, Rgb([250, 250, 250]));
    for &(x, y, glyphs) in lines {
        for g in 0..glyphs {
            let rect = Rect::at(x + g as i32 * 10, y).of_size(7, 14);
            draw_filled_rect_mut(&mut page, rect, Rgb([25, 25, 25]));
        }
    }
    page
}

fn invoice_page() -> RgbImage {
    synthetic_page(
        600,
        400,
        &[(60, 20, 40), (40, 120, 25), (40, 180, 30), (380, 260, 12), (40, 340, 20)],
    )
}

fn by_width(region: &RgbImage) -> OcrResult<Recognition> {
    let text = if region.width() > 250 {
        "Conditions de paiement a reception"
    } else {
        "Total 123,45 €"
    };
    Ok(Recognition::new(text, 75.0))
}

fn assert_result_invariants(result: &DetectionResult, image: &RgbImage, floor: f32) {
    assert!(result.success);
    for zone in &result.zones {
        let bbox = zone.bbox;
        assert!(bbox.width > 0 && bbox.height > 0);
        assert!(bbox.x + bbox.width <= image.width());
        assert!(bbox.y + bbox.height <= image.height());
        assert!(
            (floor..=1.0).contains(&zone.confidence),
            "confidence {} out of range",
            zone.confidence
        );
        assert!((0.0..=100.0).contains(&zone.ocr_confidence));
    }

    let mut positions: Vec<u32> = result.zones.iter().map(|z| z.reading_order).collect();
    positions.sort_unstable();
    let expected: Vec<u32> = (1..=result.zones.len() as u32).collect();
    assert_eq!(positions, expected);

    let ids: Vec<u32> = result.zones.iter().map(|z| z.zone_id).collect();
    assert_eq!(result.reading_order, ids);
    let counted: usize = result.zone_type_counts.values().sum();
    assert_eq!(counted, result.zones.len());
}

#[test]
fn test_blank_page_yields_one_ordered_zone() {
    let image = RgbImage::from_pixel(320, 240, Rgb([255, 255, 255]));
    let silent = |_: &RgbImage| -> OcrResult<Recognition> { Ok(Recognition::empty()) };

    let result = detect_and_classify(&image, &DocumentTypeProfile::default(), &silent);
    assert_eq!(result.zones.len(), 1);
    assert_eq!(result.zones[0].reading_order, 1);
    assert!(!result.recovered);
}

#[test]
fn test_invoice_heading_wins_over_position() {
    let image = synthetic_page(500, 300, &[(100, 10, 30)]);
    let heading = |_: &RgbImage| -> OcrResult<Recognition> {
        Ok(Recognition::new("FACTURE N° 2024-01", 88.0))
    };

    let result = detect_and_classify(&image, &DocumentTypeProfile::default(), &heading);
    assert!(result.success);
    assert!(result.zones.iter().all(|zone| zone.zone_type == "header"));
    assert!(result.zones[0].content.starts_with("FACTURE N° 2024-01"));
}

#[test]
fn test_results_respect_invariants() {
    let image = invoice_page();
    for category in DocumentCategory::ALL {
        let profile = DocumentTypeProfile::for_category(category);
        let floor = profile.classification.confidence_floor;
        let result = detect_and_classify(&image, &profile, &by_width);
        assert_result_invariants(&result, &image, floor);
    }
}

#[test]
fn test_detection_is_deterministic() {
    let image = invoice_page();
    let detector = ZoneDetector::new(DocumentTypeProfile::default()).unwrap();

    let first = detector.detect(&image, &by_width);
    let second = detector.detect(&image, &by_width);
    assert!(!first.zones.is_empty());
    assert_eq!(first, second);
    assert_eq!(detector.stats().successful_runs, 2);
}

#[test]
fn test_parallel_recognition_matches_sequential() {
    let image = invoice_page();
    let sequential =
        DocumentTypeProfile::default().with_parallel_policy(ParallelPolicy::sequential());
    let parallel = DocumentTypeProfile::default().with_parallel_policy(
        ParallelPolicy::new()
            .with_zone_threshold(0)
            .with_max_threads(Some(3)),
    );

    let expected = detect_and_classify(&image, &sequential, &by_width);
    let actual = detect_and_classify(&image, &parallel, &by_width);
    assert_eq!(expected, actual);
}

#[test]
fn test_failing_recognizer_still_returns_zones() {
    let image = invoice_page();
    let broken = |_: &RgbImage| -> OcrResult<Recognition> {
        Err(crate::core::OCRError::recognition_message("engine offline"))
    };

    let result = detect_and_classify(&image, &DocumentTypeProfile::default(), &broken);
    assert!(result.success);
    assert!(!result.recovered);
    assert_eq!(result.zones.len(), 1);
    assert_eq!(result.zones[0].reading_order, 1);
}
