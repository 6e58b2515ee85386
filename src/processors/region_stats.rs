//! Pixel statistics and component extraction for image regions.

use crate::processors::geometry::BoundingBox;
use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::region_labelling::{Connectivity, connected_components};

/// Mean and population standard deviation of pixel intensities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityStats {
    pub mean: f32,
    pub std_dev: f32,
}

/// Computes intensity mean and standard deviation.
///
/// Returns zeros for an empty image.
pub fn intensity_stats(image: &GrayImage) -> IntensityStats {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return IntensityStats {
            mean: 0.0,
            std_dev: 0.0,
        };
    }

    let (sum, sum_sq) = image.pixels().fold((0f64, 0f64), |(s, sq), p| {
        let v = p[0] as f64;
        (s + v, sq + v * v)
    });
    let mean = sum / count as f64;
    let variance = (sum_sq / count as f64 - mean * mean).max(0.0);

    IntensityStats {
        mean: mean as f32,
        std_dev: variance.sqrt() as f32,
    }
}

/// Bounding boxes of the outermost contours of a binary mask.
///
/// Only outer borders without a parent are kept, mirroring an external-only
/// contour retrieval.
pub fn external_contour_boxes(mask: &GrayImage) -> Vec<BoundingBox> {
    find_contours::<u32>(mask)
        .into_iter()
        .filter(|contour| {
            matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none()
        })
        .filter_map(|contour| {
            let (min_x, min_y, max_x, max_y) = contour.points.iter().fold(
                (u32::MAX, u32::MAX, 0u32, 0u32),
                |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
            );
            (min_x <= max_x).then(|| BoundingBox::from_corners(min_x, min_y, max_x + 1, max_y + 1))
        })
        .collect()
}

/// Bounding boxes of 8-connected foreground components, ordered by label.
pub fn component_boxes(mask: &GrayImage) -> Vec<BoundingBox> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    // (min_x, min_y, max_x, max_y) per label; label 0 is background.
    let mut extents: Vec<Option<(u32, u32, u32, u32)>> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 {
            continue;
        }
        if extents.len() < label {
            extents.resize(label, None);
        }
        let entry = &mut extents[label - 1];
        *entry = Some(match *entry {
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            None => (x, y, x, y),
        });
    }

    extents
        .into_iter()
        .flatten()
        .map(|(x0, y0, x1, y1)| BoundingBox::from_corners(x0, y0, x1 + 1, y1 + 1))
        .collect()
}

/// Number of 8-connected foreground components in a mask.
pub fn component_count(mask: &GrayImage) -> u32 {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));
    labels.pixels().map(|p| p[0]).max().unwrap_or(0)
}
