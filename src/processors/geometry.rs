//! Geometric utilities for zone processing.
//!
//! This module provides the axis-aligned bounding box used by every pipeline
//! stage, together with the overlap, enclosure and distance computations the
//! detector and merger rely on.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X-coordinate of the left edge.
    pub x: u32,
    /// Y-coordinate of the top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Creates a new bounding box from its top-left corner and size.
    #[inline]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a bounding box from exclusive corner coordinates.
    ///
    /// # Arguments
    ///
    /// * `x1` - The x-coordinate of the top-left corner.
    /// * `y1` - The y-coordinate of the top-left corner.
    /// * `x2` - The x-coordinate one past the right edge.
    /// * `y2` - The y-coordinate one past the bottom edge.
    ///
    /// Swapped corners are normalized.
    pub fn from_corners(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        let (left, right) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (top, bottom) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self::new(left, top, right - left, bottom - top)
    }

    /// Creates a box covering a whole image.
    pub fn full_image(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Exclusive right edge.
    #[inline]
    pub fn x_max(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn y_max(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Area in pixels.
    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns true if the box has a zero dimension.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Box area divided by the area of an image of the given size.
    ///
    /// Returns 0.0 for an empty image.
    pub fn area_ratio(&self, image_width: u32, image_height: u32) -> f32 {
        let image_area = image_width as u64 * image_height as u64;
        if image_area == 0 {
            return 0.0;
        }
        (self.area() as f64 / image_area as f64) as f32
    }

    /// Width divided by height, or 0.0 when the height is zero.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Center point of the box.
    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Euclidean distance between the centers of two boxes.
    pub fn center_distance(&self, other: &BoundingBox) -> f32 {
        let (cx1, cy1) = self.center();
        let (cx2, cy2) = other.center();
        ((cx1 - cx2).powi(2) + (cy1 - cy2).powi(2)).sqrt()
    }

    /// Average of the two boxes' `width + height`, halved: `((w1+h1)+(w2+h2))/4`.
    pub fn average_size(&self, other: &BoundingBox) -> f32 {
        ((self.width + self.height) as f32 + (other.width + other.height) as f32) / 4.0
    }

    /// Area of the intersection of two boxes.
    pub fn intersection_area(&self, other: &BoundingBox) -> u64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.x_max().min(other.x_max());
        let bottom = self.y_max().min(other.y_max());

        if right <= left || bottom <= top {
            return 0;
        }
        (right - left) as u64 * (bottom - top) as u64
    }

    /// Intersection area over the area of the smaller box.
    ///
    /// Returns 0.0 when either box is empty.
    pub fn overlap_ratio(&self, other: &BoundingBox) -> f32 {
        let smaller = self.area().min(other.area());
        if smaller == 0 {
            return 0.0;
        }
        (self.intersection_area(other) as f64 / smaller as f64) as f32
    }

    /// Minimal rectangle enclosing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::from_corners(
            self.x.min(other.x),
            self.y.min(other.y),
            self.x_max().max(other.x_max()),
            self.y_max().max(other.y_max()),
        )
    }

    /// Minimal rectangle enclosing every box, or `None` for an empty iterator.
    pub fn enclosing<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes
            .into_iter()
            .copied()
            .reduce(|acc, bbox| acc.union(&bbox))
    }

    /// Grows the box by `margin` on every side, clamped to the image.
    pub fn expand(&self, margin: u32, image_width: u32, image_height: u32) -> BoundingBox {
        let left = self.x.saturating_sub(margin);
        let top = self.y.saturating_sub(margin);
        let right = self.x_max().saturating_add(margin).min(image_width);
        let bottom = self.y_max().saturating_add(margin).min(image_height);
        BoundingBox::from_corners(left, top, right.max(left), bottom.max(top))
    }

    /// Returns true if the box is non-empty and lies fully inside the image.
    pub fn is_within(&self, image_width: u32, image_height: u32) -> bool {
        !self.is_empty() && self.x_max() <= image_width && self.y_max() <= image_height
    }
}

/// Fuses boxes that overlap by more than `threshold` (intersection over smaller area).
///
/// Each incoming box is compared against the boxes kept so far; a duplicate
/// widens the kept box to the enclosing rectangle instead of being added.
/// A widened box then absorbs every other kept box it now overlaps, so no
/// two boxes of the output overlap by more than `threshold`.
/// Output order follows the first occurrence of each kept box.
pub fn merge_duplicate_boxes(boxes: Vec<BoundingBox>, threshold: f32) -> Vec<BoundingBox> {
    let mut kept: Vec<BoundingBox> = Vec::with_capacity(boxes.len());

    for bbox in boxes {
        match kept
            .iter()
            .position(|existing| existing.overlap_ratio(&bbox) > threshold)
        {
            Some(index) => {
                kept[index] = kept[index].union(&bbox);
                absorb_overlapping(&mut kept, index, threshold);
            }
            None => kept.push(bbox),
        }
    }

    kept
}

/// Folds into `kept[index]` every other box it overlaps, until none is left.
fn absorb_overlapping(kept: &mut Vec<BoundingBox>, mut index: usize, threshold: f32) {
    while let Some(other) = (0..kept.len())
        .find(|&j| j != index && kept[index].overlap_ratio(&kept[j]) > threshold)
    {
        let (keep, drop) = (index.min(other), index.max(other));
        let absorbed = kept.remove(drop);
        kept[keep] = kept[keep].union(&absorbed);
        index = keep;
    }
}
