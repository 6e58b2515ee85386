//! Image processing utilities for zone detection.
//!
//! This module provides the low-level building blocks the pipeline stages are
//! assembled from.
//!
//! # Modules
//!
//! * `binarization` - Local adaptive and global Otsu thresholding
//! * `enhance` - Contrast-limited histogram equalization and smoothing
//! * `geometry` - Axis-aligned bounding boxes and overlap computations
//! * `morphology` - Rectangular closing, dilation and erosion
//! * `region_stats` - Intensity statistics, contours and connected components

pub mod binarization;
pub mod enhance;
mod geometry;
pub mod morphology;
pub mod region_stats;

pub use binarization::{adaptive_threshold_inv, combine_masks, foreground_density, otsu_binarize};
pub use enhance::{clahe, smooth};
pub use geometry::*;
pub use morphology::{close_rect, dilate_rect, dilate_square, erode_rect};
pub use region_stats::{
    IntensityStats, component_boxes, component_count, external_contour_boxes, intensity_stats,
};
