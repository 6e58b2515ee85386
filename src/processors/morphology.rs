//! Morphology with rectangular structuring elements.
//!
//! A rectangle is separable, so dilation and erosion run as one horizontal
//! and one vertical max/min pass. That costs `w + h` reads per pixel where
//! `imageproc::morphology::grayscale_dilate` with a full rectangular `Mask`
//! costs `w * h`, which matters for the wide word-bridging kernels.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

#[derive(Clone, Copy)]
enum Extremum {
    Max,
    Min,
}

impl Extremum {
    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Extremum::Max => a.max(b),
            Extremum::Min => a.min(b),
        }
    }

    fn identity(self) -> u8 {
        match self {
            Extremum::Max => u8::MIN,
            Extremum::Min => u8::MAX,
        }
    }
}

/// Applies a 1-D window along x (`horizontal == true`) or y.
///
/// The window covers `size` pixels with the anchor at its center; pixels
/// outside the image do not participate. Dilation walks the reflected window
/// so that closing with an even-sized kernel stays anchored.
fn line_pass(image: &GrayImage, size: u32, horizontal: bool, op: Extremum) -> GrayImage {
    let (width, height) = image.dimensions();
    if size <= 1 || width == 0 || height == 0 {
        return image.clone();
    }

    let (before, after) = match op {
        Extremum::Min => ((size - 1) / 2, size / 2),
        Extremum::Max => (size / 2, (size - 1) / 2),
    };
    let mut output = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let (start, end) = if horizontal {
                (x.saturating_sub(before), (x + after).min(width - 1))
            } else {
                (y.saturating_sub(before), (y + after).min(height - 1))
            };

            let mut value = op.identity();
            for i in start..=end {
                let pixel = if horizontal {
                    image.get_pixel(i, y)[0]
                } else {
                    image.get_pixel(x, i)[0]
                };
                value = op.pick(value, pixel);
            }
            output.put_pixel(x, y, Luma([value]));
        }
    }

    output
}

/// Dilation with a `kernel_width x kernel_height` rectangle.
pub fn dilate_rect(image: &GrayImage, kernel_width: u32, kernel_height: u32) -> GrayImage {
    let horizontal = line_pass(image, kernel_width, true, Extremum::Max);
    line_pass(&horizontal, kernel_height, false, Extremum::Max)
}

/// Erosion with a `kernel_width x kernel_height` rectangle.
pub fn erode_rect(image: &GrayImage, kernel_width: u32, kernel_height: u32) -> GrayImage {
    let horizontal = line_pass(image, kernel_width, true, Extremum::Min);
    line_pass(&horizontal, kernel_height, false, Extremum::Min)
}

/// Morphological closing (dilation followed by erosion) with a rectangle.
pub fn close_rect(image: &GrayImage, kernel_width: u32, kernel_height: u32) -> GrayImage {
    let dilated = dilate_rect(image, kernel_width, kernel_height);
    erode_rect(&dilated, kernel_width, kernel_height)
}

/// Square dilation with Chebyshev radius `k`.
pub fn dilate_square(image: &GrayImage, k: u8) -> GrayImage {
    morphology::dilate(image, Norm::LInf, k)
}
