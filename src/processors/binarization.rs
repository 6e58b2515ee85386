//! Binarization helpers.
//!
//! Foreground pixels are always 255 and background pixels 0 in the masks
//! produced here, so the results can be fed straight into contour tracing
//! and connected component labelling.

use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

/// Summed-area table over a grayscale image, padded with a zero row and column.
struct IntegralImage {
    stride: usize,
    sums: Vec<u64>,
}

impl IntegralImage {
    fn new(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let stride = width as usize + 1;
        let mut sums = vec![0u64; stride * (height as usize + 1)];

        for y in 0..height as usize {
            let mut row_sum = 0u64;
            for x in 0..width as usize {
                row_sum += image.get_pixel(x as u32, y as u32)[0] as u64;
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
            }
        }

        Self { stride, sums }
    }

    /// Sum over the half-open rectangle `[x0, x1) x [y0, y1)`.
    fn sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> u64 {
        let s = self.stride;
        self.sums[y1 * s + x1] + self.sums[y0 * s + x0]
            - self.sums[y0 * s + x1]
            - self.sums[y1 * s + x0]
    }
}

/// Inverted local-mean thresholding.
///
/// A pixel becomes foreground when it is at least `offset` darker than the mean
/// of its `block_size x block_size` neighborhood, so dark glyphs on a light page
/// come out white.
pub fn adaptive_threshold_inv(image: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut output = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return output;
    }

    let integral = IntegralImage::new(image);
    let radius = (block_size / 2) as usize;

    for y in 0..height as usize {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(height as usize);
        for x in 0..width as usize {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius + 1).min(width as usize);

            let count = ((x1 - x0) * (y1 - y0)) as f32;
            let mean = integral.sum(x0, y0, x1, y1) as f32 / count;
            let value = image.get_pixel(x as u32, y as u32)[0] as f32;

            if value <= mean - offset {
                output.put_pixel(x as u32, y as u32, Luma([FOREGROUND]));
            }
        }
    }

    output
}

/// Global Otsu binarization. Returns the mask and the chosen level.
///
/// Pixels strictly above the level are foreground.
pub fn otsu_binarize(image: &GrayImage) -> (GrayImage, u8) {
    let level = otsu_level(image);
    let mut output = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[0] > level {
            output.put_pixel(x, y, Luma([FOREGROUND]));
        }
    }
    (output, level)
}

/// Pixel-wise logical OR of equally sized masks.
///
/// Returns `None` for an empty slice or mismatched dimensions.
pub fn combine_masks(masks: &[GrayImage]) -> Option<GrayImage> {
    let first = masks.first()?;
    let dimensions = first.dimensions();
    if masks.iter().any(|mask| mask.dimensions() != dimensions) {
        return None;
    }

    let mut combined = first.clone();
    for mask in &masks[1..] {
        for (out, pixel) in combined.pixels_mut().zip(mask.pixels()) {
            if pixel[0] != BACKGROUND {
                out[0] = FOREGROUND;
            }
        }
    }
    Some(combined)
}

/// Fraction of non-zero pixels in a mask.
pub fn foreground_density(mask: &GrayImage) -> f32 {
    let total = mask.width() as u64 * mask.height() as u64;
    if total == 0 {
        return 0.0;
    }
    let foreground = mask.pixels().filter(|p| p[0] != BACKGROUND).count() as u64;
    (foreground as f64 / total as f64) as f32
}
