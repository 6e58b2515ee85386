//! Contrast normalization and smoothing applied before candidate detection.

use image::{GrayImage, Luma};
use imageproc::filter::bilateral_filter;

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `grid x grid` lattice of tiles. Each tile gets its
/// own clipped equalization table, and every output pixel is bilinearly
/// interpolated between the tables of the four nearest tile centers.
///
/// # Arguments
///
/// * `image` - The grayscale input image.
/// * `clip_limit` - Histogram clip limit, as a multiple of the mean bin height.
/// * `grid` - Number of tiles along each axis.
pub fn clahe(image: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let grid = grid.max(1);
    let tile_w = width.div_ceil(grid).max(1);
    let tile_h = height.div_ceil(grid).max(1);
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[image.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            luts.push(tile_lut(&mut hist, (x1 - x0) * (y1 - y0), clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    let mut output = GrayImage::new(width, height);
    for y in 0..height {
        let (ty0, ty1, wy) = interpolation_cell(y, tile_h, tiles_y);
        for x in 0..width {
            let (tx0, tx1, wx) = interpolation_cell(x, tile_w, tiles_x);
            let value = image.get_pixel(x, y)[0] as usize;

            let top = lut_at(tx0, ty0)[value] as f32 * (1.0 - wx)
                + lut_at(tx1, ty0)[value] as f32 * wx;
            let bottom = lut_at(tx0, ty1)[value] as f32 * (1.0 - wx)
                + lut_at(tx1, ty1)[value] as f32 * wx;
            let mapped = top * (1.0 - wy) + bottom * wy;

            output.put_pixel(x, y, Luma([mapped.round().clamp(0.0, 255.0) as u8]));
        }
    }

    output
}

/// Builds the clipped equalization table for one tile.
fn tile_lut(hist: &mut [u32; 256], pixels: u32, clip_limit: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    if pixels == 0 {
        for (value, entry) in lut.iter_mut().enumerate() {
            *entry = value as u8;
        }
        return lut;
    }

    let clip = ((clip_limit * pixels as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }

    let share = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, bin) in hist.iter_mut().enumerate() {
        *bin += share + u32::from(i < remainder);
    }

    let mut cumulative = 0u64;
    for (value, entry) in lut.iter_mut().enumerate() {
        cumulative += hist[value] as u64;
        *entry = ((cumulative * 255) as f64 / pixels as f64).round().min(255.0) as u8;
    }
    lut
}

/// Returns the two neighboring tile indices along one axis and the weight of the second.
fn interpolation_cell(coord: u32, tile_size: u32, tiles: u32) -> (u32, u32, f32) {
    let position = (coord as f32 + 0.5) / tile_size as f32 - 0.5;
    let last = tiles.saturating_sub(1);
    let first = (position.floor().max(0.0) as u32).min(last);
    let second = (first + 1).min(last);
    let weight = if second == first {
        0.0
    } else {
        (position - first as f32).clamp(0.0, 1.0)
    };
    (first, second, weight)
}

/// Edge-preserving smoothing that removes scan noise without blurring glyph edges.
///
/// Bilateral filter over a `window_size` square; neighbors far from the
/// center intensity get almost no weight. A window of 1 or less is a no-op.
pub fn smooth(
    image: &GrayImage,
    window_size: u32,
    sigma_color: f32,
    sigma_spatial: f32,
) -> GrayImage {
    if window_size <= 1 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    bilateral_filter(image, window_size, sigma_color, sigma_spatial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clahe_keeps_uniform_image_uniform() {
        let image = GrayImage::from_pixel(64, 48, Luma([255]));
        let enhanced = clahe(&image, 3.0, 8);
        let first = enhanced.get_pixel(0, 0)[0];
        assert!(enhanced.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn test_clahe_stretches_low_contrast() {
        let mut image = GrayImage::from_pixel(32, 32, Luma([100]));
        for x in 0..32 {
            for y in 0..16 {
                image.put_pixel(x, y, Luma([150]));
            }
        }
        let enhanced = clahe(&image, 40.0, 1);
        let dark = enhanced.get_pixel(16, 28)[0] as i32;
        let bright = enhanced.get_pixel(16, 3)[0] as i32;
        assert!(bright - dark > 50);
    }

    #[test]
    fn test_clahe_tiny_image() {
        let image = GrayImage::from_pixel(3, 2, Luma([10]));
        let enhanced = clahe(&image, 3.0, 8);
        assert_eq!(enhanced.dimensions(), (3, 2));
    }

    #[test]
    fn test_smooth_flattens_faint_noise() {
        let mut image = GrayImage::from_pixel(9, 9, Luma([100]));
        image.put_pixel(4, 4, Luma([110]));
        let smoothed = smooth(&image, 5, 50.0, 50.0);
        assert!(smoothed.get_pixel(4, 4)[0] <= 102);
        assert_eq!(smoothed.get_pixel(0, 0)[0], 100);
    }

    #[test]
    fn test_smooth_keeps_glyph_edges() {
        let mut image = GrayImage::from_pixel(16, 8, Luma([230]));
        for x in 0..8 {
            for y in 0..8 {
                image.put_pixel(x, y, Luma([20]));
            }
        }
        let smoothed = smooth(&image, 5, 50.0, 50.0);
        for y in 0..8 {
            assert!(smoothed.get_pixel(7, y)[0] <= 22);
            assert!(smoothed.get_pixel(8, y)[0] >= 228);
        }
    }

    #[test]
    fn test_smooth_disabled_window() {
        let mut image = GrayImage::from_pixel(5, 5, Luma([90]));
        image.put_pixel(2, 2, Luma([0]));
        assert_eq!(smooth(&image, 1, 50.0, 50.0), image);
        assert_eq!(smooth(&GrayImage::new(0, 0), 5, 50.0, 50.0).dimensions(), (0, 0));
    }
}
