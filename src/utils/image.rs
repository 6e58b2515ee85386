//! Utility functions for image handling.
//!
//! This module provides functions for loading document images, converting
//! between pixel formats, and cropping zones out of a page with bounds checks.

use crate::core::{ImageProcessError, OCRError};
use crate::processors::BoundingBox;
use image::{DynamicImage, GrayImage, RgbImage, imageops};

/// Converts a DynamicImage to an RgbImage.
///
/// # Arguments
///
/// * `img` - The DynamicImage to convert
///
/// # Returns
///
/// * `RgbImage` - The converted RGB image
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Converts an RgbImage to an 8-bit grayscale image using Rec. 709 luma weights.
pub fn rgb_to_gray(img: &RgbImage) -> GrayImage {
    imageops::grayscale(img)
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Arguments
///
/// * `path` - A reference to the path of the image file to load
///
/// # Returns
///
/// * `Ok(RgbImage)` - The loaded and converted RGB image
/// * `Err(OCRError)` - An error if the image could not be loaded or converted
///
/// # Errors
///
/// This function will return an `OCRError::ImageLoad` error if the file is
/// missing, unreadable, or not a supported image format.
pub fn load_image(path: &std::path::Path) -> Result<RgbImage, OCRError> {
    let img = image::open(path).map_err(OCRError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

fn check_crop(
    bbox: &BoundingBox,
    image_width: u32,
    image_height: u32,
) -> Result<(), ImageProcessError> {
    if bbox.is_empty() {
        return Err(ImageProcessError::InvalidCropSize);
    }
    if !bbox.is_within(image_width, image_height) {
        return Err(ImageProcessError::CropOutOfBounds {
            x: bbox.x,
            y: bbox.y,
            width: bbox.width,
            height: bbox.height,
            image_width,
            image_height,
        });
    }
    Ok(())
}

/// Copies a region out of an RGB image.
///
/// # Errors
///
/// Fails with `InvalidCropSize` for an empty box and `CropOutOfBounds` when the
/// box extends past the image.
pub fn crop_rgb(image: &RgbImage, bbox: &BoundingBox) -> Result<RgbImage, ImageProcessError> {
    check_crop(bbox, image.width(), image.height())?;
    Ok(imageops::crop_imm(image, bbox.x, bbox.y, bbox.width, bbox.height).to_image())
}

/// Copies a region out of a grayscale image. Same rules as [`crop_rgb`].
pub fn crop_gray(image: &GrayImage, bbox: &BoundingBox) -> Result<GrayImage, ImageProcessError> {
    check_crop(bbox, image.width(), image.height())?;
    Ok(imageops::crop_imm(image, bbox.x, bbox.y, bbox.width, bbox.height).to_image())
}

/// Crops a box grown by `margin` pixels on each side, clamped to the image.
pub fn crop_with_margin(
    image: &RgbImage,
    bbox: &BoundingBox,
    margin: u32,
) -> Result<RgbImage, ImageProcessError> {
    let expanded = bbox.expand(margin, image.width(), image.height());
    crop_rgb(image, &expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_crop_rgb_in_bounds() {
        let mut image = RgbImage::new(20, 10);
        image.put_pixel(5, 5, Rgb([9, 9, 9]));
        let crop = crop_rgb(&image, &BoundingBox::new(5, 5, 3, 2)).unwrap();
        assert_eq!(crop.dimensions(), (3, 2));
        assert_eq!(crop.get_pixel(0, 0), &Rgb([9, 9, 9]));
    }

    #[test]
    fn test_crop_rejects_bad_boxes() {
        let image = GrayImage::new(20, 10);
        assert!(matches!(
            crop_gray(&image, &BoundingBox::new(0, 0, 0, 5)),
            Err(ImageProcessError::InvalidCropSize)
        ));
        assert!(matches!(
            crop_gray(&image, &BoundingBox::new(15, 0, 10, 5)),
            Err(ImageProcessError::CropOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_crop_with_margin_is_clamped() {
        let image = RgbImage::new(20, 10);
        let crop = crop_with_margin(&image, &BoundingBox::new(1, 1, 4, 4), 5).unwrap();
        assert_eq!(crop.dimensions(), (10, 10));
    }

    #[test]
    fn test_load_missing_image_is_image_load_error() {
        let err = load_image(std::path::Path::new("/nonexistent/page.png")).unwrap_err();
        assert!(matches!(err, OCRError::ImageLoad(_)));
    }

    #[test]
    fn test_rgb_to_gray_keeps_neutral_values() {
        let image = RgbImage::from_pixel(2, 2, Rgb([200, 200, 200]));
        assert_eq!(rgb_to_gray(&image).get_pixel(1, 1)[0], 200);
    }
}
