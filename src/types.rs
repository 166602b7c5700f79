//! Image types flowing between the codec and the providers

use crate::error::{BgRemovalError, Result};
use image::{DynamicImage, GrayImage, RgbaImage};

/// Foreground mask, one byte per pixel: 0 = background, 255 = foreground
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationMask {
    /// Mask data as grayscale values (0-255), row-major
    pub data: Vec<u8>,

    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl SegmentationMask {
    /// Create a new segmentation mask
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Create mask from a grayscale image
    #[must_use]
    pub fn from_image(image: GrayImage) -> Self {
        let dimensions = image.dimensions();
        Self::new(image.into_raw(), dimensions)
    }

    /// Convert mask to a grayscale image
    ///
    /// # Errors
    /// - Data length does not match the dimensions
    pub fn to_image(&self) -> Result<GrayImage> {
        let (width, height) = self.dimensions;
        GrayImage::from_raw(width, height, self.data.clone()).ok_or_else(|| {
            BgRemovalError::internal(format!(
                "Mask data ({} bytes) does not match {width}x{height}",
                self.data.len()
            ))
        })
    }

    /// Resize the mask to new dimensions
    ///
    /// # Errors
    /// - Data length does not match the current dimensions
    pub fn resize(&self, new_width: u32, new_height: u32) -> Result<Self> {
        if self.dimensions == (new_width, new_height) {
            return Ok(self.clone());
        }
        let resized = image::imageops::resize(
            &self.to_image()?,
            new_width,
            new_height,
            image::imageops::FilterType::Triangle,
        );
        Ok(Self::from_image(resized))
    }
}

/// A decoded image whose alpha channel carries the foreground mask
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    image: RgbaImage,
}

impl ProcessedImage {
    /// Install `mask` as the alpha channel of `image`; color values are untouched.
    ///
    /// # Errors
    /// - Mask and image dimensions differ
    pub fn from_mask(image: &DynamicImage, mask: &SegmentationMask) -> Result<Self> {
        let mut rgba = image.to_rgba8();
        if rgba.dimensions() != mask.dimensions {
            return Err(BgRemovalError::internal(format!(
                "Mask {:?} does not match image {:?}",
                mask.dimensions,
                rgba.dimensions()
            )));
        }

        for (pixel, alpha) in rgba.pixels_mut().zip(mask.data.iter().copied()) {
            pixel[3] = alpha;
        }

        Ok(Self { image: rgba })
    }

    /// Wrap an RGBA buffer that already carries the mask in its alpha channel
    #[must_use]
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Image dimensions (width, height)
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Borrow the RGBA pixels
    #[must_use]
    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    /// Extract the alpha channel as a mask
    #[must_use]
    pub fn mask(&self) -> SegmentationMask {
        let data = self.image.pixels().map(|pixel| pixel[3]).collect();
        SegmentationMask::new(data, self.image.dimensions())
    }

    #[must_use]
    pub fn into_dynamic(self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_from_mask_sets_alpha_only() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 1, Rgb([10, 20, 30])));
        let mask = SegmentationMask::new(vec![0, 255], (2, 1));

        let processed = ProcessedImage::from_mask(&image, &mask).unwrap();
        let rgba = processed.as_rgba();
        assert_eq!(rgba.get_pixel(0, 0).0, [10, 20, 30, 0]);
        assert_eq!(rgba.get_pixel(1, 0).0, [10, 20, 30, 255]);
        assert_eq!(processed.mask(), mask);
    }

    #[test]
    fn test_from_mask_dimension_mismatch() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let mask = SegmentationMask::new(vec![0; 4], (2, 2));
        assert!(ProcessedImage::from_mask(&image, &mask).is_err());
    }

    #[test]
    fn test_mask_resize() {
        let mask = SegmentationMask::new(vec![255; 4], (2, 2));
        let resized = mask.resize(8, 6).unwrap();
        assert_eq!(resized.dimensions, (8, 6));
        assert_eq!(resized.data.len(), 48);
        assert!(resized.data.iter().all(|value| *value == 255));

        let broken = SegmentationMask::new(vec![0; 3], (2, 2));
        assert!(broken.to_image().is_err());
    }
}
