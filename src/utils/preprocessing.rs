//! Image preprocessing for model inference
//!
//! Letterboxes the image into the model's square input and undoes the same
//! transform when mapping the predicted mask back to the original pixels.

use crate::{
    error::{BgRemovalError, Result},
    models::PreprocessingConfig,
    types::SegmentationMask,
};
use image::{DynamicImage, ImageBuffer, RgbImage};
use ndarray::Array4;

/// Padding color for the letterbox canvas
const PADDING_COLOR: [u8; 3] = [255, 255, 255];

/// Scale and offsets of an aspect-preserving fit into a square canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Scale factor from original to canvas pixels
    pub scale: f32,
    /// Resized width inside the canvas
    pub scaled_width: u32,
    /// Resized height inside the canvas
    pub scaled_height: u32,
    /// Horizontal centering offset
    pub offset_x: u32,
    /// Vertical centering offset
    pub offset_y: u32,
}

impl Letterbox {
    /// Fit `(width, height)` into a `target_size` square, centered
    #[must_use]
    pub fn fit(original: (u32, u32), target_size: u32) -> Self {
        let (width, height) = original;
        let target = target_size as f32;
        let scale = (target / width.max(1) as f32).min(target / height.max(1) as f32);

        let scaled_width = ((width as f32 * scale).round() as u32).clamp(1, target_size);
        let scaled_height = ((height as f32 * scale).round() as u32).clamp(1, target_size);

        Self {
            scale,
            scaled_width,
            scaled_height,
            offset_x: (target_size - scaled_width) / 2,
            offset_y: (target_size - scaled_height) / 2,
        }
    }
}

/// Shared image preprocessing utilities
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Preprocess image for model inference
    ///
    /// This function handles:
    /// - RGB conversion
    /// - Aspect ratio preserving resize
    /// - Center padding to target size
    /// - Normalization to tensor format (NCHW)
    ///
    /// # Errors
    /// - Image has a zero dimension
    pub fn preprocess_for_inference(
        image: &DynamicImage,
        config: &PreprocessingConfig,
    ) -> Result<Array4<f32>> {
        if image.width() == 0 || image.height() == 0 {
            return Err(BgRemovalError::inference("Cannot preprocess an empty image"));
        }

        let target_size = config.target_size;
        let rgb_image = image.to_rgb8();
        let letterbox = Letterbox::fit(rgb_image.dimensions(), target_size);

        let resized = image::imageops::resize(
            &rgb_image,
            letterbox.scaled_width,
            letterbox.scaled_height,
            image::imageops::FilterType::Triangle,
        );

        let mut canvas: RgbImage =
            ImageBuffer::from_pixel(target_size, target_size, image::Rgb(PADDING_COLOR));
        image::imageops::overlay(
            &mut canvas,
            &resized,
            i64::from(letterbox.offset_x),
            i64::from(letterbox.offset_y),
        );

        Ok(Self::canvas_to_tensor(&canvas, config))
    }

    /// Convert canvas to normalized tensor
    fn canvas_to_tensor(canvas: &RgbImage, config: &PreprocessingConfig) -> Array4<f32> {
        let size = config.target_size as usize;
        let mean = config.normalization_mean;
        let std = config.normalization_std;

        Array4::from_shape_fn((1, 3, size, size), |(_, channel, y, x)| {
            let pixel = canvas.get_pixel(x as u32, y as u32);
            let (value, mean, std) = match channel {
                0 => (pixel[0], mean[0], std[0]),
                1 => (pixel[1], mean[1], std[1]),
                _ => (pixel[2], mean[2], std[2]),
            };
            (f32::from(value) / 255.0 - mean) / std
        })
    }

    /// Map a `(1, 1, H, W)` model output back onto the original image as a mask
    ///
    /// # Errors
    /// - Output tensor is not a single-channel batch of one
    pub fn tensor_to_mask(
        tensor: &Array4<f32>,
        original_dimensions: (u32, u32),
    ) -> Result<SegmentationMask> {
        let shape = tensor.shape();
        let (batch, channels, mask_height, mask_width) = match shape {
            [b, c, h, w] => (*b, *c, *h, *w),
            _ => return Err(BgRemovalError::inference("Invalid output tensor rank")),
        };
        if batch != 1 || channels != 1 || mask_height == 0 || mask_width == 0 {
            return Err(BgRemovalError::inference(format!(
                "Invalid output tensor shape {shape:?}"
            )));
        }

        let target_size = mask_width.min(mask_height) as u32;
        let letterbox = Letterbox::fit(original_dimensions, target_size);
        let (orig_width, orig_height) = original_dimensions;

        let mut data = Vec::with_capacity((orig_width as usize) * (orig_height as usize));
        for y in 0..orig_height {
            for x in 0..orig_width {
                let tensor_x = (x as f32 * letterbox.scale) as usize + letterbox.offset_x as usize;
                let tensor_y = (y as f32 * letterbox.scale) as usize + letterbox.offset_y as usize;
                let value = tensor
                    .get([0, 0, tensor_y, tensor_x])
                    .copied()
                    .unwrap_or(0.0);
                data.push((value.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }

        Ok(SegmentationMask::new(data, original_dimensions))
    }
}
