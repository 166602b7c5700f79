//! Output format handling service
//!
//! Format-specific pixel conversions that run before encoding, kept apart
//! from the encoders themselves.

use crate::config::OutputFormat;
use image::{DynamicImage, Rgb, RgbImage};

/// Canvas color used when a format cannot carry transparency
pub const FLATTEN_BACKGROUND: [u8; 3] = [255, 255, 255];

/// Service for handling output format conversions
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Check if a format supports transparency (alpha channel)
    ///
    /// # Examples
    /// ```rust
    /// use bgremove_api::{config::OutputFormat, services::OutputFormatHandler};
    ///
    /// assert!(OutputFormatHandler::supports_transparency(OutputFormat::Png));
    /// assert!(!OutputFormatHandler::supports_transparency(OutputFormat::Jpeg));
    /// ```
    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        match format {
            OutputFormat::Png | OutputFormat::WebP => true,
            OutputFormat::Jpeg => false,
        }
    }

    /// Whether the encoder honors a quality setting
    #[must_use]
    pub fn uses_quality(format: OutputFormat) -> bool {
        match format {
            OutputFormat::Jpeg | OutputFormat::WebP => true,
            OutputFormat::Png => false,
        }
    }

    /// Composite an image onto an opaque canvas, using its alpha as the blend mask.
    ///
    /// Images without an alpha channel are only converted to RGB.
    #[must_use]
    pub fn flatten_alpha(image: &DynamicImage, background: [u8; 3]) -> RgbImage {
        if !image.color().has_alpha() {
            return image.to_rgb8();
        }

        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut output = RgbImage::new(width, height);

        for (src, dst) in rgba.pixels().zip(output.pixels_mut()) {
            let alpha = u16::from(src[3]);
            let inv_alpha = 255 - alpha;
            let blend = |fg: u8, bg: u8| -> u8 {
                ((u16::from(fg) * alpha + u16::from(bg) * inv_alpha + 127) / 255) as u8
            };
            *dst = Rgb([
                blend(src[0], background[0]),
                blend(src[1], background[1]),
                blend(src[2], background[2]),
            ]);
        }

        output
    }
}
