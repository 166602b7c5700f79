//! Image decoding and encoding service
//!
//! Turns uploaded bytes into a `DynamicImage` and a processed image back
//! into PNG, JPEG or WebP bytes.

use crate::{
    config::OutputFormat,
    error::{BgRemovalError, Result},
    services::format::{OutputFormatHandler, FLATTEN_BACKGROUND},
};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageFormat};
use std::io::Cursor;

/// Largest edge the WebP encoder accepts
const WEBP_MAX_DIMENSION: u32 = 16383;

/// Encoded image bytes together with their format
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

impl EncodedImage {
    /// MIME type for the `Content-Type` header
    #[must_use]
    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }
}

/// Service for decoding uploads and encoding results
pub struct ImageIOService;

impl ImageIOService {
    /// Decode an in-memory image container.
    ///
    /// The result is normalized to RGB8 or RGBA8 depending on whether the
    /// source carries an alpha channel.
    ///
    /// # Errors
    /// - Buffer is empty or not a recognized image container
    /// - Container is truncated or corrupt
    ///
    /// # Examples
    /// ```rust,no_run
    /// use bgremove_api::services::ImageIOService;
    ///
    /// # fn example(upload: &[u8]) -> bgremove_api::Result<()> {
    /// let image = ImageIOService::decode(upload)?;
    /// println!("{}x{}", image.width(), image.height());
    /// # Ok(())
    /// # }
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(BgRemovalError::decode("empty image buffer"));
        }

        let image = image::load_from_memory(bytes)
            .map_err(|e| BgRemovalError::decode(e.to_string()))?;

        tracing::debug!(
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            "Decoded uploaded image"
        );

        Ok(if image.color().has_alpha() {
            DynamicImage::ImageRgba8(image.into_rgba8())
        } else {
            DynamicImage::ImageRgb8(image.into_rgb8())
        })
    }

    /// Encode an image in the given format.
    ///
    /// `quality` is used by JPEG and WebP only. JPEG output is flattened onto
    /// a white canvas when the image carries alpha.
    ///
    /// # Errors
    /// - Encoder failure
    /// - Image too large for the WebP encoder
    pub fn encode(image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<EncodedImage> {
        let quality = quality.clamp(1, 100);
        let bytes = match format {
            OutputFormat::Png => Self::encode_png(image)?,
            OutputFormat::Jpeg => Self::encode_jpeg(image, quality)?,
            OutputFormat::WebP => Self::encode_webp(image, quality)?,
        };

        tracing::debug!(
            format = %format,
            quality = ?OutputFormatHandler::uses_quality(format).then_some(quality),
            keeps_alpha = OutputFormatHandler::supports_transparency(format),
            size_bytes = bytes.len(),
            "Encoded processed image"
        );

        Ok(EncodedImage { bytes, format })
    }

    /// Encode using a caller-supplied format string, falling back to PNG for
    /// anything unrecognized
    ///
    /// # Errors
    /// - Same as [`ImageIOService::encode`]
    pub fn encode_requested(image: &DynamicImage, format: &str, quality: u8) -> Result<EncodedImage> {
        if !OutputFormat::is_recognized(format) {
            tracing::debug!(requested = format, "Unrecognized output format, using PNG");
        }
        Self::encode(image, OutputFormat::from_request(format), quality)
    }

    fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| BgRemovalError::encode(format!("PNG: {e}")))?;
        Ok(buffer)
    }

    fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
        let rgb = OutputFormatHandler::flatten_alpha(image, FLATTEN_BACKGROUND);
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, quality)
            .encode_image(&rgb)
            .map_err(|e| BgRemovalError::encode(format!("JPEG: {e}")))?;
        Ok(buffer)
    }

    fn encode_webp(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
        let (width, height) = (image.width(), image.height());
        if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
            return Err(BgRemovalError::encode(format!(
                "WebP: {width}x{height} exceeds the {WEBP_MAX_DIMENSION}px limit"
            )));
        }

        let rgba = image.to_rgba8();
        let encoded = webp::Encoder::from_rgba(rgba.as_raw(), width, height)
            .encode_simple(false, f32::from(quality))
            .map_err(|e| BgRemovalError::encode(format!("WebP: {e:?}")))?;
        Ok(encoded.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    /// Left half transparent, right half opaque blue
    fn half_transparent(width: u32, height: u32) -> DynamicImage {
        let image = RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([20, 40, 220, 255])
            }
        });
        DynamicImage::ImageRgba8(image)
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            ImageIOService::decode(b""),
            Err(BgRemovalError::Decode(_))
        ));
        assert!(matches!(
            ImageIOService::decode(b"definitely not an image"),
            Err(BgRemovalError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_normalizes_color() {
        let png = ImageIOService::encode(&half_transparent(4, 4), OutputFormat::Png, 95).unwrap();
        let decoded = ImageIOService::decode(&png.bytes).unwrap();
        assert!(matches!(decoded, DynamicImage::ImageRgba8(_)));

        let jpeg = ImageIOService::encode(&half_transparent(4, 4), OutputFormat::Jpeg, 95).unwrap();
        let decoded = ImageIOService::decode(&jpeg.bytes).unwrap();
        assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_round_trip_preserves_dimensions() {
        let image = half_transparent(37, 21);
        for format in [OutputFormat::Png, OutputFormat::Jpeg, OutputFormat::WebP] {
            let encoded = ImageIOService::encode(&image, format, 90).unwrap();
            assert_eq!(encoded.format, format);
            let decoded = ImageIOService::decode(&encoded.bytes).unwrap();
            assert_eq!(decoded.dimensions(), (37, 21), "format {format}");
        }
    }

    #[test]
    fn test_png_keeps_alpha_exactly() {
        let image = half_transparent(8, 8);
        let encoded = ImageIOService::encode(&image, OutputFormat::Png, 10).unwrap();
        assert_eq!(encoded.media_type(), "image/png");

        let decoded = ImageIOService::decode(&encoded.bytes).unwrap().to_rgba8();
        assert_eq!(decoded, image.to_rgba8());
    }

    #[test]
    fn test_jpeg_flattens_transparency_to_white() {
        let encoded =
            ImageIOService::encode(&half_transparent(32, 32), OutputFormat::Jpeg, 95).unwrap();
        assert_eq!(encoded.media_type(), "image/jpeg");

        let decoded = ImageIOService::decode(&encoded.bytes).unwrap();
        assert!(!decoded.color().has_alpha());

        let rgb = decoded.to_rgb8();
        // Sample away from the seam to stay clear of block artifacts
        let background = rgb.get_pixel(3, 16);
        assert!(background.0.iter().all(|channel| *channel >= 245), "{background:?}");
        let foreground = rgb.get_pixel(28, 16);
        assert!(foreground[2] > 180 && foreground[0] < 60, "{foreground:?}");
    }

    #[test]
    fn test_webp_keeps_alpha() {
        let encoded =
            ImageIOService::encode(&half_transparent(32, 32), OutputFormat::WebP, 80).unwrap();
        assert_eq!(encoded.media_type(), "image/webp");
        assert_eq!(encoded.bytes.get(0..4), Some(&b"RIFF"[..]));

        let decoded = ImageIOService::decode(&encoded.bytes).unwrap();
        assert!(decoded.color().has_alpha());
        let rgba = decoded.to_rgba8();
        assert!(rgba.get_pixel(2, 16)[3] < 16);
        assert!(rgba.get_pixel(30, 16)[3] > 240);
    }

    #[test]
    fn test_unrecognized_format_encodes_png() {
        let encoded =
            ImageIOService::encode_requested(&half_transparent(4, 4), "bmp", 95).unwrap();
        assert_eq!(encoded.format, OutputFormat::Png);
        assert_eq!(
            image::guess_format(&encoded.bytes).unwrap(),
            ImageFormat::Png
        );

        let encoded =
            ImageIOService::encode_requested(&half_transparent(4, 4), "JPG", 95).unwrap();
        assert_eq!(encoded.format, OutputFormat::Jpeg);
    }
}
