//! Fast image decoding.
//!
//! Uses zune-jpeg for JPEG files (1.5-2x faster than image crate),
//! falls back to image crate for anything zune cannot handle.

use crate::error::DecodeError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decodes image files using the fastest available decoder
pub struct FastDecoder;

impl FastDecoder {
    /// Decode an image from a file path.
    ///
    /// - JPEG: zune-jpeg, falling back to the image crate on failure
    /// - Other formats: image crate
    pub fn decode(path: &Path) -> Result<DynamicImage, DecodeError> {
        if is_jpeg(path) {
            Self::decode_jpeg(path).or_else(|_| Self::decode_fallback(path))
        } else {
            Self::decode_fallback(path)
        }
    }

    /// Decode and convert to 8-bit RGB, the layout both models consume
    pub fn decode_rgb(path: &Path) -> Result<image::RgbImage, DecodeError> {
        Self::decode(path).map(|image| image.to_rgb8())
    }

    fn decode_jpeg(path: &Path) -> Result<DynamicImage, DecodeError> {
        let file_bytes = fs::read(path).map_err(|e| DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(&file_bytes, options);

        let pixels = decoder.decode().map_err(|e| DecodeError {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| DecodeError {
            path: path.to_path_buf(),
            reason: "Failed to get image info".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;
        let buffer_error = |kind: &str| DecodeError {
            path: path.to_path_buf(),
            reason: format!("Failed to create {} buffer", kind),
        };

        let image = match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => {
                let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| buffer_error("RGB"))?;
                DynamicImage::ImageRgb8(buffer)
            }
            ColorSpace::RGBA => {
                let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| buffer_error("RGBA"))?;
                DynamicImage::ImageRgba8(buffer)
            }
            ColorSpace::Luma => {
                let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| buffer_error("Luma"))?;
                DynamicImage::ImageLuma8(buffer)
            }
            _ => return Self::decode_fallback(path),
        };

        Ok(image)
    }

    fn decode_fallback(path: &Path) -> Result<DynamicImage, DecodeError> {
        image::open(path).map_err(|e| DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

fn is_jpeg(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref(),
        Some("jpg" | "jpeg")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use tempfile::TempDir;

    #[test]
    fn jpeg_detection_ignores_case() {
        assert!(is_jpeg(Path::new("photo.JPG")));
        assert!(is_jpeg(Path::new("photo.jpeg")));
        assert!(!is_jpeg(Path::new("photo.png")));
    }

    #[test]
    fn decodes_jpeg_written_by_image_crate() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("solid.jpg");
        RgbImage::from_pixel(32, 16, Rgb([200, 40, 40])).save(&path).unwrap();

        let decoded = FastDecoder::decode_rgb(&path).unwrap();

        assert_eq!(decoded.dimensions(), (32, 16));
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_panic() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("corrupt.jpg");
        fs::write(&path, b"this is not a valid image file").unwrap();

        let error = FastDecoder::decode(&path).unwrap_err();

        assert_eq!(error.path, path);
    }
}
