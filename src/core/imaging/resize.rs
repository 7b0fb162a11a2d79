//! Fast SIMD-accelerated image resizing.
//!
//! Uses fast_image_resize, which picks AVX2/NEON code paths when
//! available. Both models take fixed-size RGB input, so every photo
//! goes through here before inference.

use fast_image_resize::{images::Image, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{ImageBuffer, RgbImage};

/// Reusable RGB resizer
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    /// Create a new fast resizer
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Resize an RGB image to exactly `width` x `height` (aspect ratio is
    /// not preserved). Returns `None` for zero-sized source or target.
    pub fn resize_rgb(&mut self, image: &RgbImage, width: u32, height: u32) -> Option<RgbImage> {
        let (src_width, src_height) = image.dimensions();
        if src_width == 0 || src_height == 0 || width == 0 || height == 0 {
            return None;
        }

        if (src_width, src_height) == (width, height) {
            return Some(image.clone());
        }

        let src_image =
            Image::from_vec_u8(src_width, src_height, image.as_raw().clone(), PixelType::U8x3)
                .ok()?;
        let mut dst_image = Image::new(width, height, PixelType::U8x3);

        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
            fast_image_resize::FilterType::Bilinear,
        ));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .ok()?;

        ImageBuffer::from_raw(width, height, dst_image.into_vec())
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ])
        })
    }

    #[test]
    fn resize_produces_requested_dimensions() {
        let mut resizer = FastResizer::new();
        let resized = resizer.resize_rgb(&gradient(300, 200), 224, 224).unwrap();

        assert_eq!(resized.dimensions(), (224, 224));
    }

    #[test]
    fn solid_colour_survives_resizing() {
        let mut resizer = FastResizer::new();
        let solid = RgbImage::from_pixel(50, 80, Rgb([10, 20, 30]));

        let resized = resizer.resize_rgb(&solid, 16, 16).unwrap();

        for pixel in resized.pixels() {
            for (actual, expected) in pixel.0.iter().zip([10u8, 20, 30]) {
                assert!(actual.abs_diff(expected) <= 1);
            }
        }
    }

    #[test]
    fn zero_sized_target_is_rejected() {
        let mut resizer = FastResizer::new();
        assert!(resizer.resize_rgb(&gradient(10, 10), 0, 10).is_none());
    }
}
