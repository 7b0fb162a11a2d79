//! # Imaging Module
//!
//! Pixel-level helpers shared by the detector, the encoder and the
//! annotator: decoding, resizing and rectangle drawing.

mod decode;
mod draw;
mod resize;

pub use decode::FastDecoder;
pub use draw::{draw_rect_outline, PixelRect};
pub use resize::FastResizer;

use image::RgbImage;

/// Per-channel values in R, G, B order
pub type ChannelStats = [f32; 3];

/// Lay an RGB image out as a `[1, 3, H, W]` float tensor.
///
/// Each channel is scaled to `[0, 1]`, then `(v - mean) / std` is applied.
/// Pass zero means and unit stds for plain `[0, 1]` scaling.
pub fn to_nchw(image: &RgbImage, mean: ChannelStats, std: ChannelStats) -> (Vec<usize>, Vec<f32>) {
    let (width, height) = image.dimensions();
    let plane = (width * height) as usize;
    let mut data = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in image.enumerate_pixels() {
        let idx = (y * width + x) as usize;
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            data[c * plane + idx] = (value - mean[c]) / std[c];
        }
    }

    (vec![1, 3, height as usize, width as usize], data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn nchw_layout_is_planar() {
        let mut image = RgbImage::from_pixel(2, 1, Rgb([0, 0, 0]));
        image.put_pixel(1, 0, Rgb([255, 0, 51]));

        let (shape, data) = to_nchw(&image, [0.0; 3], [1.0; 3]);

        assert_eq!(shape, vec![1, 3, 1, 2]);
        assert_eq!(data, vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.2]);
    }

    #[test]
    fn normalization_is_applied_per_channel() {
        let image = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));

        let (_, data) = to_nchw(&image, [0.5, 0.0, 1.0], [0.5, 1.0, 2.0]);

        assert_eq!(data, vec![1.0, 1.0, 0.0]);
    }
}
