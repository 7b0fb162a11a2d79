//! Rectangle drawing on RGB buffers.

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// Integer pixel rectangle with inclusive corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelRect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: right.max(left),
            bottom: bottom.max(top),
        }
    }

    /// Clip to an image of the given size. `None` if nothing is left.
    pub fn clip(&self, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 || self.left >= width || self.top >= height {
            return None;
        }
        Some(Self {
            left: self.left,
            top: self.top,
            right: self.right.min(width - 1),
            bottom: self.bottom.min(height - 1),
        })
    }
}

/// Draw the outline of `rect` onto `image`, growing `thickness` pixels
/// inward from the rectangle's edges.
pub fn draw_rect_outline(image: &mut RgbImage, rect: PixelRect, color: Rgb<u8>, thickness: u32) {
    let (width, height) = image.dimensions();
    let Some(rect) = rect.clip(width, height) else {
        return;
    };

    for t in 0..thickness.max(1) {
        let top = rect.top + t;
        let bottom = rect.bottom.saturating_sub(t);
        let left = rect.left + t;
        let right = rect.right.saturating_sub(t);

        if top > bottom || left > right {
            break;
        }

        for x in left..=right {
            image.put_pixel(x, top, color);
            image.put_pixel(x, bottom, color);
        }
        for y in top..=bottom {
            image.put_pixel(left, y, color);
            image.put_pixel(right, y, color);
        }
    }
}
