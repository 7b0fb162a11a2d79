//! Detection data types.

use crate::core::imaging::PixelRect;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Axis-aligned box in source-image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    /// Create a box from two corners, in any order
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x_min: x1.min(x2),
            y_min: y1.min(y2),
            x_max: x1.max(x2),
            y_max: y1.max(y2),
        }
    }

    /// Create a box from its center and size
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(
            cx - width / 2.0,
            cy - height / 2.0,
            cx + width / 2.0,
            cy + height / 2.0,
        )
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Intersection over union in `[0, 1]`
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix = (self.x_max.min(other.x_max) - self.x_min.max(other.x_min)).max(0.0);
        let iy = (self.y_max.min(other.y_max) - self.y_min.max(other.y_min)).max(0.0);
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;

        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }

    /// Smallest box covering both boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Smallest box covering every box in `boxes`, `None` when empty
    pub fn enclosing<'a>(boxes: impl IntoIterator<Item = &'a BoundingBox>) -> Option<BoundingBox> {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BoundingBox>, b| {
                Some(acc.map_or(*b, |a| a.union(b)))
            })
    }

    /// Restrict the box to `[0, width] x [0, height]`
    pub fn clamp(&self, width: f32, height: f32) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min.clamp(0.0, width),
            y_min: self.y_min.clamp(0.0, height),
            x_max: self.x_max.clamp(0.0, width),
            y_max: self.y_max.clamp(0.0, height),
        }
    }

    /// Integer pixel corners, truncating toward zero
    pub fn to_pixel_rect(&self) -> PixelRect {
        PixelRect::new(
            self.x_min.max(0.0) as u32,
            self.y_min.max(0.0) as u32,
            self.x_max.max(0.0) as u32,
            self.y_max.max(0.0) as u32,
        )
    }
}

/// One labeled object found in one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class name, used as the entity key
    pub label: String,
    /// Index into the detector's class list
    pub class_id: usize,
    /// Detector confidence in `[0, 1]`
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// All detections for one successfully processed image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub image: PathBuf,
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    /// Distinct labels in order of first appearance
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for detection in &self.detections {
            if !labels.contains(&detection.label.as_str()) {
                labels.push(&detection.label);
            }
        }
        labels
    }
}
