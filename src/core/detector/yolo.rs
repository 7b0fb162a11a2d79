//! YOLOv8 object detector running on ONNX Runtime.

use super::labels::coco_labels;
use super::nms::non_max_suppression;
use super::{BoundingBox, Detection, ObjectDetector};
use crate::core::imaging::{to_nchw, FastDecoder, FastResizer};
use crate::core::runtime;
use crate::error::{DetectError, ModelError};
use image::{Rgb, RgbImage};
use ort::session::Session;
use ort::value::Tensor;
use std::path::{Path, PathBuf};

/// Grey used for letterbox padding
const PAD_VALUE: u8 = 114;

/// Configuration for the YOLO detector
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Square input size the model was exported with
    pub input_size: u32,
    /// Minimum class score to keep a box
    pub confidence_threshold: f32,
    /// Boxes of one class overlapping more than this are suppressed
    pub iou_threshold: f32,
    /// Upper bound on detections per image
    pub max_detections: usize,
    /// Class names indexed by class id
    pub labels: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input_size: 640,
            confidence_threshold: 0.5,
            iou_threshold: 0.7,
            max_detections: 300,
            labels: coco_labels(),
        }
    }
}

impl DetectorConfig {
    fn label_for(&self, class_id: usize) -> String {
        self.labels
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }
}

/// How a source image was fitted into the square model input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub source_width: u32,
    pub source_height: u32,
}

impl Letterbox {
    /// Fit `width` x `height` inside a `size` square, keeping aspect ratio
    pub fn fit(width: u32, height: u32, size: u32) -> Self {
        let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
        let scaled_width = ((width as f32 * scale).round() as u32).clamp(1, size);
        let scaled_height = ((height as f32 * scale).round() as u32).clamp(1, size);

        Self {
            scale,
            pad_x: ((size - scaled_width) / 2) as f32,
            pad_y: ((size - scaled_height) / 2) as f32,
            source_width: width,
            source_height: height,
        }
    }

    fn scaled_size(&self) -> (u32, u32) {
        (
            (self.source_width as f32 * self.scale).round().max(1.0) as u32,
            (self.source_height as f32 * self.scale).round().max(1.0) as u32,
        )
    }

    /// Map a box from model-input space back to the source image
    pub fn to_source(&self, bbox: BoundingBox) -> BoundingBox {
        BoundingBox::new(
            (bbox.x_min - self.pad_x) / self.scale,
            (bbox.y_min - self.pad_y) / self.scale,
            (bbox.x_max - self.pad_x) / self.scale,
            (bbox.y_max - self.pad_y) / self.scale,
        )
        .clamp(self.source_width as f32, self.source_height as f32)
    }
}

/// YOLOv8 detector
pub struct YoloDetector {
    session: Session,
    input_name: String,
    config: DetectorConfig,
    resizer: FastResizer,
}

impl YoloDetector {
    /// Load a YOLOv8 ONNX export.
    ///
    /// Fails with [`ModelError::NotFound`] if the path is not a file.
    pub fn load(model_path: &Path, config: DetectorConfig) -> Result<Self, ModelError> {
        let session = runtime::load_session(model_path)?;
        let input_name = runtime::first_input_name(&session, model_path)?;

        tracing::info!(
            model = %model_path.display(),
            classes = config.labels.len(),
            input_size = config.input_size,
            "detector loaded"
        );

        Ok(Self {
            session,
            input_name,
            config,
            resizer: FastResizer::new(),
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn letterbox(&mut self, image: &RgbImage, path: &Path) -> Result<(RgbImage, Letterbox), DetectError> {
        let size = self.config.input_size;
        let letterbox = Letterbox::fit(image.width(), image.height(), size);
        let (scaled_width, scaled_height) = letterbox.scaled_size();

        let resized = self
            .resizer
            .resize_rgb(image, scaled_width.min(size), scaled_height.min(size))
            .ok_or_else(|| inference_error(path, "image has no pixels"))?;

        let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));
        image::imageops::replace(
            &mut canvas,
            &resized,
            letterbox.pad_x as i64,
            letterbox.pad_y as i64,
        );

        Ok((canvas, letterbox))
    }
}

impl ObjectDetector for YoloDetector {
    fn detect(&mut self, image_path: &Path) -> Result<Vec<Detection>, DetectError> {
        let image = FastDecoder::decode_rgb(image_path)?;
        let (input_image, letterbox) = self.letterbox(&image, image_path)?;
        let (shape, data) = to_nchw(&input_image, [0.0; 3], [1.0; 3]);

        let input = Tensor::from_array((shape, data))
            .map_err(|e| inference_error(image_path, &e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| inference_error(image_path, &e.to_string()))?;

        let (output_shape, output) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| inference_error(image_path, &e.to_string()))?;
        let dims: Vec<usize> = output_shape.iter().map(|&d| d as usize).collect();

        decode_output(&dims, output, &letterbox, &self.config)
    }
}

/// Turn a raw `[1, 4 + classes, anchors]` output into source-space detections.
///
/// Each anchor column holds `cx, cy, w, h` in model-input pixels followed by
/// one score per class. Transposed `[1, anchors, 4 + classes]` exports are
/// accepted as well.
pub fn decode_output(
    dims: &[usize],
    data: &[f32],
    letterbox: &Letterbox,
    config: &DetectorConfig,
) -> Result<Vec<Detection>, DetectError> {
    let unexpected = || DetectError::UnexpectedOutput {
        shape: dims.to_vec(),
    };

    let (rows, cols) = match dims {
        [1, rows, cols] => (*rows, *cols),
        [rows, cols] => (*rows, *cols),
        _ => return Err(unexpected()),
    };

    // Prefer the axis matching the class list, else assume features are the
    // short axis (84 vs 8400 for COCO at 640)
    let expected_features = config.labels.len() + 4;
    let transposed = if rows == expected_features {
        false
    } else if cols == expected_features {
        true
    } else {
        rows > cols
    };
    let (features, anchors) = if transposed { (cols, rows) } else { (rows, cols) };

    if features <= 4 || data.len() < features * anchors {
        return Err(unexpected());
    }

    let value = |feature: usize, anchor: usize| {
        if transposed {
            data[anchor * features + feature]
        } else {
            data[feature * anchors + anchor]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_id, confidence) = (4..features)
            .map(|f| (f - 4, value(f, anchor)))
            .fold((0, f32::MIN), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            });

        if confidence < config.confidence_threshold {
            continue;
        }

        let model_box = BoundingBox::from_center(
            value(0, anchor),
            value(1, anchor),
            value(2, anchor),
            value(3, anchor),
        );

        candidates.push(Detection {
            label: config.label_for(class_id),
            class_id,
            confidence,
            bbox: letterbox.to_source(model_box),
        });
    }

    Ok(non_max_suppression(
        candidates,
        config.iou_threshold,
        config.max_detections,
    ))
}

fn inference_error(path: &Path, reason: &str) -> DetectError {
    DetectError::Inference {
        path: PathBuf::from(path),
        reason: reason.to_string(),
    }
}
