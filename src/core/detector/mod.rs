//! # Detector Module
//!
//! Finds labeled objects in images.
//!
//! ## Contents
//! - `ObjectDetector` - the seam the pipeline talks to
//! - `YoloDetector` - YOLOv8 ONNX export on ONNX Runtime
//! - `run_inference` - best-effort batch runner; failed images are skipped
//!
//! Labels default to the 80 COCO classes.

mod labels;
mod nms;
mod types;
mod yolo;

pub use labels::{coco_labels, load_labels, COCO_CLASSES};
pub use nms::non_max_suppression;
pub use types::{BoundingBox, Detection, DetectionResult};
pub use yolo::{decode_output, DetectorConfig, Letterbox, YoloDetector};

use crate::core::annotate;
use crate::error::DetectError;
use crate::events::{DetectEvent, DetectProgress, Event, EventSender};
use std::path::{Path, PathBuf};

/// Trait for object detectors
///
/// Implement this trait to plug in another model (or a fixed table of
/// detections for testing).
pub trait ObjectDetector: Send {
    /// Detect objects in one image
    fn detect(&mut self, image: &Path) -> Result<Vec<Detection>, DetectError>;
}

/// Options for a batch inference run
#[derive(Debug, Clone)]
pub struct InferenceOptions {
    /// Detections scoring below this are dropped
    pub min_confidence: f32,
    /// When set, every image is also saved here with all of its
    /// detections drawn
    pub preview_dir: Option<PathBuf>,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            preview_dir: None,
        }
    }
}

/// Outcome of running the detector over a batch of images
#[derive(Debug, Default)]
pub struct InferenceBatch {
    /// One result per successfully processed image, in input order
    pub results: Vec<DetectionResult>,
    /// Images that were skipped, with the reason
    pub failures: Vec<(PathBuf, DetectError)>,
    /// Non-fatal problems writing detection previews
    pub preview_errors: Vec<String>,
}

/// Run the detector over every image.
///
/// An image that fails is logged and skipped; the rest of the batch
/// still runs.
pub fn run_inference(
    detector: &mut dyn ObjectDetector,
    images: &[PathBuf],
    options: &InferenceOptions,
    events: &EventSender,
) -> InferenceBatch {
    let mut batch = InferenceBatch::default();

    events.send(Event::Detect(DetectEvent::Started {
        total_images: images.len(),
    }));

    for (index, image) in images.iter().enumerate() {
        match detector.detect(image) {
            Ok(mut detections) => {
                detections.retain(|d| d.confidence >= options.min_confidence);

                tracing::debug!(
                    image = %image.display(),
                    detections = detections.len(),
                    "detected objects"
                );

                if let Some(ref dir) = options.preview_dir {
                    if let Err(e) = annotate::save_detection_preview(image, &detections, dir) {
                        tracing::warn!("could not save detection preview: {}", e);
                        batch.preview_errors.push(e.to_string());
                    }
                }

                events.send(Event::Detect(DetectEvent::Progress(DetectProgress {
                    completed: index + 1,
                    total: images.len(),
                    current_path: image.clone(),
                    detections: detections.len(),
                })));

                batch.results.push(DetectionResult {
                    image: image.clone(),
                    detections,
                });
            }
            Err(e) => {
                tracing::warn!("Error processing image '{}': {}", image.display(), e);

                events.send(Event::Detect(DetectEvent::Error {
                    path: image.clone(),
                    message: e.to_string(),
                }));

                batch.failures.push((image.clone(), e));
            }
        }
    }

    events.send(Event::Detect(DetectEvent::Completed {
        processed: batch.results.len(),
        failed: batch.failures.len(),
    }));

    batch
}
