//! # Annotate Module
//!
//! Draws the enclosing rectangle of an entity onto a matched image and
//! writes it to the output tree:
//!
//! ```text
//! <output root>/<reference stem>/<entity>/top1-crop.jpeg
//! ```

use crate::core::detector::{BoundingBox, Detection};
use crate::core::grouping::BoxIndex;
use crate::core::imaging::{draw_rect_outline, FastDecoder};
use crate::error::AnnotateError;
use image::{ImageFormat, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Outline color for matched entities
pub const MATCH_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Outline color for raw detection previews
pub const PREVIEW_COLOR: Rgb<u8> = Rgb([255, 64, 64]);

/// Outline thickness in pixels
pub const LINE_THICKNESS: u32 = 2;

/// Which boxes feed the enclosing rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxScope {
    /// Every box of the entity label across all detected images
    #[default]
    AllImages,
    /// Only the boxes found in the candidate image itself
    CandidateOnly,
}

/// Minimal rectangle covering the entity's boxes, `None` if there are none
pub fn enclosing_rect(
    boxes: &BoxIndex,
    entity: &str,
    candidate: &Path,
    scope: BoxScope,
) -> Option<BoundingBox> {
    match scope {
        BoxScope::AllImages => BoundingBox::enclosing(boxes.boxes_for(entity)),
        BoxScope::CandidateOnly => BoundingBox::enclosing(boxes.boxes_in(entity, candidate)),
    }
}

/// File name for the match at `rank` (1-based)
pub fn output_file_name(rank: usize) -> String {
    format!("top{}-crop.jpeg", rank)
}

/// Folder name for an entity label
///
/// Path separators in custom labels would otherwise nest folders.
pub fn entity_folder_name(label: &str) -> String {
    label.replace(['/', '\\'], "_")
}

/// Create `path` and any missing parents
pub fn ensure_dir(path: &Path) -> Result<(), AnnotateError> {
    std::fs::create_dir_all(path).map_err(|source| AnnotateError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Draw `rect` onto a copy of `source` and save it as JPEG.
///
/// With no rectangle the image is saved unchanged.
pub fn save_annotated(
    source: &Path,
    rect: Option<BoundingBox>,
    destination: &Path,
) -> Result<(), AnnotateError> {
    let mut image = FastDecoder::decode_rgb(source)?;

    if let Some(rect) = rect {
        draw_box(&mut image, &rect, MATCH_COLOR);
    }

    save_jpeg(&image, destination)?;
    tracing::debug!(
        source = %source.display(),
        destination = %destination.display(),
        "saved annotated image"
    );
    Ok(())
}

/// Save `image` with every detection outlined into `dir`.
///
/// The file is named after the image stem. Returns the written path.
pub fn save_detection_preview(
    image: &Path,
    detections: &[Detection],
    dir: &Path,
) -> Result<PathBuf, AnnotateError> {
    ensure_dir(dir)?;

    let mut canvas = FastDecoder::decode_rgb(image)?;
    for detection in detections {
        draw_box(&mut canvas, &detection.bbox, PREVIEW_COLOR);
    }

    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let destination = dir.join(format!("{}.jpeg", stem));

    save_jpeg(&canvas, &destination)?;
    Ok(destination)
}

fn draw_box(image: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    let rect = bbox.clamp(width as f32, height as f32).to_pixel_rect();
    draw_rect_outline(image, rect, color, LINE_THICKNESS);
}

fn save_jpeg(image: &RgbImage, destination: &Path) -> Result<(), AnnotateError> {
    image
        .save_with_format(destination, ImageFormat::Jpeg)
        .map_err(|e| AnnotateError::Save {
            path: destination.to_path_buf(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detector::DetectionResult;
    use tempfile::TempDir;

    fn detection(label: &str, bbox: BoundingBox) -> Detection {
        Detection {
            label: label.to_string(),
            class_id: 0,
            confidence: 0.9,
            bbox,
        }
    }

    fn write_jpeg(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(64, 64, Rgb([20, 20, 20]))
            .save(&path)
            .unwrap();
        path
    }

    fn index() -> BoxIndex {
        BoxIndex::from_results(&[
            DetectionResult {
                image: PathBuf::from("/a.jpg"),
                detections: vec![
                    detection("cat", BoundingBox::new(10.0, 10.0, 50.0, 50.0)),
                    detection("dog", BoundingBox::new(0.0, 0.0, 5.0, 5.0)),
                ],
            },
            DetectionResult {
                image: PathBuf::from("/b.jpg"),
                detections: vec![detection("cat", BoundingBox::new(30.0, 5.0, 60.0, 40.0))],
            },
        ])
    }

    #[test]
    fn single_box_encloses_itself() {
        let boxes = BoxIndex::from_results(&[DetectionResult {
            image: PathBuf::from("/a.jpg"),
            detections: vec![detection("cat", BoundingBox::new(10.0, 10.0, 50.0, 50.0))],
        }]);

        let rect = enclosing_rect(&boxes, "cat", Path::new("/a.jpg"), BoxScope::AllImages);

        assert_eq!(rect, Some(BoundingBox::new(10.0, 10.0, 50.0, 50.0)));
    }

    #[test]
    fn all_images_scope_spans_every_box_of_the_label() {
        let rect = enclosing_rect(&index(), "cat", Path::new("/a.jpg"), BoxScope::AllImages);

        assert_eq!(rect, Some(BoundingBox::new(10.0, 5.0, 60.0, 50.0)));
    }

    #[test]
    fn candidate_scope_uses_own_boxes_only() {
        let rect = enclosing_rect(&index(), "cat", Path::new("/b.jpg"), BoxScope::CandidateOnly);

        assert_eq!(rect, Some(BoundingBox::new(30.0, 5.0, 60.0, 40.0)));
    }

    #[test]
    fn unknown_label_has_no_rect() {
        assert_eq!(
            enclosing_rect(&index(), "bird", Path::new("/a.jpg"), BoxScope::AllImages),
            None
        );
    }

    #[test]
    fn file_names_are_one_based() {
        assert_eq!(output_file_name(1), "top1-crop.jpeg");
        assert_eq!(output_file_name(3), "top3-crop.jpeg");
    }

    #[test]
    fn folder_names_have_no_separators() {
        assert_eq!(entity_folder_name("traffic light"), "traffic light");
        assert_eq!(entity_folder_name("a/b\\c"), "a_b_c");
    }

    #[test]
    fn save_draws_a_green_outline() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_jpeg(temp_dir.path(), "cat.jpg");
        let destination = temp_dir.path().join("top1-crop.jpeg");

        save_annotated(
            &source,
            Some(BoundingBox::new(10.0, 10.0, 50.0, 50.0)),
            &destination,
        )
        .unwrap();

        let saved = image::open(&destination).unwrap().to_rgb8();
        assert_eq!(saved.dimensions(), (64, 64));
        let edge = saved.get_pixel(30, 10);
        assert!(edge[1] > 150 && edge[0] < 120, "edge pixel {:?}", edge);
        let inside = saved.get_pixel(30, 30);
        assert!(inside[1] < 80, "inside pixel {:?}", inside);
    }

    #[test]
    fn save_without_rect_copies_the_image() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_jpeg(temp_dir.path(), "plain.jpg");
        let destination = temp_dir.path().join("top1-crop.jpeg");

        save_annotated(&source, None, &destination).unwrap();

        assert!(destination.is_file());
    }

    #[test]
    fn corrupt_source_is_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("broken.jpg");
        std::fs::write(&source, b"not a jpeg").unwrap();

        let error = save_annotated(&source, None, &temp_dir.path().join("out.jpeg")).unwrap_err();

        assert!(!error.is_fatal());
    }

    #[test]
    fn unwritable_destination_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_jpeg(temp_dir.path(), "cat.jpg");
        let destination = temp_dir.path().join("missing").join("top1-crop.jpeg");

        let error = save_annotated(&source, None, &destination).unwrap_err();

        assert!(error.is_fatal());
    }

    #[test]
    fn preview_is_named_after_the_image() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_jpeg(temp_dir.path(), "street.jpg");
        let preview_dir = temp_dir.path().join("detections");

        let written = save_detection_preview(
            &source,
            &[detection("car", BoundingBox::new(4.0, 4.0, 20.0, 20.0))],
            &preview_dir,
        )
        .unwrap();

        assert_eq!(written, preview_dir.join("street.jpeg"));
        assert!(written.is_file());
    }
}
