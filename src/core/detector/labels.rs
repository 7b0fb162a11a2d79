//! Class names for detector outputs.

use crate::error::ModelError;
use std::fs;
use std::path::Path;

/// The 80 COCO classes, in the order YOLOv8 models emit them
pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Default class list as owned strings
pub fn coco_labels() -> Vec<String> {
    COCO_CLASSES.iter().map(|s| s.to_string()).collect()
}

/// Read a newline-separated labels file. Blank lines are skipped.
pub fn load_labels(path: &Path) -> Result<Vec<String>, ModelError> {
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ModelError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ModelError::LoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    })?;

    let labels: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if labels.is_empty() {
        return Err(ModelError::InvalidSignature {
            path: path.to_path_buf(),
            reason: "labels file is empty".to_string(),
        });
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn coco_order_matches_yolo_class_ids() {
        assert_eq!(COCO_CLASSES[0], "person");
        assert_eq!(COCO_CLASSES[15], "cat");
        assert_eq!(COCO_CLASSES[16], "dog");
        assert_eq!(COCO_CLASSES[79], "toothbrush");
    }

    #[test]
    fn labels_file_skips_blank_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("labels.txt");
        fs::write(&path, "cat\n\n  dog  \nbird\n").unwrap();

        let labels = load_labels(&path).unwrap();

        assert_eq!(labels, vec!["cat", "dog", "bird"]);
    }

    #[test]
    fn missing_labels_file_is_not_found() {
        let error = load_labels(Path::new("/nonexistent/labels.txt")).unwrap_err();
        assert!(matches!(error, ModelError::NotFound { .. }));
    }

    #[test]
    fn empty_labels_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("labels.txt");
        fs::write(&path, "\n\n").unwrap();

        assert!(load_labels(&path).is_err());
    }
}
