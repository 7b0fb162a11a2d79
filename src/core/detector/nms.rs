//! Per-class non-maximum suppression.

use super::Detection;

/// Keep the highest-confidence detection among heavily overlapping boxes
/// of the same class.
///
/// Output is ordered by descending confidence (stable for ties) and
/// capped at `max_detections`.
pub fn non_max_suppression(
    mut detections: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in detections {
        if kept.len() >= max_detections {
            break;
        }

        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });

        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detector::BoundingBox;

    fn det(class_id: usize, confidence: f32, x: f32) -> Detection {
        Detection {
            label: format!("class_{}", class_id),
            class_id,
            confidence,
            bbox: BoundingBox::new(x, 0.0, x + 10.0, 10.0),
        }
    }

    #[test]
    fn overlapping_same_class_keeps_best() {
        let kept = non_max_suppression(vec![det(0, 0.6, 0.0), det(0, 0.9, 1.0)], 0.5, 10);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn overlapping_different_classes_survive() {
        let kept = non_max_suppression(vec![det(0, 0.6, 0.0), det(1, 0.9, 0.0)], 0.5, 10);

        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn separate_boxes_survive() {
        let kept = non_max_suppression(vec![det(0, 0.6, 0.0), det(0, 0.9, 50.0)], 0.5, 10);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn output_is_capped() {
        let detections = (0..5).map(|i| det(0, 0.5, i as f32 * 100.0)).collect();

        let kept = non_max_suppression(detections, 0.5, 3);

        assert_eq!(kept.len(), 3);
    }
}
