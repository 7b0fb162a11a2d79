//! # Grouping Module
//!
//! Groups images by the entity labels detected in them.
//!
//! - `EntityIndex` - label to the images containing it, in processing order
//! - `BoxIndex` - label to every box of that label, for enclosing rectangles

use crate::core::detector::{BoundingBox, DetectionResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// When the entity index is filled relative to ranking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    /// Index every image first; each reference sees all images sharing a label
    #[default]
    Complete,
    /// Grow the index while processing; a reference only sees images
    /// processed at or before it
    Incremental,
}

/// Label to the ordered list of images containing that label
#[derive(Debug, Default, Clone)]
pub struct EntityIndex {
    entities: HashMap<String, Vec<PathBuf>>,
    /// Labels in order of first appearance
    order: Vec<String>,
    processed: HashSet<PathBuf>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every result in order
    pub fn from_results(results: &[DetectionResult]) -> Self {
        let mut index = Self::new();
        for result in results {
            index.record(result);
        }
        index
    }

    /// Add one image under each distinct label it contains.
    ///
    /// Returns `false` if the image was already recorded. Images without
    /// detections are marked processed but create no entry.
    pub fn record(&mut self, result: &DetectionResult) -> bool {
        if !self.processed.insert(result.image.clone()) {
            return false;
        }

        for label in result.labels() {
            if !self.entities.contains_key(label) {
                self.order.push(label.to_string());
            }
            let images = self.entities.entry(label.to_string()).or_default();
            if !images.contains(&result.image) {
                images.push(result.image.clone());
            }
        }

        true
    }

    /// Images containing `label`, in processing order
    pub fn candidates(&self, label: &str) -> &[PathBuf] {
        self.entities.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `label` has enough images to rank against each other
    pub fn qualifies(&self, label: &str) -> bool {
        self.candidates(label).len() > 1
    }

    /// Labels in order of first appearance
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Every detected box, grouped by label
#[derive(Debug, Default, Clone)]
pub struct BoxIndex {
    boxes: HashMap<String, Vec<(PathBuf, BoundingBox)>>,
}

impl BoxIndex {
    pub fn from_results(results: &[DetectionResult]) -> Self {
        let mut boxes: HashMap<String, Vec<(PathBuf, BoundingBox)>> = HashMap::new();
        for result in results {
            for detection in &result.detections {
                boxes
                    .entry(detection.label.clone())
                    .or_default()
                    .push((result.image.clone(), detection.bbox));
            }
        }
        Self { boxes }
    }

    /// All boxes of `label` across every image
    pub fn boxes_for(&self, label: &str) -> impl Iterator<Item = &BoundingBox> {
        self.boxes
            .get(label)
            .into_iter()
            .flatten()
            .map(|(_, bbox)| bbox)
    }

    /// Boxes of `label` inside one image
    pub fn boxes_in<'a>(
        &'a self,
        label: &str,
        image: &'a Path,
    ) -> impl Iterator<Item = &'a BoundingBox> {
        self.boxes
            .get(label)
            .into_iter()
            .flatten()
            .filter(move |(path, _)| path == image)
            .map(|(_, bbox)| bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detector::Detection;

    fn result(image: &str, labels: &[&str]) -> DetectionResult {
        DetectionResult {
            image: PathBuf::from(image),
            detections: labels
                .iter()
                .enumerate()
                .map(|(i, label)| Detection {
                    label: label.to_string(),
                    class_id: i,
                    confidence: 0.9,
                    bbox: BoundingBox::new(i as f32, i as f32, 10.0 + i as f32, 10.0),
                })
                .collect(),
        }
    }

    #[test]
    fn image_without_detections_creates_no_entry() {
        let index = EntityIndex::from_results(&[result("/empty.jpg", &[])]);

        assert!(index.is_empty());
    }

    #[test]
    fn two_cats_share_one_entity() {
        let index = EntityIndex::from_results(&[
            result("/a.jpg", &["cat"]),
            result("/b.jpg", &["cat", "sofa"]),
        ]);

        assert_eq!(
            index.candidates("cat"),
            &[PathBuf::from("/a.jpg"), PathBuf::from("/b.jpg")]
        );
        assert!(index.qualifies("cat"));
        assert!(!index.qualifies("sofa"));
    }

    #[test]
    fn repeated_label_in_one_image_is_listed_once() {
        let index = EntityIndex::from_results(&[result("/a.jpg", &["dog", "dog", "dog"])]);

        assert_eq!(index.candidates("dog").len(), 1);
    }

    #[test]
    fn recording_an_image_twice_is_ignored() {
        let mut index = EntityIndex::new();

        assert!(index.record(&result("/a.jpg", &["cat"])));
        assert!(!index.record(&result("/a.jpg", &["cat", "dog"])));

        assert_eq!(index.candidates("cat").len(), 1);
        assert!(index.candidates("dog").is_empty());
    }

    #[test]
    fn entities_keep_first_seen_order() {
        let index = EntityIndex::from_results(&[
            result("/a.jpg", &["person", "bicycle"]),
            result("/b.jpg", &["car", "person"]),
        ]);

        let entities: Vec<_> = index.entities().collect();
        assert_eq!(entities, vec!["person", "bicycle", "car"]);
    }

    #[test]
    fn unknown_label_has_no_candidates() {
        let index = EntityIndex::new();

        assert!(index.candidates("zebra").is_empty());
        assert!(!index.qualifies("zebra"));
    }

    #[test]
    fn box_index_collects_across_images() {
        let boxes = BoxIndex::from_results(&[
            result("/a.jpg", &["cat"]),
            result("/b.jpg", &["cat", "dog"]),
        ]);

        assert_eq!(boxes.boxes_for("cat").count(), 2);
        assert_eq!(boxes.boxes_in("cat", Path::new("/b.jpg")).count(), 1);
        assert_eq!(boxes.boxes_in("dog", Path::new("/a.jpg")).count(), 0);
        assert_eq!(boxes.boxes_for("bird").count(), 0);
    }
}
