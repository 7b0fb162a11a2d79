//! What a pipeline run produced.

use crate::core::detector::BoundingBox;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of pipeline execution
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Images found in the input directories
    pub total_images: usize,
    /// Images the detector processed successfully
    pub processed_images: usize,
    /// One entry per processed image, in processing order
    pub references: Vec<ReferenceReport>,
    /// Annotated files written
    pub files_written: usize,
    /// Embeddings served from memory
    pub cache_hits: usize,
    /// Non-fatal errors, one message each
    pub errors: Vec<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineResult {
    /// Entity folders written across all references
    pub fn entity_groups(&self) -> usize {
        self.references.iter().map(|r| r.entities.len()).sum()
    }
}

/// Output for one reference image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceReport {
    pub image: PathBuf,
    /// `<output root>/<image stem>`
    pub output_dir: PathBuf,
    pub entities: Vec<EntityReport>,
}

/// Output for one entity of a reference image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityReport {
    pub entity: String,
    pub folder: PathBuf,
    /// Images sharing the entity, the reference included
    pub candidates: usize,
    pub matches: Vec<RankedFile>,
}

/// One written match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedFile {
    /// 1-based position in the ranking
    pub rank: usize,
    pub image: PathBuf,
    pub score: f32,
    pub output: PathBuf,
    /// Rectangle drawn on the image, if any
    pub enclosing: Option<BoundingBox>,
}
