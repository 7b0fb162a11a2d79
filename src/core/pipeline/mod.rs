//! # Pipeline Module
//!
//! Orchestrates the full entity matching workflow.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Discover the JPEG images in the input directory
//! 2. **Detect** - Run the object detector on every image
//! 3. **Group** - Index images by the entity labels they contain
//! 4. **Rank** - For each image and entity, rank the other images by
//!    embedding similarity and save the best matches annotated
//!
//! Work is sequential; progress goes out over the event channel.

mod executor;
mod report;

pub use executor::{Pipeline, PipelineBuilder, PipelineConfig, DETECTIONS_DIR};
pub use report::{EntityReport, PipelineResult, RankedFile, ReferenceReport};
