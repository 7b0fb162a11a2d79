//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the entity matching pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Image discovery events
    Scan(ScanEvent),
    /// Object detection events
    Detect(DetectEvent),
    /// Similarity ranking and output events
    Rank(RankEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { paths: Vec<PathBuf> },
    /// An image was found
    ImageFound { path: PathBuf },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_images: usize },
}

/// Events during the detection phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DetectEvent {
    /// Detection has started
    Started { total_images: usize },
    /// An image was processed
    Progress(DetectProgress),
    /// An image failed and was skipped
    Error { path: PathBuf, message: String },
    /// Detection completed
    Completed { processed: usize, failed: usize },
}

/// Progress information during detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectProgress {
    /// Number of images attempted so far
    pub completed: usize,
    /// Total number of images to process
    pub total: usize,
    /// Image that was just processed
    pub current_path: PathBuf,
    /// Objects found in that image
    pub detections: usize,
}

/// Events during the ranking phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RankEvent {
    /// Ranking has started
    Started { total_references: usize },
    /// A reference image has been handled
    Progress(RankProgress),
    /// An entity group was ranked for a reference image
    EntityRanked {
        reference: PathBuf,
        entity: String,
        candidates: usize,
        kept: usize,
    },
    /// A photo could not be embedded or annotated and was skipped
    Skipped { path: PathBuf, message: String },
    /// An annotated match was written
    FileWritten { path: PathBuf },
    /// Ranking completed
    Completed {
        entity_groups: usize,
        files_written: usize,
    },
}

/// Progress information during ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankProgress {
    /// Number of reference images handled so far
    pub completed: usize,
    /// Total number of reference images
    pub total: usize,
    /// Reference image that was just handled
    pub current_path: PathBuf,
    /// Embeddings served from memory so far
    pub cache_hits: usize,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Detecting,
    Grouping,
    Ranking,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Images found in the input directory
    pub total_images: usize,
    /// Images the detector processed successfully
    pub processed_images: usize,
    /// Entity folders written across all reference images
    pub entity_groups: usize,
    /// Annotated files written
    pub files_written: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Detecting => write!(f, "Detecting"),
            PipelinePhase::Grouping => write!(f, "Grouping"),
            PipelinePhase::Ranking => write!(f, "Ranking"),
        }
    }
}
