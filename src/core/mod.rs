//! # Core Module
//!
//! The entity matching engine, free of any front-end concerns.
//!
//! ## Modules
//! - `scanner` - Discovers images in the input directory
//! - `imaging` - Decoding, resizing and rectangle drawing
//! - `runtime` - ONNX Runtime session loading
//! - `detector` - Object detection (YOLOv8)
//! - `embedder` - Whole-image embeddings (CLIP) with a per-run cache
//! - `grouping` - Entity label to image index
//! - `ranking` - Cosine-similarity ranking of candidates
//! - `annotate` - Enclosing rectangles and output files
//! - `pipeline` - Orchestrates the full workflow

pub mod annotate;
pub mod detector;
pub mod embedder;
pub mod grouping;
pub mod imaging;
pub mod pipeline;
pub mod ranking;
pub mod runtime;
pub mod scanner;

// Re-export commonly used types
pub use annotate::BoxScope;
pub use detector::{BoundingBox, Detection, DetectionResult, ObjectDetector};
pub use embedder::{Embedding, ImageEmbedder};
pub use grouping::{EntityIndex, GroupingMode};
pub use pipeline::{Pipeline, PipelineResult};
pub use ranking::SimilarMatch;
pub use scanner::ImageFile;
