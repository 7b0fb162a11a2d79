//! # Embedder Module
//!
//! Turns an image into a fixed-length embedding vector for similarity
//! comparison.
//!
//! ## Contents
//! - `ImageEmbedder` - the seam the pipeline talks to
//! - `ClipEncoder` - CLIP vision tower exported to ONNX
//! - `EmbeddingCache` - memoizes embeddings per image path for one run

mod cache;
mod clip;

pub use cache::{EmbeddingCache, EmbeddingCacheStats};
pub use clip::{ClipEncoder, EncoderConfig};

use crate::error::EmbedError;
use std::path::Path;
use std::sync::Arc;

/// Embedding vector for one image
///
/// Clones share the underlying buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Arc<[f32]>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values.into())
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cosine similarity in `[-1, 1]`
    pub fn cosine_similarity(&self, other: &Embedding) -> Result<f32, EmbedError> {
        if self.len() != other.len() {
            return Err(EmbedError::DimensionMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        Ok(cosine_similarity(self.as_slice(), other.as_slice()))
    }
}

/// Cosine similarity of two equal-length vectors.
///
/// Accumulates in f64 so a vector compared with itself gives exactly 1.0.
/// Returns 0.0 if either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0) as f32
}

/// Trait for image encoders
pub trait ImageEmbedder: Send {
    /// Embed one whole image
    fn embed(&mut self, image: &Path) -> Result<Embedding, EmbedError>;
}
