//! # Ranking Module
//!
//! Orders the images sharing an entity by how similar they look to a
//! reference image.

use crate::core::embedder::{Embedding, EmbeddingCache};
use crate::error::EmbedError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default number of matches kept per entity
pub const DEFAULT_TOP_K: usize = 3;

/// One candidate image and its similarity to the reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarMatch {
    pub image: PathBuf,
    /// Cosine similarity in `[-1, 1]`
    pub score: f32,
}

/// Outcome of ranking one entity's candidates
#[derive(Debug, Default)]
pub struct Ranking {
    /// Best matches first, at most `top_k`
    pub matches: Vec<SimilarMatch>,
    /// Candidates whose embedding could not be computed
    pub skipped: Vec<(PathBuf, EmbedError)>,
}

/// Rank `candidates` against the reference embedding.
///
/// The reference itself and repeated paths are excluded. Scores are sorted
/// descending; equal scores keep candidate order.
pub fn rank_candidates(
    reference: &Path,
    reference_embedding: &Embedding,
    candidates: &[PathBuf],
    cache: &mut EmbeddingCache,
    top_k: usize,
) -> Ranking {
    let mut ranking = Ranking::default();
    let mut compared: HashSet<&Path> = HashSet::new();

    for candidate in candidates {
        if candidate == reference || !compared.insert(candidate.as_path()) {
            continue;
        }

        let score = cache
            .get(candidate)
            .and_then(|embedding| reference_embedding.cosine_similarity(&embedding));

        match score {
            Ok(score) => ranking.matches.push(SimilarMatch {
                image: candidate.clone(),
                score,
            }),
            Err(e) => {
                tracing::warn!(
                    "Skipping candidate '{}' for '{}': {}",
                    candidate.display(),
                    reference.display(),
                    e
                );
                ranking.skipped.push((candidate.clone(), e));
            }
        }
    }

    sort_matches(&mut ranking.matches);
    ranking.matches.truncate(top_k);
    ranking
}

/// Sort best first; stable, so ties keep their order
pub fn sort_matches(matches: &mut [SimilarMatch]) {
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
}
