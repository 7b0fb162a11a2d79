//! Per-run embedding memo.

use super::{Embedding, ImageEmbedder};
use crate::error::EmbedError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Snapshot of cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbeddingCacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

/// Wraps an embedder so each image is encoded at most once.
///
/// Failures are not cached; a later request for the same image retries.
pub struct EmbeddingCache {
    embedder: Box<dyn ImageEmbedder>,
    entries: HashMap<PathBuf, Embedding>,
    hits: usize,
    misses: usize,
}

impl EmbeddingCache {
    pub fn new(embedder: Box<dyn ImageEmbedder>) -> Self {
        Self {
            embedder,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Embedding for `image`, computing it on first request
    pub fn get(&mut self, image: &Path) -> Result<Embedding, EmbedError> {
        if let Some(embedding) = self.entries.get(image) {
            self.hits += 1;
            return Ok(embedding.clone());
        }

        self.misses += 1;
        let embedding = self.embedder.embed(image)?;
        self.entries.insert(image.to_path_buf(), embedding.clone());
        Ok(embedding)
    }

    /// Drop all entries and reset the counters
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn stats(&self) -> EmbeddingCacheStats {
        EmbeddingCacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingEmbedder {
        calls: Arc<AtomicUsize>,
    }

    impl ImageEmbedder for CountingEmbedder {
        fn embed(&mut self, image: &Path) -> Result<Embedding, EmbedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if image.ends_with("broken.jpg") {
                return Err(EmbedError::Empty {
                    path: image.to_path_buf(),
                });
            }
            Ok(Embedding::new(vec![image.as_os_str().len() as f32, 1.0]))
        }
    }

    fn cache() -> (EmbeddingCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let embedder = CountingEmbedder {
            calls: Arc::clone(&calls),
        };
        (EmbeddingCache::new(Box::new(embedder)), calls)
    }

    #[test]
    fn second_request_is_a_hit() {
        let (mut cache, calls) = cache();

        let first = cache.get(Path::new("/a.jpg")).unwrap();
        let second = cache.get(Path::new("/a.jpg")).unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.stats(),
            EmbeddingCacheStats {
                entries: 1,
                hits: 1,
                misses: 1
            }
        );
    }

    #[test]
    fn failures_are_not_cached() {
        let (mut cache, calls) = cache();

        assert!(cache.get(Path::new("/broken.jpg")).is_err());
        assert!(cache.get(Path::new("/broken.jpg")).is_err());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn clear_forgets_everything() {
        let (mut cache, calls) = cache();
        cache.get(Path::new("/a.jpg")).unwrap();

        cache.clear();
        cache.get(Path::new("/a.jpg")).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().hits, 0);
    }
}
