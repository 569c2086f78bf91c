use dashmap::DashMap;
use extract::ExtractionResult;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Extraction results keyed by a hash of (extractor, text).
#[derive(Clone)]
pub struct ResultCache {
    results: Arc<DashMap<String, ExtractionResult>>,
    hits: Arc<AtomicUsize>,
    max_entries: usize,
}

impl ResultCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            results: Arc::new(DashMap::new()),
            hits: Arc::new(AtomicUsize::new(0)),
            max_entries,
        }
    }

    pub fn get(&self, extractor: &str, text: &str) -> Option<ExtractionResult> {
        let key = self.hash_key(extractor, text);
        let hit = self.results.get(&key).map(|r| r.value().clone());
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    pub fn set(&self, extractor: &str, text: &str, result: ExtractionResult) {
        if self.max_entries == 0 {
            return;
        }
        if self.results.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self
                .results
                .iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.results.remove(&key);
            }
        }
        let key = self.hash_key(extractor, text);
        self.results.insert(key, result);
    }

    fn hash_key(&self, extractor: &str, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(extractor.as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            results_cached: self.results.len(),
            hits: self.hits.load(Ordering::Relaxed),
            max_entries: self.max_entries,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub results_cached: usize,
    pub hits: usize,
    pub max_entries: usize,
}
