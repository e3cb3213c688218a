//! In-memory embedding cache backed by moka.
//!
//! Keys are blake3 hashes of the redacted fragment text; raw source text
//! never reaches this layer. TinyLFU admission with a configurable TTL.

use std::time::Duration;

use moka::sync::Cache;

/// Cache key for a piece of redacted text.
pub fn content_key(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Bounded in-memory cache from content key to embedding vector.
pub struct EmbeddingCache {
    inner: Cache<String, Vec<f32>>,
}

impl EmbeddingCache {
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();
        Self { inner }
    }

    pub fn get(&self, key: &str) -> Option<Vec<f32>> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: String, embedding: Vec<f32>) {
        self.inner.insert(key, embedding);
    }

    pub fn len(&self) -> u64 {
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}
