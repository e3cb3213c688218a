use serde::{Deserialize, Serialize};

use super::defaults;

/// Embedding provider and cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimensions: usize,
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: defaults::DEFAULT_EMBEDDING_DIMENSIONS,
            cache_capacity: defaults::DEFAULT_CACHE_CAPACITY,
            cache_ttl_secs: defaults::DEFAULT_CACHE_TTL_SECS,
        }
    }
}
