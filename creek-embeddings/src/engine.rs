//! EmbeddingEngine, the entry point for creek-embeddings.
//!
//! Wraps a provider and the content-keyed cache into one interface the
//! pipeline calls per fragment. The provider is swappable through
//! `IEmbeddingProvider` so tests can inject fixed vectors.

use creek_core::config::EmbeddingConfig;
use creek_core::errors::{CreekResult, LinkError};
use creek_core::fragment::Fragment;
use creek_core::traits::IEmbeddingProvider;
use tracing::{debug, info};

use crate::cache::{content_key, EmbeddingCache};
use crate::provider::HashedTermFrequency;

/// Caching embedding engine over a pluggable provider.
pub struct EmbeddingEngine {
    provider: Box<dyn IEmbeddingProvider>,
    cache: EmbeddingCache,
    dimensions: usize,
}

impl EmbeddingEngine {
    /// Create an engine with the default hashed term-frequency provider.
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self::with_provider(Box::new(HashedTermFrequency::new(config.dimensions)), config)
    }

    /// Create an engine around a caller-supplied provider.
    pub fn with_provider(provider: Box<dyn IEmbeddingProvider>, config: &EmbeddingConfig) -> Self {
        let cache = EmbeddingCache::new(config.cache_capacity, config.cache_ttl_secs);
        info!(
            provider = provider.name(),
            dims = config.dimensions,
            cache_capacity = config.cache_capacity,
            "embedding engine initialized"
        );
        Self {
            provider,
            cache,
            dimensions: config.dimensions,
        }
    }

    /// Embed a piece of redacted text, consulting the cache first.
    ///
    /// Rejects providers that return the wrong vector length so a bad
    /// provider cannot poison the similarity index downstream.
    pub fn embed_text(&self, text: &str) -> CreekResult<Vec<f32>> {
        let key = content_key(text);
        if let Some(hit) = self.cache.get(&key) {
            debug!(key = %key, "embedding cache hit");
            return Ok(hit);
        }

        let vector = self.provider.embed(text)?;
        if vector.len() != self.dimensions {
            return Err(LinkError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            }
            .into());
        }

        self.cache.insert(key, vector.clone());
        Ok(vector)
    }

    /// Embed a fragment's redacted text and attach the vector to it.
    pub fn attach(&self, fragment: &mut Fragment) -> CreekResult<()> {
        let vector = self.embed_text(&fragment.text)?;
        debug!(fragment_id = %fragment.id, dims = vector.len(), "fragment embedded");
        fragment.embedding = Some(vector);
        Ok(())
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn cached_entries(&self) -> u64 {
        self.cache.len()
    }
}
