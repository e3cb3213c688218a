//! Deterministic embeddings for redacted fragments.
//!
//! A hashed term-frequency provider behind the `IEmbeddingProvider` seam,
//! fronted by a blake3-keyed in-memory cache. The linking layer consumes
//! these vectors; nothing here ever sees raw source text.

pub mod cache;
pub mod engine;
pub mod provider;

pub use cache::{content_key, EmbeddingCache};
pub use engine::EmbeddingEngine;
pub use provider::HashedTermFrequency;
