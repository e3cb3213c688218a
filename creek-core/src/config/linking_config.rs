use serde::{Deserialize, Serialize};

use super::defaults;

/// Similarity measure over embedding vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    Dot,
}

/// Linking engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkingConfig {
    /// Semantic edges below this similarity are never materialized.
    pub similarity_threshold: f64,
    pub metric: SimilarityMetric,
    /// Collections at or below this size use exact pairwise search;
    /// larger ones go through the approximate index.
    pub exact_search_limit: usize,
    pub ann_max_connections: usize,
    pub ann_ef_construction: usize,
    pub ann_ef_search: usize,
    /// Neighbours requested per query in approximate mode.
    pub ann_candidates: usize,
    /// Window for temporal-proximity edges.
    pub temporal_window_hours: i64,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: defaults::DEFAULT_SIMILARITY_THRESHOLD,
            metric: SimilarityMetric::Cosine,
            exact_search_limit: defaults::DEFAULT_EXACT_SEARCH_LIMIT,
            ann_max_connections: defaults::DEFAULT_ANN_MAX_CONNECTIONS,
            ann_ef_construction: defaults::DEFAULT_ANN_EF_CONSTRUCTION,
            ann_ef_search: defaults::DEFAULT_ANN_EF_SEARCH,
            ann_candidates: defaults::DEFAULT_ANN_CANDIDATES,
            temporal_window_hours: defaults::DEFAULT_TEMPORAL_WINDOW_HOURS,
        }
    }
}
