//! Embedding collection with a two-mode neighbour search.
//!
//! Collections at or below `exact_search_limit` answer queries by exact
//! pairwise scan. Larger ones generate candidates from an HNSW index and
//! re-score them with the exact metric, so a pair's reported similarity is
//! identical whichever mode found it. Only recall differs between modes,
//! never strength.

use std::collections::{BTreeMap, HashMap};

use hnsw_rs::prelude::*;
use tracing::debug;

use creek_core::config::{LinkingConfig, SimilarityMetric};
use creek_core::errors::LinkError;

use crate::similarity;

/// Capacity hint handed to the HNSW constructor.
const ANN_CAPACITY: usize = 100_000;
/// Layer cap for the HNSW graph.
const ANN_MAX_LAYER: usize = 16;

enum AnnBackend {
    Cosine(Hnsw<'static, f32, DistCosine>),
    Dot(Hnsw<'static, f32, DistDot>),
}

impl AnnBackend {
    fn new(metric: SimilarityMetric, max_connections: usize, ef_construction: usize) -> Self {
        match metric {
            SimilarityMetric::Cosine => Self::Cosine(Hnsw::new(
                max_connections,
                ANN_CAPACITY,
                ANN_MAX_LAYER,
                ef_construction,
                DistCosine {},
            )),
            SimilarityMetric::Dot => Self::Dot(Hnsw::new(
                max_connections,
                ANN_CAPACITY,
                ANN_MAX_LAYER,
                ef_construction,
                DistDot {},
            )),
        }
    }

    fn insert(&self, vector: &[f32], data_id: usize) {
        match self {
            Self::Cosine(hnsw) => hnsw.insert_slice((vector, data_id)),
            Self::Dot(hnsw) => hnsw.insert_slice((vector, data_id)),
        }
    }

    fn search(&self, query: &[f32], k: usize, ef_search: usize) -> Vec<Neighbour> {
        match self {
            Self::Cosine(hnsw) => hnsw.search(query, k, ef_search),
            Self::Dot(hnsw) => hnsw.search(query, k, ef_search),
        }
    }
}

/// One neighbour with its exact similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub fragment_id: String,
    pub similarity: f64,
}

/// The registered embedding collection plus its approximate index.
///
/// The HNSW side is fed from the first insertion even while queries still
/// run exact, so crossing `exact_search_limit` never triggers a bulk
/// rebuild mid-run.
pub struct SemanticIndex {
    metric: SimilarityMetric,
    exact_limit: usize,
    candidates: usize,
    ef_search: usize,
    dimensions: Option<usize>,
    vectors: BTreeMap<String, Vec<f32>>,
    ann: AnnBackend,
    data_ids: HashMap<String, usize>,
    ids_by_data: HashMap<usize, String>,
}

impl SemanticIndex {
    pub fn new(config: &LinkingConfig) -> Self {
        Self {
            metric: config.metric,
            exact_limit: config.exact_search_limit,
            candidates: config.ann_candidates,
            ef_search: config.ann_ef_search,
            dimensions: None,
            vectors: BTreeMap::new(),
            ann: AnnBackend::new(
                config.metric,
                config.ann_max_connections,
                config.ann_ef_construction,
            ),
            data_ids: HashMap::new(),
            ids_by_data: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn contains(&self, fragment_id: &str) -> bool {
        self.vectors.contains_key(fragment_id)
    }

    /// Dimensionality fixed by the first insertion, if any.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Whether queries currently route through the approximate index.
    pub fn uses_ann(&self) -> bool {
        self.vectors.len() > self.exact_limit
    }

    /// Register one fragment's embedding. The first insertion fixes the
    /// collection's dimensionality; later mismatches are rejected before
    /// they can poison scores. Re-inserting a known id is a no-op.
    pub fn insert(&mut self, fragment_id: &str, vector: &[f32]) -> Result<bool, LinkError> {
        if let Some(expected) = self.dimensions {
            if vector.len() != expected {
                return Err(LinkError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        } else {
            self.dimensions = Some(vector.len());
        }
        if self.vectors.contains_key(fragment_id) {
            debug!(fragment_id, "embedding already indexed");
            return Ok(false);
        }

        let data_id = self.data_ids.len();
        self.ann.insert(vector, data_id);
        self.data_ids.insert(fragment_id.to_string(), data_id);
        self.ids_by_data.insert(data_id, fragment_id.to_string());
        self.vectors.insert(fragment_id.to_string(), vector.to_vec());
        Ok(true)
    }

    pub fn vector(&self, fragment_id: &str) -> Option<&[f32]> {
        self.vectors.get(fragment_id).map(Vec::as_slice)
    }

    /// Neighbours of a registered fragment scoring at or above `threshold`,
    /// descending by similarity, ids ascending on exact ties.
    pub fn neighbours(
        &self,
        fragment_id: &str,
        threshold: f64,
    ) -> Result<Vec<Scored>, LinkError> {
        let query = self
            .vectors
            .get(fragment_id)
            .ok_or_else(|| LinkError::MissingEmbedding {
                fragment_id: fragment_id.to_string(),
            })?;

        let mut scored = if self.uses_ann() {
            self.ann_candidates(fragment_id, query)
        } else {
            self.vectors
                .iter()
                .filter(|(id, _)| id.as_str() != fragment_id)
                .map(|(id, v)| Scored {
                    fragment_id: id.clone(),
                    similarity: similarity::score(self.metric, query, v),
                })
                .collect::<Vec<_>>()
        };

        scored.retain(|s| s.similarity >= threshold);
        scored.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.fragment_id.cmp(&b.fragment_id))
        });
        Ok(scored)
    }

    /// Candidates from the HNSW graph, re-scored exactly. Requests one
    /// neighbour beyond the configured count because the query point is in
    /// the index and comes back as its own nearest neighbour.
    fn ann_candidates(&self, fragment_id: &str, query: &[f32]) -> Vec<Scored> {
        let k = self.candidates + 1;
        let neighbours = self.ann.search(query, k, self.ef_search.max(k));
        debug!(
            fragment_id,
            candidates = neighbours.len(),
            "ann candidates fetched"
        );
        neighbours
            .into_iter()
            .filter_map(|n| self.ids_by_data.get(&n.d_id))
            .filter(|id| id.as_str() != fragment_id)
            .filter_map(|id| {
                self.vectors.get(id).map(|v| Scored {
                    fragment_id: id.clone(),
                    similarity: similarity::score(self.metric, query, v),
                })
            })
            .collect()
    }
}
