//! LinkingEngine: one writer, deterministic edges.
//!
//! All linking state lives behind one lock, and edge-producing calls
//! additionally hold a running flag, so two batches can never interleave
//! insertions. Registration is separated from edge computation: a batch is
//! registered in full first, then edges are computed per fragment in id
//! order, which makes every pair visible exactly once whichever side of it
//! arrived later.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use creek_core::config::LinkingConfig;
use creek_core::errors::{CreekResult, LinkError};
use creek_core::fragment::{Fragment, Resonance, ResonanceKind};

use crate::graph::EdgeGraph;
use crate::index::SemanticIndex;
use crate::temporal::{self, TemporalProfile, WindowIndex};

/// Strength drift past this counts as disagreement in `relink_check`.
const STRENGTH_TOLERANCE: f64 = 1e-9;

/// Counts from one linking run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkOutcome {
    /// Fragments this run saw for the first time.
    pub registered: usize,
    pub semantic_edges: usize,
    pub temporal_edges: usize,
}

struct LinkState {
    index: SemanticIndex,
    graph: EdgeGraph,
    profiles: BTreeMap<String, TemporalProfile>,
    window: WindowIndex,
}

pub struct LinkingEngine {
    config: LinkingConfig,
    state: RwLock<LinkState>,
    /// Single-writer guard over edge insertion.
    running: AtomicBool,
}

impl LinkingEngine {
    pub fn new(config: LinkingConfig) -> Self {
        let state = LinkState {
            index: SemanticIndex::new(&config),
            graph: EdgeGraph::new(),
            profiles: BTreeMap::new(),
            window: WindowIndex::new(),
        };
        Self {
            config,
            state: RwLock::new(state),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &LinkingConfig {
        &self.config
    }

    /// Link a batch of embedded fragments against everything registered so
    /// far, including each other. Fragments already registered are skipped,
    /// which is what makes relinking an unchanged collection a no-op.
    pub fn link_batch(
        &self,
        fragments: &[Fragment],
        now: DateTime<Utc>,
    ) -> CreekResult<LinkOutcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(LinkError::AlreadyRunning.into());
        }
        let result = self.link_batch_inner(fragments, now);
        self.running.store(false, Ordering::SeqCst);
        result
    }

    fn link_batch_inner(
        &self,
        fragments: &[Fragment],
        now: DateTime<Utc>,
    ) -> CreekResult<LinkOutcome> {
        let mut state = self.state.write().map_err(|_| LinkError::StatePoisoned)?;
        let mut outcome = LinkOutcome::default();

        let mut fresh: Vec<&Fragment> = Vec::new();
        for fragment in fragments {
            let embedding =
                fragment
                    .embedding
                    .as_deref()
                    .ok_or_else(|| LinkError::MissingEmbedding {
                        fragment_id: fragment.id.clone(),
                    })?;
            if state.index.insert(&fragment.id, embedding)? {
                state
                    .profiles
                    .insert(fragment.id.clone(), TemporalProfile::from_fragment(fragment));
                state.window.insert(fragment.created_at, &fragment.id);
                fresh.push(fragment);
                outcome.registered += 1;
            }
        }

        fresh.sort_by(|a, b| a.id.cmp(&b.id));
        let threshold = self.config.similarity_threshold;
        let window = Duration::hours(self.config.temporal_window_hours);

        for fragment in fresh {
            let semantic = state.index.neighbours(&fragment.id, threshold)?;

            let temporal: Vec<(String, f64)> = {
                let Some(profile) = state.profiles.get(&fragment.id) else {
                    continue;
                };
                state
                    .window
                    .within(profile.created_at, window)
                    .into_iter()
                    .filter(|id| *id != fragment.id)
                    .filter_map(|id| {
                        let other = state.profiles.get(id)?;
                        temporal::edge_strength(profile, other).map(|s| (id.to_string(), s))
                    })
                    .collect()
            };

            for scored in semantic {
                let edge = Resonance::new(
                    ResonanceKind::Semantic,
                    fragment.id.as_str(),
                    scored.fragment_id,
                    scored.similarity,
                    now,
                );
                if state.graph.insert(edge) {
                    outcome.semantic_edges += 1;
                }
            }
            for (other, strength) in temporal {
                let edge = Resonance::new(
                    ResonanceKind::Temporal,
                    fragment.id.as_str(),
                    other,
                    strength,
                    now,
                );
                if state.graph.insert(edge) {
                    outcome.temporal_edges += 1;
                }
            }
        }

        info!(
            registered = outcome.registered,
            semantic = outcome.semantic_edges,
            temporal = outcome.temporal_edges,
            collection = state.profiles.len(),
            mode = if state.index.uses_ann() { "ann" } else { "exact" },
            "linking run complete"
        );
        Ok(outcome)
    }

    /// Insert detector-produced edges (synchronicity materialization) under
    /// the same writer guard. Returns how many were new.
    pub fn insert_edges(&self, edges: Vec<Resonance>) -> CreekResult<usize> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(LinkError::AlreadyRunning.into());
        }
        let result = match self.state.write() {
            Ok(mut state) => {
                let mut added = 0;
                for edge in edges {
                    if state.graph.insert(edge) {
                        added += 1;
                    }
                }
                Ok(added)
            }
            Err(_) => Err(LinkError::StatePoisoned.into()),
        };
        self.running.store(false, Ordering::SeqCst);
        result
    }

    /// Recompute the full semantic and temporal edge set from the
    /// registered collection and compare it with the live graph. Every
    /// discrepancy comes back as one warning line; agreement returns none.
    ///
    /// Exact mode always agrees with itself. Approximate mode may not: the
    /// HNSW graph's recall depends on its insertion history, so a fresh
    /// index can surface or miss borderline candidates. That disagreement
    /// is exactly the non-determinism this check exists to catch.
    pub fn relink_check(&self) -> CreekResult<Vec<String>> {
        let state = self.state.read().map_err(|_| LinkError::StatePoisoned)?;
        let expected = self.recompute_edges(&state)?;
        let mut warnings = Vec::new();

        for (id, edge) in &expected {
            match state.graph.get(id) {
                None => warnings.push(format!(
                    "relink produced {} edge {} ({} ~ {}) absent from the graph",
                    edge.kind, id, edge.a, edge.b
                )),
                Some(live) if (live.strength - edge.strength).abs() > STRENGTH_TOLERANCE => {
                    warnings.push(format!(
                        "relink scored edge {} at {:.6} but the graph holds {:.6}",
                        id, edge.strength, live.strength
                    ));
                }
                Some(_) => {}
            }
        }
        for live in state.graph.iter() {
            // Synchronicity edges are detector output, not relink output.
            if live.kind == ResonanceKind::Synchronicity {
                continue;
            }
            if !expected.contains_key(&live.id) {
                warnings.push(format!(
                    "graph holds {} edge {} ({} ~ {}) that relinking no longer produces",
                    live.kind, live.id, live.a, live.b
                ));
            }
        }

        if !warnings.is_empty() {
            warn!(disagreements = warnings.len(), "relink check failed");
        }
        Ok(warnings)
    }

    /// From-scratch edge computation over the current collection, id order.
    fn recompute_edges(&self, state: &LinkState) -> CreekResult<BTreeMap<String, Resonance>> {
        let now = Utc::now();
        let mut index = SemanticIndex::new(&self.config);
        for id in state.profiles.keys() {
            let Some(vector) = state.index.vector(id) else {
                continue;
            };
            index.insert(id, vector)?;
        }

        let mut edges = BTreeMap::new();
        let window = Duration::hours(self.config.temporal_window_hours);
        for (id, profile) in &state.profiles {
            for scored in index.neighbours(id, self.config.similarity_threshold)? {
                let edge = Resonance::new(
                    ResonanceKind::Semantic,
                    id.clone(),
                    scored.fragment_id,
                    scored.similarity,
                    now,
                );
                edges.insert(edge.id.clone(), edge);
            }
            for other_id in state.window.within(profile.created_at, window) {
                if other_id == id.as_str() {
                    continue;
                }
                let Some(other) = state.profiles.get(other_id) else {
                    continue;
                };
                if let Some(strength) = temporal::edge_strength(profile, other) {
                    let edge = Resonance::new(
                        ResonanceKind::Temporal,
                        id.clone(),
                        other_id,
                        strength,
                        now,
                    );
                    edges.insert(edge.id.clone(), edge);
                }
            }
        }
        Ok(edges)
    }

    /// Ids of edges touching one fragment, ascending.
    pub fn edge_ids_of(&self, fragment_id: &str) -> CreekResult<Vec<String>> {
        let state = self.state.read().map_err(|_| LinkError::StatePoisoned)?;
        Ok(state.graph.edge_ids_of(fragment_id))
    }

    /// Copy of the whole edge set, id order.
    pub fn edges(&self) -> CreekResult<Vec<Resonance>> {
        let state = self.state.read().map_err(|_| LinkError::StatePoisoned)?;
        Ok(state.graph.snapshot())
    }

    /// Clone of the edge graph, for a detection pass over a consistent
    /// snapshot.
    pub fn graph_snapshot(&self) -> CreekResult<EdgeGraph> {
        let state = self.state.read().map_err(|_| LinkError::StatePoisoned)?;
        Ok(state.graph.clone())
    }

    pub fn fragment_count(&self) -> usize {
        self.state.read().map(|s| s.profiles.len()).unwrap_or(0)
    }

    pub fn edge_count(&self) -> usize {
        self.state.read().map(|s| s.graph.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use creek_core::fragment::{
        ClassificationVector, Confidence, DimensionReading, Provenance, SourcePlatform,
    };

    fn fragment(
        id_seed: &str,
        day: u32,
        embedding: Vec<f32>,
        singles: &[(&str, &str)],
    ) -> Fragment {
        let created = Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap();
        let mut classification = ClassificationVector::default();
        for (dim, label) in singles {
            classification.dimensions.insert(
                dim.to_string(),
                DimensionReading::single(*label, Confidence::new(0.8)),
            );
        }
        Fragment {
            id: format!("frag-{id_seed}"),
            title: id_seed.to_string(),
            source: Provenance {
                platform: SourcePlatform::Journal,
                origin_path: format!("journal/{id_seed}.md"),
                conversation_id: None,
                channel: None,
                interlocutor: None,
                original_encoding: None,
                utc_offset_minutes: 0,
            },
            created_at: created,
            ingested_at: created,
            text: id_seed.to_string(),
            raw_hash: "00".repeat(32),
            classification,
            embedding: Some(embedding),
            links: Vec::new(),
            redaction_count: 0,
        }
    }

    #[test]
    fn semantic_and_temporal_edges_form() {
        let engine = LinkingEngine::new(LinkingConfig::default());
        let now = Utc::now();
        let batch = vec![
            fragment("a", 1, vec![1.0, 0.0], &[("frequency", "f3_agency")]),
            fragment("b", 2, vec![0.98, 0.02], &[("frequency", "f3_agency")]),
            fragment("c", 25, vec![0.0, 1.0], &[("frequency", "f3_agency")]),
        ];
        let outcome = engine.link_batch(&batch, now).unwrap();

        assert_eq!(outcome.registered, 3);
        // a~b are near-identical vectors; c points elsewhere.
        assert_eq!(outcome.semantic_edges, 1);
        // a~b share a label one day apart; c is weeks away.
        assert_eq!(outcome.temporal_edges, 1);

        let edges = engine.edges().unwrap();
        assert!(edges
            .iter()
            .any(|e| e.kind == ResonanceKind::Semantic && e.involves("frag-a") && e.involves("frag-b")));
        assert!(edges
            .iter()
            .any(|e| e.kind == ResonanceKind::Temporal && e.involves("frag-a") && e.involves("frag-b")));
    }

    #[test]
    fn relinking_an_unchanged_batch_adds_nothing() {
        let engine = LinkingEngine::new(LinkingConfig::default());
        let now = Utc::now();
        let batch = vec![
            fragment("a", 1, vec![1.0, 0.0], &[("frequency", "f3_agency")]),
            fragment("b", 2, vec![0.98, 0.02], &[("frequency", "f3_agency")]),
        ];
        let first = engine.link_batch(&batch, now).unwrap();
        assert_eq!(first.registered, 2);
        let edges_before = engine.edges().unwrap();

        let second = engine.link_batch(&batch, now).unwrap();
        assert_eq!(second, LinkOutcome::default());
        assert_eq!(engine.edges().unwrap(), edges_before);
        assert!(engine.relink_check().unwrap().is_empty());
    }

    #[test]
    fn batches_arriving_in_any_order_produce_the_same_edges() {
        let make = || {
            vec![
                fragment("a", 1, vec![1.0, 0.0, 0.0], &[("frequency", "f3_agency")]),
                fragment("b", 2, vec![0.97, 0.03, 0.0], &[("frequency", "f3_agency")]),
                fragment("c", 3, vec![0.95, 0.05, 0.0], &[("mode", "express")]),
            ]
        };
        let now = Utc::now();

        let forward = LinkingEngine::new(LinkingConfig::default());
        forward.link_batch(&make(), now).unwrap();

        let reverse = LinkingEngine::new(LinkingConfig::default());
        let mut reversed = make();
        reversed.reverse();
        reverse.link_batch(&reversed, now).unwrap();

        let mut lhs = forward.edges().unwrap();
        let mut rhs = reverse.edges().unwrap();
        lhs.sort_by(|a, b| a.id.cmp(&b.id));
        rhs.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn missing_embedding_is_rejected() {
        let engine = LinkingEngine::new(LinkingConfig::default());
        let mut broken = fragment("a", 1, vec![1.0, 0.0], &[]);
        broken.embedding = None;
        let err = engine.link_batch(&[broken], Utc::now()).unwrap_err();
        assert!(err.to_string().contains("has no embedding"));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let engine = LinkingEngine::new(LinkingConfig::default());
        let batch = vec![
            fragment("a", 1, vec![1.0, 0.0], &[]),
            fragment("b", 2, vec![1.0, 0.0, 0.0], &[]),
        ];
        let err = engine.link_batch(&batch, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
    }

    #[test]
    fn below_threshold_pairs_are_never_stored() {
        let config = LinkingConfig {
            similarity_threshold: 0.99,
            ..Default::default()
        };
        let engine = LinkingEngine::new(config);
        let batch = vec![
            fragment("a", 1, vec![1.0, 0.0], &[]),
            fragment("b", 2, vec![0.9, 0.1], &[]),
        ];
        let outcome = engine.link_batch(&batch, Utc::now()).unwrap();
        assert_eq!(outcome.semantic_edges, 0);
        assert_eq!(engine.edge_count(), 0);
    }

    #[test]
    fn detector_edges_insert_under_the_guard() {
        let engine = LinkingEngine::new(LinkingConfig::default());
        let edge = Resonance::new(
            ResonanceKind::Synchronicity,
            "frag-a",
            "frag-b",
            0.93,
            Utc::now(),
        );
        assert_eq!(engine.insert_edges(vec![edge.clone()]).unwrap(), 1);
        assert_eq!(engine.insert_edges(vec![edge]).unwrap(), 0);
        // Synchronicity edges are ignored by the relink comparison.
        assert!(engine.relink_check().unwrap().is_empty());
    }
}
