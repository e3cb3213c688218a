use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::RECORD_ID_HEX_LEN;

/// The three kinds of resonance edge between fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResonanceKind {
    /// Embedding similarity above the linking threshold.
    Semantic,
    /// Shared taxonomic value within the temporal window.
    Temporal,
    /// High similarity across sources and a long time gap.
    Synchronicity,
}

impl ResonanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Semantic => "semantic",
            Self::Temporal => "temporal",
            Self::Synchronicity => "synchronicity",
        }
    }
}

impl fmt::Display for ResonanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An undirected edge between two fragments. Endpoints are ids, never
/// references; `a` and `b` are stored in canonical (ascending) order so the
/// same pair always produces the same edge regardless of processing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resonance {
    /// Deterministic identifier, `res-<12 hex>` over kind and endpoints.
    pub id: String,
    pub kind: ResonanceKind,
    pub a: String,
    pub b: String,
    /// Similarity for semantic edges, normalized label overlap for temporal
    /// edges. Always within [0, 1].
    pub strength: f64,
    pub noted_at: DateTime<Utc>,
}

impl Resonance {
    pub fn new(
        kind: ResonanceKind,
        x: impl Into<String>,
        y: impl Into<String>,
        strength: f64,
        noted_at: DateTime<Utc>,
    ) -> Self {
        let (x, y) = (x.into(), y.into());
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        let id = Self::derive_id(kind, &a, &b);
        Self {
            id,
            kind,
            a,
            b,
            strength,
            noted_at,
        }
    }

    /// Edge identity covers kind and endpoints, not strength, so re-scoring
    /// an existing pair updates the edge instead of duplicating it.
    pub fn derive_id(kind: ResonanceKind, a: &str, b: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind.as_str().as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(a.as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(b.as_bytes());
        let hex = hasher.finalize().to_hex();
        format!("res-{}", &hex[..RECORD_ID_HEX_LEN])
    }

    pub fn involves(&self, fragment_id: &str) -> bool {
        self.a == fragment_id || self.b == fragment_id
    }

    /// The opposite endpoint, when `fragment_id` is one of the two.
    pub fn other<'a>(&'a self, fragment_id: &str) -> Option<&'a str> {
        if self.a == fragment_id {
            Some(self.b.as_str())
        } else if self.b == fragment_id {
            Some(self.a.as_str())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_canonicalized() {
        let at = Utc::now();
        let forward = Resonance::new(ResonanceKind::Semantic, "frag-b", "frag-a", 0.8, at);
        let reverse = Resonance::new(ResonanceKind::Semantic, "frag-a", "frag-b", 0.8, at);
        assert_eq!(forward.a, "frag-a");
        assert_eq!(forward.b, "frag-b");
        assert_eq!(forward.id, reverse.id);
    }

    #[test]
    fn kind_separates_edge_identity() {
        let at = Utc::now();
        let semantic = Resonance::new(ResonanceKind::Semantic, "frag-a", "frag-b", 0.8, at);
        let temporal = Resonance::new(ResonanceKind::Temporal, "frag-a", "frag-b", 0.5, at);
        assert_ne!(semantic.id, temporal.id);
    }

    #[test]
    fn other_endpoint() {
        let edge = Resonance::new(ResonanceKind::Semantic, "frag-a", "frag-b", 0.8, Utc::now());
        assert_eq!(edge.other("frag-a"), Some("frag-b"));
        assert_eq!(edge.other("frag-b"), Some("frag-a"));
        assert_eq!(edge.other("frag-c"), None);
        assert!(edge.involves("frag-a"));
    }
}
