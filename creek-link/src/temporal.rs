//! Temporal-proximity edges.
//!
//! Cheap and exact: no embeddings involved, only creation times and
//! classification vectors. Two fragments created within the window that
//! hold the same `Single` label in at least one dimension resonate
//! temporally. Strength is the shared-dimension count over the dimension
//! count, so a full-vector match scores 1.0.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};

use creek_core::fragment::{Fragment, LabelReading};

/// What temporal linking keeps per fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalProfile {
    pub fragment_id: String,
    pub created_at: DateTime<Utc>,
    /// Dimension to label, `Single` readings only. Dual readings are
    /// ambiguous and never anchor a temporal edge.
    pub singles: BTreeMap<String, String>,
    /// Dimension count of the full classification vector.
    pub dimension_count: usize,
}

impl TemporalProfile {
    pub fn from_fragment(fragment: &Fragment) -> Self {
        let singles = fragment
            .classification
            .dimensions
            .iter()
            .filter_map(|(dim, reading)| match &reading.label {
                LabelReading::Single(label) => Some((dim.clone(), label.clone())),
                _ => None,
            })
            .collect();
        Self {
            fragment_id: fragment.id.clone(),
            created_at: fragment.created_at,
            singles,
            dimension_count: fragment.classification.dimensions.len(),
        }
    }

    /// Dimensions where both profiles hold the same `Single` label.
    pub fn shared_singles(&self, other: &Self) -> usize {
        self.singles
            .iter()
            .filter(|(dim, label)| {
                other
                    .singles
                    .get(dim.as_str())
                    .is_some_and(|l| l == *label)
            })
            .count()
    }
}

/// Temporal strength between two profiles, when an edge exists at all.
/// Time is the caller's concern; this only answers the label question.
pub fn edge_strength(a: &TemporalProfile, b: &TemporalProfile) -> Option<f64> {
    let shared = a.shared_singles(b);
    if shared == 0 {
        return None;
    }
    let dims = a.dimension_count.max(b.dimension_count);
    if dims == 0 {
        return None;
    }
    Some(shared as f64 / dims as f64)
}

/// Creation-time index for the window scan. Multiple fragments can share a
/// timestamp, so each key holds a sorted id set.
#[derive(Debug, Clone, Default)]
pub struct WindowIndex {
    by_time: BTreeMap<DateTime<Utc>, BTreeSet<String>>,
}

impl WindowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, created_at: DateTime<Utc>, fragment_id: &str) {
        self.by_time
            .entry(created_at)
            .or_default()
            .insert(fragment_id.to_string());
    }

    /// Fragment ids created within `window` of `at`, both ends inclusive,
    /// time then id order.
    pub fn within(&self, at: DateTime<Utc>, window: Duration) -> Vec<&str> {
        let start = at - window;
        let end = at + window;
        self.by_time
            .range(start..=end)
            .flat_map(|(_, ids)| ids.iter().map(String::as_str))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_time.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_time.is_empty()
    }
}
