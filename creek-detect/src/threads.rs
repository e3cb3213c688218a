//! Thread grouping: fragments that kept resonating inside a sliding window.
//!
//! Two fragments join the same group when they sit within the window of
//! each other and are connected by a resonance edge or share a `Single`
//! primary label. Chains may stretch past the window; the join condition
//! is pairwise.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use petgraph::unionfind::UnionFind;

use creek_core::fragment::{Fragment, LabelReading};
use creek_link::{EdgeGraph, TemporalProfile};

/// A candidate thread before record matching. Members ascend by creation
/// time, the way the thread record stores them.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadGroup {
    pub members: Vec<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub label_affinity: Vec<(String, String)>,
}

/// Group fragments joined inside the sliding window. Groups below
/// `min_fragments` are dropped here and never surface as threads.
pub fn detect_groups(
    archive: &BTreeMap<String, Fragment>,
    graph: &EdgeGraph,
    window_hours: i64,
    min_fragments: usize,
) -> Vec<ThreadGroup> {
    let mut ordered: Vec<&Fragment> = archive.values().collect();
    ordered.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let window = Duration::hours(window_hours);
    let profiles: Vec<TemporalProfile> = ordered
        .iter()
        .map(|f| TemporalProfile::from_fragment(f))
        .collect();

    let mut union = UnionFind::<usize>::new(ordered.len());
    for i in 0..ordered.len() {
        for j in (i + 1)..ordered.len() {
            // Time-sorted, so the first fragment past the window ends the
            // scan for this anchor.
            if ordered[j].created_at - ordered[i].created_at > window {
                break;
            }
            let joined = graph.connected(&ordered[i].id, &ordered[j].id)
                || profiles[i].shared_singles(&profiles[j]) > 0;
            if joined {
                union.union(i, j);
            }
        }
    }

    let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..ordered.len() {
        by_root.entry(union.find(i)).or_default().push(i);
    }

    let mut groups: Vec<ThreadGroup> = by_root
        .into_values()
        .filter(|indices| indices.len() >= min_fragments)
        .map(|indices| {
            let members: Vec<String> = indices.iter().map(|&i| ordered[i].id.clone()).collect();
            let label_affinity = dominant_labels(&members, archive);
            ThreadGroup {
                first_seen: ordered[indices[0]].created_at,
                last_seen: ordered[*indices.last().expect("non-empty group")].created_at,
                members,
                label_affinity,
            }
        })
        .collect();
    groups.sort_by(|a, b| a.members.cmp(&b.members));
    groups
}

/// The (dimension, label) pairs held as a `Single` primary by at least half
/// the members, most widely held first.
pub fn dominant_labels(
    member_ids: &[String],
    archive: &BTreeMap<String, Fragment>,
) -> Vec<(String, String)> {
    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for id in member_ids {
        let Some(fragment) = archive.get(id) else {
            continue;
        };
        for (dimension, reading) in &fragment.classification.dimensions {
            if let LabelReading::Single(label) = &reading.label {
                *counts
                    .entry((dimension.clone(), label.clone()))
                    .or_default() += 1;
            }
        }
    }
    let majority = member_ids.len().div_ceil(2);
    let mut dominant: Vec<((String, String), usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= majority)
        .collect();
    dominant.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    dominant.into_iter().map(|(pair, _)| pair).collect()
}

/// Thread titles come from the dominant label and the founding date, and
/// never change as membership grows.
pub fn title_for(affinity: &[(String, String)], first_seen: DateTime<Utc>) -> String {
    let label = affinity
        .first()
        .map(|(_, label)| label.as_str())
        .unwrap_or("untitled");
    format!("{} ({})", label, first_seen.format("%Y-%m-%d"))
}
