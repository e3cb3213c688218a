//! Synchronicity: the same idea surfacing in unrelated places.
//!
//! A semantic edge qualifies when it is stronger than the synchronicity
//! threshold, joins fragments from different platforms separated by at
//! least the minimum gap, and the pair is not already travelling together
//! in an active thread.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use creek_core::config::DetectConfig;
use creek_core::fragment::{Fragment, Resonance, ResonanceKind};
use creek_core::models::{SynchronicityRecord, Thread};
use creek_link::EdgeGraph;

/// One detected synchronicity: the record plus the `Synchronicity` edge to
/// add to the graph alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct SynchronicityHit {
    pub record: SynchronicityRecord,
    pub edge: Resonance,
}

pub fn detect_synchronicities(
    archive: &BTreeMap<String, Fragment>,
    graph: &EdgeGraph,
    threads: &[&Thread],
    config: &DetectConfig,
    now: DateTime<Utc>,
) -> Vec<SynchronicityHit> {
    graph
        .iter()
        .filter(|edge| edge.kind == ResonanceKind::Semantic)
        .filter(|edge| edge.strength >= config.synchronicity_threshold)
        .filter_map(|edge| {
            let a = archive.get(&edge.a)?;
            let b = archive.get(&edge.b)?;
            if a.source.platform == b.source.platform {
                return None;
            }
            let gap_days = (b.created_at - a.created_at).num_days().abs();
            if gap_days < config.synchronicity_min_gap_days {
                return None;
            }
            let travelling_together = threads.iter().any(|thread| {
                thread.is_active() && thread.contains(&edge.a) && thread.contains(&edge.b)
            });
            if travelling_together {
                return None;
            }
            Some(SynchronicityHit {
                record: SynchronicityRecord::new(
                    edge.a.as_str(),
                    edge.b.as_str(),
                    edge.strength,
                    gap_days,
                    now,
                ),
                edge: Resonance::new(
                    ResonanceKind::Synchronicity,
                    edge.a.as_str(),
                    edge.b.as_str(),
                    edge.strength,
                    now,
                ),
            })
        })
        .collect()
}
