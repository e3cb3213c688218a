//! Paradox pairing from router contradiction marks.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use creek_core::fragment::{Fragment, LabelReading};
use creek_core::models::{ContradictionMark, ParadoxRecord, ParadoxSide};
use creek_link::EdgeGraph;

/// Build paradox records from contradiction marks.
///
/// The base pairing holds the two pass readings of the marked fragment.
/// When another fragment from the same entity holds a conflicting `Single`
/// reading on the marked dimension at or above `confidence_floor` and is
/// resonance-connected to the marked one, the pair is cross-fragment
/// instead: the archive itself holds both sides.
pub fn detect_paradoxes(
    archive: &BTreeMap<String, Fragment>,
    graph: &EdgeGraph,
    marks: &[ContradictionMark],
    confidence_floor: f64,
    now: DateTime<Utc>,
) -> Vec<ParadoxRecord> {
    marks
        .iter()
        .filter_map(|mark| {
            let Some(marked) = archive.get(&mark.fragment_id) else {
                debug!(fragment_id = %mark.fragment_id, "mark references a fragment outside the archive");
                return None;
            };
            let first = ParadoxSide {
                fragment_id: mark.fragment_id.clone(),
                label: mark.rule_label.clone(),
                confidence: mark.rule_confidence,
            };
            let second = cross_fragment_side(archive, graph, mark, marked, confidence_floor)
                .unwrap_or_else(|| ParadoxSide {
                    fragment_id: mark.fragment_id.clone(),
                    label: mark.secondary_label.clone(),
                    confidence: mark.secondary_confidence,
                });
            Some(ParadoxRecord::new(
                mark.dimension.as_str(),
                marked.source.entity(),
                first,
                second,
                now,
            ))
        })
        .collect()
}

/// The first cross-fragment counterpart in id order: same platform and
/// entity, resonance-connected to the marked fragment, with a conflicting
/// `Single` at or above the floor on the marked dimension.
fn cross_fragment_side(
    archive: &BTreeMap<String, Fragment>,
    graph: &EdgeGraph,
    mark: &ContradictionMark,
    marked: &Fragment,
    confidence_floor: f64,
) -> Option<ParadoxSide> {
    archive
        .values()
        .filter(|candidate| candidate.id != marked.id)
        .filter(|candidate| {
            candidate.source.platform == marked.source.platform
                && candidate.source.entity() == marked.source.entity()
        })
        .filter(|candidate| graph.connected(&marked.id, &candidate.id))
        .find_map(|candidate| {
            let reading = candidate.classification.get(&mark.dimension)?;
            match &reading.label {
                LabelReading::Single(label)
                    if *label != mark.rule_label
                        && reading.confidence.value() >= confidence_floor =>
                {
                    Some(ParadoxSide {
                        fragment_id: candidate.id.clone(),
                        label: label.clone(),
                        confidence: reading.confidence,
                    })
                }
                _ => None,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use creek_core::fragment::{
        ClassificationVector, Confidence, DimensionReading, Provenance, Resonance, ResonanceKind,
        SourcePlatform,
    };

    fn fragment(id: &str, platform: SourcePlatform, singles: &[(&str, &str, f64)]) -> Fragment {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let mut classification = ClassificationVector::default();
        for (dimension, label, confidence) in singles {
            classification.dimensions.insert(
                dimension.to_string(),
                DimensionReading::single(*label, Confidence::new(*confidence)),
            );
        }
        Fragment {
            id: id.to_string(),
            title: id.to_string(),
            source: Provenance {
                platform,
                origin_path: format!("{platform}/{id}.md"),
                conversation_id: None,
                channel: None,
                interlocutor: None,
                original_encoding: None,
                utc_offset_minutes: 0,
            },
            created_at: created,
            ingested_at: created,
            text: id.to_string(),
            raw_hash: "00".repeat(32),
            classification,
            embedding: None,
            links: Vec::new(),
            redaction_count: 0,
        }
    }

    fn mark(fragment_id: &str) -> ContradictionMark {
        ContradictionMark {
            fragment_id: fragment_id.to_string(),
            dimension: "dosage".to_string(),
            rule_label: "medicine".to_string(),
            rule_confidence: Confidence::new(0.9),
            secondary_label: "toxic".to_string(),
            secondary_confidence: Confidence::new(0.85),
        }
    }

    fn archive_of(fragments: Vec<Fragment>) -> BTreeMap<String, Fragment> {
        fragments.into_iter().map(|f| (f.id.clone(), f)).collect()
    }

    #[test]
    fn a_mark_pairs_both_pass_readings() {
        let archive = archive_of(vec![fragment("frag-a", SourcePlatform::Journal, &[])]);
        let records = detect_paradoxes(
            &archive,
            &EdgeGraph::new(),
            &[mark("frag-a")],
            0.7,
            Utc::now(),
        );
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.dimension, "dosage");
        assert_eq!(record.entity, "self");
        assert_eq!(record.first.fragment_id, "frag-a");
        assert_eq!(record.second.fragment_id, "frag-a");
        assert_eq!(record.first.label, "medicine");
        assert_eq!(record.second.label, "toxic");
    }

    #[test]
    fn a_connected_conflicting_fragment_upgrades_the_pair() {
        let archive = archive_of(vec![
            fragment("frag-a", SourcePlatform::Journal, &[("dosage", "medicine", 0.9)]),
            fragment("frag-b", SourcePlatform::Journal, &[("dosage", "toxic", 0.8)]),
        ]);
        let mut graph = EdgeGraph::new();
        graph.insert(Resonance::new(
            ResonanceKind::Semantic,
            "frag-a",
            "frag-b",
            0.9,
            Utc::now(),
        ));
        let records =
            detect_paradoxes(&archive, &graph, &[mark("frag-a")], 0.7, Utc::now());
        assert_eq!(records.len(), 1);
        let record = &records[0];
        // Canonical side order puts frag-a first either way.
        assert_eq!(record.first.fragment_id, "frag-a");
        assert_eq!(record.second.fragment_id, "frag-b");
        assert_eq!(record.second.label, "toxic");
    }

    #[test]
    fn an_unconnected_fragment_never_upgrades() {
        let archive = archive_of(vec![
            fragment("frag-a", SourcePlatform::Journal, &[("dosage", "medicine", 0.9)]),
            fragment("frag-b", SourcePlatform::Journal, &[("dosage", "toxic", 0.8)]),
        ]);
        let records = detect_paradoxes(
            &archive,
            &EdgeGraph::new(),
            &[mark("frag-a")],
            0.7,
            Utc::now(),
        );
        assert_eq!(records[0].second.fragment_id, "frag-a");
    }

    #[test]
    fn a_different_platform_never_upgrades() {
        let archive = archive_of(vec![
            fragment("frag-a", SourcePlatform::Journal, &[("dosage", "medicine", 0.9)]),
            fragment("frag-b", SourcePlatform::Discord, &[("dosage", "toxic", 0.8)]),
        ]);
        let mut graph = EdgeGraph::new();
        graph.insert(Resonance::new(
            ResonanceKind::Semantic,
            "frag-a",
            "frag-b",
            0.9,
            Utc::now(),
        ));
        let records =
            detect_paradoxes(&archive, &graph, &[mark("frag-a")], 0.7, Utc::now());
        assert_eq!(records[0].second.fragment_id, "frag-a");
    }

    #[test]
    fn low_confidence_counterparts_stay_out_of_the_pair() {
        let archive = archive_of(vec![
            fragment("frag-a", SourcePlatform::Journal, &[("dosage", "medicine", 0.9)]),
            fragment("frag-b", SourcePlatform::Journal, &[("dosage", "toxic", 0.4)]),
        ]);
        let mut graph = EdgeGraph::new();
        graph.insert(Resonance::new(
            ResonanceKind::Semantic,
            "frag-a",
            "frag-b",
            0.9,
            Utc::now(),
        ));
        let records =
            detect_paradoxes(&archive, &graph, &[mark("frag-a")], 0.7, Utc::now());
        assert_eq!(records[0].second.fragment_id, "frag-a");
    }

    #[test]
    fn unknown_marked_fragments_are_skipped() {
        let records = detect_paradoxes(
            &BTreeMap::new(),
            &EdgeGraph::new(),
            &[mark("frag-gone")],
            0.7,
            Utc::now(),
        );
        assert!(records.is_empty());
    }
}
