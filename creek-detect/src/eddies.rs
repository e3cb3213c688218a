//! Eddy detection: gravity wells in the semantic subgraph.
//!
//! An eddy is a connected component of `Semantic` resonance that pulled in
//! enough fragments, regardless of when they were written. Temporal and
//! synchronicity edges never bind an eddy.

use creek_core::fragment::ResonanceKind;
use creek_link::EdgeGraph;

/// Connected components of the semantic subgraph with at least
/// `min_fragments` members. Member lists ascend by fragment id; components
/// are ordered by their smallest member.
pub fn detect_components(graph: &EdgeGraph, min_fragments: usize) -> Vec<Vec<String>> {
    graph
        .components(ResonanceKind::Semantic)
        .into_iter()
        .filter(|component| component.len() >= min_fragments)
        .collect()
}
