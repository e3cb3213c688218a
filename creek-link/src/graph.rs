//! The resonance edge store.
//!
//! Every edge is owned here exactly once, keyed by its deterministic id;
//! fragments carry edge ids, never edge copies. A petgraph projection
//! answers the connectivity questions the detectors ask.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{NodeIndex, UnGraph};

use creek_core::fragment::{Resonance, ResonanceKind};

#[derive(Debug, Clone, Default)]
pub struct EdgeGraph {
    edges: BTreeMap<String, Resonance>,
    /// Fragment id to the ids of edges touching it.
    touching: BTreeMap<String, BTreeSet<String>>,
}

impl EdgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh an edge. Edge identity covers kind and endpoints,
    /// so a re-scored pair updates in place. Returns true only for an edge
    /// the graph had never seen.
    pub fn insert(&mut self, edge: Resonance) -> bool {
        let is_new = !self.edges.contains_key(&edge.id);
        if is_new {
            self.touching
                .entry(edge.a.clone())
                .or_default()
                .insert(edge.id.clone());
            self.touching
                .entry(edge.b.clone())
                .or_default()
                .insert(edge.id.clone());
        }
        self.edges.insert(edge.id.clone(), edge);
        is_new
    }

    pub fn get(&self, edge_id: &str) -> Option<&Resonance> {
        self.edges.get(edge_id)
    }

    /// The edge of one kind between two fragments, in either endpoint order.
    pub fn between(&self, kind: ResonanceKind, x: &str, y: &str) -> Option<&Resonance> {
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        self.edges.get(&Resonance::derive_id(kind, a, b))
    }

    /// Whether an edge of any kind joins the two fragments.
    pub fn connected(&self, x: &str, y: &str) -> bool {
        [
            ResonanceKind::Semantic,
            ResonanceKind::Temporal,
            ResonanceKind::Synchronicity,
        ]
        .iter()
        .any(|kind| self.between(*kind, x, y).is_some())
    }

    /// Ids of edges touching a fragment, ascending.
    pub fn edge_ids_of(&self, fragment_id: &str) -> Vec<String> {
        self.touching
            .get(fragment_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn edges_of(&self, fragment_id: &str) -> Vec<&Resonance> {
        self.touching
            .get(fragment_id)
            .into_iter()
            .flat_map(|ids| ids.iter().filter_map(|id| self.edges.get(id)))
            .collect()
    }

    /// Edges in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Resonance> {
        self.edges.values()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn count_of(&self, kind: ResonanceKind) -> usize {
        self.edges.values().filter(|e| e.kind == kind).count()
    }

    /// Connected components over edges of one kind. Members within a
    /// component and the components themselves both come back sorted by
    /// id, so detection output is stable run to run.
    pub fn components(&self, kind: ResonanceKind) -> Vec<Vec<String>> {
        let mut graph: UnGraph<&str, ()> = UnGraph::new_undirected();
        let mut index_of: HashMap<&str, NodeIndex> = HashMap::new();
        for edge in self.edges.values() {
            if edge.kind != kind {
                continue;
            }
            let a = *index_of
                .entry(edge.a.as_str())
                .or_insert_with(|| graph.add_node(edge.a.as_str()));
            let b = *index_of
                .entry(edge.b.as_str())
                .or_insert_with(|| graph.add_node(edge.b.as_str()));
            graph.add_edge(a, b, ());
        }

        // Tarjan over an undirected graph yields its connected components.
        let mut components: Vec<Vec<String>> = tarjan_scc(&graph)
            .into_iter()
            .map(|scc| {
                let mut members: Vec<String> =
                    scc.into_iter().map(|ix| graph[ix].to_string()).collect();
                members.sort_unstable();
                members
            })
            .collect();
        components.sort();
        components
    }

    /// Copy of every edge, id order. The detectors run over this snapshot.
    pub fn snapshot(&self) -> Vec<Resonance> {
        self.edges.values().cloned().collect()
    }
}
