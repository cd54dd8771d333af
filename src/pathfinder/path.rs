//! Paths discovered by the pathfinder.

use std::cmp::Ordering;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::graph::{EdgeLabel, NodeKind, SemanticGraph};

/// An ordered sequence of edges from a source node.
///
/// Carries the accumulated weight and the dunder segments contributed by the
/// traversed edges, in traversal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    nodes: Vec<NodeIndex>,
    edges: Vec<EdgeIndex>,
    weight: u32,
    validity_edges: usize,
    segments: Vec<String>,
    /// Model the source node belongs to (measures and metrics only).
    source_model: Option<String>,
    source_kind: NodeKind,
}

impl Path {
    /// The empty path at `source`. Never reported as a result.
    pub(crate) fn start(graph: &SemanticGraph, source: NodeIndex) -> Self {
        Self {
            nodes: vec![source],
            edges: vec![],
            weight: 0,
            validity_edges: 0,
            segments: vec![],
            source_model: None,
            source_kind: graph.node(source).kind(),
        }
    }

    /// This path followed by one more edge.
    pub(crate) fn extended(&self, edge: EdgeIndex, head: NodeIndex, label: &EdgeLabel, weight: u32) -> Self {
        let mut next = self.clone();
        if next.edges.is_empty() && matches!(self.source_kind, NodeKind::Measure | NodeKind::Metric) {
            next.source_model = label.semantic_model.clone();
        }
        next.nodes.push(head);
        next.edges.push(edge);
        next.weight += weight;
        if label.validity_window {
            next.validity_edges += 1;
        }
        if let Some(segment) = &label.segment {
            next.segments.push(segment.clone());
        }
        next
    }

    pub fn source(&self) -> NodeIndex {
        self.nodes[0]
    }

    pub fn terminal(&self) -> NodeIndex {
        self.nodes[self.nodes.len() - 1]
    }

    /// Nodes visited, source first.
    pub fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }

    pub fn last_edge(&self) -> Option<EdgeIndex> {
        self.edges.last().copied()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn validity_edges(&self) -> usize {
        self.validity_edges
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn source_model(&self) -> Option<&str> {
        self.source_model.as_deref()
    }

    pub fn contains_edge(&self, edge: EdgeIndex) -> bool {
        self.edges.contains(&edge)
    }

    pub fn contains_node(&self, node: NodeIndex) -> bool {
        self.nodes.contains(&node)
    }

    /// Render as `A -> B -> C` using node display names.
    pub fn describe(&self, graph: &SemanticGraph) -> String {
        self.nodes
            .iter()
            .map(|idx| graph.node(*idx).to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

// Priority order: lighter first, then shorter, then by node and edge order.
// Indices follow the graph's total order, so ties never depend on identity.
impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then_with(|| self.edges.len().cmp(&other.edges.len()))
            .then_with(|| self.nodes.cmp(&other.nodes))
            .then_with(|| self.edges.cmp(&other.edges))
    }
}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Paths found by one traversal, in discovery (priority) order.
#[derive(Debug, Clone, Default)]
pub struct PathSet {
    paths: Vec<Path>,
}

impl PathSet {
    pub(crate) fn push(&mut self, path: Path) {
        self.paths.push(path);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Paths ending at `node`.
    pub fn ending_at(&self, node: NodeIndex) -> impl Iterator<Item = &Path> {
        self.paths.iter().filter(move |p| p.terminal() == node)
    }
}

impl IntoIterator for PathSet {
    type Item = Path;
    type IntoIter = std::vec::IntoIter<Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}
