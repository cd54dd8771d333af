//! Weighted, cycle-safe traversal over the semantic graph.
//!
//! The pathfinder starts at every source node at once and expands paths in
//! priority order (weight, edge count, node order). The semantic graph has
//! cycles, so termination rests on the pruning rules below rather than on
//! a visited set:
//!
//! - an edge is never reused within a path
//! - a path crosses at most one validity-window (SCD) edge
//! - a path heavier than `max_weight` is dropped
//! - a path with `max_edges` edges is not extended
//!
//! Termination predicates keep a path but stop extending it.

mod path;

pub use path::{Path, PathSet};

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::graph::NodeIndex;
use tracing::{trace, warn};

use crate::graph::{EdgeLabel, NodeKind, SemanticGraph};

/// Validity-window edges a single path may cross.
pub const MAX_VALIDITY_EDGES: usize = 1;

// ============================================================================
// Weight functions
// ============================================================================

/// Cost of extending a path by one edge.
pub trait WeightFunction {
    fn edge_weight(&self, path: &Path, label: &EdgeLabel) -> u32;
}

/// Every edge costs one: plain hop count.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeCountWeight;

impl WeightFunction for EdgeCountWeight {
    fn edge_weight(&self, _path: &Path, _label: &EdgeLabel) -> u32 {
        1
    }
}

/// Counts hops that join in a semantic model other than the source's own.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinCountWeight;

impl WeightFunction for JoinCountWeight {
    fn edge_weight(&self, path: &Path, label: &EdgeLabel) -> u32 {
        if !label.is_join_hop() {
            return 0;
        }
        match (path.source_model(), label.semantic_model.as_deref()) {
            (Some(source), Some(model)) if source == model => 0,
            _ => 1,
        }
    }
}

// ============================================================================
// Termination predicates
// ============================================================================

/// Decides whether a discovered path should stop being extended.
pub trait TerminationPredicate {
    fn should_stop(&self, graph: &SemanticGraph, path: &Path) -> bool;
}

/// Stop once the path reaches a node of the given kind.
#[derive(Debug, Clone, Copy)]
pub struct StopAtNodeKind(pub NodeKind);

impl TerminationPredicate for StopAtNodeKind {
    fn should_stop(&self, graph: &SemanticGraph, path: &Path) -> bool {
        graph.node(path.terminal()).kind() == self.0
    }
}

/// Stop once the last nodes of the path have exactly these kinds.
#[derive(Debug, Clone)]
pub struct StopAtSuffix(pub Vec<NodeKind>);

impl TerminationPredicate for StopAtSuffix {
    fn should_stop(&self, graph: &SemanticGraph, path: &Path) -> bool {
        let nodes = path.nodes();
        if self.0.is_empty() || nodes.len() < self.0.len() {
            return false;
        }
        nodes[nodes.len() - self.0.len()..]
            .iter()
            .zip(&self.0)
            .all(|(idx, kind)| graph.node(*idx).kind() == *kind)
    }
}

/// Stop once the terminal node already appeared earlier in the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopOnRepeatedNode;

impl TerminationPredicate for StopOnRepeatedNode {
    fn should_stop(&self, _graph: &SemanticGraph, path: &Path) -> bool {
        let (last, rest) = match path.nodes().split_last() {
            Some(split) => split,
            None => return false,
        };
        rest.contains(last)
    }
}

// ============================================================================
// Pathfinder
// ============================================================================

type EdgeFilter<'g> = Box<dyn Fn(&Path, &EdgeLabel, NodeIndex) -> bool + 'g>;

/// Traversal engine over one graph.
pub struct Pathfinder<'g> {
    graph: &'g SemanticGraph,
    max_edges: usize,
    predicates: Vec<Box<dyn TerminationPredicate + 'g>>,
    edge_filter: Option<EdgeFilter<'g>>,
}

impl<'g> Pathfinder<'g> {
    pub fn new(graph: &'g SemanticGraph, max_edges: usize) -> Self {
        Self {
            graph,
            max_edges,
            predicates: Vec::new(),
            edge_filter: None,
        }
    }

    pub fn with_predicate(mut self, predicate: impl TerminationPredicate + 'g) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Only follow edges for which `filter(path, label, head)` holds.
    pub fn with_edge_filter(
        mut self,
        filter: impl Fn(&Path, &EdgeLabel, NodeIndex) -> bool + 'g,
    ) -> Self {
        self.edge_filter = Some(Box::new(filter));
        self
    }

    pub fn graph(&self) -> &'g SemanticGraph {
        self.graph
    }

    /// Find every admissible path from any of `sources` whose weight stays
    /// within `max_weight`. Results come out in priority order.
    pub fn find_paths(
        &self,
        sources: &[NodeIndex],
        weight_fn: &dyn WeightFunction,
        max_weight: u32,
    ) -> PathSet {
        let mut queue: BinaryHeap<Reverse<Path>> = sources
            .iter()
            .map(|source| Reverse(Path::start(self.graph, *source)))
            .collect();

        let mut found = PathSet::default();
        let mut expanded = 0usize;
        let mut truncated = 0usize;

        while let Some(Reverse(path)) = queue.pop() {
            if !path.is_empty() {
                if self.predicates.iter().any(|p| p.should_stop(self.graph, &path)) {
                    found.push(path);
                    continue;
                }
                if path.len() >= self.max_edges {
                    if self.graph.outgoing(path.terminal()).next().is_some() {
                        truncated += 1;
                    }
                    found.push(path);
                    continue;
                }
            }

            expanded += 1;
            let mut outgoing: Vec<_> = self.graph.outgoing(path.terminal()).collect();
            outgoing.sort_by_key(|(edge, _, _)| *edge);

            for (edge, head, label) in outgoing {
                if path.contains_edge(edge) {
                    continue;
                }
                if label.validity_window && path.validity_edges() >= MAX_VALIDITY_EDGES {
                    continue;
                }
                if let Some(filter) = &self.edge_filter {
                    if !filter(&path, label, head) {
                        continue;
                    }
                }

                let weight = path.weight().saturating_add(weight_fn.edge_weight(&path, label));
                if weight > max_weight {
                    continue;
                }
                queue.push(Reverse(path.extended(edge, head, label, weight - path.weight())));
            }

            if !path.is_empty() {
                found.push(path);
            }
        }

        trace!(sources = sources.len(), expanded, found = found.len(), "pathfinder finished");
        if truncated > 0 {
            warn!(
                truncated,
                max_edges = self.max_edges,
                "paths stopped at the edge limit with edges left to follow"
            );
        }
        found
    }
}
