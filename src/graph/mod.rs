//! The semantic graph: entities, attributes, metrics, measures and time grains
//! as nodes; joins, key associations, dunder segments, grain derivations and
//! metric definitions as labeled edges.
//!
//! The graph is built once per manifest by [`SemanticGraphBuilder`] and is
//! immutable afterwards. Nodes and edges are inserted in their total order, so
//! `NodeIndex` order equals node order and iteration never depends on
//! generator or hash order.

mod builder;
mod cache;
pub mod generators;
pub mod types;

pub use builder::SemanticGraphBuilder;
pub use cache::GraphCache;
pub use types::*;

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::error::{ResolverError, ResolverResult};

/// The immutable semantic graph.
#[derive(Debug, Clone)]
pub struct SemanticGraph {
    /// The underlying directed graph
    graph: DiGraph<SemanticNode, EdgeLabel>,

    /// Interning table: node value → NodeIndex
    node_index: HashMap<SemanticNode, NodeIndex>,
}

/// Direct definition inputs of a metric, as recorded by `MetricDefinition` edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricParents {
    pub measures: Vec<String>,
    pub metrics: Vec<String>,
}

impl SemanticGraph {
    /// Freeze a deduplicated edge set into a graph.
    ///
    /// Nodes are the union of all edge endpoints plus `extra_nodes`.
    pub(crate) fn from_edges(
        edges: BTreeSet<SemanticEdge>,
        extra_nodes: BTreeSet<SemanticNode>,
    ) -> Self {
        let mut nodes = extra_nodes;
        for edge in &edges {
            nodes.insert(edge.tail.clone());
            nodes.insert(edge.head.clone());
        }

        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut node_index = HashMap::with_capacity(nodes.len());
        for node in nodes {
            let idx = graph.add_node(node.clone());
            node_index.insert(node, idx);
        }

        for edge in edges {
            // Both endpoints were interned above.
            let tail = node_index[&edge.tail];
            let head = node_index[&edge.head];
            graph.add_edge(tail, head, edge.label);
        }

        Self { graph, node_index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node weight for an index. Indices come from this graph.
    pub fn node(&self, idx: NodeIndex) -> &SemanticNode {
        &self.graph[idx]
    }

    pub fn edge_label(&self, idx: EdgeIndex) -> &EdgeLabel {
        &self.graph[idx]
    }

    pub fn edge_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    pub fn index_of(&self, node: &SemanticNode) -> Option<NodeIndex> {
        self.node_index.get(node).copied()
    }

    /// Like `index_of`, but a missing node is a model-consistency defect.
    pub fn require_index(&self, node: &SemanticNode) -> ResolverResult<NodeIndex> {
        self.index_of(node)
            .ok_or_else(|| ResolverError::MissingGraphNode(node.to_string()))
    }

    pub fn contains(&self, node: &SemanticNode) -> bool {
        self.node_index.contains_key(node)
    }

    /// All nodes in total order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &SemanticNode)> {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// All edges in total order.
    pub fn edges(&self) -> impl Iterator<Item = SemanticEdge> + '_ {
        self.graph.edge_references().map(move |e| {
            SemanticEdge::new(
                self.graph[e.source()].clone(),
                self.graph[e.target()].clone(),
                e.weight().clone(),
            )
        })
    }

    pub fn has_edge(&self, edge: &SemanticEdge) -> bool {
        let (Some(tail), Some(head)) = (self.index_of(&edge.tail), self.index_of(&edge.head)) else {
            return false;
        };
        self.graph
            .edges_connecting(tail, head)
            .any(|e| e.weight() == &edge.label)
    }

    /// Outgoing edges of a node as (edge, head, label).
    pub fn outgoing(
        &self,
        idx: NodeIndex,
    ) -> impl Iterator<Item = (EdgeIndex, NodeIndex, &EdgeLabel)> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target(), e.weight()))
    }

    /// Nodes of the given kind, in total order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeIndex> {
        self.nodes()
            .filter(|(_, node)| node.kind() == kind)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Measures and metrics a metric is directly defined from.
    pub fn metric_parents(&self, metric_name: &str) -> ResolverResult<MetricParents> {
        let idx = self.require_index(&SemanticNode::metric(metric_name))?;

        let mut parents = MetricParents::default();
        let mut incoming: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter(|e| e.weight().kind == EdgeKind::MetricDefinition)
            .map(|e| e.source())
            .collect();
        incoming.sort();
        incoming.dedup();

        for tail in incoming {
            match &self.graph[tail] {
                SemanticNode::Measure { measure_name } => parents.measures.push(measure_name.clone()),
                SemanticNode::Metric { metric_name } => parents.metrics.push(metric_name.clone()),
                other => {
                    return Err(ResolverError::InvalidMetricDefinition {
                        metric: metric_name.to_string(),
                        reason: format!("unexpected definition input {}", other),
                    })
                }
            }
        }
        Ok(parents)
    }

    /// Deterministic, serializable view of the graph.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes().map(|(_, n)| n.to_string()).collect(),
            edges: self.edges().map(|e| e.to_string()).collect(),
        }
    }
}

/// Sorted, rendered nodes and edges of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<String>,
    pub edges: Vec<String>,
}

impl GraphSnapshot {
    /// Line-oriented rendering: one node or edge per line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            out.push_str(node);
            out.push('\n');
        }
        for edge in &self.edges {
            out.push_str(edge);
            out.push('\n');
        }
        out
    }
}
