//! Graph construction: run every subgraph generator and union the results.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::ResolverResult;
use crate::manifest::ManifestLookup;

use super::generators::{default_generators, SubgraphGenerator};
use super::{SemanticEdge, SemanticGraph, SemanticNode};

/// Builds a [`SemanticGraph`] from a manifest lookup.
///
/// Each generator writes into its own edge list. The lists are merged into
/// one ordered set, so the result is independent of generator order and
/// overlapping edges collapse into one.
pub struct SemanticGraphBuilder {
    generators: Vec<Box<dyn SubgraphGenerator>>,
}

impl SemanticGraphBuilder {
    /// Builder with every default generator.
    pub fn new() -> Self {
        Self {
            generators: default_generators(),
        }
    }

    /// Builder with an explicit generator list.
    pub fn with_generators(generators: Vec<Box<dyn SubgraphGenerator>>) -> Self {
        Self { generators }
    }

    pub fn generator_names(&self) -> Vec<&'static str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    pub fn build(&self, lookup: &ManifestLookup) -> ResolverResult<SemanticGraph> {
        let mut edges: BTreeSet<SemanticEdge> = BTreeSet::new();

        for generator in &self.generators {
            let mut out = Vec::new();
            generator.add_edges(lookup, &mut out)?;
            debug!(generator = generator.name(), edges = out.len(), "ran subgraph generator");
            edges.extend(out);
        }

        // Entities and metrics are nodes even when nothing connects them.
        let mut extra_nodes: BTreeSet<SemanticNode> = lookup
            .entity_names()
            .map(SemanticNode::entity)
            .collect();
        extra_nodes.extend(lookup.metrics().map(|m| SemanticNode::metric(&m.name)));

        let graph = SemanticGraph::from_edges(edges, extra_nodes);
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            manifest = lookup.content_hash(),
            "built semantic graph"
        );
        Ok(graph)
    }
}

impl Default for SemanticGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
