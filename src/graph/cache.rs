//! Shared graph cache keyed by manifest content hash.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::ResolverResult;
use crate::manifest::ManifestLookup;

use super::{SemanticGraph, SemanticGraphBuilder};

/// Graphs are built at most once per manifest version and shared read-only.
#[derive(Debug, Default)]
pub struct GraphCache {
    graphs: DashMap<String, Arc<SemanticGraph>>,
}

impl GraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached graph for this manifest, building it on a miss.
    ///
    /// The build runs under the entry lock, so concurrent callers for the
    /// same manifest wait for one build instead of racing.
    pub fn get_or_build(
        &self,
        lookup: &ManifestLookup,
        builder: &SemanticGraphBuilder,
    ) -> ResolverResult<Arc<SemanticGraph>> {
        let key = lookup.content_hash();
        if let Some(graph) = self.graphs.get(key) {
            debug!(manifest = key, "graph cache hit");
            return Ok(Arc::clone(graph.value()));
        }

        let entry = self.graphs.entry(key.to_string());
        match entry {
            dashmap::mapref::entry::Entry::Occupied(occupied) => Ok(Arc::clone(occupied.get())),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                debug!(manifest = key, "graph cache miss");
                let graph = Arc::new(builder.build(lookup)?);
                vacant.insert(Arc::clone(&graph));
                Ok(graph)
            }
        }
    }

    pub fn get(&self, content_hash: &str) -> Option<Arc<SemanticGraph>> {
        self.graphs.get(content_hash).map(|g| Arc::clone(g.value()))
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn clear(&self) {
        self.graphs.clear();
    }
}
