//! Group-by resolution for queries.
//!
//! [`SemanticResolver`] owns a manifest and its semantic graph. For a set of
//! metrics it hands out a [`GroupByItemResolver`], which builds the
//! [`ResolutionDag`], evaluates it once, and then answers:
//!
//! - which items the query may group by (`resolve_available_items`)
//! - which item each user input names (`resolve_request`)
//!
//! User mistakes come back as [`ResolutionIssue`]s next to the result. Only
//! broken manifests, unknown metrics and composition cycles are errors.

mod dag;
mod issues;
mod items;
mod resolver;

pub use dag::{DagEvaluation, DagNode, DagNodeOutput, ResolutionDag, VariantExclusion};
pub use issues::{DagPath, IssueKind, IssueSeverity, ResolutionIssue};
pub use items::ResolvedItemSet;
pub use resolver::{AvailableItems, GroupByItemResolver, ResolutionPurpose, ResolutionResult, ResolvedInput};

use std::sync::Arc;

use tracing::info;

use crate::config::ResolverSettings;
use crate::error::ResolverResult;
use crate::graph::{GraphCache, SemanticGraph, SemanticGraphBuilder};
use crate::manifest::{ManifestLookup, SemanticManifest};

/// Entry point: a manifest, its graph, and resolver settings.
pub struct SemanticResolver {
    lookup: ManifestLookup,
    graph: Arc<SemanticGraph>,
    settings: ResolverSettings,
}

impl SemanticResolver {
    /// Index the manifest and build its graph.
    pub fn new(manifest: SemanticManifest, settings: ResolverSettings) -> ResolverResult<Self> {
        settings.validate()?;
        let lookup = ManifestLookup::new(manifest)?;
        let graph = Arc::new(SemanticGraphBuilder::new().build(&lookup)?);
        Ok(Self::from_parts(lookup, graph, settings))
    }

    /// Like [`SemanticResolver::new`], reusing a graph already built for an
    /// identical manifest.
    pub fn with_cache(
        manifest: SemanticManifest,
        settings: ResolverSettings,
        cache: &GraphCache,
    ) -> ResolverResult<Self> {
        settings.validate()?;
        let lookup = ManifestLookup::new(manifest)?;
        let graph = cache.get_or_build(&lookup, &SemanticGraphBuilder::new())?;
        Ok(Self::from_parts(lookup, graph, settings))
    }

    fn from_parts(lookup: ManifestLookup, graph: Arc<SemanticGraph>, settings: ResolverSettings) -> Self {
        info!(
            manifest = lookup.content_hash(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Semantic resolver ready"
        );
        Self {
            lookup,
            graph,
            settings,
        }
    }

    pub fn lookup(&self) -> &ManifestLookup {
        &self.lookup
    }

    pub fn graph(&self) -> &SemanticGraph {
        &self.graph
    }

    pub fn shared_graph(&self) -> Arc<SemanticGraph> {
        Arc::clone(&self.graph)
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// A resolver for queries over `metrics`. An empty list means a query
    /// without metrics.
    pub fn for_metrics(&self, metrics: &[&str]) -> ResolverResult<GroupByItemResolver<'_>> {
        GroupByItemResolver::new(&self.lookup, &self.graph, &self.settings, metrics)
    }
}
