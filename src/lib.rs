//! # Mantis Resolver
//!
//! Group-by item resolution for a metrics semantic layer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        SemanticManifest (models, measures, metrics)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [graph builder + generators]
//! ┌─────────────────────────────────────────────────────────┐
//! │      SemanticGraph (entities, attributes, metrics,       │
//! │                     measures, time grains)               │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [pathfinder + trie resolver]
//! ┌─────────────────────────────────────────────────────────┐
//! │      DunderNameTrie per measure / metric / no-metrics    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [resolution DAG]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Available items + issues, matched against user input   │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod naming;
pub mod pathfinder;
pub mod resolution;
pub mod time;
pub mod trie;

/// Name of the query-level time dimension.
pub const METRIC_TIME: &str = "metric_time";

pub use config::{ResolverSettings, Settings};
pub use error::{ResolverError, ResolverResult};
pub use graph::{GraphCache, SemanticGraph, SemanticGraphBuilder};
pub use manifest::{ManifestLookup, SemanticManifest};
pub use naming::ElementPathKey;
pub use resolution::{
    GroupByItemResolver, IssueKind, IssueSeverity, ResolutionIssue, ResolutionPurpose, ResolutionResult,
    SemanticResolver,
};
pub use trie::{ItemKind, ItemProperty, ResolvedItem};
