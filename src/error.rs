//! Fatal error types.
//!
//! These abort resolution. Problems with what a user asked for (unknown
//! group-by names, items unavailable for some metric, ambiguous names) are not
//! errors; they are reported as `ResolutionIssue`s alongside the result.

use crate::config::SettingsError;

/// Result type for resolver operations.
pub type ResolverResult<T> = Result<T, ResolverError>;

/// Errors that abort graph construction or resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// A reference into the manifest points at a semantic model that does not exist.
    #[error("Unknown semantic model: '{0}'")]
    UnknownSemanticModel(String),

    /// A metric references a measure that does not exist.
    #[error("Unknown measure: '{0}'")]
    UnknownMeasure(String),

    /// A query or metric references a metric that does not exist.
    #[error("Unknown metric: '{name}'{}", format_suggestions(.suggestions))]
    UnknownMetric {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("Unknown entity '{entity}' referenced by {referenced_by}")]
    UnknownEntity {
        entity: String,
        referenced_by: String,
    },

    /// A measure's aggregation time dimension is missing or is not a time dimension.
    #[error("Unknown time dimension '{dimension}' on semantic model '{semantic_model}'")]
    UnknownDimension {
        semantic_model: String,
        dimension: String,
    },

    /// A metric is missing the type parameters its metric type requires.
    #[error("Invalid definition for metric '{metric}': {reason}")]
    InvalidMetricDefinition { metric: String, reason: String },

    /// A generator or resolver asked the graph for a node it does not contain.
    #[error("Node not present in semantic graph: {0}")]
    MissingGraphNode(String),

    /// Metric composition loops back on itself.
    #[error("Metric composition cycle: {}", .cycle.join(" -> "))]
    MetricCycle { cycle: Vec<String> },

    #[error("Failed to parse manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(". Did you mean: {}?", suggestions.join(", "))
    }
}
