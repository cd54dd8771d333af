//! Structured resolution issues.
//!
//! Issues are values, not errors: resolution keeps going and reports every
//! problem with the query at once. Each issue records the DAG path it came
//! from, starting at the query sink.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum IssueSeverity {
    Info,
    Warning,
    Error,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Info => "info",
            IssueSeverity::Warning => "warning",
            IssueSeverity::Error => "error",
        }
    }
}

/// Labels of resolution DAG nodes, from the sink down to where the issue arose.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct DagPath(Vec<String>);

impl DagPath {
    pub fn new(origin: impl Into<String>) -> Self {
        Self(vec![origin.into()])
    }

    /// The same path seen from a child node.
    pub fn prepended(&self, label: impl Into<String>) -> Self {
        let mut labels = Vec::with_capacity(self.0.len() + 1);
        labels.push(label.into());
        labels.extend(self.0.iter().cloned());
        Self(labels)
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for DagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" -> "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum IssueKind {
    /// Intersection dropped an element some inputs could provide.
    ExcludedByInput {
        item: String,
        excluded_by: Vec<String>,
        available_in: Vec<String>,
    },
    /// A metric type removed items it cannot be grouped by.
    DisallowedForMetric {
        metric: String,
        reason: String,
        items: Vec<String>,
    },
    NoMatchingItems {
        input: String,
        suggestions: Vec<String>,
    },
    UnsupportedGrain {
        input: String,
        element: String,
        available: Vec<String>,
    },
    AmbiguousName {
        input: String,
        candidate_paths: Vec<String>,
    },
    NotAvailableForAll {
        input: String,
        excluded_by: Vec<String>,
    },
    DuplicateOutputName {
        output_name: String,
        inputs: Vec<String>,
    },
    GroupByMetricNotAllowed {
        input: String,
    },
    ScdRequiresMetricTime {
        input: String,
    },
    InvalidInput {
        input: String,
        reason: String,
    },
}

impl IssueKind {
    pub fn default_severity(&self) -> IssueSeverity {
        match self {
            IssueKind::ExcludedByInput { .. } | IssueKind::DisallowedForMetric { .. } => IssueSeverity::Info,
            _ => IssueSeverity::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolutionIssue {
    pub severity: IssueSeverity,
    pub kind: IssueKind,
    pub dag_path: DagPath,
}

impl ResolutionIssue {
    pub fn new(kind: IssueKind, dag_path: DagPath) -> Self {
        Self {
            severity: kind.default_severity(),
            kind,
            dag_path,
        }
    }

    pub fn with_severity(mut self, severity: IssueSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }

    /// The same issue as seen from a child DAG node.
    pub fn through(&self, label: &str) -> Self {
        Self {
            dag_path: self.dag_path.prepended(label),
            ..self.clone()
        }
    }

    pub fn message(&self) -> String {
        match &self.kind {
            IssueKind::ExcludedByInput {
                item,
                excluded_by,
                available_in,
            } => format!(
                "'{}' is available for {} but not for {}",
                item,
                quoted(available_in),
                quoted(excluded_by)
            ),
            IssueKind::DisallowedForMetric { metric, reason, items } => {
                format!("{} for metric '{}': {}", reason, metric, quoted(items))
            }
            IssueKind::NoMatchingItems { input, suggestions } => {
                let mut message = format!("'{}' does not match any available group-by item", input);
                if !suggestions.is_empty() {
                    message.push_str(&format!(". Suggestions: {}", quoted(suggestions)));
                }
                message
            }
            IssueKind::UnsupportedGrain {
                input,
                element,
                available,
            } => {
                if available.is_empty() {
                    format!(
                        "'{}' requests a grain or date part, but '{}' is not a time dimension",
                        input, element
                    )
                } else {
                    format!(
                        "'{}' requests a grain or date part that '{}' does not support. Available: {}",
                        input,
                        element,
                        quoted(available)
                    )
                }
            }
            IssueKind::AmbiguousName { input, candidate_paths } => format!(
                "'{}' is ambiguous; it can be reached through: {}",
                input,
                candidate_paths.join("; ")
            ),
            IssueKind::NotAvailableForAll { input, excluded_by } => format!(
                "'{}' is not available for {}",
                input,
                quoted(excluded_by)
            ),
            IssueKind::DuplicateOutputName { output_name, inputs } => format!(
                "{} all resolve to the output name '{}'",
                quoted(inputs),
                output_name
            ),
            IssueKind::GroupByMetricNotAllowed { input } => format!(
                "'{}' is a group-by metric and can only be used in a filter",
                input
            ),
            IssueKind::ScdRequiresMetricTime { input } => format!(
                "'{}' is joined through a validity window, so the query must also group by metric_time",
                input
            ),
            IssueKind::InvalidInput { reason, .. } => reason.clone(),
        }
    }
}

impl fmt::Display for ResolutionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (at {})", self.severity.as_str(), self.message(), self.dag_path)
    }
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(", ")
}
