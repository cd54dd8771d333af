//! Resolving group-by inputs against the items available to a query.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ResolverSettings;
use crate::error::ResolverResult;
use crate::graph::SemanticGraph;
use crate::manifest::ManifestLookup;
use crate::naming::{suggest, InputParser, ParsedInput, SpecPattern, DATE_PART_PREFIX};
use crate::trie::{AttributeTrieResolver, ElementFilter, ItemKind, ItemProperty, ResolvedItem};

use super::dag::{DagNodeOutput, ResolutionDag};
use super::issues::{DagPath, IssueKind, ResolutionIssue};

/// Why items are being resolved. Group-by metrics may only appear in filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResolutionPurpose {
    GroupBy,
    Filter,
}

/// Items a query may group by, plus the issues met computing them.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableItems {
    pub items: Vec<ResolvedItem>,
    pub issues: Vec<ResolutionIssue>,
}

/// One input matched to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedInput {
    pub input: String,
    pub item: ResolvedItem,
    /// Column name the item will be selected as.
    pub output_name: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionResult {
    /// Resolved inputs in request order, one per distinct item.
    pub resolved: Vec<ResolvedInput>,
    pub issues: Vec<ResolutionIssue>,
}

impl ResolutionResult {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ResolutionIssue::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ResolutionIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    /// Qualified names of the resolved items.
    pub fn names(&self) -> Vec<String> {
        self.resolved.iter().map(|r| r.item.key.qualified_name()).collect()
    }
}

/// Resolves group-by inputs for a fixed set of metrics.
///
/// The resolution DAG is built and evaluated once on construction; every
/// later request reuses the sink's items.
pub struct GroupByItemResolver<'a> {
    settings: &'a ResolverSettings,
    dag: ResolutionDag,
    sink: DagNodeOutput,
    parser: InputParser,
}

impl<'a> GroupByItemResolver<'a> {
    pub fn new(
        lookup: &'a ManifestLookup,
        graph: &'a SemanticGraph,
        settings: &'a ResolverSettings,
        metrics: &[&str],
    ) -> ResolverResult<Self> {
        let dag = ResolutionDag::build(graph, lookup, metrics, &settings.suggestions)?;
        let trie_resolver = AttributeTrieResolver::new(graph, settings);
        let sink = dag.evaluate(&trie_resolver)?.into_sink_output();

        debug!(
            metrics = ?metrics,
            items = sink.items.len(),
            issues = sink.issues.len(),
            "Resolved available group-by items"
        );

        Ok(Self {
            settings,
            dag,
            sink,
            parser: InputParser::for_lookup(lookup),
        })
    }

    pub fn dag(&self) -> &ResolutionDag {
        &self.dag
    }

    fn sink_path(&self) -> DagPath {
        DagPath::new(self.dag.node(self.dag.sink()).to_string())
    }

    /// Items valid for every metric of the query, in key order.
    pub fn resolve_available_items(
        &self,
        purpose: ResolutionPurpose,
        filter: Option<&ElementFilter>,
    ) -> AvailableItems {
        let items = self
            .sink
            .items
            .iter()
            .filter(|item| purpose == ResolutionPurpose::Filter || item.kind != ItemKind::Metric)
            .filter(|item| filter.map_or(true, |f| f.allows(item)))
            .cloned()
            .collect();

        AvailableItems {
            items,
            issues: self.sink.issues.clone(),
        }
    }

    /// Match each input to exactly one available item.
    pub fn resolve_request<S: AsRef<str>>(&self, inputs: &[S], purpose: ResolutionPurpose) -> ResolutionResult {
        let candidates: Vec<&ResolvedItem> = self.sink.items.iter().collect();
        let mut result = ResolutionResult::default();

        for input in inputs {
            let raw = input.as_ref();
            let parsed = match self.parser.parse(raw) {
                Ok(parsed) => parsed,
                Err(err) => {
                    result.issues.push(ResolutionIssue::new(
                        IssueKind::InvalidInput {
                            input: raw.to_string(),
                            reason: err.to_string(),
                        },
                        self.sink_path(),
                    ));
                    continue;
                }
            };

            let matched = parsed.pattern().match_items(&candidates);
            let Some(item) = matched.first() else {
                result.issues.push(self.diagnose_unmatched(&parsed, &candidates));
                continue;
            };

            if item.ambiguous {
                result.issues.push(ResolutionIssue::new(
                    IssueKind::AmbiguousName {
                        input: raw.to_string(),
                        candidate_paths: item.paths.iter().map(|p| p.to_string()).collect(),
                    },
                    self.sink_path(),
                ));
                continue;
            }
            if item.kind == ItemKind::Metric && purpose == ResolutionPurpose::GroupBy {
                result.issues.push(ResolutionIssue::new(
                    IssueKind::GroupByMetricNotAllowed {
                        input: raw.to_string(),
                    },
                    self.sink_path(),
                ));
                continue;
            }

            result.resolved.push(ResolvedInput {
                input: raw.to_string(),
                output_name: self.parser.input_str(item),
                item: (*item).clone(),
                descending: parsed.descending,
            });
        }

        self.check_query(&mut result);

        info!(
            inputs = inputs.len(),
            resolved = result.resolved.len(),
            errors = result.errors().count(),
            "Resolved group-by request"
        );
        result
    }

    /// Explain why nothing matched, most specific cause first.
    fn diagnose_unmatched(&self, parsed: &ParsedInput, candidates: &[&ResolvedItem]) -> ResolutionIssue {
        let raw = parsed.raw.clone();

        // A metric type removed exactly this variant.
        let qualified = parsed.key.qualified_name();
        let disallowed = self.excluded(|kind| match kind {
            IssueKind::DisallowedForMetric { metric, items, .. } if items.contains(&qualified) => {
                Some(vec![metric.clone()])
            }
            _ => None,
        });
        if let Some((excluded_by, dag_path)) = disallowed {
            return ResolutionIssue::new(IssueKind::NotAvailableForAll { input: raw, excluded_by }, dag_path);
        }

        // Other inputs offer this grain or date part, but not all of them.
        if let Some(exclusion) = self.sink.excluded_variants.get(&parsed.key) {
            return ResolutionIssue::new(
                IssueKind::NotAvailableForAll {
                    input: raw,
                    excluded_by: exclusion.excluded_by.clone(),
                },
                exclusion.dag_path.clone(),
            );
        }

        let variants: Vec<&ResolvedItem> = candidates
            .iter()
            .copied()
            .filter(|item| item.key.same_element(&parsed.key))
            .filter(|item| parsed.kind.map_or(true, |kind| kind == item.kind))
            .collect();
        if !variants.is_empty() {
            let available = variants
                .iter()
                .filter_map(|item| {
                    item.key
                        .time_grain
                        .as_ref()
                        .map(|g| g.name().to_string())
                        .or_else(|| item.key.date_part.map(|p| format!("{}{}", DATE_PART_PREFIX, p.as_str())))
                })
                .collect();
            return ResolutionIssue::new(
                IssueKind::UnsupportedGrain {
                    input: raw,
                    element: parsed.key.dunder_name(),
                    available,
                },
                self.sink_path(),
            );
        }

        let identity = parsed.key.element_identity().qualified_name();
        let intersected = self.excluded(|kind| match kind {
            IssueKind::ExcludedByInput { item, excluded_by, .. } if *item == identity => Some(excluded_by.clone()),
            _ => None,
        });
        if let Some((excluded_by, dag_path)) = intersected {
            return ResolutionIssue::new(IssueKind::NotAvailableForAll { input: raw, excluded_by }, dag_path);
        }

        let names: Vec<String> = candidates.iter().map(|item| self.parser.input_str(item)).collect();
        let lowered = raw.trim().trim_start_matches('-').to_lowercase();
        ResolutionIssue::new(
            IssueKind::NoMatchingItems {
                suggestions: suggest(&lowered, &names, &self.settings.suggestions),
                input: raw,
            },
            self.sink_path(),
        )
    }

    /// First sink issue that `select` maps to a list of excluding inputs.
    fn excluded(&self, select: impl Fn(&IssueKind) -> Option<Vec<String>>) -> Option<(Vec<String>, DagPath)> {
        self.sink
            .issues
            .iter()
            .find_map(|issue| select(&issue.kind).map(|names| (names, issue.dag_path.clone())))
    }

    /// Checks across the whole request: output names and SCD joins.
    fn check_query(&self, result: &mut ResolutionResult) {
        let mut by_output: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for resolved in &result.resolved {
            by_output
                .entry(resolved.output_name.clone())
                .or_default()
                .push(resolved.input.clone());
        }
        for (output_name, inputs) in &by_output {
            if inputs.len() > 1 {
                result.issues.push(ResolutionIssue::new(
                    IssueKind::DuplicateOutputName {
                        output_name: output_name.clone(),
                        inputs: inputs.clone(),
                    },
                    self.sink_path(),
                ));
            }
        }
        let mut seen = BTreeSet::new();
        result.resolved.retain(|r| seen.insert(r.output_name.clone()));

        if self.settings.allow_scd_without_metric_time {
            return;
        }
        let has_metric_time = result.resolved.iter().any(|r| r.item.has(ItemProperty::MetricTime));
        if has_metric_time {
            return;
        }
        for resolved in &result.resolved {
            if resolved.item.has(ItemProperty::ScdHop) {
                result.issues.push(ResolutionIssue::new(
                    IssueKind::ScdRequiresMetricTime {
                        input: resolved.input.clone(),
                    },
                    self.sink_path(),
                ));
            }
        }
    }
}
