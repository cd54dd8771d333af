//! The resolution DAG.
//!
//! One node per measure and metric a query depends on, plus a query sink.
//! Edges run from inputs to the nodes that consume them. Evaluation walks the
//! DAG in topological order: sources resolve their items from the semantic
//! graph, composite nodes intersect their parents, and issues flow toward the
//! sink with their DAG path extended at each step.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::{debug, trace};

use crate::config::SuggestionSettings;
use crate::error::{ResolverError, ResolverResult};
use crate::graph::SemanticGraph;
use crate::manifest::{ManifestLookup, MetricType};
use crate::naming::{suggest, ElementPathKey, KindWithoutPropertyPattern, SpecPattern};
use crate::trie::{AttributeTrieResolver, ItemKind, ItemProperty};

use super::issues::{DagPath, IssueKind, ResolutionIssue};
use super::items::ResolvedItemSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DagNode {
    /// Source for a query without metrics.
    NoMetricsSource,
    MeasureSource { measure: String },
    /// Simple or cumulative metric over one measure.
    SimpleMetric { metric: String, metric_type: MetricType },
    /// Ratio, derived or conversion metric over several inputs.
    CompositeMetric { metric: String, metric_type: MetricType },
    Query { metrics: Vec<String> },
}

impl DagNode {
    /// The measure or metric name, used when naming excluding inputs.
    pub fn name(&self) -> &str {
        match self {
            DagNode::NoMetricsSource => "no metrics",
            DagNode::MeasureSource { measure } => measure,
            DagNode::SimpleMetric { metric, .. } | DagNode::CompositeMetric { metric, .. } => metric,
            DagNode::Query { .. } => "query",
        }
    }
}

impl fmt::Display for DagNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DagNode::NoMetricsSource => f.write_str("NoMetricsSource"),
            DagNode::MeasureSource { measure } => write!(f, "Measure({})", measure),
            DagNode::SimpleMetric { metric, .. } | DagNode::CompositeMetric { metric, .. } => {
                write!(f, "Metric({})", metric)
            }
            DagNode::Query { .. } => f.write_str("Query"),
        }
    }
}

/// A grain or date-part variant some inputs lacked while its element
/// survived the intersection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantExclusion {
    pub excluded_by: Vec<String>,
    pub dag_path: DagPath,
}

/// Items and issues computed for one DAG node.
#[derive(Debug, Clone, Default)]
pub struct DagNodeOutput {
    pub items: ResolvedItemSet,
    pub issues: Vec<ResolutionIssue>,
    /// Not reported as issues; consulted when an input names one of these.
    pub excluded_variants: BTreeMap<ElementPathKey, VariantExclusion>,
}

/// Outputs of every node after evaluation.
#[derive(Debug, Clone)]
pub struct DagEvaluation {
    outputs: HashMap<NodeIndex, DagNodeOutput>,
    sink: NodeIndex,
}

impl DagEvaluation {
    pub fn output(&self, idx: NodeIndex) -> Option<&DagNodeOutput> {
        self.outputs.get(&idx)
    }

    pub fn sink_output(&self) -> Option<&DagNodeOutput> {
        self.outputs.get(&self.sink)
    }

    pub fn into_sink_output(mut self) -> DagNodeOutput {
        self.outputs.remove(&self.sink).unwrap_or_default()
    }
}

pub struct ResolutionDag {
    dag: DiGraph<DagNode, ()>,
    sink: NodeIndex,
}

impl ResolutionDag {
    /// Build the DAG for a query over `metrics` (possibly none).
    ///
    /// Fails on unknown metrics (with suggestions) and on composition cycles.
    pub fn build(
        graph: &SemanticGraph,
        lookup: &ManifestLookup,
        metrics: &[&str],
        suggestions: &SuggestionSettings,
    ) -> ResolverResult<Self> {
        let mut builder = DagBuilder {
            graph,
            lookup,
            suggestions,
            dag: DiGraph::new(),
            metric_nodes: HashMap::new(),
            measure_nodes: HashMap::new(),
            visiting: Vec::new(),
        };

        let mut parents = Vec::new();
        if metrics.is_empty() {
            parents.push(builder.dag.add_node(DagNode::NoMetricsSource));
        }
        for metric in metrics {
            let idx = builder.metric_node(metric)?;
            if !parents.contains(&idx) {
                parents.push(idx);
            }
        }

        let mut dag = builder.dag;
        let sink = dag.add_node(DagNode::Query {
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
        });
        for parent in parents {
            dag.add_edge(parent, sink, ());
        }

        debug!(
            nodes = dag.node_count(),
            metrics = metrics.len(),
            "Built resolution DAG"
        );
        Ok(Self { dag, sink })
    }

    pub fn sink(&self) -> NodeIndex {
        self.sink
    }

    pub fn node(&self, idx: NodeIndex) -> &DagNode {
        &self.dag[idx]
    }

    pub fn node_count(&self) -> usize {
        self.dag.node_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &DagNode)> {
        self.dag.node_indices().map(move |idx| (idx, &self.dag[idx]))
    }

    /// Direct inputs of a node, in insertion order.
    pub fn parents(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut parents: Vec<_> = self.dag.neighbors_directed(idx, Direction::Incoming).collect();
        parents.sort();
        parents
    }

    /// Nodes with no inputs.
    pub fn sources(&self) -> Vec<NodeIndex> {
        self.dag
            .node_indices()
            .filter(|idx| self.dag.neighbors_directed(*idx, Direction::Incoming).next().is_none())
            .collect()
    }

    pub fn topological_order(&self) -> ResolverResult<Vec<NodeIndex>> {
        toposort(&self.dag, None).map_err(|cycle| ResolverError::MetricCycle {
            cycle: vec![self.dag[cycle.node_id()].to_string()],
        })
    }

    /// Evaluate every node, sources first.
    pub fn evaluate(&self, resolver: &AttributeTrieResolver<'_>) -> ResolverResult<DagEvaluation> {
        let mut outputs: HashMap<NodeIndex, DagNodeOutput> = HashMap::new();

        for idx in self.topological_order()? {
            let node = &self.dag[idx];
            let parents = self.parents(idx);
            let output = match node {
                DagNode::NoMetricsSource => DagNodeOutput {
                    items: ResolvedItemSet::from_trie(resolver.resolve_without_metrics(None)?),
                    ..Default::default()
                },
                DagNode::MeasureSource { measure } => DagNodeOutput {
                    items: ResolvedItemSet::from_trie(resolver.resolve_measure(measure, None)?),
                    ..Default::default()
                },
                DagNode::SimpleMetric { metric, metric_type } => {
                    let mut output = self.combine(idx, &parents, &outputs);
                    output
                        .items
                        .union(&ResolvedItemSet::from_trie(resolver.resolve_metric_scope(metric, None)?));
                    if *metric_type == MetricType::Cumulative {
                        self.drop_date_parts(idx, metric, &mut output);
                    }
                    output
                }
                DagNode::CompositeMetric { metric, .. } => {
                    let mut output = self.combine(idx, &parents, &outputs);
                    output
                        .items
                        .union(&ResolvedItemSet::from_trie(resolver.resolve_metric_scope(metric, None)?));
                    output
                }
                DagNode::Query { .. } => self.combine(idx, &parents, &outputs),
            };

            trace!(
                node = %node,
                items = output.items.len(),
                issues = output.issues.len(),
                "Evaluated DAG node"
            );
            outputs.insert(idx, output);
        }

        Ok(DagEvaluation {
            outputs,
            sink: self.sink,
        })
    }

    /// Intersect parent items and carry parent issues through this node.
    fn combine(
        &self,
        idx: NodeIndex,
        parents: &[NodeIndex],
        outputs: &HashMap<NodeIndex, DagNodeOutput>,
    ) -> DagNodeOutput {
        let label = self.dag[idx].to_string();
        let parent_outputs: Vec<(NodeIndex, &DagNodeOutput)> = parents
            .iter()
            .filter_map(|p| outputs.get(p).map(|o| (*p, o)))
            .collect();

        let mut issues: Vec<ResolutionIssue> = Vec::new();
        for (_, output) in &parent_outputs {
            for issue in &output.issues {
                let seen = issue.through(&label);
                if !issues.contains(&seen) {
                    issues.push(seen);
                }
            }
        }

        let mut excluded_variants = BTreeMap::new();
        for (_, output) in &parent_outputs {
            for (key, exclusion) in &output.excluded_variants {
                excluded_variants
                    .entry(key.clone())
                    .or_insert_with(|| VariantExclusion {
                        excluded_by: exclusion.excluded_by.clone(),
                        dag_path: exclusion.dag_path.prepended(label.as_str()),
                    });
            }
        }

        if parent_outputs.len() == 1 {
            return DagNodeOutput {
                items: parent_outputs[0].1.items.clone(),
                issues,
                excluded_variants,
            };
        }

        let sets: Vec<&ResolvedItemSet> = parent_outputs.iter().map(|(_, o)| &o.items).collect();
        let items = ResolvedItemSet::intersection(&sets);

        // Report elements some inputs provide but others lack. Grain-only
        // differences are not exclusions.
        let identities: Vec<BTreeSet<_>> = sets.iter().map(|s| s.element_identities()).collect();
        let all: BTreeSet<_> = identities.iter().flatten().cloned().collect();
        for identity in all {
            let mut available_in = Vec::new();
            let mut excluded_by = Vec::new();
            for ((parent, _), ids) in parent_outputs.iter().zip(&identities) {
                let name = self.dag[*parent].name().to_string();
                if ids.contains(&identity) {
                    available_in.push(name);
                } else {
                    excluded_by.push(name);
                }
            }
            if !excluded_by.is_empty() {
                issues.push(ResolutionIssue::new(
                    IssueKind::ExcludedByInput {
                        item: identity.qualified_name(),
                        excluded_by,
                        available_in,
                    },
                    DagPath::new(label.clone()),
                ));
            }
        }

        // Variants of elements every input has, missing from some inputs.
        let shared: BTreeSet<ElementPathKey> = match identities.split_first() {
            Some((first, rest)) => first
                .iter()
                .filter(|id| rest.iter().all(|ids| ids.contains(*id)))
                .cloned()
                .collect(),
            None => BTreeSet::new(),
        };
        let all_keys: BTreeSet<&ElementPathKey> = sets.iter().flat_map(|s| s.keys()).collect();
        for key in all_keys {
            if items.contains(key) || !shared.contains(&key.element_identity()) {
                continue;
            }
            let excluded_by = parent_outputs
                .iter()
                .filter(|(_, output)| !output.items.contains(key))
                .map(|(parent, _)| self.dag[*parent].name().to_string())
                .collect();
            excluded_variants.insert(
                key.clone(),
                VariantExclusion {
                    excluded_by,
                    dag_path: DagPath::new(label.clone()),
                },
            );
        }

        DagNodeOutput {
            items,
            issues,
            excluded_variants,
        }
    }

    fn drop_date_parts(&self, idx: NodeIndex, metric: &str, output: &mut DagNodeOutput) {
        let plain_time = KindWithoutPropertyPattern::new(ItemKind::TimeDimension, ItemProperty::DatePart);
        let removed = output
            .items
            .retain(|item| item.kind != ItemKind::TimeDimension || plain_time.matches_item(item));
        if removed.is_empty() {
            return;
        }
        output.issues.push(ResolutionIssue::new(
            IssueKind::DisallowedForMetric {
                metric: metric.to_string(),
                reason: "Date parts are not available".to_string(),
                items: removed.iter().map(|item| item.key.qualified_name()).collect(),
            },
            DagPath::new(self.dag[idx].to_string()),
        ));
    }
}

struct DagBuilder<'a> {
    graph: &'a SemanticGraph,
    lookup: &'a ManifestLookup,
    suggestions: &'a SuggestionSettings,
    dag: DiGraph<DagNode, ()>,
    metric_nodes: HashMap<String, NodeIndex>,
    measure_nodes: HashMap<String, NodeIndex>,
    /// Metrics on the current descent, for cycle detection.
    visiting: Vec<String>,
}

impl DagBuilder<'_> {
    fn metric_node(&mut self, name: &str) -> ResolverResult<NodeIndex> {
        if let Some(idx) = self.metric_nodes.get(name) {
            return Ok(*idx);
        }
        if let Some(pos) = self.visiting.iter().position(|m| m == name) {
            let mut cycle = self.visiting[pos..].to_vec();
            cycle.push(name.to_string());
            return Err(ResolverError::MetricCycle { cycle });
        }

        let metric = self.lookup.metric(name).map_err(|_| ResolverError::UnknownMetric {
            name: name.to_string(),
            suggestions: suggest(name, self.lookup.metrics().map(|m| m.name.as_str()), self.suggestions),
        })?;
        let metric_type = metric.metric_type;
        let parents = self.graph.metric_parents(name)?;

        self.visiting.push(name.to_string());
        let mut inputs = Vec::new();
        for measure in &parents.measures {
            inputs.push(self.measure_node(measure));
        }
        for input in &parents.metrics {
            inputs.push(self.metric_node(input)?);
        }
        self.visiting.pop();

        let node = match metric_type {
            MetricType::Simple | MetricType::Cumulative => DagNode::SimpleMetric {
                metric: name.to_string(),
                metric_type,
            },
            MetricType::Ratio | MetricType::Derived | MetricType::Conversion => DagNode::CompositeMetric {
                metric: name.to_string(),
                metric_type,
            },
        };
        let idx = self.dag.add_node(node);
        inputs.sort();
        inputs.dedup();
        for input in inputs {
            self.dag.add_edge(input, idx, ());
        }
        self.metric_nodes.insert(name.to_string(), idx);
        Ok(idx)
    }

    fn measure_node(&mut self, measure: &str) -> NodeIndex {
        if let Some(idx) = self.measure_nodes.get(measure) {
            return *idx;
        }
        let idx = self.dag.add_node(DagNode::MeasureSource {
            measure: measure.to_string(),
        });
        self.measure_nodes.insert(measure.to_string(), idx);
        idx
    }
}
