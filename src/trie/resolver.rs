//! Drives the pathfinder from a set of sources and folds the discovered
//! paths into a [`DunderNameTrie`].

use std::collections::BTreeSet;

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::config::ResolverSettings;
use crate::error::ResolverResult;
use crate::graph::generators::TIME_SPINE_OWNER;
use crate::graph::{
    AttributeNode, AttributeProperty, EdgeKind, EdgeLabel, NodeKind, SemanticGraph, SemanticNode,
};
use crate::naming::ElementPathKey;
use crate::pathfinder::{JoinCountWeight, Path, Pathfinder, StopAtNodeKind};
use crate::time::DatePart;

use super::{DunderNameTrie, ItemKind, ItemProperty, PathDescriptor, ResolvedItem};

/// Narrows which items a resolution produces.
///
/// Exclusions that can be decided per edge (group-by metrics, SCD joins,
/// `metric_time`) also prune the traversal itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementFilter {
    with_any_of: BTreeSet<ItemProperty>,
    without_any_of: BTreeSet<ItemProperty>,
    element_names: Option<BTreeSet<String>>,
}

impl ElementFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only items carrying at least one of these properties.
    pub fn with_any_of(mut self, properties: impl IntoIterator<Item = ItemProperty>) -> Self {
        self.with_any_of.extend(properties);
        self
    }

    /// Drop items carrying any of these properties.
    pub fn without_any_of(mut self, properties: impl IntoIterator<Item = ItemProperty>) -> Self {
        self.without_any_of.extend(properties);
        self
    }

    /// Keep only items with one of these element names.
    pub fn with_element_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.element_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn allows(&self, item: &ResolvedItem) -> bool {
        if !self.with_any_of.is_empty() && self.with_any_of.is_disjoint(&item.properties) {
            return false;
        }
        if !self.without_any_of.is_disjoint(&item.properties) {
            return false;
        }
        match &self.element_names {
            Some(names) => names.contains(&item.key.element_name),
            None => true,
        }
    }

    fn excludes(&self, property: ItemProperty) -> bool {
        self.without_any_of.contains(&property)
    }

    pub(crate) fn admits_edge(&self, label: &EdgeLabel, head: &SemanticNode) -> bool {
        if self.excludes(ItemProperty::ScdHop) && label.validity_window {
            return false;
        }
        match head {
            SemanticNode::Metric { metric_name } => {
                !self.excludes(ItemProperty::Metric) && self.names_element(metric_name)
            }
            SemanticNode::Attribute(attr) if attr.has(AttributeProperty::MetricTime) => {
                !self.excludes(ItemProperty::MetricTime) && self.names_element(&attr.attribute_name)
            }
            // Every item past an attribute or metric is named after it.
            SemanticNode::Attribute(attr) => self.names_element(&attr.attribute_name),
            _ => true,
        }
    }

    fn names_element(&self, name: &str) -> bool {
        self.element_names.as_ref().map_or(true, |names| names.contains(name))
    }
}

/// Resolves the group-by items reachable from measures, metrics, or (for
/// queries without metrics) from every entity and the time spine.
pub struct AttributeTrieResolver<'g> {
    graph: &'g SemanticGraph,
    max_join_hops: u32,
    max_path_edges: usize,
}

impl<'g> AttributeTrieResolver<'g> {
    pub fn new(graph: &'g SemanticGraph, settings: &ResolverSettings) -> Self {
        Self {
            graph,
            max_join_hops: settings.max_join_hops,
            max_path_edges: settings.max_path_edges,
        }
    }

    /// Items reachable from a measure's own model and its joins.
    pub fn resolve_measure(&self, measure: &str, filter: Option<&ElementFilter>) -> ResolverResult<DunderNameTrie> {
        let source = self.graph.require_index(&SemanticNode::measure(measure))?;
        Ok(self.resolve(&[source], filter))
    }

    /// Items scoped to a metric itself, such as its `metric_time`.
    pub fn resolve_metric_scope(&self, metric: &str, filter: Option<&ElementFilter>) -> ResolverResult<DunderNameTrie> {
        let source = self.graph.require_index(&SemanticNode::metric(metric))?;
        Ok(self.resolve(&[source], filter))
    }

    /// Items available to a query without metrics.
    pub fn resolve_without_metrics(&self, filter: Option<&ElementFilter>) -> ResolverResult<DunderNameTrie> {
        let mut sources = self.graph.nodes_of_kind(NodeKind::Entity);
        let spine = SemanticNode::from(AttributeNode::metric_time(TIME_SPINE_OWNER));
        sources.push(self.graph.require_index(&spine)?);
        Ok(self.resolve(&sources, filter))
    }

    pub fn resolve(&self, sources: &[NodeIndex], filter: Option<&ElementFilter>) -> DunderNameTrie {
        let graph = self.graph;
        let pathfinder = Pathfinder::new(graph, self.max_path_edges)
            .with_predicate(StopAtNodeKind(NodeKind::Metric))
            .with_edge_filter(move |path, label, head| admits(graph, filter, path, label, head));
        let paths = pathfinder.find_paths(sources, &JoinCountWeight, self.max_join_hops);

        let mut trie = DunderNameTrie::new();
        let keep = |item: &ResolvedItem| filter.map_or(true, |f| f.allows(item));

        for source in sources {
            if let SemanticNode::Entity { entity_name } = graph.node(*source) {
                let item = ResolvedItem::new(ElementPathKey::new(entity_name.clone(), vec![]), ItemKind::Entity)
                    .with_property(ItemProperty::Entity)
                    .with_property(ItemProperty::Local)
                    .with_path(PathDescriptor {
                        nodes: vec![graph.node(*source).to_string()],
                        joined_models: vec![],
                        crosses_validity_window: false,
                    });
                if keep(&item) {
                    trie.insert(item);
                }
            }
        }

        for path in paths.iter() {
            for item in self.items_for_path(path) {
                if keep(&item) {
                    trie.insert(item);
                }
            }
        }

        debug!(
            sources = sources.len(),
            paths = paths.len(),
            items = trie.len(),
            "resolved dunder name trie"
        );
        trie
    }

    fn descriptor(&self, path: &Path) -> PathDescriptor {
        // An entity source stands in the model its first hop enters.
        let source_model = path.source_model().or_else(|| {
            let first = path.edges().first()?;
            match self.graph.node(path.source()) {
                SemanticNode::Entity { .. } => self.graph.edge_label(*first).semantic_model.as_deref(),
                _ => None,
            }
        });
        let joined_models = path
            .edges()
            .iter()
            .map(|e| self.graph.edge_label(*e))
            .filter(|label| label.is_join_hop())
            .filter_map(|label| label.semantic_model.as_deref())
            .filter(|model| Some(*model) != source_model)
            .map(str::to_string)
            .collect();

        PathDescriptor {
            nodes: path
                .nodes()
                .iter()
                .map(|idx| self.graph.node(*idx).to_string())
                .collect(),
            joined_models,
            crosses_validity_window: path.validity_edges() > 0,
        }
    }

    /// Items named by a path: at most one, except time grains which also
    /// unlock date parts.
    fn items_for_path(&self, path: &Path) -> Vec<ResolvedItem> {
        let source = self.graph.node(path.source());
        let mut segments = Vec::with_capacity(path.segments().len() + 1);
        if matches!(source.kind(), NodeKind::Entity | NodeKind::Attribute) {
            segments.push(source.name().to_string());
        }
        segments.extend(path.segments().iter().cloned());

        let Some(key) = ElementPathKey::from_segments(&segments) else {
            return vec![];
        };

        let descriptor = self.descriptor(path);
        let mut base = BTreeSet::new();
        base.insert(if descriptor.join_count() == 0 {
            ItemProperty::Local
        } else {
            ItemProperty::Joined
        });
        if descriptor.join_count() >= 2 {
            base.insert(ItemProperty::MultiHop);
        }
        if descriptor.crosses_validity_window {
            base.insert(ItemProperty::ScdHop);
        }

        let item = |key: ElementPathKey, kind: ItemKind, extra: &[ItemProperty]| {
            let mut item = ResolvedItem::new(key, kind).with_path(descriptor.clone());
            item.properties = base.clone();
            item.properties.extend(extra.iter().copied());
            item
        };

        match self.graph.node(path.terminal()) {
            SemanticNode::Entity { .. } => vec![item(key, ItemKind::Entity, &[ItemProperty::Entity])],
            SemanticNode::Metric { .. } => {
                let mut metric = item(key, ItemKind::Metric, &[ItemProperty::Metric, ItemProperty::Joined]);
                metric.properties.remove(&ItemProperty::Local);
                vec![metric]
            }
            SemanticNode::Attribute(attr) if attr.has(AttributeProperty::Categorical) => {
                vec![item(key, ItemKind::Dimension, &[])]
            }
            // Time attributes are named through their grains.
            SemanticNode::Attribute(_) | SemanticNode::Measure { .. } => vec![],
            SemanticNode::TimeGrain { grain } => {
                let attribute = path
                    .nodes()
                    .iter()
                    .rev()
                    .find_map(|idx| self.graph.node(*idx).as_attribute());
                let is_metric_time = attribute.is_some_and(|a| a.has(AttributeProperty::MetricTime));
                let grain_nodes = path
                    .nodes()
                    .iter()
                    .filter(|idx| self.graph.node(**idx).kind() == NodeKind::TimeGrain)
                    .count();

                let mut extra = Vec::new();
                if is_metric_time {
                    extra.push(ItemProperty::MetricTime);
                }
                let mut out = Vec::new();
                let mut grain_extra = extra.clone();
                if grain_nodes > 1 {
                    grain_extra.push(ItemProperty::DerivedTimeGranularity);
                }
                if grain.is_custom() {
                    grain_extra.push(ItemProperty::CustomGranularity);
                }
                out.push(item(
                    key.clone().with_time_grain(grain.clone()),
                    ItemKind::TimeDimension,
                    &grain_extra,
                ));

                if let Some(standard) = grain.as_standard() {
                    extra.push(ItemProperty::DatePart);
                    for part in DatePart::unlocked_at(standard) {
                        out.push(item(key.clone().with_date_part(part), ItemKind::TimeDimension, &extra));
                    }
                }
                out
            }
        }
    }
}

/// Whether a path may follow `label` into `head`.
fn admits(
    graph: &SemanticGraph,
    filter: Option<&ElementFilter>,
    path: &Path,
    label: &EdgeLabel,
    head: NodeIndex,
) -> bool {
    // Composition edges belong to the resolution DAG, not to item discovery.
    if label.kind == EdgeKind::MetricDefinition {
        return false;
    }
    if path.contains_node(head) {
        return false;
    }

    let head_node = graph.node(head);
    if let Some(previous) = path.last_edge().map(|e| graph.edge_label(e)) {
        let same_model = previous.semantic_model.is_some() && previous.semantic_model == label.semantic_model;
        // Re-entering the model just joined (or the source model) only renames items.
        let redundant_entity_hop = label.kind == EdgeKind::Join && head_node.kind() == NodeKind::Entity;
        let lookup_after_join = previous.kind == EdgeKind::Join && label.is_join_hop();
        if same_model && (redundant_entity_hop || lookup_after_join) {
            return false;
        }
    }

    filter.map_or(true, |f| f.admits_edge(label, head_node))
}
