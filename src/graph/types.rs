//! Type definitions for the semantic graph.
//!
//! Nodes and edges are plain values: two nodes built from the same key fields
//! are equal and hash the same, which is what lets independently running
//! generators emit overlapping fragments that merge without duplication.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::ExpandedGranularity;

// ============================================================================
// Nodes
// ============================================================================

/// Properties attached to an attribute node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttributeProperty {
    /// Categorical dimension
    Categorical,
    /// Time dimension (has outgoing grain edges)
    Time,
    /// The synthetic `metric_time` dimension
    MetricTime,
    /// Start or end of an SCD validity window
    ValidityBoundary,
}

/// An attribute owned by a semantic model (or, for `metric_time`, by the
/// aggregation time dimension or time spine it stands for).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttributeNode {
    pub attribute_name: String,
    pub owner: String,
    pub properties: BTreeSet<AttributeProperty>,
}

impl AttributeNode {
    pub fn categorical(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            attribute_name: name.into(),
            owner: owner.into(),
            properties: BTreeSet::from([AttributeProperty::Categorical]),
        }
    }

    pub fn time(name: impl Into<String>, owner: impl Into<String>, validity_boundary: bool) -> Self {
        let mut properties = BTreeSet::from([AttributeProperty::Time]);
        if validity_boundary {
            properties.insert(AttributeProperty::ValidityBoundary);
        }
        Self {
            attribute_name: name.into(),
            owner: owner.into(),
            properties,
        }
    }

    pub fn metric_time(owner: impl Into<String>) -> Self {
        Self {
            attribute_name: crate::METRIC_TIME.to_string(),
            owner: owner.into(),
            properties: BTreeSet::from([AttributeProperty::Time, AttributeProperty::MetricTime]),
        }
    }

    pub fn has(&self, property: AttributeProperty) -> bool {
        self.properties.contains(&property)
    }
}

/// Node kinds, used by traversal predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Entity,
    Attribute,
    Metric,
    Measure,
    TimeGrain,
}

/// A node in the semantic graph. Identity is the variant plus its key fields.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SemanticNode {
    Entity { entity_name: String },
    Attribute(AttributeNode),
    Metric { metric_name: String },
    Measure { measure_name: String },
    TimeGrain { grain: ExpandedGranularity },
}

impl SemanticNode {
    pub fn entity(name: impl Into<String>) -> Self {
        SemanticNode::Entity {
            entity_name: name.into(),
        }
    }

    pub fn metric(name: impl Into<String>) -> Self {
        SemanticNode::Metric {
            metric_name: name.into(),
        }
    }

    pub fn measure(name: impl Into<String>) -> Self {
        SemanticNode::Measure {
            measure_name: name.into(),
        }
    }

    pub fn time_grain(grain: impl Into<ExpandedGranularity>) -> Self {
        SemanticNode::TimeGrain {
            grain: grain.into(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            SemanticNode::Entity { .. } => NodeKind::Entity,
            SemanticNode::Attribute(_) => NodeKind::Attribute,
            SemanticNode::Metric { .. } => NodeKind::Metric,
            SemanticNode::Measure { .. } => NodeKind::Measure,
            SemanticNode::TimeGrain { .. } => NodeKind::TimeGrain,
        }
    }

    /// The node's own name.
    pub fn name(&self) -> &str {
        match self {
            SemanticNode::Entity { entity_name } => entity_name,
            SemanticNode::Attribute(attr) => &attr.attribute_name,
            SemanticNode::Metric { metric_name } => metric_name,
            SemanticNode::Measure { measure_name } => measure_name,
            SemanticNode::TimeGrain { grain } => grain.name(),
        }
    }

    pub fn as_attribute(&self) -> Option<&AttributeNode> {
        match self {
            SemanticNode::Attribute(attr) => Some(attr),
            _ => None,
        }
    }

    pub fn as_grain(&self) -> Option<&ExpandedGranularity> {
        match self {
            SemanticNode::TimeGrain { grain } => Some(grain),
            _ => None,
        }
    }
}

impl From<AttributeNode> for SemanticNode {
    fn from(attr: AttributeNode) -> Self {
        SemanticNode::Attribute(attr)
    }
}

impl fmt::Display for SemanticNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticNode::Entity { entity_name } => write!(f, "Entity({})", entity_name),
            SemanticNode::Attribute(attr) => {
                write!(f, "Attribute({}.{})", attr.owner, attr.attribute_name)
            }
            SemanticNode::Metric { metric_name } => write!(f, "Metric({})", metric_name),
            SemanticNode::Measure { measure_name } => write!(f, "Measure({})", measure_name),
            SemanticNode::TimeGrain { grain } => write!(f, "TimeGrain({})", grain),
        }
    }
}

// ============================================================================
// Edges
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Entity to entity, or entity to a group-by metric, through a joined model
    Join,
    /// Measure to one of its model's entities
    KeyAssociation,
    /// Entity (or measure/metric) to an attribute it exposes
    DunderSegment,
    /// Time attribute to its base grain, and grain to coarser grain
    GrainDerivation,
    /// Measure or input metric to the metric defined from it
    MetricDefinition,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Join => "Join",
            EdgeKind::KeyAssociation => "KeyAssociation",
            EdgeKind::DunderSegment => "DunderSegment",
            EdgeKind::GrainDerivation => "GrainDerivation",
            EdgeKind::MetricDefinition => "MetricDefinition",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JoinType {
    /// Attribute lookups through a unique key
    LeftOuter,
    /// Combining the outputs of metric inputs
    FullOuter,
}

/// Label of a directed edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeLabel {
    pub kind: EdgeKind,
    /// Dunder name segment contributed by traversing this edge.
    pub segment: Option<String>,
    /// Semantic model the traversal enters (or stays in) through this edge.
    pub semantic_model: Option<String>,
    pub join_type: Option<JoinType>,
    /// Set when the edge joins through an SCD validity window.
    pub validity_window: bool,
}

impl EdgeLabel {
    /// Entity-to-entity (or entity-to-metric) join into `semantic_model`.
    pub fn join(
        segment: impl Into<String>,
        semantic_model: impl Into<String>,
        validity_window: bool,
    ) -> Self {
        Self {
            kind: EdgeKind::Join,
            segment: Some(segment.into()),
            semantic_model: Some(semantic_model.into()),
            join_type: Some(JoinType::LeftOuter),
            validity_window,
        }
    }

    pub fn key_association(entity: impl Into<String>, semantic_model: impl Into<String>) -> Self {
        Self {
            kind: EdgeKind::KeyAssociation,
            segment: Some(entity.into()),
            semantic_model: Some(semantic_model.into()),
            join_type: None,
            validity_window: false,
        }
    }

    /// Entity to an attribute of `semantic_model`, looked up through the entity's key.
    pub fn attribute_lookup(
        attribute: impl Into<String>,
        semantic_model: impl Into<String>,
        validity_window: bool,
    ) -> Self {
        Self {
            kind: EdgeKind::DunderSegment,
            segment: Some(attribute.into()),
            semantic_model: Some(semantic_model.into()),
            join_type: Some(JoinType::LeftOuter),
            validity_window,
        }
    }

    /// Local attribute access (no join), e.g. measure to `metric_time`.
    pub fn dunder_segment(segment: impl Into<String>, semantic_model: impl Into<String>) -> Self {
        Self {
            kind: EdgeKind::DunderSegment,
            segment: Some(segment.into()),
            semantic_model: Some(semantic_model.into()),
            join_type: None,
            validity_window: false,
        }
    }

    pub fn grain_derivation() -> Self {
        Self {
            kind: EdgeKind::GrainDerivation,
            segment: None,
            semantic_model: None,
            join_type: None,
            validity_window: false,
        }
    }

    pub fn metric_definition(join_type: Option<JoinType>) -> Self {
        Self {
            kind: EdgeKind::MetricDefinition,
            segment: None,
            semantic_model: None,
            join_type,
            validity_window: false,
        }
    }

    /// Does this edge pull rows from `semantic_model` through a join?
    pub fn is_join_hop(&self) -> bool {
        self.join_type == Some(JoinType::LeftOuter)
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.as_str())?;
        if let Some(segment) = &self.segment {
            write!(f, " '{}'", segment)?;
        }
        if let Some(model) = &self.semantic_model {
            write!(f, " @{}", model)?;
        }
        if let Some(join_type) = &self.join_type {
            write!(f, " {:?}", join_type)?;
        }
        if self.validity_window {
            write!(f, " scd")?;
        }
        Ok(())
    }
}

/// A directed, labeled edge between two nodes, compared by (tail, head, label).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SemanticEdge {
    pub tail: SemanticNode,
    pub head: SemanticNode,
    pub label: EdgeLabel,
}

impl SemanticEdge {
    pub fn new(tail: SemanticNode, head: SemanticNode, label: EdgeLabel) -> Self {
        Self { tail, head, label }
    }
}

impl fmt::Display for SemanticEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.tail, self.label, self.head)
    }
}
