//! Manifest input types.
//!
//! The manifest is the pre-validated, immutable description of semantic
//! models and metrics. It is produced by an external loader; this crate only
//! reads it, either from JSON or through the builder helpers below.

mod lookup;

pub use lookup::{ManifestLookup, MeasureRef};

use serde::{Deserialize, Serialize};

use crate::error::ResolverResult;
use crate::time::TimeGranularity;

/// The complete semantic manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticManifest {
    #[serde(default)]
    pub semantic_models: Vec<SemanticModel>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub project_configuration: ProjectConfiguration,
}

impl SemanticManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a manifest from its JSON encoding.
    pub fn from_json_str(json: &str) -> ResolverResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_semantic_model(mut self, model: SemanticModel) -> Self {
        self.semantic_models.push(model);
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    pub fn with_time_spine(mut self, spine: TimeSpine) -> Self {
        self.project_configuration.time_spines.push(spine);
        self
    }
}

/// Project-level configuration carried by the manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfiguration {
    #[serde(default)]
    pub time_spines: Vec<TimeSpine>,
}

/// A time spine table and the custom granularities it defines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSpine {
    pub base_granularity: TimeGranularity,
    #[serde(default)]
    pub custom_granularities: Vec<CustomGranularity>,
}

impl TimeSpine {
    pub fn new(base_granularity: TimeGranularity) -> Self {
        Self {
            base_granularity,
            custom_granularities: vec![],
        }
    }

    pub fn with_custom_granularity(mut self, name: impl Into<String>) -> Self {
        self.custom_granularities
            .push(CustomGranularity { name: name.into() });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGranularity {
    pub name: String,
}

// ============================================================================
// Semantic Models
// ============================================================================

/// A semantic model: one logical table with its entities, dimensions and measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticModel {
    pub name: String,
    #[serde(default)]
    pub defaults: Option<ModelDefaults>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub measures: Vec<Measure>,
}

impl SemanticModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defaults: None,
            entities: vec![],
            dimensions: vec![],
            measures: vec![],
        }
    }

    pub fn with_agg_time_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.defaults = Some(ModelDefaults {
            agg_time_dimension: Some(dimension.into()),
        });
        self
    }

    pub fn with_entity(mut self, name: impl Into<String>, entity_type: EntityType) -> Self {
        self.entities.push(Entity {
            name: name.into(),
            entity_type,
        });
        self
    }

    pub fn with_categorical_dimension(mut self, name: impl Into<String>) -> Self {
        self.dimensions.push(Dimension::categorical(name));
        self
    }

    pub fn with_time_dimension(mut self, name: impl Into<String>, grain: TimeGranularity) -> Self {
        self.dimensions.push(Dimension::time(name, grain));
        self
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn with_measure(mut self, name: impl Into<String>) -> Self {
        self.measures.push(Measure::new(name));
        self
    }

    pub fn with_measure_def(mut self, measure: Measure) -> Self {
        self.measures.push(measure);
        self
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Whether any dimension declares validity window parameters (SCD type II).
    pub fn has_validity_window(&self) -> bool {
        self.dimensions.iter().any(|d| {
            d.type_params
                .as_ref()
                .is_some_and(|p| p.validity_params.is_some())
        })
    }

    pub fn default_agg_time_dimension(&self) -> Option<&str> {
        self.defaults
            .as_ref()
            .and_then(|d| d.agg_time_dimension.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDefaults {
    #[serde(default)]
    pub agg_time_dimension: Option<String>,
}

/// Entity (join key) declared by a semantic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

/// How an entity identifies rows of its semantic model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Primary,
    Unique,
    Natural,
    Foreign,
}

impl EntityType {
    /// Can another model join *to* this model on this entity without fan-out?
    pub fn is_join_target(&self) -> bool {
        matches!(
            self,
            EntityType::Primary | EntityType::Unique | EntityType::Natural
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    #[serde(rename = "type")]
    pub dimension_type: DimensionType,
    #[serde(default)]
    pub type_params: Option<DimensionTypeParams>,
}

impl Dimension {
    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dimension_type: DimensionType::Categorical,
            type_params: None,
        }
    }

    pub fn time(name: impl Into<String>, grain: TimeGranularity) -> Self {
        Self {
            name: name.into(),
            dimension_type: DimensionType::Time,
            type_params: Some(DimensionTypeParams {
                time_granularity: grain,
                validity_params: None,
            }),
        }
    }

    /// Mark this time dimension as a validity window boundary.
    pub fn with_validity(mut self, is_start: bool, is_end: bool) -> Self {
        if let Some(params) = self.type_params.as_mut() {
            params.validity_params = Some(ValidityParams { is_start, is_end });
        }
        self
    }

    pub fn time_granularity(&self) -> Option<TimeGranularity> {
        self.type_params.as_ref().map(|p| p.time_granularity)
    }

    pub fn is_validity_boundary(&self) -> bool {
        self.type_params
            .as_ref()
            .is_some_and(|p| p.validity_params.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionType {
    Categorical,
    Time,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionTypeParams {
    pub time_granularity: TimeGranularity,
    #[serde(default)]
    pub validity_params: Option<ValidityParams>,
}

/// Marks a time dimension as the start and/or end of an SCD validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityParams {
    #[serde(default)]
    pub is_start: bool,
    #[serde(default)]
    pub is_end: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,
    #[serde(default = "default_agg")]
    pub agg: String,
    #[serde(default)]
    pub agg_time_dimension: Option<String>,
}

fn default_agg() -> String {
    "sum".to_string()
}

impl Measure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agg: default_agg(),
            agg_time_dimension: None,
        }
    }

    pub fn with_agg_time_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.agg_time_dimension = Some(dimension.into());
        self
    }
}

// ============================================================================
// Metrics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    #[serde(default)]
    pub type_params: MetricTypeParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Simple,
    Cumulative,
    Ratio,
    Derived,
    Conversion,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Simple => "simple",
            MetricType::Cumulative => "cumulative",
            MetricType::Ratio => "ratio",
            MetricType::Derived => "derived",
            MetricType::Conversion => "conversion",
        }
    }
}

/// Type parameters for all metric types; which fields are set depends on the type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTypeParams {
    #[serde(default)]
    pub measure: Option<String>,
    #[serde(default)]
    pub numerator: Option<String>,
    #[serde(default)]
    pub denominator: Option<String>,
    #[serde(default)]
    pub expr: Option<String>,
    #[serde(default)]
    pub metrics: Vec<MetricInput>,
    #[serde(default)]
    pub window: Option<String>,
    #[serde(default)]
    pub grain_to_date: Option<TimeGranularity>,
    #[serde(default)]
    pub conversion_type_params: Option<ConversionTypeParams>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricInput {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionTypeParams {
    pub base_measure: String,
    pub conversion_measure: String,
    pub entity: String,
}

impl Metric {
    pub fn simple(name: impl Into<String>, measure: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metric_type: MetricType::Simple,
            type_params: MetricTypeParams {
                measure: Some(measure.into()),
                ..Default::default()
            },
        }
    }

    pub fn cumulative(name: impl Into<String>, measure: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metric_type: MetricType::Cumulative,
            type_params: MetricTypeParams {
                measure: Some(measure.into()),
                ..Default::default()
            },
        }
    }

    pub fn ratio(
        name: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            metric_type: MetricType::Ratio,
            type_params: MetricTypeParams {
                numerator: Some(numerator.into()),
                denominator: Some(denominator.into()),
                ..Default::default()
            },
        }
    }

    pub fn derived(name: impl Into<String>, expr: impl Into<String>, inputs: &[&str]) -> Self {
        Self {
            name: name.into(),
            metric_type: MetricType::Derived,
            type_params: MetricTypeParams {
                expr: Some(expr.into()),
                metrics: inputs
                    .iter()
                    .map(|name| MetricInput {
                        name: (*name).to_string(),
                        alias: None,
                    })
                    .collect(),
                ..Default::default()
            },
        }
    }

    pub fn conversion(
        name: impl Into<String>,
        base_measure: impl Into<String>,
        conversion_measure: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            metric_type: MetricType::Conversion,
            type_params: MetricTypeParams {
                conversion_type_params: Some(ConversionTypeParams {
                    base_measure: base_measure.into(),
                    conversion_measure: conversion_measure.into(),
                    entity: entity.into(),
                }),
                ..Default::default()
            },
        }
    }
}
