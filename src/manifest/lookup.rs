//! Name-indexed, read-only view over a `SemanticManifest`.
//!
//! Built once per manifest. Every accessor that takes a name fails with a
//! model-consistency error when the name is missing, since the manifest is
//! expected to be validated before it reaches this crate.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::{
    Dimension, DimensionType, Measure, Metric, MetricType, SemanticManifest, SemanticModel,
};
use crate::error::{ResolverError, ResolverResult};
use crate::time::{ExpandedGranularity, TimeGranularity};

/// A measure together with the semantic model that owns it.
#[derive(Debug, Clone, Copy)]
pub struct MeasureRef<'a> {
    pub semantic_model: &'a SemanticModel,
    pub measure: &'a Measure,
}

impl<'a> MeasureRef<'a> {
    /// The time dimension this measure aggregates over, falling back to the model default.
    pub fn agg_time_dimension_name(&self) -> Option<&'a str> {
        self.measure
            .agg_time_dimension
            .as_deref()
            .or_else(|| self.semantic_model.default_agg_time_dimension())
    }
}

/// O(1) lookup of manifest objects by name.
#[derive(Debug, Clone)]
pub struct ManifestLookup {
    manifest: SemanticManifest,
    models: HashMap<String, usize>,
    /// measure name -> (model index, measure index)
    measures: HashMap<String, (usize, usize)>,
    metrics: HashMap<String, usize>,
    /// entity name -> indices of models declaring it, in manifest order
    entity_models: BTreeMap<String, Vec<usize>>,
    custom_granularities: BTreeMap<String, ExpandedGranularity>,
    content_hash: String,
}

impl ManifestLookup {
    pub fn new(manifest: SemanticManifest) -> ResolverResult<Self> {
        let content_hash = compute_hash(&manifest)?;

        let mut models = HashMap::new();
        let mut measures = HashMap::new();
        let mut entity_models: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for (model_idx, model) in manifest.semantic_models.iter().enumerate() {
            models.insert(model.name.clone(), model_idx);
            for (measure_idx, measure) in model.measures.iter().enumerate() {
                measures.insert(measure.name.clone(), (model_idx, measure_idx));
            }
            for entity in &model.entities {
                entity_models
                    .entry(entity.name.clone())
                    .or_default()
                    .push(model_idx);
            }
        }

        let metrics = manifest
            .metrics
            .iter()
            .enumerate()
            .map(|(idx, metric)| (metric.name.clone(), idx))
            .collect();

        let mut custom_granularities = BTreeMap::new();
        for spine in &manifest.project_configuration.time_spines {
            for custom in &spine.custom_granularities {
                let grain = ExpandedGranularity::custom(&custom.name, spine.base_granularity);
                custom_granularities.insert(grain.name().to_string(), grain);
            }
        }

        Ok(Self {
            manifest,
            models,
            measures,
            metrics,
            entity_models,
            custom_granularities,
            content_hash,
        })
    }

    pub fn manifest(&self) -> &SemanticManifest {
        &self.manifest
    }

    /// SHA-256 of the manifest's JSON encoding, used as the graph cache key.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn semantic_models(&self) -> impl Iterator<Item = &SemanticModel> {
        self.manifest.semantic_models.iter()
    }

    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.manifest.metrics.iter()
    }

    pub fn semantic_model(&self, name: &str) -> ResolverResult<&SemanticModel> {
        self.models
            .get(name)
            .map(|idx| &self.manifest.semantic_models[*idx])
            .ok_or_else(|| ResolverError::UnknownSemanticModel(name.to_string()))
    }

    pub fn measure(&self, name: &str) -> ResolverResult<MeasureRef<'_>> {
        let (model_idx, measure_idx) = self
            .measures
            .get(name)
            .ok_or_else(|| ResolverError::UnknownMeasure(name.to_string()))?;
        let semantic_model = &self.manifest.semantic_models[*model_idx];
        Ok(MeasureRef {
            semantic_model,
            measure: &semantic_model.measures[*measure_idx],
        })
    }

    pub fn has_metric(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    /// Look up a metric. The error carries no suggestions; callers that face
    /// users attach them.
    pub fn metric(&self, name: &str) -> ResolverResult<&Metric> {
        self.metrics
            .get(name)
            .map(|idx| &self.manifest.metrics[*idx])
            .ok_or_else(|| ResolverError::UnknownMetric {
                name: name.to_string(),
                suggestions: vec![],
            })
    }

    /// Semantic models that declare the given entity, in manifest order.
    pub fn models_with_entity(&self, entity: &str) -> impl Iterator<Item = &SemanticModel> {
        self.entity_models
            .get(entity)
            .into_iter()
            .flatten()
            .map(|idx| &self.manifest.semantic_models[*idx])
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entity_models.keys().map(String::as_str)
    }

    /// Resolve the aggregation time dimension of a measure.
    ///
    /// Fails when the measure names no time dimension (directly or through
    /// its model default) or names one that is missing or not a time dimension.
    pub fn agg_time_dimension(&self, measure_name: &str) -> ResolverResult<(&SemanticModel, &Dimension)> {
        let measure = self.measure(measure_name)?;
        let model = measure.semantic_model;
        let dim_name = measure
            .agg_time_dimension_name()
            .ok_or_else(|| ResolverError::UnknownDimension {
                semantic_model: model.name.clone(),
                dimension: format!("<agg_time_dimension of {}>", measure_name),
            })?;

        let dimension = model
            .dimension(dim_name)
            .filter(|d| d.dimension_type == DimensionType::Time && d.time_granularity().is_some())
            .ok_or_else(|| ResolverError::UnknownDimension {
                semantic_model: model.name.clone(),
                dimension: dim_name.to_string(),
            })?;

        Ok((model, dimension))
    }

    /// Measures a metric reads directly (not through other metrics).
    pub fn direct_measures<'m>(&self, metric: &'m Metric) -> ResolverResult<Vec<&'m str>> {
        let params = &metric.type_params;
        match metric.metric_type {
            MetricType::Simple | MetricType::Cumulative => {
                let measure = params.measure.as_deref().ok_or_else(|| {
                    ResolverError::InvalidMetricDefinition {
                        metric: metric.name.clone(),
                        reason: format!("{} metric has no measure", metric.metric_type.as_str()),
                    }
                })?;
                Ok(vec![measure])
            }
            MetricType::Conversion => {
                let conversion = params.conversion_type_params.as_ref().ok_or_else(|| {
                    ResolverError::InvalidMetricDefinition {
                        metric: metric.name.clone(),
                        reason: "conversion metric has no conversion_type_params".to_string(),
                    }
                })?;
                Ok(vec![
                    conversion.base_measure.as_str(),
                    conversion.conversion_measure.as_str(),
                ])
            }
            MetricType::Ratio | MetricType::Derived => Ok(vec![]),
        }
    }

    /// Metrics a metric is composed from, in declaration order.
    pub fn metric_inputs<'m>(&self, metric: &'m Metric) -> ResolverResult<Vec<&'m str>> {
        let params = &metric.type_params;
        match metric.metric_type {
            MetricType::Ratio => {
                let numerator = params.numerator.as_deref();
                let denominator = params.denominator.as_deref();
                match (numerator, denominator) {
                    (Some(n), Some(d)) => Ok(vec![n, d]),
                    _ => Err(ResolverError::InvalidMetricDefinition {
                        metric: metric.name.clone(),
                        reason: "ratio metric needs a numerator and a denominator".to_string(),
                    }),
                }
            }
            MetricType::Derived => {
                if params.metrics.is_empty() {
                    return Err(ResolverError::InvalidMetricDefinition {
                        metric: metric.name.clone(),
                        reason: "derived metric has no input metrics".to_string(),
                    });
                }
                Ok(params.metrics.iter().map(|m| m.name.as_str()).collect())
            }
            MetricType::Simple | MetricType::Cumulative | MetricType::Conversion => Ok(vec![]),
        }
    }

    /// Finest grain of the configured time spines (DAY when none is configured).
    pub fn time_spine_base(&self) -> TimeGranularity {
        self.manifest
            .project_configuration
            .time_spines
            .iter()
            .map(|s| s.base_granularity)
            .min()
            .unwrap_or(TimeGranularity::Day)
    }

    pub fn custom_granularities(&self) -> impl Iterator<Item = &ExpandedGranularity> {
        self.custom_granularities.values()
    }

    /// Resolve a grain name against standard and custom granularities.
    pub fn granularity(&self, name: &str) -> Option<ExpandedGranularity> {
        TimeGranularity::parse(name)
            .map(ExpandedGranularity::Standard)
            .or_else(|| self.custom_granularities.get(&name.to_lowercase()).cloned())
    }
}

/// SHA-256 of a serializable value's JSON encoding, as lowercase hex.
fn compute_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
