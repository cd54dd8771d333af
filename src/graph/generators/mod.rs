//! Subgraph generators.
//!
//! Each generator encodes one semantic concern as edges, reading only the
//! manifest lookup. Generators never see each other's output; the builder
//! unions and sorts everything afterwards, so running them in any order
//! yields the same graph.

mod categorical_dimension;
mod complex_metric;
mod entity_join;
mod entity_key;
mod metric_time;
mod simple_metric;
mod time_dimension;
mod time_grain;

pub use categorical_dimension::CategoricalDimensionGenerator;
pub use complex_metric::ComplexMetricGenerator;
pub use entity_join::EntityJoinGenerator;
pub use entity_key::EntityKeyGenerator;
pub use metric_time::MetricTimeGenerator;
pub use simple_metric::SimpleMetricGenerator;
pub use time_dimension::TimeDimensionGenerator;
pub use time_grain::TimeGrainGenerator;

use crate::error::ResolverResult;
use crate::manifest::{Dimension, Entity, ManifestLookup, SemanticModel};

use super::SemanticEdge;

/// Owner of the `metric_time` attribute used by queries without metrics.
pub const TIME_SPINE_OWNER: &str = "time_spine";

/// One semantic concern of the graph.
pub trait SubgraphGenerator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Append this generator's edges to `edges`.
    fn add_edges(&self, lookup: &ManifestLookup, edges: &mut Vec<SemanticEdge>) -> ResolverResult<()>;
}

/// Every generator, in the order the builder runs them by default.
pub fn default_generators() -> Vec<Box<dyn SubgraphGenerator>> {
    vec![
        Box::new(EntityKeyGenerator),
        Box::new(EntityJoinGenerator),
        Box::new(CategoricalDimensionGenerator),
        Box::new(TimeDimensionGenerator),
        Box::new(TimeGrainGenerator),
        Box::new(MetricTimeGenerator),
        Box::new(SimpleMetricGenerator),
        Box::new(ComplexMetricGenerator),
    ]
}

/// Owner key of the `metric_time` attribute standing for `model.dimension`.
pub fn metric_time_owner(model: &SemanticModel, dimension: &Dimension) -> String {
    format!("{}.{}", model.name, dimension.name)
}

/// Entities through which rows of `model` can be looked up.
pub(crate) fn join_targets(model: &SemanticModel) -> impl Iterator<Item = &Entity> {
    model
        .entities
        .iter()
        .filter(|e| e.entity_type.is_join_target())
}
