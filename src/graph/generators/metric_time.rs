//! `metric_time` attributes and their base grains.

use crate::error::ResolverResult;
use crate::graph::{AttributeNode, EdgeLabel, SemanticEdge, SemanticNode};
use crate::manifest::ManifestLookup;

use super::{metric_time_owner, SubgraphGenerator, TIME_SPINE_OWNER};

/// `metric_time` stands for the aggregation time dimension of whatever
/// measure is being aggregated. There is one attribute per distinct
/// aggregation time dimension, plus one for the time spine (used when a
/// query has no metrics), each derived from its base grain.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricTimeGenerator;

impl SubgraphGenerator for MetricTimeGenerator {
    fn name(&self) -> &'static str {
        "metric_time"
    }

    fn add_edges(&self, lookup: &ManifestLookup, edges: &mut Vec<SemanticEdge>) -> ResolverResult<()> {
        for model in lookup.semantic_models() {
            for measure in &model.measures {
                let (agg_model, dimension) = lookup.agg_time_dimension(&measure.name)?;
                // agg_time_dimension only returns dimensions that have a grain
                if let Some(grain) = dimension.time_granularity() {
                    edges.push(SemanticEdge::new(
                        AttributeNode::metric_time(metric_time_owner(agg_model, dimension)).into(),
                        SemanticNode::time_grain(grain),
                        EdgeLabel::grain_derivation(),
                    ));
                }
            }
        }

        edges.push(SemanticEdge::new(
            AttributeNode::metric_time(TIME_SPINE_OWNER).into(),
            SemanticNode::time_grain(lookup.time_spine_base()),
            EdgeLabel::grain_derivation(),
        ));
        Ok(())
    }
}
