//! Metrics composed from other metrics.

use crate::error::ResolverResult;
use crate::graph::{EdgeLabel, JoinType, SemanticEdge, SemanticNode};
use crate::manifest::ManifestLookup;

use super::SubgraphGenerator;

/// Ratio and derived metrics: an edge from each input metric to the metric
/// computed from it. Inputs are combined with a full outer join on the
/// shared group-by items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexMetricGenerator;

impl SubgraphGenerator for ComplexMetricGenerator {
    fn name(&self) -> &'static str {
        "complex_metric"
    }

    fn add_edges(&self, lookup: &ManifestLookup, edges: &mut Vec<SemanticEdge>) -> ResolverResult<()> {
        for metric in lookup.metrics() {
            for input in lookup.metric_inputs(metric)? {
                lookup.metric(input)?;
                edges.push(SemanticEdge::new(
                    SemanticNode::metric(input),
                    SemanticNode::metric(&metric.name),
                    EdgeLabel::metric_definition(Some(JoinType::FullOuter)),
                ));
            }
        }
        Ok(())
    }
}
