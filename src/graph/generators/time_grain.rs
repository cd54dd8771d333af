//! The synthetic time granularity hierarchy.

use crate::error::ResolverResult;
use crate::graph::{EdgeLabel, SemanticEdge, SemanticNode};
use crate::manifest::ManifestLookup;
use crate::time::TimeGranularity;

use super::SubgraphGenerator;

/// Chains each standard grain to the next coarser one and hangs custom
/// grains off their base grain. A time attribute that reaches a grain node
/// can therefore be queried at that grain and every grain above it, and
/// each grain has exactly one path from a given attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeGrainGenerator;

impl SubgraphGenerator for TimeGrainGenerator {
    fn name(&self) -> &'static str {
        "time_grain"
    }

    fn add_edges(&self, lookup: &ManifestLookup, edges: &mut Vec<SemanticEdge>) -> ResolverResult<()> {
        for grain in TimeGranularity::ALL {
            if let Some(coarser) = grain.next_coarser() {
                edges.push(SemanticEdge::new(
                    SemanticNode::time_grain(grain),
                    SemanticNode::time_grain(coarser),
                    EdgeLabel::grain_derivation(),
                ));
            }
        }

        for custom in lookup.custom_granularities() {
            edges.push(SemanticEdge::new(
                SemanticNode::time_grain(custom.base()),
                SemanticNode::time_grain(custom.clone()),
                EdgeLabel::grain_derivation(),
            ));
        }
        Ok(())
    }
}
