//! Entity → categorical dimension edges.

use crate::error::ResolverResult;
use crate::graph::{AttributeNode, EdgeLabel, SemanticEdge, SemanticNode};
use crate::manifest::{DimensionType, ManifestLookup};

use super::{join_targets, SubgraphGenerator};

#[derive(Debug, Clone, Copy, Default)]
pub struct CategoricalDimensionGenerator;

impl SubgraphGenerator for CategoricalDimensionGenerator {
    fn name(&self) -> &'static str {
        "categorical_dimension"
    }

    fn add_edges(&self, lookup: &ManifestLookup, edges: &mut Vec<SemanticEdge>) -> ResolverResult<()> {
        for model in lookup.semantic_models() {
            let scd = model.has_validity_window();
            let dimensions = model
                .dimensions
                .iter()
                .filter(|d| d.dimension_type == DimensionType::Categorical);

            for dimension in dimensions {
                for entity in join_targets(model) {
                    edges.push(SemanticEdge::new(
                        SemanticNode::entity(&entity.name),
                        AttributeNode::categorical(&dimension.name, &model.name).into(),
                        EdgeLabel::attribute_lookup(&dimension.name, &model.name, scd),
                    ));
                }
            }
        }
        Ok(())
    }
}
