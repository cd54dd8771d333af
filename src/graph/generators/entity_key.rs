//! Measure → entity key associations.

use crate::error::ResolverResult;
use crate::graph::{EdgeLabel, SemanticEdge, SemanticNode};
use crate::manifest::ManifestLookup;

use super::SubgraphGenerator;

/// Links every measure to each entity of its semantic model. These are the
/// first hops of every path starting at a measure.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityKeyGenerator;

impl SubgraphGenerator for EntityKeyGenerator {
    fn name(&self) -> &'static str {
        "entity_key"
    }

    fn add_edges(&self, lookup: &ManifestLookup, edges: &mut Vec<SemanticEdge>) -> ResolverResult<()> {
        for model in lookup.semantic_models() {
            for measure in &model.measures {
                for entity in &model.entities {
                    edges.push(SemanticEdge::new(
                        SemanticNode::measure(&measure.name),
                        SemanticNode::entity(&entity.name),
                        EdgeLabel::key_association(&entity.name, &model.name),
                    ));
                }
            }
        }
        Ok(())
    }
}
