//! Entity → entity joins.

use crate::error::ResolverResult;
use crate::graph::{EdgeLabel, SemanticEdge, SemanticNode};
use crate::manifest::ManifestLookup;

use super::{join_targets, SubgraphGenerator};

/// For every model, an edge from each entity the model can be joined on to
/// every other entity it declares: having reached the key, the join exposes
/// the model's other keys.
///
/// Joins into a model with a validity window carry the validity marker.
/// Models that share entities produce cycles (A → B through one model,
/// B → A through another), which traversal bounds handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityJoinGenerator;

impl SubgraphGenerator for EntityJoinGenerator {
    fn name(&self) -> &'static str {
        "entity_join"
    }

    fn add_edges(&self, lookup: &ManifestLookup, edges: &mut Vec<SemanticEdge>) -> ResolverResult<()> {
        for model in lookup.semantic_models() {
            let scd = model.has_validity_window();
            for target in join_targets(model) {
                for other in model.entities.iter().filter(|e| e.name != target.name) {
                    edges.push(SemanticEdge::new(
                        SemanticNode::entity(&target.name),
                        SemanticNode::entity(&other.name),
                        EdgeLabel::join(&other.name, &model.name, scd),
                    ));
                }
            }
        }
        Ok(())
    }
}
