//! Entity → time dimension edges, and each time dimension's base grain.

use crate::error::{ResolverError, ResolverResult};
use crate::graph::{AttributeNode, EdgeLabel, SemanticEdge, SemanticNode};
use crate::manifest::{DimensionType, ManifestLookup};

use super::{join_targets, SubgraphGenerator};

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeDimensionGenerator;

impl SubgraphGenerator for TimeDimensionGenerator {
    fn name(&self) -> &'static str {
        "time_dimension"
    }

    fn add_edges(&self, lookup: &ManifestLookup, edges: &mut Vec<SemanticEdge>) -> ResolverResult<()> {
        for model in lookup.semantic_models() {
            let scd = model.has_validity_window();
            let dimensions = model
                .dimensions
                .iter()
                .filter(|d| d.dimension_type == DimensionType::Time);

            for dimension in dimensions {
                let grain = dimension
                    .time_granularity()
                    .ok_or_else(|| ResolverError::UnknownDimension {
                        semantic_model: model.name.clone(),
                        dimension: format!("{} (time dimension without a granularity)", dimension.name),
                    })?;
                let attribute: SemanticNode =
                    AttributeNode::time(&dimension.name, &model.name, dimension.is_validity_boundary())
                        .into();

                for entity in join_targets(model) {
                    edges.push(SemanticEdge::new(
                        SemanticNode::entity(&entity.name),
                        attribute.clone(),
                        EdgeLabel::attribute_lookup(&dimension.name, &model.name, scd),
                    ));
                }
                edges.push(SemanticEdge::new(
                    attribute,
                    SemanticNode::time_grain(grain),
                    EdgeLabel::grain_derivation(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AttributeProperty;
    use crate::manifest::{Dimension, EntityType, SemanticManifest, SemanticModel};
    use crate::time::TimeGranularity;

    #[test]
    fn test_time_dimension_edges() {
        let manifest = SemanticManifest::new().with_semantic_model(
            SemanticModel::new("bookings_source")
                .with_entity("booking", EntityType::Primary)
                .with_time_dimension("ds", TimeGranularity::Day),
        );
        let lookup = ManifestLookup::new(manifest).unwrap();

        let mut edges = vec![];
        TimeDimensionGenerator.add_edges(&lookup, &mut edges).unwrap();

        assert_eq!(edges.len(), 2);
        assert_eq!(edges[1].head, SemanticNode::time_grain(TimeGranularity::Day));
        let attr = edges[0].head.as_attribute().unwrap();
        assert!(attr.has(AttributeProperty::Time));
        assert!(!attr.has(AttributeProperty::ValidityBoundary));
    }

    #[test]
    fn test_validity_boundary_property() {
        let manifest = SemanticManifest::new().with_semantic_model(
            SemanticModel::new("listings_history")
                .with_entity("listing", EntityType::Natural)
                .with_dimension(Dimension::time("valid_from", TimeGranularity::Day).with_validity(true, false)),
        );
        let lookup = ManifestLookup::new(manifest).unwrap();

        let mut edges = vec![];
        TimeDimensionGenerator.add_edges(&lookup, &mut edges).unwrap();

        let attr = edges[0].head.as_attribute().unwrap();
        assert!(attr.has(AttributeProperty::ValidityBoundary));
        assert!(edges[0].label.validity_window);
    }
}
