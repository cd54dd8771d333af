//! Metrics defined directly on measures.

use crate::error::{ResolverError, ResolverResult};
use crate::graph::{AttributeNode, EdgeLabel, SemanticEdge, SemanticNode};
use crate::manifest::{ManifestLookup, MetricType};

use super::{metric_time_owner, SubgraphGenerator};

/// Simple, cumulative and conversion metrics.
///
/// Emits measure → metric definition edges, metric → `metric_time` (bound to
/// the aggregation time dimension of the metric's primary measure), and for
/// simple metrics entity → metric edges that make the metric usable as a
/// group-by metric (`listing__bookings`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleMetricGenerator;

impl SubgraphGenerator for SimpleMetricGenerator {
    fn name(&self) -> &'static str {
        "simple_metric"
    }

    fn add_edges(&self, lookup: &ManifestLookup, edges: &mut Vec<SemanticEdge>) -> ResolverResult<()> {
        for metric in lookup.metrics() {
            let measures = lookup.direct_measures(metric)?;
            let Some(primary) = measures.first() else {
                continue;
            };
            let metric_node = SemanticNode::metric(&metric.name);

            if let Some(conversion) = &metric.type_params.conversion_type_params {
                if lookup.models_with_entity(&conversion.entity).next().is_none() {
                    return Err(ResolverError::UnknownEntity {
                        entity: conversion.entity.clone(),
                        referenced_by: metric.name.clone(),
                    });
                }
            }

            for measure_name in &measures {
                // Fails on measures the manifest does not define.
                lookup.measure(measure_name)?;
                edges.push(SemanticEdge::new(
                    SemanticNode::measure(*measure_name),
                    metric_node.clone(),
                    EdgeLabel::metric_definition(None),
                ));
            }

            let (agg_model, dimension) = lookup.agg_time_dimension(primary)?;
            edges.push(SemanticEdge::new(
                metric_node.clone(),
                AttributeNode::metric_time(metric_time_owner(agg_model, dimension)).into(),
                EdgeLabel::dunder_segment(crate::METRIC_TIME, &agg_model.name),
            ));

            if metric.metric_type == MetricType::Simple {
                let model = lookup.measure(primary)?.semantic_model;
                for entity in &model.entities {
                    edges.push(SemanticEdge::new(
                        SemanticNode::entity(&entity.name),
                        metric_node.clone(),
                        EdgeLabel::join(&metric.name, &model.name, false),
                    ));
                }
            }
        }
        Ok(())
    }
}
