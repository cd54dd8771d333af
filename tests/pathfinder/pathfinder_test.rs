#[path = "../common/mod.rs"]
mod common;

use std::collections::BTreeSet;

use mantis_resolver::graph::{NodeKind, SemanticNode};
use mantis_resolver::manifest::{EntityType, SemanticManifest, SemanticModel};
use mantis_resolver::pathfinder::{
    EdgeCountWeight, JoinCountWeight, Pathfinder, StopAtNodeKind, StopOnRepeatedNode, MAX_VALIDITY_EDGES,
};
use mantis_resolver::{ManifestLookup, SemanticGraph, SemanticGraphBuilder};

fn build(manifest: SemanticManifest) -> SemanticGraph {
    SemanticGraphBuilder::new()
        .build(&ManifestLookup::new(manifest).unwrap())
        .unwrap()
}

/// Two models that join each other on swapped keys: x -> y -> x.
fn cyclic_manifest() -> SemanticManifest {
    SemanticManifest::new()
        .with_semantic_model(
            SemanticModel::new("a")
                .with_entity("x", EntityType::Primary)
                .with_entity("y", EntityType::Foreign),
        )
        .with_semantic_model(
            SemanticModel::new("b")
                .with_entity("y", EntityType::Primary)
                .with_entity("x", EntityType::Foreign),
        )
}

#[test]
fn test_cycle_terminates_without_reusing_edges() {
    let graph = build(cyclic_manifest());
    let x = graph.require_index(&SemanticNode::entity("x")).unwrap();

    let paths = Pathfinder::new(&graph, 100).find_paths(&[x], &EdgeCountWeight, 100);

    let rendered: Vec<_> = paths.iter().map(|p| p.describe(&graph)).collect();
    assert_eq!(paths.len(), 2, "{rendered:?}");
    assert!(paths.iter().all(|p| {
        let mut edges = p.edges().to_vec();
        edges.sort();
        edges.dedup();
        edges.len() == p.len()
    }));
}

#[test]
fn test_repeated_node_predicate_keeps_closing_path() {
    let graph = build(cyclic_manifest());
    let x = graph.require_index(&SemanticNode::entity("x")).unwrap();

    let paths = Pathfinder::new(&graph, 100)
        .with_predicate(StopOnRepeatedNode)
        .find_paths(&[x], &EdgeCountWeight, 100);

    assert_eq!(paths.ending_at(x).count(), 1);
}

#[test]
fn test_paths_come_out_in_weight_order() {
    let graph = build(common::bookings_manifest());
    let source = graph.require_index(&SemanticNode::measure("bookings")).unwrap();

    let paths = Pathfinder::new(&graph, 24).find_paths(&[source], &JoinCountWeight, 2);

    assert!(!paths.is_empty());
    let weights: Vec<u32> = paths.iter().map(|p| p.weight()).collect();
    assert!(weights.windows(2).all(|w| w[0] <= w[1]), "{weights:?}");
    assert!(weights.iter().all(|w| *w <= 2));
}

#[test]
fn test_weight_limit_prunes_far_joins() {
    let graph = build(common::bookings_manifest());
    let source = graph.require_index(&SemanticNode::measure("bookings")).unwrap();
    let home_state = graph
        .nodes()
        .find(|(_, n)| n.name() == "home_state")
        .map(|(idx, _)| idx)
        .unwrap();

    let near = Pathfinder::new(&graph, 24).find_paths(&[source], &JoinCountWeight, 1);
    assert_eq!(near.ending_at(home_state).count(), 0);

    let far = Pathfinder::new(&graph, 24).find_paths(&[source], &JoinCountWeight, 2);
    assert!(far.ending_at(home_state).count() >= 1);
}

#[test]
fn test_raising_weight_limit_only_adds_reachable_nodes() {
    let graph = build(common::bookings_manifest());
    let source = graph.require_index(&SemanticNode::measure("bookings")).unwrap();
    let reachable = |max_weight: u32| -> BTreeSet<_> {
        Pathfinder::new(&graph, 24)
            .find_paths(&[source], &JoinCountWeight, max_weight)
            .iter()
            .map(|p| p.terminal())
            .collect()
    };

    for limit in 0..3 {
        let (near, far) = (reachable(limit), reachable(limit + 1));
        assert!(near.is_subset(&far), "limit {limit} reaches nodes limit {} does not", limit + 1);
    }
    assert!(reachable(0).len() < reachable(2).len());
}

#[test]
fn test_edge_limit_bounds_path_length() {
    let graph = build(common::bookings_manifest());
    let source = graph.require_index(&SemanticNode::measure("bookings")).unwrap();

    let paths = Pathfinder::new(&graph, 3).find_paths(&[source], &EdgeCountWeight, u32::MAX);
    assert!(paths.iter().all(|p| p.len() <= 3));
}

#[test]
fn test_stop_at_metric_keeps_metric_terminal() {
    let graph = build(common::bookings_manifest());
    let source = graph.require_index(&SemanticNode::measure("bookings")).unwrap();

    let paths = Pathfinder::new(&graph, 24)
        .with_predicate(StopAtNodeKind(NodeKind::Metric))
        .find_paths(&[source], &JoinCountWeight, 2);

    for path in paths.iter() {
        let (_, inner) = path.nodes().split_last().unwrap();
        assert!(inner.iter().all(|idx| graph.node(*idx).kind() != NodeKind::Metric));
    }
}

#[test]
fn test_at_most_one_validity_edge() {
    let graph = build(common::scd_manifest());
    let sources = graph.nodes_of_kind(NodeKind::Entity);

    let paths = Pathfinder::new(&graph, 24).find_paths(&sources, &EdgeCountWeight, 6);
    assert!(paths.iter().all(|p| p.validity_edges() <= MAX_VALIDITY_EDGES));
}
