#[path = "../common/mod.rs"]
mod common;

use mantis_resolver::graph::generators::{
    default_generators, CategoricalDimensionGenerator, EntityJoinGenerator, SubgraphGenerator,
};
use mantis_resolver::graph::{AttributeNode, EdgeLabel, NodeKind, SemanticEdge, SemanticNode};
use mantis_resolver::manifest::{EntityType, Metric, SemanticManifest, SemanticModel};
use mantis_resolver::time::TimeGranularity;
use mantis_resolver::{ManifestLookup, ResolverError, SemanticGraphBuilder};

fn lookup(manifest: SemanticManifest) -> ManifestLookup {
    ManifestLookup::new(manifest).unwrap()
}

#[test]
fn test_snapshot_of_join_and_dimension_edges() {
    let manifest = SemanticManifest::new()
        .with_semantic_model(
            SemanticModel::new("listings")
                .with_entity("listing", EntityType::Primary)
                .with_entity("user", EntityType::Foreign)
                .with_categorical_dimension("country"),
        )
        .with_semantic_model(
            SemanticModel::new("users")
                .with_entity("user", EntityType::Primary)
                .with_categorical_dimension("home_state"),
        );
    let generators: Vec<Box<dyn SubgraphGenerator>> =
        vec![Box::new(EntityJoinGenerator), Box::new(CategoricalDimensionGenerator)];
    let graph = SemanticGraphBuilder::with_generators(generators)
        .build(&lookup(manifest))
        .unwrap();

    insta::assert_snapshot!(graph.snapshot().to_text().trim_end(), @r"
    Entity(listing)
    Entity(user)
    Attribute(listings.country)
    Attribute(users.home_state)
    Entity(listing) -[Join 'user' @listings LeftOuter]-> Entity(user)
    Entity(listing) -[DunderSegment 'country' @listings LeftOuter]-> Attribute(listings.country)
    Entity(user) -[DunderSegment 'home_state' @users LeftOuter]-> Attribute(users.home_state)
    ");
}

#[test]
fn test_generator_order_does_not_change_graph() {
    let lookup = lookup(common::bookings_manifest());

    let forward = SemanticGraphBuilder::new().build(&lookup).unwrap();
    let mut reversed_generators = default_generators();
    reversed_generators.reverse();
    let reversed = SemanticGraphBuilder::with_generators(reversed_generators)
        .build(&lookup)
        .unwrap();

    assert_eq!(forward.snapshot(), reversed.snapshot());
}

#[test]
fn test_rebuild_is_identical() {
    let lookup = lookup(common::bookings_manifest());
    let a = SemanticGraphBuilder::new().build(&lookup).unwrap();
    let b = SemanticGraphBuilder::new().build(&lookup).unwrap();
    assert_eq!(a.snapshot().to_text(), b.snapshot().to_text());
}

#[test]
fn test_bookings_graph_shape() {
    let graph = SemanticGraphBuilder::new()
        .build(&lookup(common::bookings_manifest()))
        .unwrap();

    assert!(graph.has_edge(&SemanticEdge::new(
        SemanticNode::measure("bookings"),
        SemanticNode::entity("listing"),
        EdgeLabel::key_association("listing", "bookings_source"),
    )));
    assert!(graph.has_edge(&SemanticEdge::new(
        SemanticNode::entity("listing"),
        AttributeNode::categorical("country", "listings_latest").into(),
        EdgeLabel::attribute_lookup("country", "listings_latest", false),
    )));
    assert!(graph.has_edge(&SemanticEdge::new(
        SemanticNode::entity("listing"),
        SemanticNode::entity("user"),
        EdgeLabel::join("user", "listings_latest", false),
    )));
    assert!(graph.has_edge(&SemanticEdge::new(
        SemanticNode::time_grain(TimeGranularity::Day),
        SemanticNode::time_grain(TimeGranularity::Week),
        EdgeLabel::grain_derivation(),
    )));

    // Every metric is a node, each with its definition inputs.
    assert_eq!(graph.nodes_of_kind(NodeKind::Metric).len(), 9);
    let parents = graph.metric_parents("bookings_per_listing").unwrap();
    assert_eq!(parents.metrics, vec!["bookings", "listings"]);
    assert!(parents.measures.is_empty());

    let conversion = graph.metric_parents("view_to_booking").unwrap();
    assert_eq!(conversion.measures, vec!["bookings", "views"]);
}

#[test]
fn test_scd_model_edges_are_marked() {
    let graph = SemanticGraphBuilder::new()
        .build(&lookup(common::scd_manifest()))
        .unwrap();

    assert!(graph.has_edge(&SemanticEdge::new(
        SemanticNode::entity("listing"),
        AttributeNode::categorical("host_name", "listing_hosts").into(),
        EdgeLabel::attribute_lookup("host_name", "listing_hosts", true),
    )));
}

#[test]
fn test_unknown_measure_is_fatal() {
    let manifest = common::bookings_manifest().with_metric(Metric::simple("broken", "no_such_measure"));
    let err = SemanticGraphBuilder::new().build(&lookup(manifest)).err().unwrap();
    assert!(matches!(err, ResolverError::UnknownMeasure(name) if name == "no_such_measure"));
}

#[test]
fn test_conversion_entity_must_exist() {
    let manifest =
        common::bookings_manifest().with_metric(Metric::conversion("broken", "views", "bookings", "session"));
    let err = SemanticGraphBuilder::new().build(&lookup(manifest)).err().unwrap();
    assert!(matches!(err, ResolverError::UnknownEntity { entity, .. } if entity == "session"));
}
