#[path = "../common/mod.rs"]
mod common;

use std::collections::BTreeSet;

use mantis_resolver::manifest::{EntityType, SemanticManifest, SemanticModel};
use mantis_resolver::naming::ElementPathKey;
use mantis_resolver::trie::{AttributeTrieResolver, DunderNameTrie, ElementFilter};
use mantis_resolver::{ItemKind, ItemProperty, ManifestLookup, ResolverSettings, SemanticGraph, SemanticGraphBuilder};

fn build(manifest: SemanticManifest) -> SemanticGraph {
    SemanticGraphBuilder::new()
        .build(&ManifestLookup::new(manifest).unwrap())
        .unwrap()
}

fn names(trie: &DunderNameTrie) -> BTreeSet<String> {
    trie.items().iter().map(|i| i.key.qualified_name()).collect()
}

fn country() -> ElementPathKey {
    ElementPathKey::new("country", vec!["listing".into()])
}

#[test]
fn test_second_dimension_source_is_preserved_as_ambiguity() {
    let manifest = common::bookings_manifest().with_semantic_model(
        SemanticModel::new("listings_extra")
            .with_entity("listing", EntityType::Primary)
            .with_categorical_dimension("country"),
    );
    let graph = build(manifest);
    let resolver = AttributeTrieResolver::new(&graph, &ResolverSettings::default());

    let trie = resolver.resolve_measure("bookings", None).unwrap();
    let item = trie.get(&country()).unwrap();

    assert!(item.ambiguous);
    assert_eq!(item.paths.len(), 2);
    let ends: BTreeSet<_> = item.paths.iter().filter_map(|p| p.nodes.last().cloned()).collect();
    assert_eq!(
        ends,
        BTreeSet::from([
            "Attribute(listings_extra.country)".to_string(),
            "Attribute(listings_latest.country)".to_string(),
        ])
    );
}

#[test]
fn test_unique_path_is_not_ambiguous() {
    let graph = build(common::bookings_manifest());
    let resolver = AttributeTrieResolver::new(&graph, &ResolverSettings::default());

    let trie = resolver.resolve_measure("bookings", None).unwrap();
    let item = trie.get(&country()).unwrap();
    assert!(!item.ambiguous);
    assert_eq!(item.paths.iter().next().map(|p| p.join_count()), Some(1));
}

#[test]
fn test_multi_hop_items() {
    let graph = build(common::bookings_manifest());
    let resolver = AttributeTrieResolver::new(&graph, &ResolverSettings::default());

    let trie = resolver.resolve_measure("bookings", None).unwrap();
    let home_state = trie
        .get(&ElementPathKey::new("home_state", vec!["listing".into(), "user".into()]))
        .unwrap();
    assert!(home_state.has(ItemProperty::MultiHop));
    assert_eq!(home_state.kind, ItemKind::Dimension);

    let user = trie
        .get(&ElementPathKey::new("user", vec!["listing".into()]))
        .unwrap();
    assert_eq!(user.kind, ItemKind::Entity);
}

#[test]
fn test_views_only_reach_coarse_metric_time() {
    let graph = build(common::bookings_manifest());
    let resolver = AttributeTrieResolver::new(&graph, &ResolverSettings::default());

    let views = names(&resolver.resolve_metric_scope("views", None).unwrap());
    assert!(!views.contains("metric_time__day"));
    assert!(views.contains("metric_time__month"));
    assert!(views.contains("metric_time__extract_quarter"));
    assert!(!views.contains("metric_time__extract_dow"));
}

#[test]
fn test_scd_items_are_flagged_and_filterable() {
    let graph = build(common::scd_manifest());
    let resolver = AttributeTrieResolver::new(&graph, &ResolverSettings::default());
    let host = ElementPathKey::new("host_name", vec!["listing".into()]);

    let trie = resolver.resolve_measure("bookings", None).unwrap();
    assert!(trie.get(&host).unwrap().has(ItemProperty::ScdHop));

    let no_scd = ElementFilter::new().without_any_of([ItemProperty::ScdHop]);
    let filtered = resolver.resolve_measure("bookings", Some(&no_scd)).unwrap();
    assert!(filtered.get(&host).is_none());
    assert!(filtered.get(&country()).is_some());
}

#[test]
fn test_without_metrics_starts_at_every_entity() {
    let graph = build(common::bookings_manifest());
    let resolver = AttributeTrieResolver::new(&graph, &ResolverSettings::default());

    let names = names(&resolver.resolve_without_metrics(None).unwrap());
    for expected in ["listing", "user", "user__home_state", "listing__country", "metric_time__day"] {
        assert!(names.contains(expected), "missing {expected}");
    }
}

#[test]
fn test_element_name_filter() {
    let graph = build(common::bookings_manifest());
    let resolver = AttributeTrieResolver::new(&graph, &ResolverSettings::default());
    let filter = ElementFilter::new().with_element_names(["country"]);

    let trie = resolver.resolve_measure("bookings", Some(&filter)).unwrap();
    assert!(trie.items().iter().all(|i| i.key.element_name == "country"));
    assert_eq!(trie.len(), 1);
}
