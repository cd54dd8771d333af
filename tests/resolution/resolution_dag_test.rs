#[path = "../common/mod.rs"]
mod common;

use mantis_resolver::config::SuggestionSettings;
use mantis_resolver::manifest::{EntityType, Metric, SemanticManifest, SemanticModel};
use mantis_resolver::resolution::{DagNode, ResolutionDag};
use mantis_resolver::time::TimeGranularity;
use mantis_resolver::trie::AttributeTrieResolver;
use mantis_resolver::{
    IssueKind, IssueSeverity, ManifestLookup, ResolverError, ResolverSettings, SemanticGraphBuilder,
};

/// m1 and m2 share the `e` entity (and its dimension `a`); each also has a
/// dimension of its own.
fn split_manifest() -> SemanticManifest {
    SemanticManifest::new()
        .with_semantic_model(
            SemanticModel::new("shared")
                .with_entity("e", EntityType::Primary)
                .with_categorical_dimension("a"),
        )
        .with_semantic_model(
            SemanticModel::new("first")
                .with_agg_time_dimension("ds")
                .with_entity("k1", EntityType::Primary)
                .with_entity("e", EntityType::Foreign)
                .with_time_dimension("ds", TimeGranularity::Day)
                .with_categorical_dimension("b")
                .with_measure("m1"),
        )
        .with_semantic_model(
            SemanticModel::new("second")
                .with_agg_time_dimension("ds")
                .with_entity("k2", EntityType::Primary)
                .with_entity("e", EntityType::Foreign)
                .with_time_dimension("ds", TimeGranularity::Day)
                .with_categorical_dimension("c")
                .with_measure("m2"),
        )
        .with_metric(Metric::simple("m1", "m1"))
        .with_metric(Metric::simple("m2", "m2"))
        .with_metric(Metric::ratio("m1_per_m2", "m1", "m2"))
}

fn evaluate(manifest: SemanticManifest, metrics: &[&str]) -> mantis_resolver::resolution::DagNodeOutput {
    let lookup = ManifestLookup::new(manifest).unwrap();
    let graph = SemanticGraphBuilder::new().build(&lookup).unwrap();
    let dag = ResolutionDag::build(&graph, &lookup, metrics, &SuggestionSettings::default()).unwrap();
    let resolver = AttributeTrieResolver::new(&graph, &ResolverSettings::default());
    dag.evaluate(&resolver).unwrap().into_sink_output()
}

#[test]
fn test_composition_cycle_is_fatal() {
    let manifest = common::bookings_manifest()
        .with_metric(Metric::derived("loop_a", "loop_b + 1", &["loop_b"]))
        .with_metric(Metric::derived("loop_b", "loop_a - 1", &["loop_a"]));
    let lookup = ManifestLookup::new(manifest).unwrap();
    let graph = SemanticGraphBuilder::new().build(&lookup).unwrap();

    let err = ResolutionDag::build(&graph, &lookup, &["loop_a"], &SuggestionSettings::default())
        .err()
        .unwrap();
    match err {
        ResolverError::MetricCycle { cycle } => assert_eq!(cycle, vec!["loop_a", "loop_b", "loop_a"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_intersection_and_exclusion_issues() {
    let output = evaluate(split_manifest(), &["m1", "m2"]);
    let names: Vec<_> = output.items.keys().map(|k| k.qualified_name()).collect();

    assert!(names.contains(&"e__a".to_string()));
    assert!(names.contains(&"metric_time__day".to_string()));
    assert!(!names.contains(&"k1__b".to_string()));
    assert!(!names.contains(&"k2__c".to_string()));

    let excluded = |item: &str| {
        output.issues.iter().find_map(|issue| match &issue.kind {
            IssueKind::ExcludedByInput {
                item: excluded_item,
                excluded_by,
                ..
            } if excluded_item == item => Some((excluded_by.clone(), issue.severity)),
            _ => None,
        })
    };
    assert_eq!(excluded("k1__b"), Some((vec!["m2".to_string()], IssueSeverity::Info)));
    assert_eq!(excluded("k2__c"), Some((vec!["m1".to_string()], IssueSeverity::Info)));
    assert_eq!(excluded("e__a"), None);
}

#[test]
fn test_ratio_node_intersects_its_inputs() {
    let output = evaluate(split_manifest(), &["m1_per_m2"]);
    assert!(output.items.keys().any(|k| k.qualified_name() == "e__a"));
    assert!(!output.items.keys().any(|k| k.qualified_name() == "k1__b"));

    let issue = output
        .issues
        .iter()
        .find(|issue| matches!(&issue.kind, IssueKind::ExcludedByInput { item, .. } if item == "k1__b"))
        .unwrap();
    assert_eq!(issue.dag_path.labels(), &["Query", "Metric(m1_per_m2)"]);
}

#[test]
fn test_grain_monotonicity() {
    let output = evaluate(common::bookings_manifest(), &["bookings_per_view"]);
    let grains: Vec<_> = output
        .items
        .iter()
        .filter(|item| item.key.element_name == "metric_time" && item.key.date_part.is_none())
        .filter_map(|item| item.key.time_grain.clone())
        .collect();

    assert_eq!(
        grains,
        vec![
            TimeGranularity::Month.into(),
            TimeGranularity::Quarter.into(),
            TimeGranularity::Year.into(),
        ]
    );
    // Grain-only differences are not reported as exclusions.
    assert!(!output.issues.iter().any(
        |issue| matches!(&issue.kind, IssueKind::ExcludedByInput { item, .. } if item == "metric_time")
    ));
}

#[test]
fn test_conversion_metric_uses_both_measures() {
    let lookup = ManifestLookup::new(common::bookings_manifest()).unwrap();
    let graph = SemanticGraphBuilder::new().build(&lookup).unwrap();
    let dag = ResolutionDag::build(&graph, &lookup, &["view_to_booking"], &SuggestionSettings::default()).unwrap();

    let measures: Vec<_> = dag
        .nodes()
        .filter_map(|(_, node)| match node {
            DagNode::MeasureSource { measure } => Some(measure.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(measures, vec!["bookings", "views"]);

    let resolver = AttributeTrieResolver::new(&graph, &ResolverSettings::default());
    let output = dag.evaluate(&resolver).unwrap().into_sink_output();
    let names: Vec<_> = output.items.keys().map(|k| k.qualified_name()).collect();
    assert!(names.contains(&"listing__country".to_string()));
    assert!(names.contains(&"metric_time__month".to_string()));
    assert!(!names.contains(&"booking__is_instant".to_string()));
}

#[test]
fn test_query_without_metrics() {
    let lookup = ManifestLookup::new(common::bookings_manifest()).unwrap();
    let graph = SemanticGraphBuilder::new().build(&lookup).unwrap();
    let dag = ResolutionDag::build(&graph, &lookup, &[], &SuggestionSettings::default()).unwrap();

    assert_eq!(dag.node_count(), 2);
    assert_eq!(dag.sources().len(), 1);
    assert_eq!(*dag.node(dag.sources()[0]), DagNode::NoMetricsSource);
}
