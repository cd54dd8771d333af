#[path = "../common/mod.rs"]
mod common;

use mantis_resolver::manifest::{EntityType, SemanticModel};
use mantis_resolver::resolution::ResolutionPurpose;
use mantis_resolver::trie::ElementFilter;
use mantis_resolver::{IssueKind, ItemProperty, ResolverError, ResolverSettings, SemanticResolver};

fn issue_kinds(result: &mantis_resolver::ResolutionResult) -> Vec<&IssueKind> {
    result.issues.iter().map(|i| &i.kind).collect()
}

#[test]
fn test_available_items_for_simple_metric() {
    let resolver = common::resolver(common::bookings_manifest());
    let items = resolver
        .for_metrics(&["bookings"])
        .unwrap()
        .resolve_available_items(ResolutionPurpose::GroupBy, None);
    let names = common::names(&items.items);

    for expected in [
        "booking__is_instant",
        "listing__country",
        "listing__user__home_state",
        "metric_time__day",
        "metric_time__extract_dow",
    ] {
        assert!(names.contains(&expected.to_string()), "missing {expected}");
    }
    assert!(!names.contains(&"listing__bookings".to_string()));

    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names.len(), sorted.len());
}

#[test]
fn test_available_items_are_deterministic() {
    let first = common::resolver(common::bookings_manifest());
    let second = common::resolver(common::bookings_manifest());

    let a = first
        .for_metrics(&["bookings_per_listing"])
        .unwrap()
        .resolve_available_items(ResolutionPurpose::Filter, None);
    let b = second
        .for_metrics(&["bookings_per_listing"])
        .unwrap()
        .resolve_available_items(ResolutionPurpose::Filter, None);

    assert_eq!(a.items, b.items);
    assert_eq!(a.issues, b.issues);
}

#[test]
fn test_available_items_with_filter() {
    let resolver = common::resolver(common::bookings_manifest());
    let filter = ElementFilter::new().with_any_of([ItemProperty::MetricTime]);
    let items = resolver
        .for_metrics(&["bookings"])
        .unwrap()
        .resolve_available_items(ResolutionPurpose::GroupBy, Some(&filter));

    assert!(!items.items.is_empty());
    assert!(items.items.iter().all(|i| i.key.element_name == "metric_time"));
}

#[test]
fn test_call_syntax_and_dunder_agree() {
    let resolver = common::resolver(common::bookings_manifest());
    let group_by = resolver.for_metrics(&["bookings"]).unwrap();

    let result = group_by.resolve_request(
        &[
            "TimeDimension('metric_time', 'month')",
            "Dimension('listing__country')",
            "Entity('listing')",
        ],
        ResolutionPurpose::GroupBy,
    );
    assert!(!result.has_errors(), "{:?}", result.issues);
    assert_eq!(result.names(), vec!["metric_time__month", "listing__country", "listing"]);
}

#[test]
fn test_no_match_suggests_close_names() {
    let resolver = common::resolver(common::bookings_manifest());
    let result = resolver
        .for_metrics(&["bookings"])
        .unwrap()
        .resolve_request(&["listing__countri"], ResolutionPurpose::GroupBy);

    match issue_kinds(&result).as_slice() {
        [IssueKind::NoMatchingItems { suggestions, .. }] => {
            assert_eq!(suggestions.first().map(String::as_str), Some("listing__country"))
        }
        other => panic!("unexpected issues: {other:?}"),
    }
}

#[test]
fn test_item_missing_for_one_metric() {
    let resolver = common::resolver(common::bookings_manifest());
    let result = resolver
        .for_metrics(&["bookings", "views"])
        .unwrap()
        .resolve_request(&["booking__is_instant"], ResolutionPurpose::GroupBy);

    match issue_kinds(&result).as_slice() {
        [IssueKind::NotAvailableForAll { excluded_by, .. }] => assert_eq!(excluded_by, &vec!["views".to_string()]),
        other => panic!("unexpected issues: {other:?}"),
    }
    assert!(result.resolved.is_empty());
}

#[test]
fn test_grain_missing_for_one_metric_names_it() {
    let resolver = common::resolver(common::bookings_manifest());
    let group_by = resolver.for_metrics(&["bookings", "views"]).unwrap();

    let result = group_by.resolve_request(&["metric_time__day"], ResolutionPurpose::GroupBy);
    match result.issues.as_slice() {
        [issue] => {
            assert!(matches!(
                &issue.kind,
                IssueKind::NotAvailableForAll { excluded_by, .. } if excluded_by == &vec!["views".to_string()]
            ));
            assert_eq!(issue.dag_path.labels(), &["Query".to_string()]);
        }
        other => panic!("unexpected issues: {other:?}"),
    }

    // No input offers hourly grain at all.
    let result = group_by.resolve_request(&["metric_time__hour"], ResolutionPurpose::GroupBy);
    assert!(matches!(
        issue_kinds(&result).as_slice(),
        [IssueKind::UnsupportedGrain { .. }]
    ));
}

#[test]
fn test_grain_missing_inside_ratio_names_input() {
    let resolver = common::resolver(common::bookings_manifest());
    let result = resolver
        .for_metrics(&["bookings_per_view"])
        .unwrap()
        .resolve_request(&["metric_time__day"], ResolutionPurpose::GroupBy);

    match result.issues.as_slice() {
        [issue] => {
            assert!(matches!(
                &issue.kind,
                IssueKind::NotAvailableForAll { excluded_by, .. } if excluded_by == &vec!["views".to_string()]
            ));
            assert_eq!(
                issue.dag_path.labels(),
                &["Query".to_string(), "Metric(bookings_per_view)".to_string()]
            );
        }
        other => panic!("unexpected issues: {other:?}"),
    }
}

#[test]
fn test_date_part_rejected_for_cumulative() {
    let resolver = common::resolver(common::bookings_manifest());
    let result = resolver
        .for_metrics(&["cumulative_bookings"])
        .unwrap()
        .resolve_request(&["metric_time__extract_year"], ResolutionPurpose::GroupBy);

    match issue_kinds(&result).as_slice() {
        [IssueKind::NotAvailableForAll { excluded_by, .. }] => {
            assert_eq!(excluded_by, &vec!["cumulative_bookings".to_string()])
        }
        other => panic!("unexpected issues: {other:?}"),
    }
}

#[test]
fn test_ambiguous_name_is_an_error() {
    let manifest = common::bookings_manifest().with_semantic_model(
        SemanticModel::new("listings_extra")
            .with_entity("listing", EntityType::Primary)
            .with_categorical_dimension("country"),
    );
    let resolver = common::resolver(manifest);
    let result = resolver
        .for_metrics(&["bookings"])
        .unwrap()
        .resolve_request(&["listing__country"], ResolutionPurpose::GroupBy);

    assert!(result.has_errors());
    match issue_kinds(&result).as_slice() {
        [IssueKind::AmbiguousName { candidate_paths, .. }] => assert_eq!(candidate_paths.len(), 2),
        other => panic!("unexpected issues: {other:?}"),
    }
}

#[test]
fn test_scd_dimension_needs_metric_time() {
    let resolver = common::resolver(common::scd_manifest());
    let group_by = resolver.for_metrics(&["bookings"]).unwrap();

    let alone = group_by.resolve_request(&["listing__host_name"], ResolutionPurpose::GroupBy);
    assert!(matches!(
        issue_kinds(&alone).as_slice(),
        [IssueKind::ScdRequiresMetricTime { .. }]
    ));

    let with_time = group_by.resolve_request(&["listing__host_name", "metric_time__day"], ResolutionPurpose::GroupBy);
    assert!(!with_time.has_errors(), "{:?}", with_time.issues);
}

#[test]
fn test_scd_check_can_be_disabled() {
    let settings = ResolverSettings {
        allow_scd_without_metric_time: true,
        ..Default::default()
    };
    let resolver = SemanticResolver::new(common::scd_manifest(), settings).unwrap();
    let result = resolver
        .for_metrics(&["bookings"])
        .unwrap()
        .resolve_request(&["listing__host_name"], ResolutionPurpose::GroupBy);
    assert!(!result.has_errors());
}

#[test]
fn test_group_by_metric_in_filter() {
    let resolver = common::resolver(common::bookings_manifest());
    let group_by = resolver.for_metrics(&["views"]).unwrap();

    let as_filter = group_by.resolve_request(&["Metric('bookings', group_by=['listing'])"], ResolutionPurpose::Filter);
    assert!(!as_filter.has_errors(), "{:?}", as_filter.issues);
    assert_eq!(as_filter.names(), vec!["listing__bookings"]);

    let as_group_by = group_by.resolve_request(&["listing__bookings"], ResolutionPurpose::GroupBy);
    assert!(matches!(
        issue_kinds(&as_group_by).as_slice(),
        [IssueKind::GroupByMetricNotAllowed { .. }]
    ));
}

#[test]
fn test_invalid_input_is_reported_not_fatal() {
    let resolver = common::resolver(common::bookings_manifest());
    let result = resolver
        .for_metrics(&["bookings"])
        .unwrap()
        .resolve_request(&["listing.country", "listing__country"], ResolutionPurpose::GroupBy);

    assert_eq!(result.names(), vec!["listing__country"]);
    assert!(matches!(issue_kinds(&result).as_slice(), [IssueKind::InvalidInput { .. }]));
}

#[test]
fn test_unknown_metric_is_fatal() {
    let resolver = common::resolver(common::bookings_manifest());
    let err = resolver.for_metrics(&["bookins"]).err().unwrap();
    assert!(matches!(err, ResolverError::UnknownMetric { suggestions, .. } if suggestions.contains(&"bookings".to_string())));
}
