#[path = "../common/mod.rs"]
mod common;

use mantis_resolver::config::SuggestionSettings;
use mantis_resolver::manifest::TimeSpine;
use mantis_resolver::naming::{suggest, CallNamingScheme, ElementPathKey, InputParser, NamingScheme, SpecPattern};
use mantis_resolver::resolution::ResolutionPurpose;
use mantis_resolver::time::{DatePart, TimeGranularity};
use mantis_resolver::ItemKind;

#[test]
fn test_every_available_item_is_addressable_by_its_name() {
    let resolver = common::resolver(common::bookings_manifest());
    let group_by = resolver.for_metrics(&["bookings"]).unwrap();
    let items = group_by.resolve_available_items(ResolutionPurpose::Filter, None).items;
    let candidates: Vec<_> = items.iter().collect();
    let parser = InputParser::for_lookup(resolver.lookup());

    for item in &items {
        let name = parser.input_str(item);
        let parsed = parser.parse(&name).unwrap();
        let matched = parsed.pattern().match_items(&candidates);
        assert!(matched.iter().any(|m| m.key == item.key), "{name} did not match itself");
    }
}

#[test]
fn test_call_syntax_round_trips_through_call_scheme() {
    let resolver = common::resolver(common::bookings_manifest());
    let group_by = resolver.for_metrics(&["bookings"]).unwrap();
    let items = group_by.resolve_available_items(ResolutionPurpose::Filter, None).items;
    let scheme = CallNamingScheme::default();

    for item in items.iter().filter(|i| i.kind != ItemKind::Metric) {
        let call = scheme.input_str(item);
        let parsed = scheme.parse(&call).unwrap();
        assert_eq!(parsed.key, item.key, "{call}");
    }
}

#[test]
fn test_descending_forms() {
    let parser = InputParser::default();

    let dunder = parser.parse("-metric_time__month").unwrap();
    let call = parser
        .parse("TimeDimension('metric_time', 'month').descending(True)")
        .unwrap();
    assert!(dunder.descending && call.descending);
    assert_eq!(dunder.key, call.key);
}

#[test]
fn test_entity_path_keyword() {
    let parser = InputParser::default();
    let parsed = parser
        .parse("Dimension('home_state', entity_path=['listing', 'user'])")
        .unwrap();
    assert_eq!(
        parsed.key,
        ElementPathKey::new("home_state", vec!["listing".into(), "user".into()])
    );
}

#[test]
fn test_date_part_keyword() {
    let parser = InputParser::default();
    let parsed = parser
        .parse("TimeDimension('booking__ds', date_part_name='dow')")
        .unwrap();
    assert_eq!(parsed.key.date_part, Some(DatePart::Dow));
    assert_eq!(parsed.key.qualified_name(), "booking__ds__extract_dow");
}

#[test]
fn test_grain_and_date_part_conflict() {
    let parser = InputParser::default();
    assert!(parser
        .parse("TimeDimension('metric_time', 'month', date_part_name='year')")
        .is_err());
}

#[test]
fn test_custom_grain_from_manifest() {
    let manifest = common::bookings_manifest()
        .with_time_spine(TimeSpine::new(TimeGranularity::Day).with_custom_granularity("fiscal_quarter"));
    let resolver = common::resolver(manifest);
    let parser = InputParser::for_lookup(resolver.lookup());

    let parsed = parser.parse("metric_time__fiscal_quarter").unwrap();
    assert!(parsed.key.time_grain.is_some_and(|g| g.is_custom()));

    // Without the manifest it is just another name segment.
    let plain = InputParser::default().parse("metric_time__fiscal_quarter").unwrap();
    assert_eq!(plain.key.element_name, "fiscal_quarter");
}

#[test]
fn test_suggestions_rank_closest_first() {
    let candidates = ["listing__country", "listing__capacity", "booking__is_instant", "metric_time__day"];
    let settings = SuggestionSettings::default();

    let ranked = suggest("listing__contry", candidates, &settings);
    assert_eq!(ranked.first().map(String::as_str), Some("listing__country"));

    let limited = suggest(
        "listing__contry",
        candidates,
        &SuggestionSettings {
            limit: 1,
            ..settings
        },
    );
    assert_eq!(limited.len(), 1);
}
