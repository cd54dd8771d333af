//! Shared manifests for integration tests.

#![allow(dead_code)]

use mantis_resolver::manifest::{Dimension, EntityType, Metric, SemanticManifest, SemanticModel};
use mantis_resolver::time::TimeGranularity;
use mantis_resolver::{ResolverSettings, SemanticResolver};

pub fn bookings_model() -> SemanticModel {
    SemanticModel::new("bookings_source")
        .with_agg_time_dimension("ds")
        .with_entity("booking", EntityType::Primary)
        .with_entity("listing", EntityType::Foreign)
        .with_entity("guest", EntityType::Foreign)
        .with_time_dimension("ds", TimeGranularity::Day)
        .with_categorical_dimension("is_instant")
        .with_measure("bookings")
        .with_measure("booking_value")
}

pub fn listings_model() -> SemanticModel {
    SemanticModel::new("listings_latest")
        .with_agg_time_dimension("created_at")
        .with_entity("listing", EntityType::Primary)
        .with_entity("user", EntityType::Foreign)
        .with_time_dimension("created_at", TimeGranularity::Day)
        .with_categorical_dimension("country")
        .with_categorical_dimension("capacity")
        .with_measure("listings")
}

pub fn users_model() -> SemanticModel {
    SemanticModel::new("users_source")
        .with_entity("user", EntityType::Primary)
        .with_categorical_dimension("home_state")
}

/// Views are only recorded monthly.
pub fn views_model() -> SemanticModel {
    SemanticModel::new("views_source")
        .with_agg_time_dimension("ds")
        .with_entity("view", EntityType::Primary)
        .with_entity("listing", EntityType::Foreign)
        .with_time_dimension("ds", TimeGranularity::Month)
        .with_categorical_dimension("device")
        .with_measure("views")
}

/// Listing hosts over time, keyed by a validity window.
pub fn hosts_model() -> SemanticModel {
    SemanticModel::new("listing_hosts")
        .with_entity("listing", EntityType::Natural)
        .with_dimension(Dimension::time("window_start", TimeGranularity::Day).with_validity(true, false))
        .with_dimension(Dimension::time("window_end", TimeGranularity::Day).with_validity(false, true))
        .with_categorical_dimension("host_name")
}

pub fn bookings_manifest() -> SemanticManifest {
    SemanticManifest::new()
        .with_semantic_model(bookings_model())
        .with_semantic_model(listings_model())
        .with_semantic_model(users_model())
        .with_semantic_model(views_model())
        .with_metric(Metric::simple("bookings", "bookings"))
        .with_metric(Metric::simple("booking_value", "booking_value"))
        .with_metric(Metric::simple("listings", "listings"))
        .with_metric(Metric::simple("views", "views"))
        .with_metric(Metric::cumulative("cumulative_bookings", "bookings"))
        .with_metric(Metric::ratio("bookings_per_listing", "bookings", "listings"))
        .with_metric(Metric::ratio("bookings_per_view", "bookings", "views"))
        .with_metric(Metric::derived(
            "value_per_booking",
            "booking_value / bookings",
            &["booking_value", "bookings"],
        ))
        .with_metric(Metric::conversion("view_to_booking", "views", "bookings", "listing"))
}

pub fn scd_manifest() -> SemanticManifest {
    bookings_manifest().with_semantic_model(hosts_model())
}

pub fn resolver(manifest: SemanticManifest) -> SemanticResolver {
    SemanticResolver::new(manifest, ResolverSettings::default()).unwrap()
}

pub fn names(items: &[mantis_resolver::ResolvedItem]) -> Vec<String> {
    items.iter().map(|item| item.key.qualified_name()).collect()
}
