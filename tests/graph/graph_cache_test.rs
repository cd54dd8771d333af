#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::thread;

use mantis_resolver::{GraphCache, ManifestLookup, SemanticGraphBuilder};

#[test]
fn test_same_manifest_shares_one_graph() {
    let cache = GraphCache::new();
    let builder = SemanticGraphBuilder::new();
    let first = ManifestLookup::new(common::bookings_manifest()).unwrap();
    let second = ManifestLookup::new(common::bookings_manifest()).unwrap();

    let a = cache.get_or_build(&first, &builder).unwrap();
    let b = cache.get_or_build(&second, &builder).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 1);
    assert!(cache.get(first.content_hash()).is_some());
}

#[test]
fn test_different_manifests_get_different_graphs() {
    let cache = GraphCache::new();
    let builder = SemanticGraphBuilder::new();
    let plain = ManifestLookup::new(common::bookings_manifest()).unwrap();
    let scd = ManifestLookup::new(common::scd_manifest()).unwrap();

    let a = cache.get_or_build(&plain, &builder).unwrap();
    let b = cache.get_or_build(&scd, &builder).unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_ne!(plain.content_hash(), scd.content_hash());
    assert_eq!(cache.len(), 2);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_concurrent_builds_converge() {
    let cache = Arc::new(GraphCache::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let lookup = ManifestLookup::new(common::bookings_manifest()).unwrap();
                cache.get_or_build(&lookup, &SemanticGraphBuilder::new()).unwrap()
            })
        })
        .collect();
    let graphs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(cache.len(), 1);
    assert!(graphs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}
