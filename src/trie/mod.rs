//! Resolved group-by items and the dunder name trie that indexes them.
//!
//! The trie is keyed segment-wise on dunder names (`listing`, `country`), and
//! each trie node holds every item whose dunder name ends there, one per
//! grain or date part variant. An item keeps every distinct path that
//! produced it, so an ambiguous name stays visible.

mod resolver;

pub use resolver::{AttributeTrieResolver, ElementFilter};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::naming::ElementPathKey;

// ============================================================================
// Items
// ============================================================================

/// Flags describing how an item is reached and what it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ItemProperty {
    /// No join outside the source model
    Local,
    /// At least one join
    Joined,
    /// Two or more joins
    MultiHop,
    Entity,
    /// Group-by metric
    Metric,
    MetricTime,
    /// Coarser than the dimension's own grain
    DerivedTimeGranularity,
    DatePart,
    CustomGranularity,
    /// Joined through an SCD validity window
    ScdHop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ItemKind {
    Entity,
    Dimension,
    TimeDimension,
    Metric,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Entity => "entity",
            ItemKind::Dimension => "dimension",
            ItemKind::TimeDimension => "time_dimension",
            ItemKind::Metric => "metric",
        }
    }
}

/// How one path reached an item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PathDescriptor {
    /// Rendered nodes, source first.
    pub nodes: Vec<String>,
    /// Models entered by joins, in join order.
    pub joined_models: Vec<String>,
    pub crosses_validity_window: bool,
}

impl PathDescriptor {
    pub fn join_count(&self) -> usize {
        self.joined_models.len()
    }
}

impl fmt::Display for PathDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nodes.join(" -> "))
    }
}

/// A group-by item reachable from some set of sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedItem {
    pub key: ElementPathKey,
    pub kind: ItemKind,
    pub properties: BTreeSet<ItemProperty>,
    pub paths: BTreeSet<PathDescriptor>,
    /// Set when one resolution reached the key through more than one path.
    pub ambiguous: bool,
}

impl ResolvedItem {
    pub fn new(key: ElementPathKey, kind: ItemKind) -> Self {
        Self {
            key,
            kind,
            properties: BTreeSet::new(),
            paths: BTreeSet::new(),
            ambiguous: false,
        }
    }

    pub fn with_property(mut self, property: ItemProperty) -> Self {
        self.properties.insert(property);
        self
    }

    pub fn with_path(mut self, path: PathDescriptor) -> Self {
        self.paths.insert(path);
        self
    }

    pub fn has(&self, property: ItemProperty) -> bool {
        self.properties.contains(&property)
    }

    /// Fold in another resolution's view of the same key.
    pub fn merge(&mut self, other: &ResolvedItem) {
        self.properties.extend(other.properties.iter().copied());
        self.paths.extend(other.paths.iter().cloned());
        self.ambiguous |= other.ambiguous;
    }
}

// ============================================================================
// Trie
// ============================================================================

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: BTreeMap<String, TrieNode>,
    items: BTreeMap<ElementPathKey, ResolvedItem>,
}

/// Items indexed by dunder name segments.
#[derive(Debug, Clone, Default)]
pub struct DunderNameTrie {
    root: TrieNode,
    len: usize,
}

impl DunderNameTrie {
    pub fn new() -> Self {
        Self::default()
    }

    fn segments(key: &ElementPathKey) -> impl Iterator<Item = &String> {
        key.entity_links.iter().chain(std::iter::once(&key.element_name))
    }

    /// Insert an item. A second path to an existing key is kept alongside the
    /// first and marks the item ambiguous.
    pub fn insert(&mut self, item: ResolvedItem) {
        let mut node = &mut self.root;
        for segment in Self::segments(&item.key) {
            node = node.children.entry(segment.clone()).or_default();
        }

        match node.items.get_mut(&item.key) {
            Some(existing) => {
                let new_path = item.paths.iter().any(|p| !existing.paths.contains(p));
                existing.merge(&item);
                if new_path {
                    existing.ambiguous = true;
                }
            }
            None => {
                node.items.insert(item.key.clone(), item);
                self.len += 1;
            }
        }
    }

    fn node_for(&self, segments: &[&str]) -> Option<&TrieNode> {
        let mut node = &self.root;
        for segment in segments {
            node = node.children.get(*segment)?;
        }
        Some(node)
    }

    pub fn get(&self, key: &ElementPathKey) -> Option<&ResolvedItem> {
        let segments: Vec<&str> = Self::segments(key).map(String::as_str).collect();
        self.node_for(&segments)?.items.get(key)
    }

    /// Every grain and date part variant of a dunder name.
    pub fn items_named(&self, dunder_name: &str) -> Vec<&ResolvedItem> {
        let segments: Vec<&str> = dunder_name.split(crate::naming::DUNDER).collect();
        self.node_for(&segments)
            .map(|node| node.items.values().collect())
            .unwrap_or_default()
    }

    /// Items whose dunder name starts with the given segments.
    pub fn items_with_prefix(&self, segments: &[&str]) -> Vec<&ResolvedItem> {
        let mut out = Vec::new();
        if let Some(node) = self.node_for(segments) {
            collect(node, &mut out);
        }
        out
    }

    /// All items, depth first in segment order.
    pub fn items(&self) -> Vec<&ResolvedItem> {
        let mut out = Vec::with_capacity(self.len);
        collect(&self.root, &mut out);
        out
    }

    pub fn into_items(self) -> Vec<ResolvedItem> {
        fn drain(node: TrieNode, out: &mut Vec<ResolvedItem>) {
            out.extend(node.items.into_values());
            for (_, child) in node.children {
                drain(child, out);
            }
        }
        let mut out = Vec::with_capacity(self.len);
        drain(self.root, &mut out);
        out
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn collect<'a>(node: &'a TrieNode, out: &mut Vec<&'a ResolvedItem>) {
    out.extend(node.items.values());
    for child in node.children.values() {
        collect(child, out);
    }
}
