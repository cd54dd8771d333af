//! Deduplicated, ordered sets of resolved items.

use std::collections::{BTreeMap, BTreeSet};

use crate::naming::ElementPathKey;
use crate::trie::{DunderNameTrie, ResolvedItem};

/// Items keyed by `ElementPathKey`; iteration is always in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedItemSet {
    items: BTreeMap<ElementPathKey, ResolvedItem>,
}

impl ResolvedItemSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_trie(trie: DunderNameTrie) -> Self {
        let mut set = Self::new();
        for item in trie.into_items() {
            set.insert(item);
        }
        set
    }

    /// Insert, merging with an existing item under the same key.
    pub fn insert(&mut self, item: ResolvedItem) {
        match self.items.get_mut(&item.key) {
            Some(existing) => existing.merge(&item),
            None => {
                self.items.insert(item.key.clone(), item);
            }
        }
    }

    pub fn union(&mut self, other: &ResolvedItemSet) {
        for item in other.iter() {
            self.insert(item.clone());
        }
    }

    /// Items whose key is in every set. With no sets, the result is empty.
    pub fn intersection(sets: &[&ResolvedItemSet]) -> ResolvedItemSet {
        let Some((first, rest)) = sets.split_first() else {
            return ResolvedItemSet::new();
        };

        let mut out = ResolvedItemSet::new();
        for (key, item) in &first.items {
            if rest.iter().all(|s| s.items.contains_key(key)) {
                let mut merged = item.clone();
                for set in rest {
                    if let Some(other) = set.items.get(key) {
                        merged.merge(other);
                    }
                }
                out.items.insert(key.clone(), merged);
            }
        }
        out
    }

    /// Keep items for which `keep` holds; return the removed ones in key order.
    pub fn retain(&mut self, mut keep: impl FnMut(&ResolvedItem) -> bool) -> Vec<ResolvedItem> {
        let removed_keys: Vec<ElementPathKey> = self
            .items
            .values()
            .filter(|item| !keep(item))
            .map(|item| item.key.clone())
            .collect();
        removed_keys
            .into_iter()
            .filter_map(|key| self.items.remove(&key))
            .collect()
    }

    pub fn get(&self, key: &ElementPathKey) -> Option<&ResolvedItem> {
        self.items.get(key)
    }

    pub fn contains(&self, key: &ElementPathKey) -> bool {
        self.items.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedItem> {
        self.items.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ElementPathKey> {
        self.items.keys()
    }

    /// Elements present, ignoring grain and date part.
    pub fn element_identities(&self) -> BTreeSet<ElementPathKey> {
        self.items.keys().map(ElementPathKey::element_identity).collect()
    }

    /// Every variant of one element.
    pub fn variants_of(&self, element: &ElementPathKey) -> Vec<&ResolvedItem> {
        self.items
            .values()
            .filter(|item| item.key.same_element(element))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<ResolvedItem> for ResolvedItemSet {
    fn from_iter<I: IntoIterator<Item = ResolvedItem>>(iter: I) -> Self {
        let mut set = ResolvedItemSet::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}
