//! Patterns matched against resolved items.

use crate::time::{DatePart, ExpandedGranularity};
use crate::trie::{ItemKind, ItemProperty, ResolvedItem};

use super::ParsedInput;

/// Selects items from a candidate set.
pub trait SpecPattern {
    fn matches_item(&self, item: &ResolvedItem) -> bool;

    fn match_items<'a>(&self, candidates: &[&'a ResolvedItem]) -> Vec<&'a ResolvedItem> {
        candidates
            .iter()
            .copied()
            .filter(|item| self.matches_item(item))
            .collect()
    }
}

/// Matches an element reached through exactly the given entity links.
///
/// Without a grain or date part, a time dimension matches at its finest
/// standard grain only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityLinkPattern {
    pub element_name: String,
    pub entity_links: Vec<String>,
    pub time_grain: Option<ExpandedGranularity>,
    pub date_part: Option<DatePart>,
    pub kind: Option<ItemKind>,
}

impl EntityLinkPattern {
    pub fn from_input(input: &ParsedInput) -> Self {
        Self {
            element_name: input.key.element_name.clone(),
            entity_links: input.key.entity_links.clone(),
            time_grain: input.key.time_grain.clone(),
            date_part: input.key.date_part,
            kind: input.kind,
        }
    }

    /// The same pattern with grain and date part dropped.
    pub fn element_only(&self) -> Self {
        Self {
            time_grain: None,
            date_part: None,
            ..self.clone()
        }
    }

    fn matches_element(&self, item: &ResolvedItem) -> bool {
        item.key.element_name == self.element_name
            && item.key.entity_links == self.entity_links
            && self.kind.map_or(true, |kind| kind == item.kind)
    }
}

impl SpecPattern for EntityLinkPattern {
    fn matches_item(&self, item: &ResolvedItem) -> bool {
        if !self.matches_element(item) {
            return false;
        }
        match (&self.time_grain, &self.date_part) {
            (Some(grain), _) => item.key.time_grain.as_ref() == Some(grain),
            (None, Some(part)) => item.key.date_part.as_ref() == Some(part),
            (None, None) => item.key.date_part.is_none(),
        }
    }

    fn match_items<'a>(&self, candidates: &[&'a ResolvedItem]) -> Vec<&'a ResolvedItem> {
        let matched: Vec<&ResolvedItem> = candidates
            .iter()
            .copied()
            .filter(|item| self.matches_item(item))
            .collect();
        if self.time_grain.is_some() || self.date_part.is_some() {
            return matched;
        }

        let finest = matched
            .iter()
            .filter_map(|item| item.key.time_grain.as_ref())
            .filter(|grain| !grain.is_custom())
            .min()
            .cloned();
        match finest {
            Some(finest) => matched
                .into_iter()
                .filter(|item| item.key.time_grain.as_ref() == Some(&finest))
                .collect(),
            None => matched,
        }
    }
}

/// Matches group-by metrics by metric name, through any entity links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricNamePattern {
    pub metric_name: String,
}

impl MetricNamePattern {
    pub fn new(metric_name: impl Into<String>) -> Self {
        Self {
            metric_name: metric_name.into(),
        }
    }
}

impl SpecPattern for MetricNamePattern {
    fn matches_item(&self, item: &ResolvedItem) -> bool {
        item.kind == ItemKind::Metric && item.key.element_name == self.metric_name
    }
}

/// Matches items of one kind that do not carry a property, e.g. time
/// dimensions that are not date parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindWithoutPropertyPattern {
    pub kind: ItemKind,
    pub without: ItemProperty,
}

impl KindWithoutPropertyPattern {
    pub fn new(kind: ItemKind, without: ItemProperty) -> Self {
        Self { kind, without }
    }
}

impl SpecPattern for KindWithoutPropertyPattern {
    fn matches_item(&self, item: &ResolvedItem) -> bool {
        item.kind == self.kind && !item.has(self.without)
    }
}
