//! `ElementPathKey`: the externally visible identity of a group-by item.

use std::fmt;

use serde::Serialize;

use crate::time::{DatePart, ExpandedGranularity};

/// Separator between dunder name segments.
pub const DUNDER: &str = "__";

/// Prefix of the date part suffix segment (`ds__extract_year`).
pub const DATE_PART_PREFIX: &str = "extract_";

/// Element name plus the entity links leading to it, with an optional grain
/// or date part for time dimensions.
///
/// `listing__country` is `("country", ["listing"])`; `metric_time__month` is
/// `("metric_time", [], grain = month)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ElementPathKey {
    pub element_name: String,
    pub entity_links: Vec<String>,
    pub time_grain: Option<ExpandedGranularity>,
    pub date_part: Option<DatePart>,
}

impl ElementPathKey {
    pub fn new(element_name: impl Into<String>, entity_links: Vec<String>) -> Self {
        Self {
            element_name: element_name.into(),
            entity_links,
            time_grain: None,
            date_part: None,
        }
    }

    /// Split dunder segments into links and element name.
    pub fn from_segments(segments: &[String]) -> Option<Self> {
        let (element, links) = segments.split_last()?;
        Some(Self::new(element.clone(), links.to_vec()))
    }

    pub fn with_time_grain(mut self, grain: ExpandedGranularity) -> Self {
        self.time_grain = Some(grain);
        self
    }

    pub fn with_date_part(mut self, date_part: DatePart) -> Self {
        self.date_part = Some(date_part);
        self
    }

    /// Links and element name: `listing__country`.
    pub fn dunder_name(&self) -> String {
        let mut parts: Vec<&str> = self.entity_links.iter().map(String::as_str).collect();
        parts.push(&self.element_name);
        parts.join(DUNDER)
    }

    /// Dunder name plus the grain or date part suffix: `metric_time__month`.
    pub fn qualified_name(&self) -> String {
        let mut name = self.dunder_name();
        if let Some(grain) = &self.time_grain {
            name.push_str(DUNDER);
            name.push_str(grain.name());
        }
        if let Some(part) = &self.date_part {
            name.push_str(DUNDER);
            name.push_str(DATE_PART_PREFIX);
            name.push_str(part.as_str());
        }
        name
    }

    /// The same element without grain or date part.
    pub fn element_identity(&self) -> ElementPathKey {
        Self::new(self.element_name.clone(), self.entity_links.clone())
    }

    pub fn same_element(&self, other: &ElementPathKey) -> bool {
        self.element_name == other.element_name && self.entity_links == other.entity_links
    }
}

impl fmt::Display for ElementPathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}
