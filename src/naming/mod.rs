//! Translating between user-facing names and resolved items.
//!
//! Two input syntaxes are accepted:
//! - dunder names: `listing__country`, `metric_time__month`,
//!   `booking__ds__extract_year`, with a leading `-` for descending order
//! - call expressions: `TimeDimension('metric_time', 'month')`,
//!   `Dimension('listing__country')`, `Entity('listing')`,
//!   `Metric('bookings', group_by=['listing'])`
//!
//! Either parses into a [`ParsedInput`], which becomes a [`SpecPattern`]
//! matched against resolved items. The reverse direction renders an item as
//! the dunder name a user would type.

mod call;
mod dunder;
mod key;
mod pattern;
mod suggest;

pub use call::CallNamingScheme;
pub use dunder::DunderNamingScheme;
pub use key::{ElementPathKey, DATE_PART_PREFIX, DUNDER};
pub use pattern::{EntityLinkPattern, KindWithoutPropertyPattern, MetricNamePattern, SpecPattern};
pub use suggest::suggest;

use std::collections::BTreeMap;

use crate::manifest::ManifestLookup;
use crate::time::{ExpandedGranularity, TimeGranularity};
use crate::trie::{ItemKind, ResolvedItem};

/// A group-by input that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid group-by input '{input}': {reason}")]
pub struct NamingError {
    pub input: String,
    pub reason: String,
}

impl NamingError {
    pub fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A parsed group-by input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    /// The input as the user wrote it.
    pub raw: String,
    pub key: ElementPathKey,
    /// Item kind, when the syntax states it (`Entity(...)`, `Metric(...)`).
    pub kind: Option<ItemKind>,
    pub descending: bool,
}

impl ParsedInput {
    pub fn pattern(&self) -> EntityLinkPattern {
        EntityLinkPattern::from_input(self)
    }
}

/// Standard and custom grain names known to a manifest.
#[derive(Debug, Clone, Default)]
pub struct GrainNames {
    custom: BTreeMap<String, ExpandedGranularity>,
}

impl GrainNames {
    pub fn new(custom: impl IntoIterator<Item = ExpandedGranularity>) -> Self {
        Self {
            custom: custom
                .into_iter()
                .map(|g| (g.name().to_string(), g))
                .collect(),
        }
    }

    pub fn for_lookup(lookup: &ManifestLookup) -> Self {
        Self::new(lookup.custom_granularities().cloned())
    }

    pub fn resolve(&self, name: &str) -> Option<ExpandedGranularity> {
        TimeGranularity::parse(name)
            .map(ExpandedGranularity::Standard)
            .or_else(|| self.custom.get(&name.to_lowercase()).cloned())
    }
}

/// One input syntax.
pub trait NamingScheme {
    /// Could `input` be written in this syntax?
    fn accepts(&self, input: &str) -> bool;

    fn parse(&self, input: &str) -> Result<ParsedInput, NamingError>;

    /// The canonical input for an item in this syntax.
    fn input_str(&self, item: &ResolvedItem) -> String;
}

/// Parses inputs in whichever syntax they are written in.
#[derive(Debug, Clone, Default)]
pub struct InputParser {
    dunder: DunderNamingScheme,
    call: CallNamingScheme,
}

impl InputParser {
    pub fn new(grains: GrainNames) -> Self {
        Self {
            dunder: DunderNamingScheme::new(grains.clone()),
            call: CallNamingScheme::new(grains),
        }
    }

    pub fn for_lookup(lookup: &ManifestLookup) -> Self {
        Self::new(GrainNames::for_lookup(lookup))
    }

    pub fn parse(&self, input: &str) -> Result<ParsedInput, NamingError> {
        if self.call.accepts(input) {
            self.call.parse(input)
        } else {
            self.dunder.parse(input)
        }
    }

    /// Canonical dunder name for an item.
    pub fn input_str(&self, item: &ResolvedItem) -> String {
        self.dunder.input_str(item)
    }
}
