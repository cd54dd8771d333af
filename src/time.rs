//! Time granularities and date parts.
//!
//! Standard grains form a total order from finest to coarsest. Custom grains
//! (fiscal quarters, retail weeks, ...) are declared by the time spine over a
//! standard base grain and are only reachable from dimensions whose base
//! grain is at least as fine as that base.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard time granularities, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeGranularity {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeGranularity {
    /// All standard grains, finest first.
    pub const ALL: [TimeGranularity; 11] = [
        TimeGranularity::Nanosecond,
        TimeGranularity::Microsecond,
        TimeGranularity::Millisecond,
        TimeGranularity::Second,
        TimeGranularity::Minute,
        TimeGranularity::Hour,
        TimeGranularity::Day,
        TimeGranularity::Week,
        TimeGranularity::Month,
        TimeGranularity::Quarter,
        TimeGranularity::Year,
    ];

    /// Parse a grain name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nanosecond" => Some(TimeGranularity::Nanosecond),
            "microsecond" => Some(TimeGranularity::Microsecond),
            "millisecond" => Some(TimeGranularity::Millisecond),
            "second" => Some(TimeGranularity::Second),
            "minute" => Some(TimeGranularity::Minute),
            "hour" => Some(TimeGranularity::Hour),
            "day" => Some(TimeGranularity::Day),
            "week" => Some(TimeGranularity::Week),
            "month" => Some(TimeGranularity::Month),
            "quarter" => Some(TimeGranularity::Quarter),
            "year" => Some(TimeGranularity::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeGranularity::Nanosecond => "nanosecond",
            TimeGranularity::Microsecond => "microsecond",
            TimeGranularity::Millisecond => "millisecond",
            TimeGranularity::Second => "second",
            TimeGranularity::Minute => "minute",
            TimeGranularity::Hour => "hour",
            TimeGranularity::Day => "day",
            TimeGranularity::Week => "week",
            TimeGranularity::Month => "month",
            TimeGranularity::Quarter => "quarter",
            TimeGranularity::Year => "year",
        }
    }

    /// The next coarser standard grain, if any.
    pub fn next_coarser(&self) -> Option<TimeGranularity> {
        let idx = Self::ALL.iter().position(|g| g == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    /// This grain and every coarser standard grain.
    pub fn and_coarser(&self) -> Vec<TimeGranularity> {
        Self::ALL.iter().copied().filter(|g| g >= self).collect()
    }
}

impl fmt::Display for TimeGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A standard grain or a custom grain defined over a standard base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandedGranularity {
    Standard(TimeGranularity),
    Custom { name: String, base: TimeGranularity },
}

impl ExpandedGranularity {
    pub fn custom(name: impl Into<String>, base: TimeGranularity) -> Self {
        ExpandedGranularity::Custom {
            name: name.into().to_lowercase(),
            base,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ExpandedGranularity::Standard(g) => g.as_str(),
            ExpandedGranularity::Custom { name, .. } => name,
        }
    }

    /// The standard grain this granularity is computed from.
    pub fn base(&self) -> TimeGranularity {
        match self {
            ExpandedGranularity::Standard(g) => *g,
            ExpandedGranularity::Custom { base, .. } => *base,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ExpandedGranularity::Custom { .. })
    }

    pub fn as_standard(&self) -> Option<TimeGranularity> {
        match self {
            ExpandedGranularity::Standard(g) => Some(*g),
            ExpandedGranularity::Custom { .. } => None,
        }
    }
}

impl From<TimeGranularity> for ExpandedGranularity {
    fn from(g: TimeGranularity) -> Self {
        ExpandedGranularity::Standard(g)
    }
}

// Custom grains sort right after their base, then by name.
impl Ord for ExpandedGranularity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.base()
            .cmp(&other.base())
            .then_with(|| self.is_custom().cmp(&other.is_custom()))
            .then_with(|| self.name().cmp(other.name()))
    }
}

impl PartialOrd for ExpandedGranularity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ExpandedGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parts of a date that can be extracted from a time dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePart {
    Year,
    Quarter,
    Month,
    Day,
    Dow,
    Doy,
}

impl DatePart {
    pub const ALL: [DatePart; 6] = [
        DatePart::Year,
        DatePart::Quarter,
        DatePart::Month,
        DatePart::Day,
        DatePart::Dow,
        DatePart::Doy,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "year" => Some(DatePart::Year),
            "quarter" => Some(DatePart::Quarter),
            "month" => Some(DatePart::Month),
            "day" => Some(DatePart::Day),
            "dow" => Some(DatePart::Dow),
            "doy" => Some(DatePart::Doy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatePart::Year => "year",
            DatePart::Quarter => "quarter",
            DatePart::Month => "month",
            DatePart::Day => "day",
            DatePart::Dow => "dow",
            DatePart::Doy => "doy",
        }
    }

    /// Coarsest base grain a time dimension may have for this part to be extractable.
    pub fn required_grain(&self) -> TimeGranularity {
        match self {
            DatePart::Year => TimeGranularity::Year,
            DatePart::Quarter => TimeGranularity::Quarter,
            DatePart::Month => TimeGranularity::Month,
            DatePart::Day | DatePart::Dow | DatePart::Doy => TimeGranularity::Day,
        }
    }

    /// Date parts that become extractable once a path reaches `grain`.
    pub fn unlocked_at(grain: TimeGranularity) -> impl Iterator<Item = DatePart> {
        Self::ALL
            .into_iter()
            .filter(move |part| part.required_grain() == grain)
    }
}

impl fmt::Display for DatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
