//! Dunder name syntax: `[-]entity__...__element[__grain | __extract_part]`.

use std::sync::LazyLock;

use regex::Regex;

use super::{ElementPathKey, GrainNames, NamingError, NamingScheme, ParsedInput, DATE_PART_PREFIX, DUNDER};
use crate::time::DatePart;
use crate::trie::ResolvedItem;

static DUNDER_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").unwrap());

#[derive(Debug, Clone, Default)]
pub struct DunderNamingScheme {
    grains: GrainNames,
}

impl DunderNamingScheme {
    pub fn new(grains: GrainNames) -> Self {
        Self { grains }
    }

    /// Parse a dunder name without the descending marker.
    pub(crate) fn parse_name(&self, raw: &str, name: &str) -> Result<ElementPathKey, NamingError> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(NamingError::new(raw, "empty name"));
        }
        if !DUNDER_NAME.is_match(&name) {
            return Err(NamingError::new(
                raw,
                "names may only contain letters, digits and underscores",
            ));
        }

        let mut segments: Vec<String> = name.split(DUNDER).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(NamingError::new(raw, "empty name segment"));
        }

        let mut grain = None;
        let mut date_part = None;
        if segments.len() > 1 {
            let last = &segments[segments.len() - 1];
            if let Some(part) = last.strip_prefix(DATE_PART_PREFIX) {
                date_part = Some(
                    DatePart::parse(part)
                        .ok_or_else(|| NamingError::new(raw, format!("unknown date part '{}'", part)))?,
                );
                segments.pop();
            } else if let Some(g) = self.grains.resolve(last) {
                grain = Some(g);
                segments.pop();
            }
        }

        let mut key = ElementPathKey::from_segments(&segments)
            .ok_or_else(|| NamingError::new(raw, "missing element name"))?;
        key.time_grain = grain;
        key.date_part = date_part;
        Ok(key)
    }
}

impl NamingScheme for DunderNamingScheme {
    fn accepts(&self, input: &str) -> bool {
        let trimmed = input.trim();
        let name = trimmed.strip_prefix('-').unwrap_or(trimmed);
        DUNDER_NAME.is_match(&name.to_lowercase())
    }

    fn parse(&self, input: &str) -> Result<ParsedInput, NamingError> {
        let trimmed = input.trim();
        let (descending, name) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        Ok(ParsedInput {
            raw: input.to_string(),
            key: self.parse_name(input, name)?,
            kind: None,
            descending,
        })
    }

    fn input_str(&self, item: &ResolvedItem) -> String {
        item.key.qualified_name()
    }
}
