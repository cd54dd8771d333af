//! Call expression syntax.
//!
//! ```text
//! TimeDimension('metric_time', 'month')
//! TimeDimension('booking__ds', date_part_name='year').descending(True)
//! Dimension('country', entity_path=['listing'])
//! Dimension('listing__country').grain('month')
//! Entity('listing')
//! Metric('bookings', group_by=['listing'])
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::{DunderNamingScheme, ElementPathKey, GrainNames, NamingError, NamingScheme, ParsedInput};
use crate::time::DatePart;
use crate::trie::{ItemKind, ResolvedItem};

static CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(TimeDimension|Dimension|Entity|Metric)\s*\(([^)]*)\)(.*?)\s*$").unwrap()
});

static METHOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\.\s*(\w+)\s*\(([^)]*)\)").unwrap());

/// A literal argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Literal {
    Str(String),
    List(Vec<String>),
    Bool(bool),
}

#[derive(Debug, Clone, Default)]
pub struct CallNamingScheme {
    dunder: DunderNamingScheme,
    grains: GrainNames,
}

impl CallNamingScheme {
    pub fn new(grains: GrainNames) -> Self {
        Self {
            dunder: DunderNamingScheme::new(grains.clone()),
            grains,
        }
    }

    fn grain(&self, raw: &str, value: &Literal) -> Result<crate::time::ExpandedGranularity, NamingError> {
        let name = expect_str(raw, value)?;
        self.grains
            .resolve(name)
            .ok_or_else(|| NamingError::new(raw, format!("unknown time granularity '{}'", name)))
    }

    fn date_part(&self, raw: &str, value: &Literal) -> Result<DatePart, NamingError> {
        let name = expect_str(raw, value)?;
        DatePart::parse(name).ok_or_else(|| NamingError::new(raw, format!("unknown date part '{}'", name)))
    }

    fn apply(
        &self,
        raw: &str,
        parsed: &mut ParsedInput,
        name: &str,
        value: &Literal,
    ) -> Result<(), NamingError> {
        match (parsed.kind, name) {
            (Some(ItemKind::TimeDimension), "time_granularity_name" | "grain") => {
                parsed.key.time_grain = Some(self.grain(raw, value)?);
            }
            (Some(ItemKind::TimeDimension), "date_part_name" | "date_part") => {
                parsed.key.date_part = Some(self.date_part(raw, value)?);
            }
            (Some(ItemKind::Dimension), "grain") => {
                parsed.key.time_grain = Some(self.grain(raw, value)?);
                parsed.kind = Some(ItemKind::TimeDimension);
            }
            (Some(ItemKind::Dimension), "date_part") => {
                parsed.key.date_part = Some(self.date_part(raw, value)?);
                parsed.kind = Some(ItemKind::TimeDimension);
            }
            (Some(ItemKind::Metric), "group_by") | (_, "entity_path") => {
                let mut links = expect_list(raw, value)?;
                links.extend(parsed.key.entity_links.drain(..));
                parsed.key.entity_links = links.into_iter().map(|l| l.to_lowercase()).collect();
            }
            (_, "descending") => match value {
                Literal::Bool(b) => parsed.descending = *b,
                _ => return Err(NamingError::new(raw, "descending takes True or False")),
            },
            _ => {
                return Err(NamingError::new(raw, format!("unsupported argument '{}'", name)));
            }
        }
        Ok(())
    }
}

impl NamingScheme for CallNamingScheme {
    fn accepts(&self, input: &str) -> bool {
        CALL.is_match(input)
    }

    fn parse(&self, input: &str) -> Result<ParsedInput, NamingError> {
        let captures = CALL
            .captures(input)
            .ok_or_else(|| NamingError::new(input, "not a call expression"))?;
        let kind = match &captures[1] {
            "TimeDimension" => ItemKind::TimeDimension,
            "Dimension" => ItemKind::Dimension,
            "Entity" => ItemKind::Entity,
            _ => ItemKind::Metric,
        };

        let mut args = split_args(input, &captures[2])?.into_iter();
        let name = match args.next() {
            Some((None, value)) => expect_str(input, &value)?.to_string(),
            _ => return Err(NamingError::new(input, "the first argument must be a quoted name")),
        };

        // Metric names are not dunder names; their links come from group_by.
        let key = match kind {
            ItemKind::Metric => ElementPathKey::new(name.to_lowercase(), vec![]),
            _ => self.dunder.parse_name(input, &name)?,
        };
        let mut parsed = ParsedInput {
            raw: input.to_string(),
            key,
            kind: Some(kind),
            descending: false,
        };

        let mut positional = 0;
        for (keyword, value) in args {
            match keyword {
                Some(keyword) => self.apply(input, &mut parsed, &keyword, &value)?,
                None if kind == ItemKind::TimeDimension && positional == 0 => {
                    positional += 1;
                    self.apply(input, &mut parsed, "time_granularity_name", &value)?;
                }
                None => return Err(NamingError::new(input, "unexpected positional argument")),
            }
        }

        let mut chain = &captures[3];
        while !chain.trim().is_empty() {
            let method = METHOD
                .captures(chain)
                .ok_or_else(|| NamingError::new(input, format!("cannot parse '{}'", chain.trim())))?;
            let mut method_args = split_args(input, &method[2])?;
            let value = match (method_args.pop(), method_args.is_empty()) {
                (Some((None, value)), true) => value,
                _ => return Err(NamingError::new(input, format!("{}() takes one argument", &method[1]))),
            };
            self.apply(input, &mut parsed, &method[1], &value)?;
            chain = &chain[method[0].len()..];
        }

        if parsed.key.time_grain.is_some() && parsed.key.date_part.is_some() {
            return Err(NamingError::new(input, "a date part cannot be combined with a grain"));
        }
        Ok(parsed)
    }

    fn input_str(&self, item: &ResolvedItem) -> String {
        let key = &item.key;
        let quoted_links = || {
            key.entity_links
                .iter()
                .map(|l| format!("'{}'", l))
                .collect::<Vec<_>>()
                .join(", ")
        };
        match item.kind {
            ItemKind::Entity => format!("Entity('{}')", key.dunder_name()),
            ItemKind::Dimension => format!("Dimension('{}')", key.dunder_name()),
            ItemKind::Metric => format!("Metric('{}', group_by=[{}])", key.element_name, quoted_links()),
            ItemKind::TimeDimension => match (&key.time_grain, &key.date_part) {
                (Some(grain), _) => format!("TimeDimension('{}', '{}')", key.dunder_name(), grain),
                (None, Some(part)) => {
                    format!("TimeDimension('{}', date_part_name='{}')", key.dunder_name(), part)
                }
                (None, None) => format!("TimeDimension('{}')", key.dunder_name()),
            },
        }
    }
}

fn expect_str<'a>(raw: &str, value: &'a Literal) -> Result<&'a str, NamingError> {
    match value {
        Literal::Str(s) => Ok(s),
        _ => Err(NamingError::new(raw, "expected a quoted string")),
    }
}

fn expect_list(raw: &str, value: &Literal) -> Result<Vec<String>, NamingError> {
    match value {
        Literal::List(items) => Ok(items.clone()),
        Literal::Str(s) => Ok(vec![s.clone()]),
        Literal::Bool(_) => Err(NamingError::new(raw, "expected a list of names")),
    }
}

/// Split an argument list on top-level commas into (keyword, literal) pairs.
fn split_args(raw: &str, args: &str) -> Result<Vec<(Option<String>, Literal)>, NamingError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in args.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                current.push(c);
            }
            (None, '[') => {
                depth += 1;
                current.push(c);
            }
            (None, ']') => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            (None, ',') if depth == 0 => parts.push(std::mem::take(&mut current)),
            (None, c) => current.push(c),
        }
    }
    if quote.is_some() || depth != 0 {
        return Err(NamingError::new(raw, "unbalanced quotes or brackets"));
    }
    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current);
    }

    parts
        .into_iter()
        .map(|part| {
            let part = part.trim();
            match split_keyword(part) {
                Some((keyword, value)) => Ok((Some(keyword.to_string()), parse_literal(raw, value)?)),
                None => Ok((None, parse_literal(raw, part)?)),
            }
        })
        .collect()
}

/// `name = value`, where `name` is an identifier outside any quotes.
fn split_keyword(part: &str) -> Option<(&str, &str)> {
    let (keyword, value) = part.split_once('=')?;
    let keyword = keyword.trim();
    if !keyword.is_empty() && keyword.chars().all(|c| c.is_alphanumeric() || c == '_') {
        Some((keyword, value.trim()))
    } else {
        None
    }
}

fn parse_literal(raw: &str, text: &str) -> Result<Literal, NamingError> {
    let text = text.trim();
    if let Some(inner) = strip_quotes(text) {
        return Ok(Literal::Str(inner.to_string()));
    }
    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        let items = split_args(raw, inner)?
            .into_iter()
            .map(|(keyword, value)| match (keyword, value) {
                (None, Literal::Str(s)) => Ok(s),
                _ => Err(NamingError::new(raw, "lists may only contain quoted names")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Literal::List(items));
    }
    match text {
        "True" | "true" => Ok(Literal::Bool(true)),
        "False" | "false" => Ok(Literal::Bool(false)),
        _ => Err(NamingError::new(raw, format!("cannot parse argument '{}'", text))),
    }
}

fn strip_quotes(text: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|q| {
        text.strip_prefix(q)
            .and_then(|t| t.strip_suffix(q))
            .filter(|inner| !inner.contains(q))
    })
}
