//! Fuzzy suggestions for inputs that match nothing.
//!
//! Only ever used to build messages; a fuzzy match never resolves an input.

use std::collections::BTreeMap;

use strsim::jaro_winkler;

use crate::config::SuggestionSettings;

/// Rank `candidates` by similarity to `input`, best first.
pub fn suggest<S: AsRef<str>>(
    input: &str,
    candidates: impl IntoIterator<Item = S>,
    settings: &SuggestionSettings,
) -> Vec<String> {
    let input = input.trim().trim_start_matches('-').to_lowercase();

    // name -> best score; BTreeMap keeps ties in name order
    let mut scored: BTreeMap<String, f64> = BTreeMap::new();
    for candidate in candidates {
        let candidate = candidate.as_ref();
        let score = jaro_winkler(&input, &candidate.to_lowercase());
        if score >= settings.min_similarity {
            let best = scored.entry(candidate.to_string()).or_insert(score);
            if score > *best {
                *best = score;
            }
        }
    }

    let mut ranked: Vec<(String, f64)> = scored.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(settings.limit)
        .map(|(name, _)| name)
        .collect()
}
