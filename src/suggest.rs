//! # Suggestion Ranking Module
//!
//! ## Purpose
//! Ranks distinct field values (model names, companies) against a partial
//! search string for autocomplete. One algorithm serves both fields,
//! parameterized only by the distinct-value source.
//!
//! ## Input/Output Specification
//! - **Input**: Partial search text plus the distinct values of one field
//! - **Output**: At most `cap` values, best match first
//! - **Determinism**: The comparator is a total order up to equal-length
//!   equal-content strings, so output does not depend on input order
//!
//! ## Ranking
//! 1. Exact case-insensitive equality to the query
//! 2. Values whose lowercase form starts with the query
//! 3. Earlier first occurrence of the query within the value
//! 4. Shorter value

use std::cmp::Ordering;

/// Default cap on returned suggestions
pub const DEFAULT_SUGGESTION_CAP: usize = 4;

/// Rank `values` against `query`, returning at most `cap` matches.
///
/// Values are kept only when the lowercased query is a substring of the
/// lowercased value. An empty or whitespace-only query yields no results,
/// not all values.
pub fn rank_suggestions<I, S>(query: &str, values: I, cap: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    // Pre-filter to substring matches, keeping the lowercase form alongside
    // so the comparator does not re-lowercase on every comparison.
    let mut matches: Vec<(String, String)> = values
        .into_iter()
        .map(|v| {
            let original = v.as_ref().to_string();
            let lower = original.to_lowercase();
            (original, lower)
        })
        .filter(|(_, lower)| lower.contains(&query))
        .collect();

    matches.sort_by(|(_, a), (_, b)| compare_relevance(a, b, &query));
    matches.truncate(cap);
    matches.into_iter().map(|(original, _)| original).collect()
}

/// Relevance comparator over lowercased values. `Ordering::Less` means a
/// better match.
fn compare_relevance(a: &str, b: &str, query: &str) -> Ordering {
    // Priority 1: exact match first
    let a_exact = a == query;
    let b_exact = b == query;
    if a_exact != b_exact {
        return if a_exact { Ordering::Less } else { Ordering::Greater };
    }

    // Priority 2: prefix matches before mere containment
    let a_prefix = a.starts_with(query);
    let b_prefix = b.starts_with(query);
    if a_prefix != b_prefix {
        return if a_prefix { Ordering::Less } else { Ordering::Greater };
    }

    // Priority 3: earlier occurrence of the query
    // The pre-filter guarantees the query occurs in both.
    let a_pos = a.find(query).unwrap_or(usize::MAX);
    let b_pos = b.find(query).unwrap_or(usize::MAX);
    if a_pos != b_pos {
        return a_pos.cmp(&b_pos);
    }

    // Priority 4: shorter value first
    a.len().cmp(&b.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_then_prefix_then_contains() {
        let values = ["Heroic", "Hero", "Superhero", "Zero"];
        let result = rank_suggestions("hero", values, DEFAULT_SUGGESTION_CAP);
        assert_eq!(result, vec!["Hero", "Heroic", "Superhero"]);
    }

    #[test]
    fn empty_or_whitespace_query_yields_nothing() {
        let values = ["Hero", "Lectro"];
        assert!(rank_suggestions("", values, DEFAULT_SUGGESTION_CAP).is_empty());
        assert!(rank_suggestions("   ", values, DEFAULT_SUGGESTION_CAP).is_empty());
    }

    #[test]
    fn caps_at_four() {
        let values = ["Hero 1", "Hero 2", "Hero 3", "Hero 4", "Hero 5"];
        let result = rank_suggestions("hero", values, DEFAULT_SUGGESTION_CAP);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn substring_matches_are_included() {
        // Contrast with the listing filter, which requires a prefix.
        let result = rank_suggestions("ero", ["Hero"], DEFAULT_SUGGESTION_CAP);
        assert_eq!(result, vec!["Hero"]);
    }

    #[test]
    fn earlier_occurrence_ranks_higher() {
        let values = ["Grand Eco", "Eco Rider"];
        let result = rank_suggestions("eco", values, DEFAULT_SUGGESTION_CAP);
        assert_eq!(result, vec!["Eco Rider", "Grand Eco"]);
    }

    #[test]
    fn shorter_value_breaks_remaining_ties() {
        let values = ["Hero Deluxe", "Hero X"];
        let result = rank_suggestions("hero", values, DEFAULT_SUGGESTION_CAP);
        assert_eq!(result, vec!["Hero X", "Hero Deluxe"]);
    }

    #[test]
    fn output_is_independent_of_input_order() {
        let a = rank_suggestions("hero", ["Superhero", "Hero", "Heroic"], 4);
        let b = rank_suggestions("hero", ["Hero", "Heroic", "Superhero"], 4);
        assert_eq!(a, b);
    }

    #[test]
    fn query_is_case_insensitive() {
        let result = rank_suggestions("HERO", ["hero"], DEFAULT_SUGGESTION_CAP);
        assert_eq!(result, vec!["hero"]);
    }
}
