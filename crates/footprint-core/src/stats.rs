//! Visit statistics and list filtering.

use std::cmp::Ordering;
use std::fmt::Write as _;

use serde::Serialize;

use crate::scope::ScopeId;

/// Names listed in a share summary before it is abbreviated.
const SUMMARY_MAX_NAMES: usize = 40;

/// Share of `total` that `count` represents, in percent, rounded to one
/// decimal place. Zero when `total` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

/// A percentage formatted with one decimal place, e.g. `"6.8%"`.
#[must_use]
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

/// Case-insensitive alphabetical order, ties broken by the raw string.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Names containing `query` (case-insensitive), sorted alphabetically.
///
/// The query is matched as typed, spaces included. Only an empty query
/// returns every name, sorted.
#[must_use]
pub fn filter_names<'a, I>(names: I, query: &str) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = query.to_lowercase();
    let mut matched: Vec<&str> = names
        .into_iter()
        .filter(|name| needle.is_empty() || name.to_lowercase().contains(&needle))
        .collect();
    matched.sort_by(|a, b| compare_names(a, b));
    matched
}

/// Counts shown in the stats bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisitStats {
    /// Active scope.
    pub scope: ScopeId,
    /// Number of visited regions.
    pub visited: usize,
    /// Number of regions in the scope.
    pub total: usize,
    /// `visited / total` in percent, one decimal.
    pub percentage: f64,
}

impl VisitStats {
    /// Compute stats for `visited` of `total` regions.
    #[must_use]
    pub fn new(scope: ScopeId, visited: usize, total: usize) -> Self {
        Self {
            scope,
            visited,
            total,
            percentage: percentage(visited, total),
        }
    }
}

/// Shareable one-paragraph summary of a selection.
///
/// `"Visited 12 of 177 countries (6.8%): Chile, France, ..."`. Long
/// lists are cut after a fixed number of names with an "and N more"
/// tail.
#[must_use]
pub fn summary_text<'a, I>(scope: ScopeId, count: usize, total: usize, names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let noun = scope.descriptor().noun;
    let mut text = format!(
        "Visited {count} of {total} {noun} ({})",
        format_percentage(percentage(count, total))
    );

    let mut sorted: Vec<&str> = names.into_iter().collect();
    if sorted.is_empty() {
        text.push('.');
        return text;
    }
    sorted.sort_by(|a, b| compare_names(a, b));

    text.push_str(": ");
    let shown = sorted.len().min(SUMMARY_MAX_NAMES);
    text.push_str(&sorted[..shown].join(", "));
    if sorted.len() > shown {
        let _ = write!(text, ", and {} more", sorted.len() - shown);
    }
    text.push('.');
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert!((percentage(1, 177) - 0.6).abs() < 1e-9);
        assert!((percentage(12, 177) - 6.8).abs() < 1e-9);
        assert!((percentage(177, 177) - 100.0).abs() < 1e-9);
        assert!((percentage(1, 3) - 33.3).abs() < 1e-9);
    }

    #[test]
    fn percentage_of_empty_scope_is_zero() {
        assert!(percentage(0, 0).abs() < f64::EPSILON);
        assert!(percentage(5, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn format_keeps_one_decimal() {
        assert_eq!(format_percentage(0.0), "0.0%");
        assert_eq!(format_percentage(6.8), "6.8%");
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let names = ["Niger", "Nigeria", "Algeria", "France"];
        assert_eq!(filter_names(names, "GER"), vec!["Algeria", "Niger", "Nigeria"]);
        assert!(filter_names(names, "xyz").is_empty());
    }

    #[test]
    fn whitespace_in_query_is_significant() {
        let names = ["France", "Costa Rica"];
        assert_eq!(filter_names(names, " r"), vec!["Costa Rica"]);
        assert_eq!(filter_names(names, "france "), Vec::<&str>::new());
        assert!(filter_names(names, "   ").is_empty());
    }

    #[test]
    fn empty_query_returns_all_sorted() {
        let names = ["b", "C", "a"];
        assert_eq!(filter_names(names, ""), vec!["a", "b", "C"]);
        assert_eq!(filter_names(names, "   "), vec!["a", "b", "C"]);
    }

    #[test]
    fn summary_lists_sorted_names() {
        let text = summary_text(ScopeId::World, 2, 177, ["France", "Chile"]);
        assert_eq!(text, "Visited 2 of 177 countries (1.1%): Chile, France.");
    }

    #[test]
    fn summary_without_names() {
        let text = summary_text(ScopeId::UsStates, 0, 51, []);
        assert_eq!(text, "Visited 0 of 51 states (0.0%).");
    }

    #[test]
    fn summary_abbreviates_long_lists() {
        let names: Vec<String> = (0..45).map(|i| format!("R{i:02}")).collect();
        let text = summary_text(ScopeId::World, 45, 177, names.iter().map(String::as_str));
        assert!(text.ends_with(", and 5 more."));
    }
}
