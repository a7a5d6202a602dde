//! Incidence of coded categories among respondents.
//!
//! Open-ended answers are coded into categories, one row per (respondent,
//! category) pair. The incidence of a category is the weighted share of *all*
//! respondents in the table who have at least one row with that category, not
//! only of those who answered.

use npscope_stats::ratio::{Ratio, round1};
use npscope_table::{CellValue, Table};
use serde::Serialize;

use crate::aggregate::WeightedAggregator;

/// Incidence of one category (or one category within a parent answer).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    /// `"{category}"`, or `"{category} ({parent})"` when grouped by a parent.
    pub label: String,
    pub category: String,
    pub parent: Option<String>,
    /// Weighted respondents with the category, rounded to one decimal.
    pub count: f64,
    pub percentage: f64,
}

/// Category incidences of `column`, sorted by descending percentage.
///
/// With `parent_column`, each observed (parent, category) pair is counted
/// independently and labelled `"{category} ({parent})"`; rows without a parent
/// value are labelled by the category alone. Ties keep first-seen order.
///
/// Returns an empty list when the table is empty, the column is absent, or the
/// base is zero.
///
/// ```
/// use npscope_analysis::category::compute_category_stats;
/// use npscope_table::Table;
///
/// let coded = Table::new(
///     ["ResponseId", "Category"],
///     vec![
///         vec!["R1".into(), "Taste".into()],
///         vec!["R1".into(), "Price".into()],
///         vec!["R2".into(), "Taste".into()],
///         vec!["R3".into(), "".into()],
///         vec!["R4".into(), "".into()],
///     ],
/// )
/// .unwrap();
///
/// let stats = compute_category_stats(&coded, "Category", Some("ResponseId"), None, None);
/// assert_eq!(stats[0].label, "Taste");
/// assert_eq!(stats[0].percentage, 50.0);
/// assert_eq!(stats[1].label, "Price");
/// assert_eq!(stats[1].percentage, 25.0);
/// ```
#[must_use]
pub fn compute_category_stats(
    table: &Table,
    column: &str,
    id_column: Option<&str>,
    weight_column: Option<&str>,
    parent_column: Option<&str>,
) -> Vec<CategoryShare> {
    let Some(category_index) = table.column_index(column) else {
        log::debug!("category column '{column}' not found");
        return vec![];
    };
    let parent_index = parent_column.and_then(|name| table.column_index(name));
    let aggregator = WeightedAggregator::new(table, weight_column, id_column);
    let base = aggregator.base();
    if base == 0.0 {
        return vec![];
    }

    let mut keys = Vec::<(String, Option<String>)>::new();
    for row in table.rows() {
        let Some(category) = label_of(&row[category_index]) else {
            continue;
        };
        let parent = parent_index.and_then(|index| label_of(&row[index]));
        let key = (category, parent);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    let mut shares = keys
        .into_iter()
        .map(|(category, parent)| {
            let count = aggregator.count_where(|row| {
                label_of(&row[category_index]).as_ref() == Some(&category)
                    && parent_index.and_then(|index| label_of(&row[index])) == parent
            });
            let ratio = Ratio::new(count, base);
            (ratio.percentage(), category, parent, count)
        })
        .collect::<Vec<_>>();
    shares.sort_by(|a, b| b.0.total_cmp(&a.0));

    shares
        .into_iter()
        .map(|(percentage, category, parent, count)| CategoryShare {
            label: match &parent {
                Some(parent) => format!("{category} ({parent})"),
                None => category.clone(),
            },
            category,
            parent,
            count: round1(count),
            percentage: round1(percentage),
        })
        .collect()
}

fn label_of(cell: &CellValue) -> Option<String> {
    (!cell.is_blank()).then(|| cell.to_label().trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coded() -> Table {
        Table::new(
            ["id", "Q6", "Q6_coded", "w"],
            vec![
                vec!["R1".into(), "Good".into(), "Taste".into(), 1.0.into()],
                vec!["R1".into(), "Good".into(), "Taste".into(), 1.0.into()],
                vec!["R1".into(), "Good".into(), "Price".into(), 1.0.into()],
                vec!["R2".into(), "Bad".into(), "Taste".into(), 3.0.into()],
                vec!["R3".into(), CellValue::Missing, "Service".into(), 1.0.into()],
                vec!["R4".into(), CellValue::Missing, CellValue::Missing, 1.0.into()],
            ],
        )
        .unwrap()
    }

    fn labels(stats: &[CategoryShare]) -> Vec<(&str, f64)> {
        stats.iter().map(|s| (s.label.as_str(), s.percentage)).collect()
    }

    #[test]
    fn test_incidence_base_includes_non_answering_respondents() {
        let stats = compute_category_stats(&coded(), "Q6_coded", Some("id"), None, None);
        assert_eq!(
            labels(&stats),
            vec![("Taste", 50.0), ("Price", 25.0), ("Service", 25.0)]
        );
        assert_eq!(stats[0].count, 2.0);
    }

    #[test]
    fn test_weighted_incidence() {
        let stats = compute_category_stats(&coded(), "Q6_coded", Some("id"), Some("w"), None);
        // base: R1 1 + R2 3 + R3 1 + R4 1
        assert_eq!(
            labels(&stats),
            vec![("Taste", 66.7), ("Price", 16.7), ("Service", 16.7)]
        );
    }

    #[test]
    fn test_parent_pairs_are_counted_independently() {
        let stats = compute_category_stats(&coded(), "Q6_coded", Some("id"), None, Some("Q6"));
        assert_eq!(
            labels(&stats),
            vec![
                ("Taste (Good)", 25.0),
                ("Price (Good)", 25.0),
                ("Taste (Bad)", 25.0),
                ("Service", 25.0),
            ]
        );
        assert_eq!(stats[0].parent.as_deref(), Some("Good"));
        assert_eq!(stats[3].parent, None);
    }

    #[test]
    fn test_absent_parent_column_is_ignored() {
        let with = compute_category_stats(&coded(), "Q6_coded", Some("id"), None, Some("Q5"));
        let without = compute_category_stats(&coded(), "Q6_coded", Some("id"), None, None);
        assert_eq!(with, without);
    }

    #[test]
    fn test_empty_results() {
        assert!(compute_category_stats(&coded(), "Q9", Some("id"), None, None).is_empty());
        let empty = Table::new(["id", "Q6_coded"], vec![]).unwrap();
        assert!(compute_category_stats(&empty, "Q6_coded", Some("id"), None, None).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let table = coded();
        let first = compute_category_stats(&table, "Q6_coded", Some("id"), Some("w"), Some("Q6"));
        let second = compute_category_stats(&table, "Q6_coded", Some("id"), Some("w"), Some("Q6"));
        assert_eq!(first, second);
    }
}
