//! Top-box percentages for rating-scale questions.

use std::collections::BTreeMap;

use npscope_table::{CellValue, NumericCoercion, Table};

use crate::aggregate::WeightedAggregator;

/// Default lowest rating counted as "top box" (top 3 of a 7-point scale).
pub const DEFAULT_TOP_BOX_THRESHOLD: f64 = 5.0;

/// Weighted percentage of valid ratings at or above `threshold`, per column.
///
/// Ratings are coerced label-tolerantly, so `"6 - Satisfied"` counts as 6. Rows
/// whose rating cannot be coerced are left out of that column's base. A column
/// absent from the table reports 0.0; the other columns are unaffected.
///
/// ```
/// use npscope_analysis::top_box::{DEFAULT_TOP_BOX_THRESHOLD, compute_top_box};
/// use npscope_table::Table;
///
/// let table = Table::new(
///     ["Q5"],
///     vec![vec![5.0.into()], vec!["6 - Satisfied".into()], vec![7.0.into()]],
/// )
/// .unwrap();
///
/// let top_box = compute_top_box(&table, &["Q5", "Q6"], None, DEFAULT_TOP_BOX_THRESHOLD);
/// assert_eq!(top_box["Q5"], 100.0);
/// assert_eq!(top_box["Q6"], 0.0);
/// ```
#[must_use]
pub fn compute_top_box<S>(
    table: &Table,
    columns: &[S],
    weight_column: Option<&str>,
    threshold: f64,
) -> BTreeMap<String, f64>
where
    S: AsRef<str>,
{
    let aggregator = WeightedAggregator::new(table, weight_column, None);
    columns
        .iter()
        .map(|column| {
            let column = column.as_ref();
            let percentage = match table.column_index(column) {
                Some(index) => {
                    let rating =
                        |row: &[CellValue]| NumericCoercion::LabelTolerant.coerce(&row[index]);
                    aggregator
                        .share_within(
                            |row| rating(row).is_some(),
                            |row| rating(row).is_some_and(|value| value >= threshold),
                        )
                        .rounded_percentage()
                }
                None => {
                    log::debug!("top-box column '{column}' not found; reporting 0");
                    0.0
                }
            };
            (column.to_owned(), percentage)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            ["Q1", "Q2", "w"],
            vec![
                vec![7.0.into(), "2 - Dissatisfied".into(), 1.0.into()],
                vec![4.0.into(), "7 - Extremely satisfied".into(), 3.0.into()],
                vec!["n/a".into(), CellValue::Missing, 1.0.into()],
                vec![5.0.into(), "Neutral".into(), 0.0.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_unweighted_excludes_invalid_rows() {
        let top_box = compute_top_box(&table(), &["Q1", "Q2"], None, DEFAULT_TOP_BOX_THRESHOLD);
        // Q1: 7 and 5 of {7, 4, 5}
        assert_eq!(top_box["Q1"], 66.7);
        // Q2: 7 of {2, 7}
        assert_eq!(top_box["Q2"], 50.0);
    }

    #[test]
    fn test_weighted() {
        let top_box =
            compute_top_box(&table(), &["Q1", "Q2"], Some("w"), DEFAULT_TOP_BOX_THRESHOLD);
        // Q1: weight 1 (7) + 0 (5) of 1 + 3 + 0
        assert_eq!(top_box["Q1"], 25.0);
        assert_eq!(top_box["Q2"], 75.0);
    }

    #[test]
    fn test_custom_threshold() {
        let top_box = compute_top_box(&table(), &["Q1"], None, 6.0);
        assert_eq!(top_box["Q1"], 33.3);
    }

    #[test]
    fn test_missing_column_is_zero() {
        let top_box = compute_top_box(&table(), &["Q9", "Q1"], None, DEFAULT_TOP_BOX_THRESHOLD);
        assert_eq!(top_box["Q9"], 0.0);
        assert_eq!(top_box["Q1"], 66.7);
    }
}
