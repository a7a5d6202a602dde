//! Response rates for open-ended questions.

use std::collections::BTreeMap;

use npscope_stats::ratio::Ratio;
use npscope_table::Table;

use crate::aggregate::WeightedAggregator;

/// Weighted percentage of the base with a non-blank answer, per column.
///
/// The base is the whole table under the denominator policy of
/// [`WeightedAggregator`]: respondents count once when `id_column` is given.
/// A column absent from the table reports 0.0, as does an empty table.
///
/// ```
/// use npscope_analysis::response_rate::compute_response_rate;
/// use npscope_table::{CellValue, Table};
///
/// let table = Table::new(
///     ["ResponseId", "Q6"],
///     vec![
///         vec!["R1".into(), "Great food".into()],
///         vec!["R1".into(), "Fast delivery".into()],
///         vec!["R2".into(), "   ".into()],
///         vec!["R3".into(), CellValue::Missing],
///         vec!["R4".into(), "Too slow".into()],
///     ],
/// )
/// .unwrap();
///
/// let rates = compute_response_rate(&table, &["Q6"], Some("ResponseId"), None);
/// assert_eq!(rates["Q6"], 50.0);
/// ```
#[must_use]
pub fn compute_response_rate<S>(
    table: &Table,
    columns: &[S],
    id_column: Option<&str>,
    weight_column: Option<&str>,
) -> BTreeMap<String, f64>
where
    S: AsRef<str>,
{
    let aggregator = WeightedAggregator::new(table, weight_column, id_column);
    let base = aggregator.base();
    columns
        .iter()
        .map(|column| {
            let column = column.as_ref();
            let rate = match table.column_index(column) {
                Some(index) => {
                    let answered = aggregator.count_where(|row| !row[index].is_blank());
                    Ratio::new(answered, base).rounded_percentage()
                }
                None => {
                    log::debug!("open-end column '{column}' not found; reporting 0");
                    0.0
                }
            };
            (column.to_owned(), rate)
        })
        .collect()
}
