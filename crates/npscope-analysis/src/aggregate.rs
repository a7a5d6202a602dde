//! Weighted counting under a single denominator policy.
//!
//! Every percentage reported by the engine is produced by a
//! [`WeightedAggregator`]. The policy depends on which of the weight and
//! respondent-id columns are in use:
//!
//! | weights | ids | base                                               |
//! |---------|-----|----------------------------------------------------|
//! | yes     | yes | sum of weights over the first row of each respondent |
//! | no      | yes | number of distinct respondents                     |
//! | yes     | no  | sum of weights                                     |
//! | no      | no  | number of rows                                     |
//!
//! Numerators follow the same policy restricted to the matching rows, so a
//! respondent with several matching rows counts once.

use std::collections::HashSet;

use npscope_stats::ratio::Ratio;
use npscope_table::{CellValue, Table, parse_number};

/// Counts rows of a table under the denominator policy.
#[derive(Debug, Clone, Copy)]
pub struct WeightedAggregator<'a> {
    table: &'a Table,
    weight: Option<usize>,
    id: Option<usize>,
}

impl<'a> WeightedAggregator<'a> {
    /// Creates an aggregator over `table`.
    ///
    /// A named column that is absent from the table is ignored (with a warning),
    /// so counting falls back to the unweighted or per-row policy.
    #[must_use]
    pub fn new(table: &'a Table, weight_column: Option<&str>, id_column: Option<&str>) -> Self {
        let resolve = |name: Option<&str>, role: &str| {
            let name = name?;
            let index = table.column_index(name);
            if index.is_none() {
                log::warn!("{role} column '{name}' not found; ignoring it");
            }
            index
        };
        Self {
            table,
            weight: resolve(weight_column, "weight"),
            id: resolve(id_column, "respondent id"),
        }
    }

    #[must_use]
    pub fn table(&self) -> &'a Table {
        self.table
    }

    #[must_use]
    pub fn is_weighted(&self) -> bool {
        self.weight.is_some()
    }

    #[must_use]
    pub fn is_respondent_based(&self) -> bool {
        self.id.is_some()
    }

    /// Weight carried by a row: the weight cell, or 1.0 when unweighted.
    ///
    /// Non-numeric weight cells count as 0.
    #[must_use]
    pub fn row_weight(&self, row: &[CellValue]) -> f64 {
        self.weight
            .map_or(1.0, |index| parse_number(&row[index]).unwrap_or(0.0))
    }

    /// Weighted count of the rows (or respondents) satisfying `predicate`.
    ///
    /// In respondent mode, rows with a blank id are not counted and only the
    /// first matching row of each respondent contributes its weight.
    pub fn count_where<F>(&self, mut predicate: F) -> f64
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        match self.id {
            Some(id) => {
                let mut seen = HashSet::new();
                self.table
                    .rows()
                    .filter(|row| !row[id].is_blank() && predicate(row))
                    .filter(|row| seen.insert(row[id].to_label()))
                    .map(|row| self.row_weight(row))
                    .sum()
            }
            None => self
                .table
                .rows()
                .filter(|row| predicate(row))
                .map(|row| self.row_weight(row))
                .sum(),
        }
    }

    /// Weighted count of all rows (or respondents).
    #[must_use]
    pub fn base(&self) -> f64 {
        self.count_where(|_| true)
    }

    /// Share of the whole table satisfying `predicate`.
    pub fn share<F>(&self, predicate: F) -> Ratio
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        Ratio::new(self.count_where(predicate), self.base())
    }

    /// Share of the rows satisfying `base` that also satisfy `predicate`.
    pub fn share_within<B, F>(&self, mut base: B, mut predicate: F) -> Ratio
    where
        B: FnMut(&[CellValue]) -> bool,
        F: FnMut(&[CellValue]) -> bool,
    {
        let numerator = self.count_where(|row| base(row) && predicate(row));
        let denominator = self.count_where(base);
        Ratio::new(numerator, denominator)
    }
}

/// One-shot form of [`WeightedAggregator::share`].
///
/// ```
/// use npscope_analysis::aggregate::weighted_percentage;
/// use npscope_table::{CellValue, Table};
///
/// let table = Table::new(
///     ["id", "answer", "w"],
///     vec![
///         vec!["R1".into(), "yes".into(), 2.0.into()],
///         vec!["R1".into(), "no".into(), 2.0.into()],
///         vec!["R2".into(), "no".into(), 1.0.into()],
///     ],
/// )
/// .unwrap();
///
/// let yes = |row: &[CellValue]| row[1] == CellValue::from("yes");
/// // ids and weights: R1 counts once with weight 2, R2 with weight 1
/// let ratio = weighted_percentage(&table, yes, Some("w"), Some("id"));
/// assert_eq!((ratio.numerator, ratio.denominator), (2.0, 3.0));
/// // neither: plain rows
/// assert_eq!(weighted_percentage(&table, yes, None, None).denominator, 3.0);
/// ```
pub fn weighted_percentage<F>(
    table: &Table,
    predicate: F,
    weight_column: Option<&str>,
    id_column: Option<&str>,
) -> Ratio
where
    F: FnMut(&[CellValue]) -> bool,
{
    WeightedAggregator::new(table, weight_column, id_column).share(predicate)
}
