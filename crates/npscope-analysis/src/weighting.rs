//! Post-stratification weighting.
//!
//! Weights are computed from segment keys by a [`WeightingStrategy`]:
//!
//! - [`CellWeighting`]: target proportion ÷ sample proportion, normalized to a
//!   mean of 1.0. Rows of a segment absent from the targets get weight 0.
//! - [`RateMergeWeighting`]: population rate ÷ sample count, rescaled so the
//!   weights sum to the row count. Rows of an unmatched segment fall back to a
//!   raw weight of 1.0.
//!
//! [`WeightCalculator`] builds the keys and appends the weights as a new
//! column to a copy of the table. The input table is never modified.
//!
//! # Example
//!
//! ```
//! use npscope_analysis::{
//!     targets::TargetMap,
//!     weighting::{CellWeighting, WeightCalculator},
//! };
//! use npscope_table::Table;
//!
//! let survey = Table::new(
//!     ["gender"],
//!     vec![vec!["Male".into()], vec!["Male".into()], vec!["Female".into()]],
//! )
//! .unwrap();
//! let targets = [("Male", 0.5), ("Female", 0.5)].into_iter().collect::<TargetMap>();
//!
//! let weighted = WeightCalculator::new(["gender"])
//!     .apply(&survey, &CellWeighting::new(targets))
//!     .unwrap();
//! assert_eq!(weighted.weights.values, vec![0.75, 0.75, 1.5]);
//! assert!(weighted.table.has_column("Weight"));
//! ```

use std::collections::{BTreeSet, HashMap};

use npscope_table::{CellValue, MissingColumnError, Table, TableError};

use crate::{segment::SegmentKeyBuilder, targets::TargetMap};

/// Default name of the appended weight column.
pub const DEFAULT_WEIGHT_COLUMN: &str = "Weight";

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum WeightingError {
    #[display("no segment columns configured")]
    NoSegmentColumns,
    #[display("{_0}")]
    MissingColumn(MissingColumnError),
    #[display("failed to attach weights: {_0}")]
    Table(TableError),
    #[display("invalid target {value} for segment '{segment}': must be finite and non-negative")]
    InvalidTarget { segment: String, value: f64 },
}

/// Per-row weights together with how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Weights {
    /// One weight per row, in row order.
    pub values: Vec<f64>,
    /// Segment key of each row.
    pub segment_keys: Vec<String>,
    /// Name of the strategy that produced the weights.
    pub strategy: &'static str,
    /// Factor applied to the raw weights (1.0 when no rescaling took place).
    pub scale_factor: f64,
    /// Number of rows whose segment has no target or rate.
    pub unmatched_rows: usize,
    /// Sorted keys of the segments without a target or rate.
    pub unmatched_segments: Vec<String>,
}

impl Weights {
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum() / self.values.len() as f64
        }
    }
}

/// Computes one weight per row from the rows' segment keys.
pub trait WeightingStrategy {
    /// Short name reported alongside the weights.
    fn name(&self) -> &'static str;

    /// Weighs rows given their segment keys, in row order.
    fn weigh(&self, segment_keys: Vec<String>) -> Weights;

    /// Rejects inputs that would produce negative or non-finite weights.
    fn validate(&self) -> Result<(), WeightingError> {
        Ok(())
    }
}

/// Target proportion ÷ sample proportion, normalized to a mean weight of 1.0.
#[derive(Debug, Clone, Default)]
pub struct CellWeighting {
    targets: TargetMap,
}

impl CellWeighting {
    #[must_use]
    pub fn new(targets: TargetMap) -> Self {
        Self { targets }
    }

    #[must_use]
    pub fn targets(&self) -> &TargetMap {
        &self.targets
    }
}

impl WeightingStrategy for CellWeighting {
    fn name(&self) -> &'static str {
        "cell"
    }

    fn validate(&self) -> Result<(), WeightingError> {
        check_values(&self.targets)
    }

    #[expect(clippy::cast_precision_loss)]
    fn weigh(&self, segment_keys: Vec<String>) -> Weights {
        let total = segment_keys.len() as f64;
        let counts = count_keys(&segment_keys);
        let mut unmatched = Unmatched::default();

        let raw = segment_keys
            .iter()
            .map(|key| match self.targets.get(key) {
                Some(target) => target / (counts[key.as_str()] as f64 / total),
                None => {
                    unmatched.record(key);
                    0.0
                }
            })
            .collect::<Vec<_>>();

        let mean = if raw.is_empty() {
            0.0
        } else {
            raw.iter().sum::<f64>() / total
        };
        let scale_factor = if mean > 0.0 { 1.0 / mean } else { 1.0 };
        if unmatched.rows > 0 {
            log::warn!(
                "{} row(s) in {} segment(s) have no target and get weight 0",
                unmatched.rows,
                unmatched.segments.len()
            );
        }

        Weights {
            values: raw.into_iter().map(|w| w * scale_factor).collect(),
            segment_keys,
            strategy: self.name(),
            scale_factor,
            unmatched_rows: unmatched.rows,
            unmatched_segments: unmatched.segments.into_iter().collect(),
        }
    }
}

/// Population rate ÷ sample count, rescaled so the weights sum to the row count.
///
/// Unlike [`CellWeighting`], rows of a segment without a rate keep a raw
/// weight of [`RateMergeWeighting::UNMATCHED_WEIGHT`] before rescaling.
#[derive(Debug, Clone, Default)]
pub struct RateMergeWeighting {
    rates: TargetMap,
}

impl RateMergeWeighting {
    pub const UNMATCHED_WEIGHT: f64 = 1.0;

    /// `rates` holds absolute population figures per segment key, e.g. from
    /// [`population_rates`](crate::targets::population_rates).
    #[must_use]
    pub fn new(rates: TargetMap) -> Self {
        Self { rates }
    }
}

impl WeightingStrategy for RateMergeWeighting {
    fn name(&self) -> &'static str {
        "rate-merge"
    }

    fn validate(&self) -> Result<(), WeightingError> {
        check_values(&self.rates)
    }

    #[expect(clippy::cast_precision_loss)]
    fn weigh(&self, segment_keys: Vec<String>) -> Weights {
        let counts = count_keys(&segment_keys);
        let mut unmatched = Unmatched::default();

        let raw = segment_keys
            .iter()
            .map(|key| match self.rates.get(key) {
                Some(rate) => rate / counts[key.as_str()] as f64,
                None => {
                    unmatched.record(key);
                    Self::UNMATCHED_WEIGHT
                }
            })
            .collect::<Vec<_>>();

        let raw_sum = raw.iter().sum::<f64>();
        let scale_factor = if raw_sum > 0.0 {
            segment_keys.len() as f64 / raw_sum
        } else {
            1.0
        };
        if unmatched.rows > 0 {
            log::warn!(
                "{} row(s) in {} segment(s) have no population rate and fall back to weight {}",
                unmatched.rows,
                unmatched.segments.len(),
                Self::UNMATCHED_WEIGHT
            );
        }

        Weights {
            values: raw.into_iter().map(|w| w * scale_factor).collect(),
            segment_keys,
            strategy: self.name(),
            scale_factor,
            unmatched_rows: unmatched.rows,
            unmatched_segments: unmatched.segments.into_iter().collect(),
        }
    }
}

#[derive(Default)]
struct Unmatched {
    rows: usize,
    segments: BTreeSet<String>,
}

impl Unmatched {
    fn record(&mut self, key: &str) {
        self.rows += 1;
        if !self.segments.contains(key) {
            self.segments.insert(key.to_owned());
        }
    }
}

fn check_values(values: &TargetMap) -> Result<(), WeightingError> {
    match values.find_invalid() {
        Some((segment, value)) => Err(WeightingError::InvalidTarget {
            segment: segment.to_owned(),
            value,
        }),
        None => Ok(()),
    }
}

fn count_keys(keys: &[String]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for key in keys {
        *counts.entry(key.as_str()).or_insert(0) += 1;
    }
    counts
}

/// A copy of the input table with a weight column, plus the weights themselves.
#[derive(Debug, Clone)]
pub struct WeightedTable {
    pub table: Table,
    pub weight_column: String,
    pub weights: Weights,
}

/// Applies a [`WeightingStrategy`] to tables segmented by a fixed list of columns.
#[derive(Debug, Clone)]
pub struct WeightCalculator {
    segment_columns: Vec<String>,
    weight_column: String,
}

impl WeightCalculator {
    #[must_use]
    pub fn new<I, S>(segment_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segment_columns: segment_columns.into_iter().map(Into::into).collect(),
            weight_column: DEFAULT_WEIGHT_COLUMN.to_owned(),
        }
    }

    #[must_use]
    pub fn with_weight_column<S>(mut self, weight_column: S) -> Self
    where
        S: Into<String>,
    {
        self.weight_column = weight_column.into();
        self
    }

    #[must_use]
    pub fn segment_columns(&self) -> &[String] {
        &self.segment_columns
    }

    #[must_use]
    pub fn weight_column(&self) -> &str {
        &self.weight_column
    }

    /// Computes weights for every row of `table` without attaching them.
    ///
    /// Fails with [`WeightingError::InvalidTarget`] when the strategy holds a
    /// negative or non-finite target.
    pub fn weights<W>(&self, table: &Table, strategy: &W) -> Result<Weights, WeightingError>
    where
        W: WeightingStrategy + ?Sized,
    {
        if self.segment_columns.is_empty() {
            return Err(WeightingError::NoSegmentColumns);
        }
        strategy.validate()?;
        let keys = SegmentKeyBuilder::new(self.segment_columns.iter().map(String::as_str))
            .build(table)?;
        let weights = strategy.weigh(keys);
        log::debug!(
            "computed {} {} weight(s) over [{}], scale factor {:.4}",
            weights.len(),
            weights.strategy,
            self.segment_columns.join(", "),
            weights.scale_factor
        );
        Ok(weights)
    }

    /// Returns a copy of `table` with the weight column set.
    ///
    /// An existing column of the same name is replaced in the copy only.
    pub fn apply<W>(&self, table: &Table, strategy: &W) -> Result<WeightedTable, WeightingError>
    where
        W: WeightingStrategy + ?Sized,
    {
        let weights = self.weights(table, strategy)?;
        let cells = weights.values.iter().copied().map(CellValue::from).collect();
        let table = table.with_column(self.weight_column.as_str(), cells)?;
        Ok(WeightedTable {
            table,
            weight_column: self.weight_column.clone(),
            weights,
        })
    }
}

/// Cell-weights `survey` against `targets`, returning the table with a
/// [`DEFAULT_WEIGHT_COLUMN`] column.
pub fn compute_weights<S>(
    survey: &Table,
    segment_columns: &[S],
    targets: TargetMap,
) -> Result<Table, WeightingError>
where
    S: AsRef<str>,
{
    let calculator = WeightCalculator::new(segment_columns.iter().map(|column| column.as_ref()));
    Ok(calculator.apply(survey, &CellWeighting::new(targets))?.table)
}
