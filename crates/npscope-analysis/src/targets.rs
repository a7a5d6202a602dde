//! Target proportions per segment.
//!
//! A [`TargetMap`] maps segment keys to the share of the population each
//! segment should carry after weighting. It is either supplied by the user or
//! derived from a population table with [`derive_targets`].

use std::collections::{BTreeMap, btree_map};

use npscope_table::{CellValue, MissingColumnError, NumericCoercion, Table};
use serde::{Deserialize, Serialize};

use crate::segment::{SegmentKeyBuilder, normalize_key};

/// Mapping from segment key to a non-negative value.
///
/// Holds proportions for cell weighting, or raw per-segment rates for
/// rate-merge weighting. Keys are normalized on insertion, and values inserted
/// under keys that normalize to the same key are summed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>")]
pub struct TargetMap(BTreeMap<String, f64>);

impl From<BTreeMap<String, f64>> for TargetMap {
    fn from(map: BTreeMap<String, f64>) -> Self {
        map.into_iter().collect()
    }
}

impl<S> FromIterator<(S, f64)> for TargetMap
where
    S: AsRef<str>,
{
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        let mut map = Self::default();
        for (key, value) in iter {
            map.add(key.as_ref(), value);
        }
        map
    }
}

impl<'a> IntoIterator for &'a TargetMap {
    type Item = (&'a String, &'a f64);
    type IntoIter = btree_map::Iter<'a, String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl TargetMap {
    /// Adds `value` to the entry for `key`.
    pub fn add(&mut self, key: &str, value: f64) {
        *self.0.entry(normalize_key(key)).or_default() += value;
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, f64> {
        self.0.iter()
    }

    /// The first entry whose value is negative or not finite.
    #[must_use]
    pub fn find_invalid(&self) -> Option<(&str, f64)> {
        self.0
            .iter()
            .find(|(_, value)| !value.is_finite() || **value < 0.0)
            .map(|(key, &value)| (key.as_str(), value))
    }

    /// Sum of all values.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Divides every value by the total, producing proportions that sum to 1.
    ///
    /// Returns an empty map when the total is not positive.
    #[must_use]
    pub fn into_proportions(self) -> Self {
        let total = self.total();
        if total <= 0.0 {
            return Self::default();
        }
        Self(
            self.0
                .into_iter()
                .map(|(key, value)| (key, value / total))
                .collect(),
        )
    }
}

/// Derives target proportions from a population table.
///
/// Without `target_column` every population row counts once. With it, the column
/// is coerced to numbers (non-numeric cells count as 0) and summed per segment.
/// The result is divided by the grand total.
///
/// This is a soft operation: a missing segment column, an empty table or a zero
/// total yields an empty map.
///
/// ```
/// use npscope_analysis::targets::derive_targets;
/// use npscope_table::Table;
///
/// let population = Table::new(
///     ["gender", "members"],
///     vec![
///         vec!["Male".into(), 300.0.into()],
///         vec!["Female".into(), 700.0.into()],
///     ],
/// )
/// .unwrap();
///
/// let targets = derive_targets(&population, &["gender"], Some("members"));
/// assert_eq!(targets.get("Male"), Some(0.3));
/// assert_eq!(targets.get("Female"), Some(0.7));
/// ```
#[must_use]
pub fn derive_targets<S>(
    population: &Table,
    segment_columns: &[S],
    target_column: Option<&str>,
) -> TargetMap
where
    S: AsRef<str>,
{
    if segment_columns.is_empty() {
        return TargetMap::default();
    }
    let builder = SegmentKeyBuilder::new(segment_columns.iter().map(|column| column.as_ref()));
    let keys = match builder.build(population) {
        Ok(keys) => keys,
        Err(err) => {
            log::debug!("no targets derived: {err}");
            return TargetMap::default();
        }
    };

    let target_index = target_column.and_then(|name| {
        let index = population.column_index(name);
        if index.is_none() {
            log::warn!("target column '{name}' not found in population table; counting rows");
        }
        index
    });
    let amounts = match target_index {
        Some(index) => population.values(index).map(target_amount).collect::<Vec<_>>(),
        None => vec![1.0; population.len()],
    };

    keys.iter()
        .zip(amounts)
        .collect::<TargetMap>()
        .into_proportions()
}

/// Sums `rate_column` per segment key without normalizing.
///
/// Used by rate-merge weighting, where the values are absolute population
/// figures (e.g. member counts). Unlike [`derive_targets`], missing columns
/// are reported.
pub fn population_rates<S>(
    population: &Table,
    segment_columns: &[S],
    rate_column: &str,
) -> Result<TargetMap, MissingColumnError>
where
    S: AsRef<str>,
{
    let keys = SegmentKeyBuilder::new(segment_columns.iter().map(|column| column.as_ref()))
        .build(population)?;
    let rate_index = population.require_column(rate_column)?;
    Ok(keys
        .iter()
        .zip(population.values(rate_index).map(target_amount))
        .collect())
}

fn target_amount(cell: &CellValue) -> f64 {
    NumericCoercion::Direct.coerce(cell).unwrap_or(0.0)
}
