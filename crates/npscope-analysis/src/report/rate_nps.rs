use std::collections::BTreeMap;

use npscope_stats::ratio::round_to;
use npscope_table::{NumericCoercion, Table};
use serde::Serialize;

use crate::{
    nps::{NpsCategory, NpsResult, compute_nps},
    targets::population_rates,
    weighting::{RateMergeWeighting, WeightCalculator},
};

use super::AnalysisError;

/// NPS under rate-merge weighting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateWeightedNps {
    pub nps: NpsResult,
    /// Rows with a valid score; only these are weighted.
    pub total_responses: usize,
    pub scale_factor: f64,
    pub unmatched_rows: usize,
    pub unmatched_segments: Vec<String>,
    /// One entry per segment key, sorted by key.
    pub segments: Vec<SegmentNps>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentNps {
    pub segment: String,
    pub rows: usize,
    pub weight_sum: f64,
    pub nps: f64,
}

/// Weights valid responses by population rate ÷ sample count and reports NPS.
///
/// `rate_column` is summed per segment of the population table. Survey rows
/// whose score is missing or outside `0..=10` are dropped before weighting,
/// so the weights sum to the number of valid responses.
pub fn rate_weighted_nps<S>(
    survey: &Table,
    population: &Table,
    segment_columns: &[S],
    rate_column: &str,
    score_column: &str,
) -> Result<RateWeightedNps, AnalysisError>
where
    S: AsRef<str>,
{
    let score_index = survey.require_column(score_column)?;
    survey.require_columns(segment_columns)?;
    let rates = population_rates(population, segment_columns, rate_column)?;

    let valid = survey.filter_rows(|row| {
        NumericCoercion::Direct
            .coerce(&row[score_index])
            .and_then(NpsCategory::classify)
            .is_some()
    });
    let calculator = WeightCalculator::new(segment_columns.iter().map(|column| column.as_ref()));
    let weighted = calculator.apply(&valid, &RateMergeWeighting::new(rates))?;
    let weight_column = Some(weighted.weight_column.as_str());

    let mut rows_by_segment = BTreeMap::<&str, Vec<usize>>::new();
    for (row, key) in weighted.weights.segment_keys.iter().enumerate() {
        rows_by_segment.entry(key).or_default().push(row);
    }
    let segments = rows_by_segment
        .into_iter()
        .map(|(segment, rows)| {
            let subset = weighted.table.select_rows(&rows);
            SegmentNps {
                segment: segment.to_owned(),
                rows: rows.len(),
                weight_sum: round_to(rows.iter().map(|&i| weighted.weights.values[i]).sum(), 2),
                nps: compute_nps(&subset, score_column, weight_column).score,
            }
        })
        .collect();

    Ok(RateWeightedNps {
        nps: compute_nps(&weighted.table, score_column, weight_column),
        total_responses: valid.len(),
        scale_factor: round_to(weighted.weights.scale_factor, 4),
        unmatched_rows: weighted.weights.unmatched_rows,
        unmatched_segments: weighted.weights.unmatched_segments.clone(),
        segments,
    })
}
