//! End-to-end reports assembled from the calculators.
//!
//! - [`run_analysis`]: overall and per-group NPS and top-box, optionally weighted
//! - [`run_response_rates`]: open-end response rates and category incidence per
//!   NPS segment
//! - [`rate_weighted_nps`]: NPS under rate-merge weighting with a per-segment
//!   breakdown
//! - [`preview_segments`]: segment keys and suggested targets before weighting

use std::collections::HashSet;

use npscope_table::{MissingColumnError, Table, TableError};
use serde::{Deserialize, Serialize};

use crate::{
    diagnostics::WeightDiagnostics,
    segment::SegmentKeyBuilder,
    targets::{TargetMap, derive_targets},
    weighting::{CellWeighting, WeightCalculator, WeightedTable, Weights, WeightingError},
};

pub use self::{analysis::*, preview::*, rate_nps::*, response_rates::*};

mod analysis;
mod preview;
mod rate_nps;
mod response_rates;

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum AnalysisError {
    #[display("{_0}")]
    MissingColumn(MissingColumnError),
    #[display("weighting error: {_0}")]
    Weighting(WeightingError),
    #[display("failed to build table: {_0}")]
    Table(TableError),
    #[display("all rows excluded due to missing segment data")]
    AllRowsExcluded,
    #[display("no targets given and none could be derived from the population table")]
    NoTargets,
    #[display("no survey table loaded")]
    NoSurvey,
}

/// Cell weighting settings of a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightingConfig {
    pub segment_columns: Vec<String>,
    /// Target proportions per segment key. When empty, targets are derived
    /// from the population table.
    #[serde(default)]
    pub targets: TargetMap,
    /// Population column summed per segment when deriving targets.
    #[serde(default)]
    pub target_column: Option<String>,
}

/// How the weights of a report were obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightingSummary {
    pub strategy: &'static str,
    pub segment_columns: Vec<String>,
    pub scale_factor: f64,
    pub unmatched_rows: usize,
    pub unmatched_segments: Vec<String>,
    pub diagnostics: Option<WeightDiagnostics>,
}

impl WeightingSummary {
    fn new(segment_columns: &[String], weights: &Weights) -> Self {
        Self {
            strategy: weights.strategy,
            segment_columns: segment_columns.to_vec(),
            scale_factor: weights.scale_factor,
            unmatched_rows: weights.unmatched_rows,
            unmatched_segments: weights.unmatched_segments.clone(),
            diagnostics: WeightDiagnostics::from_weights(&weights.values),
        }
    }
}

/// Survey rows that survived segment filtering, with cell weights attached.
#[derive(Debug)]
struct PreparedSurvey {
    weighted: WeightedTable,
    excluded_count: usize,
    summary: WeightingSummary,
}

/// Drops rows with blank segment cells and cell-weights the rest.
fn weight_survey(
    survey: &Table,
    population: Option<&Table>,
    config: &WeightingConfig,
) -> Result<PreparedSurvey, AnalysisError> {
    if config.segment_columns.is_empty() {
        return Err(WeightingError::NoSegmentColumns.into());
    }
    let indices = survey.require_columns(&config.segment_columns)?;
    let complete = survey.filter_rows(|row| !SegmentKeyBuilder::has_blank(row, &indices));
    let excluded_count = survey.len() - complete.len();
    if excluded_count > 0 {
        log::info!("excluded {excluded_count} row(s) with missing segment data");
    }
    if complete.is_empty() {
        return Err(AnalysisError::AllRowsExcluded);
    }

    let targets = if config.targets.is_empty() {
        population
            .map(|population| {
                derive_targets(
                    population,
                    &config.segment_columns,
                    config.target_column.as_deref(),
                )
            })
            .unwrap_or_default()
    } else {
        config.targets.clone()
    };
    if targets.is_empty() {
        return Err(AnalysisError::NoTargets);
    }

    let weighted = WeightCalculator::new(config.segment_columns.iter().cloned())
        .apply(&complete, &CellWeighting::new(targets))?;
    let summary = WeightingSummary::new(&config.segment_columns, &weighted.weights);
    Ok(PreparedSurvey {
        weighted,
        excluded_count,
        summary,
    })
}

/// Keeps the first row of each respondent; rows with a blank id are kept as is.
fn unique_respondents(table: &Table, id_column: &str) -> Table {
    let Some(id) = table.column_index(id_column) else {
        return table.clone();
    };
    let mut seen = HashSet::new();
    table.filter_rows(|row| row[id].is_blank() || seen.insert(row[id].to_label()))
}

#[cfg(test)]
mod tests {
    use npscope_table::CellValue;

    use super::*;

    fn survey() -> Table {
        Table::new(
            ["id", "gender"],
            vec![
                vec!["R1".into(), "M".into()],
                vec!["R2".into(), "F".into()],
                vec!["R3".into(), " ".into()],
                vec!["R1".into(), "M".into()],
            ],
        )
        .unwrap()
    }

    fn config() -> WeightingConfig {
        WeightingConfig {
            segment_columns: vec!["gender".to_owned()],
            targets: [("M", 0.5), ("F", 0.5)].into_iter().collect(),
            target_column: None,
        }
    }

    #[test]
    fn test_weight_survey_excludes_blank_segments() {
        let prepared = weight_survey(&survey(), None, &config()).unwrap();
        assert_eq!(prepared.excluded_count, 1);
        assert_eq!(prepared.weighted.table.len(), 3);
        assert_eq!(prepared.summary.strategy, "cell");
    }

    #[test]
    fn test_weight_survey_all_excluded() {
        let survey = Table::new(["gender"], vec![vec![CellValue::Missing]]).unwrap();
        let err = weight_survey(&survey, None, &config()).unwrap_err();
        assert!(matches!(err, AnalysisError::AllRowsExcluded));
    }

    #[test]
    fn test_weight_survey_derives_targets_from_population() {
        let population = Table::new(
            ["gender", "count"],
            vec![vec!["M".into(), 1.0.into()], vec!["F".into(), 3.0.into()]],
        )
        .unwrap();
        let config = WeightingConfig {
            targets: TargetMap::default(),
            target_column: Some("count".to_owned()),
            ..config()
        };
        let prepared = weight_survey(&survey(), Some(&population), &config).unwrap();
        // M: 0.25 / (2/3), F: 0.75 / (1/3); the mean is already 1
        let values = &prepared.weighted.weights.values;
        assert!((values[0] - 0.375).abs() < 1e-9);
        assert!((values[1] - 2.25).abs() < 1e-9);

        let err = weight_survey(&survey(), None, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::NoTargets));
    }

    #[test]
    fn test_weight_survey_missing_segment_column() {
        let config = WeightingConfig {
            segment_columns: vec!["region".to_owned()],
            ..config()
        };
        let err = weight_survey(&survey(), None, &config).unwrap_err();
        assert_eq!(err.to_string(), "missing column(s): region");
    }

    #[test]
    fn test_weight_survey_rejects_negative_targets() {
        let config = WeightingConfig {
            targets: [("M", 1.2), ("F", -0.2)].into_iter().collect(),
            ..config()
        };
        let err = weight_survey(&survey(), None, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::Weighting(WeightingError::InvalidTarget { .. })));
        assert_eq!(
            err.to_string(),
            "weighting error: invalid target -0.2 for segment 'F': must be finite and non-negative"
        );
    }

    #[test]
    fn test_unique_respondents() {
        let unique = unique_respondents(&survey(), "id");
        assert_eq!(unique.len(), 3);
        assert_eq!(unique_respondents(&survey(), "other").len(), 4);
    }
}
