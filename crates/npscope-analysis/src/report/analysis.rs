use std::collections::BTreeMap;

use npscope_table::Table;
use serde::{Deserialize, Serialize};

use crate::{
    nps::{NpsResult, compute_nps},
    targets::derive_targets,
    top_box::{DEFAULT_TOP_BOX_THRESHOLD, compute_top_box},
    weighting::{CellWeighting, DEFAULT_WEIGHT_COLUMN, WeightCalculator},
};

use super::{AnalysisError, WeightingConfig, WeightingSummary, weight_survey};

/// Column holding the weights of a re-weighted group, next to the overall
/// weights.
pub const SUBSET_WEIGHT_COLUMN: &str = "SubsetWeight";

fn default_top_box_threshold() -> f64 {
    DEFAULT_TOP_BOX_THRESHOLD
}

/// Settings of an NPS/top-box analysis.
///
/// ```
/// use npscope_analysis::report::AnalysisRequest;
///
/// let request: AnalysisRequest = serde_json::from_str(r#"{"nps_column": "Q1"}"#).unwrap();
/// assert_eq!(request.top_box_threshold, 5.0);
/// assert!(request.weighting.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub nps_column: String,
    #[serde(default)]
    pub top_box_columns: Vec<String>,
    #[serde(default = "default_top_box_threshold")]
    pub top_box_threshold: f64,
    #[serde(default)]
    pub weighting: Option<WeightingConfig>,
    #[serde(default)]
    pub group_by_columns: Vec<String>,
    /// Columns used to re-weight each group against the population table.
    #[serde(default)]
    pub group_weighting_columns: Option<Vec<String>>,
}

impl AnalysisRequest {
    #[must_use]
    pub fn new<S>(nps_column: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            nps_column: nps_column.into(),
            top_box_columns: vec![],
            top_box_threshold: DEFAULT_TOP_BOX_THRESHOLD,
            weighting: None,
            group_by_columns: vec![],
            group_weighting_columns: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub nps: NpsResult,
    pub top_box: BTreeMap<String, f64>,
    pub weighted: bool,
    /// Rows dropped because a segment cell was blank.
    pub excluded_count: usize,
    pub weighting: Option<WeightingSummary>,
    /// Per group-by column, one entry per distinct value in first-seen order.
    pub segmented_results: BTreeMap<String, Vec<GroupResult>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupResult {
    pub group: String,
    pub rows: usize,
    pub nps: f64,
    pub top_box: BTreeMap<String, f64>,
    /// Whether the group was re-weighted on its own rather than keeping the
    /// overall weights.
    pub subset_weighted: bool,
}

/// Runs an NPS/top-box analysis of `survey`.
///
/// With weighting configured, rows with a blank segment cell are dropped and
/// the rest are cell-weighted. Targets come from the request or, when it has
/// none, from `population`.
pub fn run_analysis(
    survey: &Table,
    population: Option<&Table>,
    request: &AnalysisRequest,
) -> Result<AnalysisReport, AnalysisError> {
    let (table, excluded_count, weighting) = match &request.weighting {
        Some(config) => {
            let prepared = weight_survey(survey, population, config)?;
            (
                prepared.weighted.table,
                prepared.excluded_count,
                Some(prepared.summary),
            )
        }
        None => (survey.clone(), 0, None),
    };
    table.require_column(&request.nps_column)?;

    let context = GroupContext {
        request,
        population,
        weight_column: weighting.as_ref().map(|_| DEFAULT_WEIGHT_COLUMN),
    };
    let nps = compute_nps(&table, &request.nps_column, context.weight_column);
    let top_box = compute_top_box(
        &table,
        &request.top_box_columns,
        context.weight_column,
        request.top_box_threshold,
    );
    log::debug!(
        "overall NPS {} over {} response(s)",
        nps.score,
        nps.responses
    );

    let segmented_results = request
        .group_by_columns
        .iter()
        .filter_map(|column| {
            let groups = context.group_results(&table, column)?;
            Some((column.clone(), groups))
        })
        .collect();

    Ok(AnalysisReport {
        nps,
        top_box,
        weighted: weighting.is_some(),
        excluded_count,
        weighting,
        segmented_results,
    })
}

struct GroupContext<'a> {
    request: &'a AnalysisRequest,
    population: Option<&'a Table>,
    weight_column: Option<&'a str>,
}

impl GroupContext<'_> {
    fn group_results(&self, table: &Table, column: &str) -> Option<Vec<GroupResult>> {
        let Some(index) = table.column_index(column) else {
            log::debug!("group-by column '{column}' not found; skipping");
            return None;
        };

        let mut groups = Vec::<String>::new();
        for cell in table.values(index) {
            if cell.is_blank() {
                continue;
            }
            let label = cell.to_label();
            if !groups.contains(&label) {
                groups.push(label);
            }
        }

        let results = groups
            .into_iter()
            .map(|group| {
                let subset = table
                    .filter_rows(|row| !row[index].is_blank() && row[index].to_label() == group);
                let reweighted = self.reweight(&subset, column, &group);
                let subset_weighted = reweighted.is_some();
                let (subset, weight_column) = match reweighted {
                    Some(weighted) => (weighted, Some(SUBSET_WEIGHT_COLUMN)),
                    None => (subset, self.weight_column),
                };
                GroupResult {
                    rows: subset.len(),
                    nps: compute_nps(&subset, &self.request.nps_column, weight_column).score,
                    top_box: compute_top_box(
                        &subset,
                        &self.request.top_box_columns,
                        weight_column,
                        self.request.top_box_threshold,
                    ),
                    subset_weighted,
                    group,
                }
            })
            .collect();
        Some(results)
    }

    /// Cell-weights one group into [`SUBSET_WEIGHT_COLUMN`] against targets
    /// derived for the group-weighting columns, or returns `None` to keep the
    /// overall weights.
    ///
    /// Only weighted analyses re-weight their groups.
    fn reweight(&self, subset: &Table, column: &str, group: &str) -> Option<Table> {
        let config = self.request.weighting.as_ref()?;
        let columns = self
            .request
            .group_weighting_columns
            .as_deref()
            .filter(|columns| !columns.is_empty())?;
        let population = self.population?;

        let targets = derive_targets(population, columns, config.target_column.as_deref());
        if targets.is_empty() {
            log::warn!(
                "no targets for [{}] in {column}={group}; using overall weights",
                columns.join(", ")
            );
            return None;
        }
        let calculator = WeightCalculator::new(columns.iter().cloned())
            .with_weight_column(SUBSET_WEIGHT_COLUMN);
        match calculator.apply(subset, &CellWeighting::new(targets)) {
            Ok(weighted) => Some(weighted.table),
            Err(err) => {
                log::warn!(
                    "subset weighting for {column}={group} failed: {err}; using overall weights"
                );
                None
            }
        }
    }
}
