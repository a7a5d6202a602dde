use std::collections::HashMap;

use npscope_stats::ratio::round1;
use npscope_table::{CellValue, NumericCoercion, Table};
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::WeightedAggregator,
    category::{CategoryShare, compute_category_stats},
    nps::NpsCategory,
    response_rate::compute_response_rate,
    session::{AnalysisSession, DEFAULT_ID_COLUMN},
    weighting::DEFAULT_WEIGHT_COLUMN,
};

use super::{AnalysisError, WeightingConfig, WeightingSummary, unique_respondents, weight_survey};

pub const OVERALL_SEGMENT: &str = "Overall";
pub const PROMOTERS_SEGMENT: &str = "Promoters (9-10)";
pub const PASSIVES_SEGMENT: &str = "Passives (7-8)";
pub const DETRACTORS_SEGMENT: &str = "Detractors (0-6)";
pub const AT_RISK_SEGMENT: &str = "At-Risk (0-3)";

/// Highest score of the at-risk segment, a subset of the detractors.
const AT_RISK_MAX_SCORE: f64 = 3.0;

fn default_id_column() -> String {
    DEFAULT_ID_COLUMN.to_owned()
}

/// Settings of an open-end response-rate report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRateRequest {
    /// Score column used to split respondents into NPS segments.
    #[serde(default)]
    pub nps_column: Option<String>,
    pub open_end_columns: Vec<String>,
    #[serde(default)]
    pub weighting: Option<WeightingConfig>,
    #[serde(default = "default_id_column")]
    pub id_column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRateReport {
    pub excluded_count: usize,
    pub weighting: Option<WeightingSummary>,
    /// One entry per open-end column, in request order.
    pub columns: Vec<OpenEndResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenEndResult {
    pub column: String,
    /// The preceding open-end column, whose answers group the categories.
    pub parent: Option<String>,
    pub segments: Vec<SegmentOpenEnd>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentOpenEnd {
    pub segment: String,
    /// Weighted respondent base of the segment, rounded to one decimal.
    pub total_count: f64,
    pub response_rate: f64,
    pub category_stats: Vec<CategoryShare>,
}

/// Reports response rates and category incidence of open-end columns over the
/// session's survey merged with its coding table.
///
/// With weighting configured, weights are computed on one row per respondent
/// of the survey and carried over to the merged rows by respondent id; merged
/// rows of respondents without a weight are dropped.
pub fn run_response_rates(
    session: &AnalysisSession,
    request: &ResponseRateRequest,
) -> Result<ResponseRateReport, AnalysisError> {
    let survey = session.survey().ok_or(AnalysisError::NoSurvey)?;
    let merged = session.merged().ok_or(AnalysisError::NoSurvey)??;
    let id_column = merged
        .has_column(&request.id_column)
        .then_some(request.id_column.as_str());

    let (table, weight_column, excluded_count, weighting) = match &request.weighting {
        Some(config) => {
            let respondents = unique_respondents(survey, &request.id_column);
            let prepared = weight_survey(&respondents, session.population(), config)?;
            match carry_weights(&prepared.weighted.table, &merged, &request.id_column)? {
                Some(table) => (
                    table,
                    Some(DEFAULT_WEIGHT_COLUMN),
                    prepared.excluded_count,
                    Some(prepared.summary),
                ),
                None => {
                    log::warn!(
                        "id column '{}' missing; response rates are unweighted",
                        request.id_column
                    );
                    (merged, None, prepared.excluded_count, Some(prepared.summary))
                }
            }
        }
        None => (merged, None, 0, None),
    };

    let segments = nps_segments(&table, request.nps_column.as_deref());
    let columns = request
        .open_end_columns
        .iter()
        .enumerate()
        .filter(|(_, column)| !column.trim().is_empty())
        .map(|(i, column)| {
            let parent = i
                .checked_sub(1)
                .map(|j| request.open_end_columns[j].clone())
                .filter(|parent| !parent.trim().is_empty());
            let segments = segments
                .iter()
                .map(|(segment, subset)| {
                    let aggregator = WeightedAggregator::new(subset, weight_column, id_column);
                    SegmentOpenEnd {
                        segment: (*segment).to_owned(),
                        total_count: round1(aggregator.base()),
                        response_rate: compute_response_rate(
                            subset,
                            std::slice::from_ref(column),
                            id_column,
                            weight_column,
                        )[column.as_str()],
                        category_stats: compute_category_stats(
                            subset,
                            column,
                            id_column,
                            weight_column,
                            parent.as_deref(),
                        ),
                    }
                })
                .collect();
            OpenEndResult {
                column: column.clone(),
                parent,
                segments,
            }
        })
        .collect();

    Ok(ResponseRateReport {
        excluded_count,
        weighting,
        columns,
    })
}

/// Copies each respondent's weight onto the merged rows with the same id.
///
/// Returns `None` when either table lacks the id column.
fn carry_weights(
    weighted: &Table,
    merged: &Table,
    id_column: &str,
) -> Result<Option<Table>, AnalysisError> {
    let (Some(weighted_id), Some(merged_id), Some(weight_index)) = (
        weighted.column_index(id_column),
        merged.column_index(id_column),
        weighted.column_index(DEFAULT_WEIGHT_COLUMN),
    ) else {
        return Ok(None);
    };

    let mut by_id = HashMap::new();
    for row in weighted.rows() {
        if !row[weighted_id].is_blank() {
            by_id
                .entry(row[weighted_id].to_label())
                .or_insert_with(|| row[weight_index].clone());
        }
    }

    let mut rows = vec![];
    let mut weights = vec![];
    for (index, row) in merged.rows().enumerate() {
        if row[merged_id].is_blank() {
            continue;
        }
        if let Some(weight) = by_id.get(&row[merged_id].to_label()) {
            rows.push(index);
            weights.push(weight.clone());
        }
    }
    let dropped = merged.len() - rows.len();
    if dropped > 0 {
        log::debug!("dropped {dropped} merged row(s) without a respondent weight");
    }
    Ok(Some(merged.select_rows(&rows).with_column(DEFAULT_WEIGHT_COLUMN, weights)?))
}

/// The whole table followed by its NPS segments, when the score column exists.
fn nps_segments(table: &Table, nps_column: Option<&str>) -> Vec<(&'static str, Table)> {
    let mut segments = vec![(OVERALL_SEGMENT, table.clone())];
    let Some(index) = nps_column.and_then(|column| table.column_index(column)) else {
        return segments;
    };
    let score = |row: &[CellValue]| {
        NumericCoercion::Direct
            .coerce(&row[index])
            .filter(|&score| NpsCategory::classify(score).is_some())
    };
    let category = |row: &[CellValue]| score(row).and_then(NpsCategory::classify);

    segments.extend([
        (
            PROMOTERS_SEGMENT,
            table.filter_rows(|row| category(row) == Some(NpsCategory::Promoter)),
        ),
        (
            PASSIVES_SEGMENT,
            table.filter_rows(|row| category(row) == Some(NpsCategory::Passive)),
        ),
        (
            DETRACTORS_SEGMENT,
            table.filter_rows(|row| category(row) == Some(NpsCategory::Detractor)),
        ),
        (
            AT_RISK_SEGMENT,
            table.filter_rows(|row| score(row).is_some_and(|score| score <= AT_RISK_MAX_SCORE)),
        ),
    ]);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey() -> Table {
        Table::new(
            ["ResponseId", "gender", "Q1", "Q6", "Q7"],
            vec![
                vec!["R1".into(), "M".into(), 10.0.into(), "Tasty".into(), "More sauce".into()],
                vec!["R2".into(), "F".into(), 2.0.into(), "Cold".into(), CellValue::Missing],
                vec!["R3".into(), "F".into(), 8.0.into(), CellValue::Missing, CellValue::Missing],
                vec![
                    "R4".into(),
                    CellValue::Missing,
                    9.0.into(),
                    "Fast".into(),
                    CellValue::Missing,
                ],
            ],
        )
        .unwrap()
    }

    fn coding() -> Table {
        Table::new(
            ["ResponseId", "Q6_coded"],
            vec![
                vec!["R1".into(), "Taste".into()],
                vec!["R1".into(), "Price".into()],
                vec!["R2".into(), "Temperature".into()],
                vec!["R4".into(), "Speed".into()],
            ],
        )
        .unwrap()
    }

    fn session() -> AnalysisSession {
        let mut session = AnalysisSession::new();
        session.set_survey(survey());
        session.set_coding(coding());
        session
    }

    fn request() -> ResponseRateRequest {
        ResponseRateRequest {
            nps_column: Some("Q1".to_owned()),
            open_end_columns: vec!["Q6".to_owned(), "Q6_coded".to_owned()],
            weighting: None,
            id_column: DEFAULT_ID_COLUMN.to_owned(),
        }
    }

    fn segment<'a>(result: &'a OpenEndResult, name: &str) -> &'a SegmentOpenEnd {
        result
            .segments
            .iter()
            .find(|s| s.segment == name)
            .unwrap()
    }

    #[test]
    fn test_unweighted_report() {
        let report = run_response_rates(&session(), &request()).unwrap();
        assert_eq!(report.columns.len(), 2);

        let q6 = &report.columns[0];
        assert_eq!(q6.parent, None);
        let names = q6.segments.iter().map(|s| s.segment.as_str()).collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                OVERALL_SEGMENT,
                PROMOTERS_SEGMENT,
                PASSIVES_SEGMENT,
                DETRACTORS_SEGMENT,
                AT_RISK_SEGMENT
            ]
        );
        let overall = segment(q6, OVERALL_SEGMENT);
        assert_eq!(overall.total_count, 4.0);
        assert_eq!(overall.response_rate, 75.0);
        assert_eq!(segment(q6, PROMOTERS_SEGMENT).total_count, 2.0);
        assert_eq!(segment(q6, AT_RISK_SEGMENT).response_rate, 100.0);

        let coded = &report.columns[1];
        assert_eq!(coded.parent.as_deref(), Some("Q6"));
        let overall = segment(coded, OVERALL_SEGMENT);
        assert_eq!(overall.response_rate, 75.0);
        assert_eq!(overall.category_stats[0].label, "Taste (Tasty)");
        assert_eq!(overall.category_stats[0].percentage, 25.0);
        assert_eq!(overall.category_stats.len(), 4);
    }

    #[test]
    fn test_blank_preceding_column_is_not_a_parent() {
        let request = ResponseRateRequest {
            open_end_columns: vec![" ".to_owned(), "Q6_coded".to_owned()],
            ..request()
        };
        let report = run_response_rates(&session(), &request).unwrap();
        assert_eq!(report.columns.len(), 1);
        assert_eq!(report.columns[0].column, "Q6_coded");
        assert_eq!(report.columns[0].parent, None);
        let overall = segment(&report.columns[0], OVERALL_SEGMENT);
        assert_eq!(overall.category_stats[0].label, "Taste");
    }

    #[test]
    fn test_weighted_report_drops_unweighted_respondents() {
        let request = ResponseRateRequest {
            weighting: Some(WeightingConfig {
                segment_columns: vec!["gender".to_owned()],
                targets: [("M", 0.5), ("F", 0.5)].into_iter().collect(),
                target_column: None,
            }),
            ..request()
        };
        let report = run_response_rates(&session(), &request).unwrap();
        assert_eq!(report.excluded_count, 1);

        // R4 has no gender and is dropped; R1 weighs 1.5, R2 and R3 0.75 each
        let overall = segment(&report.columns[0], OVERALL_SEGMENT);
        assert_eq!(overall.total_count, 3.0);
        assert_eq!(overall.response_rate, 75.0);
        let passives = segment(&report.columns[0], PASSIVES_SEGMENT);
        assert_eq!(passives.total_count, 0.8);
        assert_eq!(passives.response_rate, 0.0);
    }

    #[test]
    fn test_without_nps_column_only_overall() {
        let request = ResponseRateRequest {
            nps_column: None,
            ..request()
        };
        let report = run_response_rates(&session(), &request).unwrap();
        assert_eq!(report.columns[0].segments.len(), 1);
    }

    #[test]
    fn test_no_survey() {
        let err = run_response_rates(&AnalysisSession::new(), &request()).unwrap_err();
        assert!(matches!(err, AnalysisError::NoSurvey));
    }

    #[test]
    fn test_request_defaults() {
        let request: ResponseRateRequest =
            serde_json::from_str(r#"{"open_end_columns": ["Q6"]}"#).unwrap();
        assert_eq!(request.id_column, "ResponseId");
        assert_eq!(request.nps_column, None);
    }
}
