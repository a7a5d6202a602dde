//! Uploaded tables for one analysis session.
//!
//! An [`AnalysisSession`] owns the tables a user has provided: the survey
//! responses, an optional population table for target derivation, and an
//! optional coding table holding one row per (respondent, coded category) of
//! open-ended answers. The session is an ordinary value owned by its caller;
//! analysis operations only ever borrow it.

use std::collections::{HashMap, HashSet};

use npscope_table::{CellValue, Table, TableError};

/// Default respondent identifier column.
pub const DEFAULT_ID_COLUMN: &str = "ResponseId";

#[derive(Debug, Clone)]
pub struct AnalysisSession {
    survey: Option<Table>,
    population: Option<Table>,
    coding: Option<Table>,
    id_column: String,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            survey: None,
            population: None,
            coding: None,
            id_column: DEFAULT_ID_COLUMN.to_owned(),
        }
    }

    #[must_use]
    pub fn with_id_column<S>(mut self, id_column: S) -> Self
    where
        S: Into<String>,
    {
        self.id_column = id_column.into();
        self
    }

    #[must_use]
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn set_survey(&mut self, table: Table) {
        log::debug!("survey table loaded: {} rows", table.len());
        self.survey = Some(table);
    }

    pub fn set_population(&mut self, table: Table) {
        log::debug!("population table loaded: {} rows", table.len());
        self.population = Some(table);
    }

    pub fn set_coding(&mut self, table: Table) {
        log::debug!("coding table loaded: {} rows", table.len());
        self.coding = Some(table);
    }

    /// Drops every table.
    pub fn reset(&mut self) {
        self.survey = None;
        self.population = None;
        self.coding = None;
    }

    #[must_use]
    pub fn survey(&self) -> Option<&Table> {
        self.survey.as_ref()
    }

    #[must_use]
    pub fn population(&self) -> Option<&Table> {
        self.population.as_ref()
    }

    #[must_use]
    pub fn coding(&self) -> Option<&Table> {
        self.coding.as_ref()
    }

    /// The survey table left-joined with the coding table on the id column.
    ///
    /// Coding columns that also exist in the survey are taken from the survey.
    /// A survey row yields one output row per coding row with the same id, or a
    /// single row with missing coding cells when there is none. Blank ids never
    /// match.
    ///
    /// Returns the survey itself when there is no coding table or either table
    /// lacks the id column, and `None` when there is no survey.
    pub fn merged(&self) -> Option<Result<Table, TableError>> {
        let survey = self.survey.as_ref()?;
        let Some(coding) = self.coding.as_ref() else {
            return Some(Ok(survey.clone()));
        };
        let (Some(survey_id), Some(coding_id)) = (
            survey.column_index(&self.id_column),
            coding.column_index(&self.id_column),
        ) else {
            log::warn!(
                "id column '{}' missing from survey or coding table; coding not merged",
                self.id_column
            );
            return Some(Ok(survey.clone()));
        };
        Some(left_join(survey, survey_id, coding, coding_id))
    }
}

fn left_join(
    survey: &Table,
    survey_id: usize,
    coding: &Table,
    coding_id: usize,
) -> Result<Table, TableError> {
    let survey_columns = survey.columns().iter().collect::<HashSet<_>>();
    let extra = coding
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| !survey_columns.contains(name))
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    let mut by_id = HashMap::<String, Vec<&[CellValue]>>::new();
    for row in coding.rows() {
        if !row[coding_id].is_blank() {
            by_id.entry(row[coding_id].to_label()).or_default().push(row);
        }
    }

    let mut rows = vec![];
    for row in survey.rows() {
        let matches = if row[survey_id].is_blank() {
            None
        } else {
            by_id.get(&row[survey_id].to_label())
        };
        match matches {
            Some(coded) => {
                for coded_row in coded {
                    let mut merged = row.to_vec();
                    merged.extend(extra.iter().map(|&i| coded_row[i].clone()));
                    rows.push(merged);
                }
            }
            None => {
                let mut merged = row.to_vec();
                merged.resize(row.len() + extra.len(), CellValue::Missing);
                rows.push(merged);
            }
        }
    }

    let columns = survey
        .columns()
        .iter()
        .chain(extra.iter().map(|&i| &coding.columns()[i]))
        .cloned();
    Table::new(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey() -> Table {
        Table::new(
            ["ResponseId", "Q1", "Q6"],
            vec![
                vec!["R1".into(), 10.0.into(), "Great".into()],
                vec!["R2".into(), 3.0.into(), "Slow".into()],
                vec!["R3".into(), 8.0.into(), CellValue::Missing],
            ],
        )
        .unwrap()
    }

    fn coding() -> Table {
        Table::new(
            ["ResponseId", "Q6", "Q6_coded"],
            vec![
                vec!["R1".into(), "ignored".into(), "Taste".into()],
                vec!["R1".into(), "ignored".into(), "Price".into()],
                vec!["R2".into(), "ignored".into(), "Delivery".into()],
                vec!["R9".into(), "ignored".into(), "Other".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_merged_left_join() {
        let mut session = AnalysisSession::new();
        session.set_survey(survey());
        session.set_coding(coding());

        let merged = session.merged().unwrap().unwrap();
        assert_eq!(merged.columns(), ["ResponseId", "Q1", "Q6", "Q6_coded"]);
        assert_eq!(merged.len(), 4);

        let coded = merged.require_column("Q6_coded").unwrap();
        let labels = merged.values(coded).map(CellValue::to_label).collect::<Vec<_>>();
        assert_eq!(labels, vec!["Taste", "Price", "Delivery", ""]);
        // survey values win for shared columns
        assert_eq!(merged.row(0).unwrap()[2], CellValue::from("Great"));
    }

    #[test]
    fn test_merged_without_coding_is_survey() {
        let mut session = AnalysisSession::new();
        assert!(session.merged().is_none());
        session.set_survey(survey());
        assert_eq!(session.merged().unwrap().unwrap(), survey());
    }

    #[test]
    fn test_merged_without_id_column_is_survey() {
        let mut session = AnalysisSession::new().with_id_column("RespondentId");
        session.set_survey(survey());
        session.set_coding(coding());
        assert_eq!(session.merged().unwrap().unwrap(), survey());
    }

    #[test]
    fn test_reset() {
        let mut session = AnalysisSession::new();
        session.set_survey(survey());
        session.set_population(survey());
        session.set_coding(coding());
        session.reset();
        assert!(session.survey().is_none());
        assert!(session.population().is_none());
        assert!(session.coding().is_none());
    }
}
