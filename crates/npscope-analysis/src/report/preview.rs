use npscope_table::{MissingColumnError, Table};
use serde::Serialize;

use crate::{
    segment::SegmentKeyBuilder,
    targets::{TargetMap, derive_targets},
};

/// Segments found in a survey and the targets a population table suggests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentPreview {
    /// Sorted, distinct segment keys of survey rows without blank segment cells.
    pub segments: Vec<String>,
    pub suggested_targets: TargetMap,
}

/// Lists the segments of `survey` and suggests targets from `population`.
///
/// Population columns are matched to the requested names case-insensitively,
/// ignoring surrounding whitespace. Suggested targets are empty when there is no
/// population table or it lacks one of the columns.
pub fn preview_segments<S>(
    survey: &Table,
    population: Option<&Table>,
    columns: &[S],
    target_column: Option<&str>,
) -> Result<SegmentPreview, MissingColumnError>
where
    S: AsRef<str>,
{
    if columns.is_empty() {
        return Ok(SegmentPreview {
            segments: vec![],
            suggested_targets: TargetMap::default(),
        });
    }
    let builder = SegmentKeyBuilder::new(columns.iter().map(|column| column.as_ref()));
    let indices = survey.require_columns(builder.columns())?;
    let complete = survey.filter_rows(|row| !SegmentKeyBuilder::has_blank(row, &indices));
    let segments = builder.unique(&complete)?;

    let suggested_targets = population
        .map(|population| suggest_targets(population, builder.columns(), target_column))
        .unwrap_or_default();
    Ok(SegmentPreview {
        segments,
        suggested_targets,
    })
}

fn suggest_targets(
    population: &Table,
    columns: &[String],
    target_column: Option<&str>,
) -> TargetMap {
    let Some(matched) = columns
        .iter()
        .map(|column| find_column(population, column))
        .collect::<Option<Vec<_>>>()
    else {
        log::debug!("population table lacks a segment column; no targets suggested");
        return TargetMap::default();
    };
    let target_column = target_column.and_then(|name| find_column(population, name));
    derive_targets(population, &matched, target_column)
}

fn find_column<'a>(table: &'a Table, name: &str) -> Option<&'a str> {
    let wanted = name.trim().to_lowercase();
    table
        .columns()
        .iter()
        .find(|column| column.trim().to_lowercase() == wanted)
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use npscope_table::CellValue;

    use super::*;

    fn survey() -> Table {
        Table::new(
            ["Gender", "Age"],
            vec![
                vec!["Male".into(), "20-29".into()],
                vec!["Female".into(), "30-39".into()],
                vec!["Male ".into(), "20-29".into()],
                vec![CellValue::Missing, "30-39".into()],
            ],
        )
        .unwrap()
    }

    fn population() -> Table {
        Table::new(
            [" gender", "AGE", "Members"],
            vec![
                vec!["Male".into(), "20-29".into(), 40.0.into()],
                vec!["Female".into(), "30-39".into(), 60.0.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_preview_matches_population_columns_case_insensitively() {
        let preview = preview_segments(
            &survey(),
            Some(&population()),
            &["Gender", "Age"],
            Some("members"),
        )
        .unwrap();
        assert_eq!(preview.segments, vec!["Female_30-39", "Male_20-29"]);
        assert_eq!(preview.suggested_targets.get("Male_20-29"), Some(0.4));
        assert_eq!(preview.suggested_targets.get("Female_30-39"), Some(0.6));
    }

    #[test]
    fn test_preview_without_population() {
        let preview = preview_segments(&survey(), None, &["Gender"], None).unwrap();
        assert_eq!(preview.segments, vec!["Female", "Male"]);
        assert!(preview.suggested_targets.is_empty());
    }

    #[test]
    fn test_preview_population_lacking_column() {
        let population = Table::new(["gender"], vec![vec!["Male".into()]]).unwrap();
        let preview =
            preview_segments(&survey(), Some(&population), &["Gender", "Age"], None).unwrap();
        assert_eq!(preview.segments.len(), 2);
        assert!(preview.suggested_targets.is_empty());
    }

    #[test]
    fn test_preview_missing_survey_column() {
        let err = preview_segments(&survey(), None, &["Region"], None).unwrap_err();
        assert_eq!(err.columns, vec!["Region".to_owned()]);
    }
}
