//! Segment key construction.
//!
//! A segment key identifies the demographic cell a row belongs to. It is built
//! from an ordered list of columns: each value is stringified, stripped of every
//! whitespace character, and the parts are joined with [`SEGMENT_SEPARATOR`].
//!
//! The same builder is used for survey tables and population tables. Keys built
//! any other way will silently fail to match targets.
//!
//! ```
//! use npscope_analysis::segment::SegmentKeyBuilder;
//! use npscope_table::Table;
//!
//! let survey = Table::new(
//!     ["gender", "age"],
//!     vec![
//!         vec!["Male".into(), "20-29".into()],
//!         vec!["Male ".into(), "20 - 29".into()],
//!     ],
//! )
//! .unwrap();
//!
//! let keys = SegmentKeyBuilder::new(["gender", "age"]).build(&survey).unwrap();
//! assert_eq!(keys, vec!["Male_20-29", "Male_20-29"]);
//! ```

use npscope_table::{CellValue, MissingColumnError, Table};

/// Separator placed between the normalized parts of a multi-column key.
pub const SEGMENT_SEPARATOR: &str = "_";

/// Builds segment keys for an ordered list of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentKeyBuilder {
    columns: Vec<String>,
}

impl SegmentKeyBuilder {
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Builds one key per row of `table`.
    ///
    /// Fails if any of the segment columns is absent; the error names all of them.
    pub fn build(&self, table: &Table) -> Result<Vec<String>, MissingColumnError> {
        let indices = table.require_columns(&self.columns)?;
        Ok(table.rows().map(|row| segment_key(row, &indices)).collect())
    }

    /// Sorted, deduplicated keys present in `table`.
    pub fn unique(&self, table: &Table) -> Result<Vec<String>, MissingColumnError> {
        let mut keys = self.build(table)?;
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    /// Returns `true` if any of the segment cells of `row` is missing or blank.
    ///
    /// `indices` must come from [`Table::require_columns`] on the row's table.
    #[must_use]
    pub fn has_blank(row: &[CellValue], indices: &[usize]) -> bool {
        indices.iter().any(|&i| row[i].is_blank())
    }
}

/// Key of a single row given the resolved segment column indices.
#[must_use]
pub fn segment_key(row: &[CellValue], indices: &[usize]) -> String {
    indices
        .iter()
        .map(|&i| row[i].to_compact_label())
        .collect::<Vec<_>>()
        .join(SEGMENT_SEPARATOR)
}

/// Normalizes an externally supplied key the same way cell values are normalized.
///
/// Whitespace never survives key construction, so removing it from a
/// user-written key such as `"Male _ 20-29"` yields the key the builder produces.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            ["gender", "age", "score"],
            vec![
                vec!["Male".into(), "20-29".into(), 10.0.into()],
                vec!["Male ".into(), "20-29".into(), 9.0.into()],
                vec!["Female".into(), " 30 - 39 ".into(), 3.0.into()],
                vec![CellValue::Missing, "30-39".into(), 7.0.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_whitespace_variants_share_a_key() {
        let keys = SegmentKeyBuilder::new(["gender", "age"])
            .build(&table())
            .unwrap();
        assert_eq!(keys[0], "Male_20-29");
        assert_eq!(keys[0], keys[1]);
        assert_eq!(keys[2], "Female_30-39");
    }

    #[test]
    fn test_single_column_key_has_no_separator() {
        let keys = SegmentKeyBuilder::new(["gender"]).build(&table()).unwrap();
        assert_eq!(keys, vec!["Male", "Male", "Female", ""]);
    }

    #[test]
    fn test_numeric_values_stringify_without_fraction() {
        let keys = SegmentKeyBuilder::new(["score"]).build(&table()).unwrap();
        assert_eq!(keys, vec!["10", "9", "3", "7"]);
    }

    #[test]
    fn test_missing_columns_are_all_reported() {
        let err = SegmentKeyBuilder::new(["region", "age", "income"])
            .build(&table())
            .unwrap_err();
        assert_eq!(err.columns, vec!["region".to_owned(), "income".to_owned()]);
    }

    #[test]
    fn test_unique_is_sorted() {
        let keys = SegmentKeyBuilder::new(["gender", "age"])
            .unique(&table())
            .unwrap();
        assert_eq!(keys, vec!["Female_30-39", "Male_20-29", "_30-39"]);
    }

    #[test]
    fn test_has_blank() {
        let table = table();
        let indices = table.require_columns(&["gender", "age"]).unwrap();
        let blanks = table
            .rows()
            .map(|row| SegmentKeyBuilder::has_blank(row, &indices))
            .collect::<Vec<_>>();
        assert_eq!(blanks, vec![false, false, false, true]);
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key(" Male _ 20 - 29 "), "Male_20-29");
    }
}
