use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{CellValue, MissingColumnError, TableError};

/// An ordered sequence of rows over named columns.
///
/// Every row has exactly one cell per column. Operations that derive data
/// ([`with_column`](Self::with_column), [`filter_rows`](Self::filter_rows), ...)
/// return a new table and leave `self` untouched, so the same table can be
/// analyzed repeatedly under different configurations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

#[derive(Deserialize)]
struct RawTable {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<CellValue>>,
}

impl TryFrom<RawTable> for Table {
    type Error = TableError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        Self::new(raw.columns, raw.rows)
    }
}

impl Table {
    /// Creates a table, validating column names and row widths.
    ///
    /// ```
    /// use npscope_table::{Table, TableError};
    ///
    /// let ok = Table::new(["a", "b"], vec![vec![1.0.into(), "x".into()]]);
    /// assert!(ok.is_ok());
    ///
    /// let ragged = Table::new(["a", "b"], vec![vec![1.0.into()]]);
    /// assert!(matches!(ragged, Err(TableError::RowLength { row: 0, .. })));
    /// ```
    pub fn new<I, S>(columns: I, rows: Vec<Vec<CellValue>>) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect::<Vec<String>>();
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != columns.len() {
                return Err(TableError::RowLength {
                    row,
                    expected: columns.len(),
                    actual: cells.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn require_column(&self, name: &str) -> Result<usize, MissingColumnError> {
        self.column_index(name)
            .ok_or_else(|| MissingColumnError::new(name))
    }

    /// Resolves every name to its column index, reporting all absent names at once.
    pub fn require_columns<S>(&self, names: &[S]) -> Result<Vec<usize>, MissingColumnError>
    where
        S: AsRef<str>,
    {
        let mut indices = Vec::with_capacity(names.len());
        let mut missing = vec![];
        for name in names {
            match self.column_index(name.as_ref()) {
                Some(index) => indices.push(index),
                None => missing.push(name.as_ref().to_owned()),
            }
        }
        if missing.is_empty() {
            Ok(indices)
        } else {
            Err(MissingColumnError { columns: missing })
        }
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[CellValue]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Cells of one column, top to bottom.
    ///
    /// # Panics
    ///
    /// Panics if `column` is out of bounds.
    pub fn values(&self, column: usize) -> impl ExactSizeIterator<Item = &CellValue> + '_ {
        assert!(column < self.columns.len(), "column index out of bounds");
        self.rows.iter().map(move |row| &row[column])
    }

    /// Returns a copy of this table with `name` set to `values`.
    ///
    /// An existing column of the same name is replaced in the copy; otherwise the
    /// column is appended. `self` is never modified.
    pub fn with_column<S>(&self, name: S, values: Vec<CellValue>) -> Result<Self, TableError>
    where
        S: Into<String>,
    {
        let name = name.into();
        if values.len() != self.rows.len() {
            return Err(TableError::ColumnLength {
                column: name,
                expected: self.rows.len(),
                actual: values.len(),
            });
        }
        let mut table = self.clone();
        match table.column_index(&name) {
            Some(index) => {
                for (row, value) in table.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                table.columns.push(name);
                for (row, value) in table.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(table)
    }

    /// Returns a table holding the rows for which `predicate` returns `true`.
    #[must_use]
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| predicate(row))
                .cloned()
                .collect(),
        }
    }

    /// Returns a table holding the given rows, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            ["id", "score"],
            vec![
                vec!["R1".into(), 10.0.into()],
                vec!["R2".into(), CellValue::Missing],
                vec!["R3".into(), 8.0.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = Table::new(["a", "a"], vec![]);
        assert_eq!(
            result,
            Err(TableError::DuplicateColumn {
                column: "a".to_owned()
            })
        );
    }

    #[test]
    fn test_require_columns_reports_all_missing() {
        let table = sample();
        let err = table.require_columns(&["x", "id", "y"]).unwrap_err();
        assert_eq!(err.columns, vec!["x".to_owned(), "y".to_owned()]);
        assert_eq!(err.to_string(), "missing column(s): x, y");
        assert_eq!(table.require_columns(&["score", "id"]).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_with_column_appends_without_touching_source() {
        let table = sample();
        let weighted = table
            .with_column("Weight", vec![1.0.into(), 2.0.into(), 3.0.into()])
            .unwrap();
        assert_eq!(table.columns().len(), 2);
        assert_eq!(weighted.columns(), ["id", "score", "Weight"]);
        assert_eq!(weighted.row(1).unwrap()[2], CellValue::Number(2.0));
    }

    #[test]
    fn test_with_column_replaces_in_copy() {
        let table = sample();
        let replaced = table
            .with_column("score", vec![1.0.into(), 1.0.into(), 1.0.into()])
            .unwrap();
        assert_eq!(replaced.columns().len(), 2);
        assert_eq!(table.row(0).unwrap()[1], CellValue::Number(10.0));
        assert_eq!(replaced.row(0).unwrap()[1], CellValue::Number(1.0));
    }

    #[test]
    fn test_with_column_length_mismatch() {
        let err = sample().with_column("w", vec![1.0.into()]).unwrap_err();
        assert!(matches!(err, TableError::ColumnLength { expected: 3, actual: 1, .. }));
    }

    #[test]
    fn test_filter_and_select() {
        let table = sample();
        let scored = table.filter_rows(|row| !row[1].is_blank());
        assert_eq!(scored.len(), 2);
        let reordered = table.select_rows(&[2, 0]);
        assert_eq!(reordered.row(0).unwrap()[0], CellValue::from("R3"));
    }

    #[test]
    fn test_deserialize_validates() {
        let table: Table =
            serde_json::from_str(r#"{"columns": ["a"], "rows": [[1], ["x"], [null]]}"#).unwrap();
        assert_eq!(table.len(), 3);

        let ragged = serde_json::from_str::<Table>(r#"{"columns": ["a"], "rows": [[1, 2]]}"#);
        assert!(ragged.is_err());
    }

    #[test]
    fn test_serialize_shape() {
        let table = Table::new(["a"], vec![vec!["x".into()]]).unwrap();
        assert_eq!(
            serde_json::to_string(&table).unwrap(),
            r#"{"columns":["a"],"rows":[["x"]]}"#
        );
    }
}
