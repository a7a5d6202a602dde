//! Tabular data model for survey analysis.
//!
//! This crate provides the column-typed table consumed by the weighting and
//! statistics engine:
//!
//! - [`CellValue`] - A single cell: text, number, or missing
//! - [`Table`] - Named columns over rows of cells, never mutated in place
//! - [`NumericCoercion`] - The single numeric coercion utility used at every
//!   computation boundary (direct parse, optionally followed by label-tolerant
//!   integer extraction for values such as `"7 - Very satisfied"`)
//!
//! Tables are produced by an upload/parsing collaborator. In JSON they look like
//!
//! ```json
//! { "columns": ["ResponseId", "Q1_1"], "rows": [["R1", 10], ["R2", null]] }
//! ```
//!
//! # Example
//!
//! ```
//! use npscope_table::{CellValue, NumericCoercion, Table};
//!
//! let table = Table::new(
//!     ["ResponseId", "Q5"],
//!     vec![
//!         vec!["R1".into(), "7 - Very satisfied".into()],
//!         vec!["R2".into(), CellValue::from(5.0)],
//!     ],
//! )
//! .unwrap();
//!
//! let q5 = table.require_column("Q5").unwrap();
//! let values = table
//!     .values(q5)
//!     .map(|cell| NumericCoercion::LabelTolerant.coerce(cell))
//!     .collect::<Vec<_>>();
//! assert_eq!(values, vec![Some(7.0), Some(5.0)]);
//! ```

pub use self::{cell::*, coerce::*, table::*};

mod cell;
mod coerce;
mod table;

/// One or more columns required by an operation are absent from a table.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("missing column(s): {}", columns.join(", "))]
pub struct MissingColumnError {
    /// Names of the absent columns, in request order.
    pub columns: Vec<String>,
}

impl MissingColumnError {
    #[must_use]
    pub fn new<S>(column: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            columns: vec![column.into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TableError {
    #[display("duplicate column name '{column}'")]
    DuplicateColumn { column: String },
    #[display("row {row} has {actual} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[display("column '{column}' has {actual} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },
}
