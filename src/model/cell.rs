//! Cell model structures.

use crate::xlsx::column_index;
use serde::{Deserialize, Serialize};

/// Semantic type of a cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    /// Text, shared or inline
    String,
    /// Numbers, including cells without a type attribute
    Numerical,
    /// Dates and times, rendered as `YYYY-MM-DD` or RFC 3339
    DateTime,
    /// `1` or `0`
    Boolean,
}

impl CellType {
    /// Lower-case name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::String => "string",
            CellType::Numerical => "numerical",
            CellType::DateTime => "datetime",
            CellType::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded, non-empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Column letters, e.g. `A`, `AB`
    pub column: String,

    /// 1-based row number
    pub row: u32,

    /// Resolved value
    pub value: String,

    /// Semantic type of the value
    #[serde(rename = "type")]
    pub cell_type: CellType,
}

impl Cell {
    /// Create a new cell.
    pub fn new(
        column: impl Into<String>,
        row: u32,
        value: impl Into<String>,
        cell_type: CellType,
    ) -> Self {
        Self {
            column: column.into(),
            row,
            value: value.into(),
            cell_type,
        }
    }

    /// 0-based index of the column, `None` if the cell had no column
    /// letters in its reference.
    pub fn column_index(&self) -> Option<usize> {
        column_index(&self.column)
    }
}
