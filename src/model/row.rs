//! Row model structures.

use super::Cell;
use crate::error::{Error, Result};
use serde::Serialize;

/// A row of decoded cells.
///
/// Empty cells are omitted, so column letters may skip. A row carrying an
/// `error` has no cells and is the last row of its sheet stream.
#[derive(Debug, Default, Serialize)]
pub struct Row {
    /// 1-based row number
    pub index: u32,

    /// Cells in document order
    pub cells: Vec<Cell>,

    /// Terminal decoding error
    #[serde(skip)]
    pub error: Option<Error>,
}

impl Row {
    /// Create a row of cells.
    pub fn new(index: u32, cells: Vec<Cell>) -> Self {
        Self {
            index,
            cells,
            error: None,
        }
    }

    /// Create a terminal error row.
    pub fn failed(index: u32, error: Error) -> Self {
        Self {
            index,
            cells: Vec::new(),
            error: Some(error),
        }
    }

    /// Whether this row reports a decoding failure.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Convert into `Err` if the row carries an error.
    pub fn into_result(self) -> Result<Row> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }

    /// Find the cell in a column, by letters.
    pub fn cell(&self, column: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.column == column)
    }

    /// Values in document order.
    pub fn values(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.value.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellType;

    #[test]
    fn test_row_accessors() {
        let row = Row::new(
            4,
            vec![
                Cell::new("A", 4, "x", CellType::String),
                Cell::new("C", 4, "7", CellType::Numerical),
            ],
        );

        assert!(!row.is_error());
        assert_eq!(row.values(), ["x", "7"]);
        assert_eq!(row.cell("C").map(|c| c.value.as_str()), Some("7"));
        assert!(row.cell("B").is_none());
        assert!(row.into_result().is_ok());
    }

    #[test]
    fn test_failed_row() {
        let row = Row::failed(9, Error::SheetNotFound("nope".to_string()));
        assert!(row.is_error());
        assert!(row.cells.is_empty());
        assert!(matches!(row.into_result(), Err(Error::SheetNotFound(_))));
    }

    #[test]
    fn test_row_serialization_skips_error() {
        let row = Row::new(1, vec![Cell::new("A", 1, "id", CellType::String)]);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["index"], 1);
        assert_eq!(json["cells"][0]["value"], "id");
        assert!(json.get("error").is_none());
    }
}
