//! # unxlsx
//!
//! Streaming row extraction from Excel workbooks.
//!
//! This library reads `.xlsx` (and `.xlsm` / `.xltx`) packages and yields
//! the rows of a sheet one at a time, with every cell resolved to text and
//! tagged with a semantic type. It is meant for ingesting spreadsheets as
//! data: formulas, formatting and charts are not interpreted.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unxlsx::CellType;
//!
//! let reader = unxlsx::open_file("data.xlsx")?;
//! println!("Sheets: {:?}", reader.sheet_names());
//!
//! for row in reader.read_rows("Sheet1") {
//!     let row = row.into_result()?;
//!     for cell in &row.cells {
//!         if cell.cell_type == CellType::DateTime {
//!             println!("{}{} is a date: {}", cell.column, cell.row, cell.value);
//!         }
//!     }
//! }
//! # Ok::<(), unxlsx::Error>(())
//! ```
//!
//! ## Streaming
//!
//! Each call to [`XlsxReader::read_rows`] starts a background reader that
//! stays at most one row ahead of the consumer. Dropping the iterator stops
//! it; [`XlsxReader::close`] stops every reader of the workbook.
//!
//! ```no_run
//! let reader = unxlsx::open_file("large.xlsx")?;
//!
//! // Only the header is decoded; the reader is released on drop.
//! let header = reader.read_rows("Sheet1").next();
//! # Ok::<(), unxlsx::Error>(())
//! ```

pub mod container;
pub mod detect;
pub mod error;
pub mod model;
pub mod options;
pub mod xlsx;

#[cfg(test)]
mod testing;

// Re-exports
pub use container::OoxmlContainer;
pub use detect::{detect_format_from_bytes, detect_format_from_path, FormatType};
pub use error::{Error, Result};
pub use model::{Cell, CellType, Row};
pub use options::ReaderOptions;
pub use xlsx::{
    column_from_reference, column_index, column_letters, is_date_format_code, serial_to_date,
    RowIter, XlsxReader,
};

use std::path::Path;

/// Open a workbook file.
///
/// # Example
///
/// ```no_run
/// let reader = unxlsx::open_file("data.xlsx")?;
/// let rows = reader.read_all_rows("Sheet1")?;
/// # Ok::<(), unxlsx::Error>(())
/// ```
pub fn open_file(path: impl AsRef<Path>) -> Result<XlsxReader> {
    XlsxReader::open(path)
}

/// Open a workbook from bytes.
///
/// # Example
///
/// ```no_run
/// let data = std::fs::read("data.xlsx")?;
/// let reader = unxlsx::open_bytes(data)?;
/// # Ok::<(), unxlsx::Error>(())
/// ```
pub fn open_bytes(data: impl Into<Vec<u8>>) -> Result<XlsxReader> {
    XlsxReader::from_bytes(data.into())
}
