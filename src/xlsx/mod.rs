//! XLSX (Excel) spreadsheet row reader.
//!
//! A workbook is opened once into an [`XlsxReader`], which resolves the
//! sheets and loads the shared string and style tables. Rows of a sheet are
//! then streamed with [`XlsxReader::read_rows`].
//!
//! # Example
//!
//! ```no_run
//! use unxlsx::xlsx::XlsxReader;
//!
//! let reader = XlsxReader::open("spreadsheet.xlsx")?;
//!
//! for sheet in reader.sheet_names() {
//!     let rows = reader.read_all_rows(sheet)?;
//!     println!("Sheet: {} ({} rows)", sheet, rows.len());
//! }
//! # Ok::<(), unxlsx::Error>(())
//! ```

mod column;
mod date;
mod reader;
pub mod rows;
mod shared_strings;
mod stream;
mod styles;
pub mod workbook;

pub use column::{column_from_reference, column_index, column_letters};
pub use date::{is_date_format_code, serial_to_date};
pub use reader::XlsxReader;
pub use rows::{CellKind, RawCell, RowDecoder, SheetTables};
pub use shared_strings::SharedStrings;
pub use stream::RowIter;
pub use styles::{DateStyles, Styles};
pub use workbook::ResolvedTables;
