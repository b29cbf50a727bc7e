//! Error types for the unxlsx library.

use std::io;
use thiserror::Error;

/// Result type alias for unxlsx operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening a workbook or decoding its rows.
///
/// Structural errors (`Io`, `ZipArchive`, `XmlParse`, `MissingComponent`,
/// `SheetMemberNotFound`, ...) are returned when a workbook is opened.
/// Row-level errors are delivered as the terminal [`Row`](crate::Row) of a
/// sheet stream.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format could not be determined.
    #[error("Unknown file format")]
    UnknownFormat,

    /// The file format is recognized but not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Invalid or malformed data in the document.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required package member is missing.
    #[error("file not found: {0}")]
    MissingComponent(String),

    /// A sheet declared in the workbook has no content member.
    #[error("unable to find member {member:?} for sheet {sheet:?}")]
    SheetMemberNotFound {
        /// Declared sheet name
        sheet: String,
        /// Member path (or relationship id) that could not be resolved
        member: String,
    },

    /// A serial date value was not a valid decimal number.
    #[error("invalid numeric format: {0:?}")]
    InvalidNumericFormat(String),

    /// A cell typed as inline string carried no inline string.
    #[error("cell {reference} had type of InlineString, but the InlineString attribute was missing")]
    MissingInlineString {
        /// Cell reference, e.g. `C23`
        reference: String,
    },

    /// A cell carried neither a value element nor the data its type demands.
    #[error("unable to get cell value for cell {reference} - no value element found")]
    MissingCellValue {
        /// Cell reference, e.g. `C23`
        reference: String,
    },

    /// A shared string reference was not an integer.
    #[error("invalid shared string index: {0:?}")]
    InvalidSharedStringIndex(String),

    /// A shared string reference pointed past the end of the table.
    #[error("attempted to index value {index} in shared strings of length {len}")]
    SharedStringOutOfRange {
        /// Referenced index
        index: usize,
        /// Length of the shared string table
        len: usize,
    },

    /// Rows were requested for a sheet the workbook does not declare.
    #[error("unable to open sheet {0}")]
    SheetNotFound(String),

    /// The workbook was used after [`XlsxReader::close`](crate::XlsxReader::close).
    #[error("workbook has been closed")]
    Closed,
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlParse(err.to_string())
    }
}
