//! Workbook handle.

use super::rows::SheetTables;
use super::shared_strings::SharedStrings;
use super::stream::{ProducerJob, RowIter};
use super::styles::DateStyles;
use super::workbook::{self, ResolvedTables};
use crate::container::{OoxmlContainer, SharedBytes};
use crate::detect::detect_format_from_bytes;
use crate::error::{Error, Result};
use crate::model::Row;
use crate::options::ReaderOptions;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use zip::ZipArchive;

/// An open workbook.
///
/// Sheets are resolved and the shared string and style tables loaded when
/// the workbook is opened; rows are decoded lazily by [`read_rows`].
/// Several sheets (or the same sheet several times) may be read at once.
///
/// [`read_rows`]: XlsxReader::read_rows
///
/// # Example
///
/// ```no_run
/// use unxlsx::XlsxReader;
///
/// let reader = XlsxReader::open("data.xlsx")?;
/// for row in reader.read_rows("Sheet1") {
///     let row = row.into_result()?;
///     println!("{}: {:?}", row.index, row.values());
/// }
/// # Ok::<(), unxlsx::Error>(())
/// ```
pub struct XlsxReader<R = SharedBytes> {
    container: Mutex<Option<OoxmlContainer<R>>>,
    sheets: Vec<String>,
    sheet_members: HashMap<String, String>,
    tables: Arc<SheetTables>,
    closed: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
}

impl XlsxReader<SharedBytes> {
    /// Open a workbook from a file path.
    ///
    /// The compressed package is read into memory once and shared by every
    /// row reader; worksheets are still decompressed and decoded row by row.
    /// To stream the package itself, pass an archive over a cloneable
    /// reader to [`XlsxReader::from_archive`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, ReaderOptions::default())
    }

    /// Open a workbook from a file path with explicit options. Reads the
    /// compressed package into memory, like [`XlsxReader::open`].
    pub fn open_with_options(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Self> {
        let mut data = Vec::new();
        File::open(path.as_ref())?.read_to_end(&mut data)?;
        Self::from_bytes_with_options(data, options)
    }

    /// Open a workbook held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_options(data, ReaderOptions::default())
    }

    /// Open a workbook held in memory with explicit options.
    pub fn from_bytes_with_options(data: Vec<u8>, options: ReaderOptions) -> Result<Self> {
        let format = detect_format_from_bytes(&data)?.ensure_supported()?;
        log::debug!("opening {} ({} bytes)", format, data.len());

        let container = OoxmlContainer::from_bytes(data)?;
        Self::from_container(container, options)
    }
}

impl<R: Read + Seek + Clone> XlsxReader<R> {
    /// Open a workbook from an already-open archive.
    pub fn from_archive(archive: ZipArchive<R>) -> Result<Self> {
        Self::from_container(OoxmlContainer::from_archive(archive), ReaderOptions::default())
    }

    /// Open a workbook from a container.
    pub fn from_container(container: OoxmlContainer<R>, options: ReaderOptions) -> Result<Self> {
        let ResolvedTables {
            sheets,
            sheet_members,
            shared_strings,
            date_styles,
        } = workbook::resolve(&container, &options)?;

        Ok(Self {
            container: Mutex::new(Some(container)),
            sheets,
            sheet_members,
            tables: Arc::new(SheetTables::new(shared_strings, date_styles)),
            closed: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }
}

impl<R> XlsxReader<R> {
    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> &[String] {
        &self.sheets
    }

    /// Get the number of sheets.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Package member holding a sheet's rows, `None` for unknown sheets.
    pub fn sheet_member(&self, sheet: &str) -> Option<&str> {
        self.sheet_members.get(sheet).map(String::as_str)
    }

    /// The shared string table.
    pub fn shared_strings(&self) -> &SharedStrings {
        self.tables.shared_strings()
    }

    /// Style indices that format dates.
    pub fn date_styles(&self) -> &DateStyles {
        self.tables.date_styles()
    }

    /// Number of row producers currently running for this workbook.
    pub fn active_readers(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the workbook and release the package.
    ///
    /// Running row iterators end at their next row. Reading rows after
    /// closing yields a single [`Error::Closed`] row. Closing twice is a
    /// no-op.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let container = self
            .container
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(container);
        log::debug!("workbook closed");
    }
}

impl<R: Read + Seek + Clone + Send + 'static> XlsxReader<R> {
    /// Stream the rows of a sheet.
    ///
    /// Each call starts an independent reader. An unknown sheet yields one
    /// row carrying [`Error::SheetNotFound`].
    pub fn read_rows(&self, sheet: &str) -> RowIter {
        let closed = Arc::clone(&self.closed);
        if self.is_closed() {
            return RowIter::single(Row::failed(0, Error::Closed), closed);
        }

        let Some(member) = self.sheet_members.get(sheet) else {
            return RowIter::single(
                Row::failed(0, Error::SheetNotFound(sheet.to_string())),
                closed,
            );
        };

        let archive = self
            .container
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(OoxmlContainer::archive);
        let Some(archive) = archive else {
            return RowIter::single(Row::failed(0, Error::Closed), closed);
        };

        RowIter::spawn(ProducerJob {
            sheet: sheet.to_string(),
            member: member.clone(),
            archive,
            tables: Arc::clone(&self.tables),
            closed,
            active: Arc::clone(&self.active),
        })
    }

    /// Read a whole sheet into memory, failing on the first row error.
    pub fn read_all_rows(&self, sheet: &str) -> Result<Vec<Row>> {
        self.read_rows(sheet).map(Row::into_result).collect()
    }
}

impl<R> std::fmt::Debug for XlsxReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XlsxReader")
            .field("sheets", &self.sheets)
            .field("shared_strings", &self.tables.shared_strings().len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
