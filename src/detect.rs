//! Format detection for spreadsheet packages.

use crate::container::decode_xml_bytes;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// OLE compound file magic, used by legacy binary `.xls` workbooks.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Content type for the main part of an `.xlsx` workbook.
const WORKBOOK_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";

/// Content type for the main part of an `.xlsm` workbook.
const MACRO_WORKBOOK_CONTENT_TYPE: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";

/// Content types for `.xltx` and `.xltm` templates.
const TEMPLATE_CONTENT_TYPES: [&str; 2] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.template.main+xml",
    "application/vnd.ms-excel.template.macroEnabled.main+xml",
];

/// Main parts of other Office packages, which are rejected by name.
const FOREIGN_CONTENT_TYPES: [(&str, &str); 2] = [
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        "word processing document (.docx)",
    ),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
        "presentation (.pptx)",
    ),
];

/// Detected spreadsheet format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    /// Excel workbook (.xlsx)
    Workbook,
    /// Macro-enabled workbook (.xlsm)
    MacroWorkbook,
    /// Workbook template (.xltx, .xltm)
    Template,
    /// Legacy binary workbook (.xls), recognised but not readable
    LegacyBinary,
}

impl FormatType {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Workbook => "xlsx",
            FormatType::MacroWorkbook => "xlsm",
            FormatType::Template => "xltx",
            FormatType::LegacyBinary => "xls",
        }
    }

    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            FormatType::Workbook => "Excel Workbook",
            FormatType::MacroWorkbook => "Excel Macro-Enabled Workbook",
            FormatType::Template => "Excel Template",
            FormatType::LegacyBinary => "Excel 97-2003 Workbook",
        }
    }

    /// Whether rows can be read from this format.
    pub fn is_supported(&self) -> bool {
        !matches!(self, FormatType::LegacyBinary)
    }

    /// `Ok` for readable formats, `Error::UnsupportedFormat` otherwise.
    pub fn ensure_supported(self) -> Result<Self> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(Error::UnsupportedFormat(format!(
                "{} (.{})",
                self.name(),
                self.extension()
            )))
        }
    }
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the format type from a file path.
///
/// # Example
///
/// ```no_run
/// use unxlsx::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("data.xlsx")?;
/// println!("Detected format: {}", format);
/// # Ok::<(), unxlsx::Error>(())
/// ```
pub fn detect_format_from_path(path: impl AsRef<Path>) -> Result<FormatType> {
    let mut file = File::open(path.as_ref())?;
    let mut magic = [0u8; 8];
    let read = read_prefix(&mut file, &mut magic)?;
    if is_ole_file(&magic[..read]) {
        return Ok(FormatType::LegacyBinary);
    }
    if !is_zip_file(&magic[..read]) {
        return Err(Error::UnknownFormat);
    }

    file.rewind()?;
    detect_format_from_reader(BufReader::new(file))
}

/// Detect the format type from a byte slice.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FormatType> {
    if is_ole_file(data) {
        return Ok(FormatType::LegacyBinary);
    }
    if !is_zip_file(data) {
        return Err(Error::UnknownFormat);
    }

    detect_format_from_reader(std::io::Cursor::new(data))
}

/// Detect the format type of a ZIP package.
///
/// The package's `[Content_Types].xml` decides; packages without one (or
/// without a recognised main part) are accepted when they have an `xl/`
/// folder.
pub fn detect_format_from_reader<R: Read + Seek>(reader: R) -> Result<FormatType> {
    let mut archive = zip::ZipArchive::new(reader)?;

    let content_types = match archive.by_name(CONTENT_TYPES_PATH) {
        Ok(mut file) => {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            Some(decode_xml_bytes(&bytes)?)
        }
        Err(_) => None,
    };

    if let Some(content_types) = content_types.as_deref() {
        if let Some(format) = format_from_content_types(content_types)? {
            return Ok(format);
        }
    }

    if archive.file_names().any(|n| n.starts_with("xl/")) {
        Ok(FormatType::Workbook)
    } else {
        Err(Error::UnknownFormat)
    }
}

fn format_from_content_types(content_types: &str) -> Result<Option<FormatType>> {
    if content_types.contains(WORKBOOK_CONTENT_TYPE) {
        return Ok(Some(FormatType::Workbook));
    }
    if content_types.contains(MACRO_WORKBOOK_CONTENT_TYPE) {
        return Ok(Some(FormatType::MacroWorkbook));
    }
    if TEMPLATE_CONTENT_TYPES.iter().any(|t| content_types.contains(t)) {
        return Ok(Some(FormatType::Template));
    }
    for (content_type, name) in FOREIGN_CONTENT_TYPES {
        if content_types.contains(content_type) {
            return Err(Error::UnsupportedFormat(name.to_string()));
        }
    }
    Ok(None)
}

fn read_prefix(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.starts_with(&ZIP_MAGIC)
}

/// Check if data starts with the OLE compound file signature.
pub fn is_ole_file(data: &[u8]) -> bool {
    data.starts_with(&OLE_MAGIC)
}
