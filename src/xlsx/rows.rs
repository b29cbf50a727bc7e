//! Worksheet row decoding.
//!
//! [`RowDecoder`] pulls XML events from a worksheet member and turns each
//! `<row>` into a [`Row`]. The whole row is read before any of its cells is
//! resolved, so a failure anywhere in the row yields a single error row.

use super::column::column_from_reference;
use super::date::serial_to_date;
use super::shared_strings::SharedStrings;
use super::styles::DateStyles;
use crate::error::{Error, Result};
use crate::model::{Cell, CellType, Row};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;
use std::sync::Arc;

/// The `t` attribute of a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CellKind {
    /// No `t` attribute, which means a number.
    #[default]
    Absent,
    /// `n`
    Number,
    /// `s`, an index into the shared string table
    SharedString,
    /// `inlineStr`, text carried in `<is>`
    InlineString,
    /// `b`
    Boolean,
    /// `d`, an ISO 8601 date stored as text
    Date,
    /// `str`, the cached result of a string formula
    FormulaString,
    /// `e`
    Error,
    /// Anything else
    Other(String),
}

impl CellKind {
    /// Classify a `t` attribute value.
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            None | Some("") => CellKind::Absent,
            Some("n") => CellKind::Number,
            Some("s") => CellKind::SharedString,
            Some("inlineStr") => CellKind::InlineString,
            Some("b") => CellKind::Boolean,
            Some("d") => CellKind::Date,
            Some("str") => CellKind::FormulaString,
            Some("e") => CellKind::Error,
            Some(other) => CellKind::Other(other.to_string()),
        }
    }
}

/// A `<c>` element as it appears in the sheet, before resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCell {
    /// Cell reference, e.g. `B7`
    pub reference: String,
    /// Type discriminator
    pub kind: CellKind,
    /// Text of `<v>`, if present
    pub value: Option<String>,
    /// Text of `<is>`, if present
    pub inline_string: Option<String>,
    /// Positional style index; `0` when the cell has no `s` attribute
    pub style: usize,
}

/// Lookup tables shared read-only by every row decoder of a workbook.
#[derive(Debug, Clone, Default)]
pub struct SheetTables {
    shared_strings: SharedStrings,
    date_styles: DateStyles,
}

impl SheetTables {
    pub fn new(shared_strings: SharedStrings, date_styles: DateStyles) -> Self {
        Self {
            shared_strings,
            date_styles,
        }
    }

    pub fn shared_strings(&self) -> &SharedStrings {
        &self.shared_strings
    }

    pub fn date_styles(&self) -> &DateStyles {
        &self.date_styles
    }

    fn is_date_style(&self, raw: &RawCell) -> bool {
        self.date_styles.contains(raw.style)
    }

    /// Textual value of a raw cell.
    ///
    /// Shared strings are looked up, and numbers under a date style are
    /// converted with [`serial_to_date`]. Everything else, booleans
    /// included, is returned as written.
    pub fn cell_value(&self, raw: &RawCell) -> Result<String> {
        if raw.kind == CellKind::InlineString {
            return raw
                .inline_string
                .clone()
                .ok_or_else(|| Error::MissingInlineString {
                    reference: raw.reference.clone(),
                });
        }

        let value = raw
            .value
            .as_deref()
            .ok_or_else(|| Error::MissingCellValue {
                reference: raw.reference.clone(),
            })?;

        match raw.kind {
            CellKind::SharedString => {
                let index = value
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidSharedStringIndex(value.to_string()))?;
                Ok(self.shared_strings.resolve(index)?.to_string())
            }
            CellKind::Date => Ok(value.to_string()),
            _ if self.is_date_style(raw) => serial_to_date(value),
            _ => Ok(value.to_string()),
        }
    }

    /// Semantic type of a raw cell. A date style wins over every
    /// discriminator except an explicit date.
    pub fn cell_type(&self, raw: &RawCell) -> CellType {
        match (&raw.kind, self.is_date_style(raw)) {
            (kind, true) if *kind != CellKind::Date => CellType::DateTime,
            (CellKind::Boolean, _) => CellType::Boolean,
            (CellKind::Date, _) => CellType::DateTime,
            (CellKind::Number | CellKind::Absent, _) => CellType::Numerical,
            (CellKind::SharedString | CellKind::InlineString, _) => CellType::String,
            _ => CellType::String,
        }
    }

    /// Resolve a raw cell into a public cell on row `row`.
    ///
    /// Returns `Ok(None)` for empty cells, those with neither a value nor
    /// an inline string.
    pub fn resolve_cell(&self, raw: &RawCell, row: u32) -> Result<Option<Cell>> {
        if raw.value.is_none() && raw.inline_string.is_none() {
            return Ok(None);
        }

        let value = self.cell_value(raw)?;
        Ok(Some(Cell::new(
            column_from_reference(&raw.reference),
            row,
            value,
            self.cell_type(raw),
        )))
    }

    /// Resolve every cell of a row, stopping at the first failure.
    pub fn resolve_cells(&self, raw_cells: &[RawCell], row: u32) -> Result<Vec<Cell>> {
        let mut cells = Vec::with_capacity(raw_cells.len());
        for raw in raw_cells {
            if let Some(cell) = self.resolve_cell(raw, row)? {
                cells.push(cell);
            }
        }
        Ok(cells)
    }
}

/// Which text node the decoder is currently collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    None,
    Value,
    InlineText,
}

/// Streaming decoder over a worksheet member.
///
/// Yields rows in document order. Rows without cells are skipped. After an
/// error row the decoder is exhausted.
pub struct RowDecoder<B: BufRead> {
    reader: Reader<B>,
    buf: Vec<u8>,
    row_buf: Vec<u8>,
    tables: Arc<SheetTables>,
    last_index: u32,
    done: bool,
}

impl<B: BufRead> RowDecoder<B> {
    pub fn new(source: B, tables: Arc<SheetTables>) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(false);

        Self {
            reader,
            buf: Vec::new(),
            row_buf: Vec::new(),
            tables,
            last_index: 0,
            done: false,
        }
    }

    /// Index of the most recently started row, 0 before the first.
    pub fn last_index(&self) -> u32 {
        self.last_index
    }

    fn fail(&mut self, index: u32, error: Error) -> Row {
        self.done = true;
        Row::failed(index, error)
    }
}

impl<B: BufRead> Iterator for RowDecoder<B> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        while !self.done {
            self.buf.clear();
            let outcome = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"row" => {
                    match row_index(e, self.last_index) {
                        Ok(index) => {
                            self.last_index = index;
                            read_row(&mut self.reader, &mut self.row_buf, index)
                                .and_then(|raw| self.tables.resolve_cells(&raw, index))
                                .map(|cells| Row::new(index, cells))
                                .map_err(|err| (index, err))
                        }
                        Err(err) => Err((self.last_index, err)),
                    }
                }
                Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"row" => {
                    match row_index(e, self.last_index) {
                        Ok(index) => {
                            self.last_index = index;
                            Ok(Row::new(index, Vec::new()))
                        }
                        Err(err) => Err((self.last_index, err)),
                    }
                }
                Ok(Event::Eof) => {
                    self.done = true;
                    return None;
                }
                Err(e) => Err((self.last_index, Error::from(e))),
                _ => continue,
            };

            match outcome {
                Ok(row) if row.cells.is_empty() => continue,
                Ok(row) => return Some(row),
                Err((index, err)) => return Some(self.fail(index, err)),
            }
        }
        None
    }
}

/// Row number from the `r` attribute, or one past the previous row.
fn row_index(e: &BytesStart<'_>, previous: u32) -> Result<u32> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == b"r" {
            let value = attr.unescape_value()?;
            return value
                .trim()
                .parse()
                .map_err(|_| Error::InvalidData(format!("invalid row index {:?}", value)));
        }
    }
    Ok(previous.saturating_add(1))
}

/// Read attributes of a `<c>` element.
fn raw_cell(e: &BytesStart<'_>) -> Result<RawCell> {
    let mut cell = RawCell::default();
    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?;
        match attr.key.local_name().as_ref() {
            b"r" => cell.reference = value.into_owned(),
            b"t" => cell.kind = CellKind::from_attribute(Some(value.as_ref())),
            b"s" => {
                cell.style = value
                    .trim()
                    .parse()
                    .map_err(|_| Error::InvalidData(format!("invalid style index {:?}", value)))?;
            }
            _ => {}
        }
    }
    Ok(cell)
}

/// Collect the raw cells of a row whose start tag has just been read, up to
/// and including its end tag.
fn read_row<B: BufRead>(
    reader: &mut Reader<B>,
    buf: &mut Vec<u8>,
    index: u32,
) -> Result<Vec<RawCell>> {
    let mut cells = Vec::new();
    let mut current: Option<RawCell> = None;
    let mut capture = Capture::None;
    let mut in_inline = false;
    let mut in_phonetic = false;

    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"c" => current = Some(raw_cell(e)?),
                b"v" => {
                    if let Some(cell) = current.as_mut() {
                        cell.value.get_or_insert_with(String::new);
                        capture = Capture::Value;
                    }
                }
                b"is" => {
                    if let Some(cell) = current.as_mut() {
                        cell.inline_string.get_or_insert_with(String::new);
                        in_inline = true;
                    }
                }
                b"rPh" if in_inline => in_phonetic = true,
                b"t" if in_inline && !in_phonetic => capture = Capture::InlineText,
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"c" => cells.push(raw_cell(e)?),
                b"v" => {
                    if let Some(cell) = current.as_mut() {
                        cell.value.get_or_insert_with(String::new);
                    }
                }
                b"is" => {
                    if let Some(cell) = current.as_mut() {
                        cell.inline_string.get_or_insert_with(String::new);
                    }
                }
                _ => {}
            },
            Event::Text(ref e) if capture != Capture::None => {
                let text = e.unescape()?;
                push_text(current.as_mut(), capture, &text);
            }
            Event::CData(ref e) if capture != Capture::None => {
                let text = String::from_utf8_lossy(e);
                push_text(current.as_mut(), capture, &text);
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some(cell) = current.take() {
                        cells.push(cell);
                    }
                    capture = Capture::None;
                    in_inline = false;
                    in_phonetic = false;
                }
                b"v" | b"t" => capture = Capture::None,
                b"rPh" => in_phonetic = false,
                b"is" => in_inline = false,
                b"row" => return Ok(cells),
                _ => {}
            },
            Event::Eof => {
                return Err(Error::XmlParse(format!(
                    "unexpected end of document inside row {}",
                    index
                )))
            }
            _ => {}
        }
    }
}

fn push_text(cell: Option<&mut RawCell>, capture: Capture, text: &str) {
    let Some(cell) = cell else { return };
    let target = match capture {
        Capture::Value => cell.value.as_mut(),
        Capture::InlineText => cell.inline_string.as_mut(),
        Capture::None => None,
    };
    if let Some(target) = target {
        target.push_str(text);
    }
}
