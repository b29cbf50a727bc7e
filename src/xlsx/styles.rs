//! XLSX styles parsing for date detection.

use super::date::is_date_format_code;
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use std::collections::{BTreeSet, HashMap};

/// Built-in number formats 14 to 22 are the date and time formats.
const BUILTIN_DATE_FORMATS: std::ops::RangeInclusive<u32> = 14..=22;

/// Ids from here on refer to custom formats declared in `numFmts`.
const FIRST_CUSTOM_FORMAT: u32 = 164;

/// Styles information parsed from xl/styles.xml.
#[derive(Debug, Default)]
pub struct Styles {
    /// Custom number formats: numFmtId -> formatCode
    num_fmts: HashMap<u32, String>,
    /// Cell formats: style index -> numFmtId
    cell_xfs: Vec<u32>,
}

impl Styles {
    /// Parse styles from xl/styles.xml content.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut styles = Self::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut in_num_fmts = false;
        let mut in_cell_xfs = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"numFmts" => in_num_fmts = true,
                    b"cellXfs" => in_cell_xfs = true,
                    b"numFmt" if in_num_fmts => styles.add_num_fmt(e)?,
                    b"xf" if in_cell_xfs => styles.add_cell_xf(e)?,
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                    b"numFmt" if in_num_fmts => styles.add_num_fmt(e)?,
                    b"xf" if in_cell_xfs => styles.add_cell_xf(e)?,
                    _ => {}
                },
                Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                    b"numFmts" => in_num_fmts = false,
                    b"cellXfs" => in_cell_xfs = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(styles)
    }

    fn add_num_fmt(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let mut num_fmt_id: Option<u32> = None;
        let mut format_code = String::new();
        for attr in e.attributes() {
            let attr = attr?;
            match attr.key.local_name().as_ref() {
                b"numFmtId" => num_fmt_id = attr.unescape_value()?.trim().parse().ok(),
                b"formatCode" => format_code = attr.unescape_value()?.into_owned(),
                _ => {}
            }
        }
        if let Some(id) = num_fmt_id {
            self.num_fmts.insert(id, format_code);
        }
        Ok(())
    }

    fn add_cell_xf(&mut self, e: &BytesStart<'_>) -> Result<()> {
        // A missing or unreadable numFmtId means General (0).
        let mut num_fmt_id: u32 = 0;
        for attr in e.attributes() {
            let attr = attr?;
            if attr.key.local_name().as_ref() == b"numFmtId" {
                num_fmt_id = attr.unescape_value()?.trim().parse().unwrap_or(0);
            }
        }
        self.cell_xfs.push(num_fmt_id);
        Ok(())
    }

    /// Get the numFmtId for a cell style index.
    pub fn get_num_fmt_id(&self, style_index: usize) -> Option<u32> {
        self.cell_xfs.get(style_index).copied()
    }

    /// Get the format code of a custom number format.
    pub fn format_code(&self, num_fmt_id: u32) -> Option<&str> {
        self.num_fmts.get(&num_fmt_id).map(String::as_str)
    }

    /// Check if a numFmtId represents a date format.
    pub fn is_date_format(&self, num_fmt_id: u32) -> bool {
        if BUILTIN_DATE_FORMATS.contains(&num_fmt_id) {
            return true;
        }

        num_fmt_id >= FIRST_CUSTOM_FORMAT
            && self
                .format_code(num_fmt_id)
                .is_some_and(is_date_format_code)
    }

    /// Collect the positional style indices whose format is a date.
    pub fn date_styles(&self) -> DateStyles {
        self.cell_xfs
            .iter()
            .enumerate()
            .filter(|&(_, &id)| self.is_date_format(id))
            .map(|(index, _)| index)
            .collect()
    }
}

/// Set of cell style indices (positions in `cellXfs`) that format dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateStyles {
    indices: BTreeSet<usize>,
}

impl DateStyles {
    /// Whether cells with this style index hold dates.
    pub fn contains(&self, style_index: usize) -> bool {
        self.indices.contains(&style_index)
    }

    /// Number of date styles.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over the date style indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

impl FromIterator<usize> for DateStyles {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            indices: iter.into_iter().collect(),
        }
    }
}
