//! Workbook resolution: declared sheets, their members, and the lookup
//! tables needed to interpret cell values.

use super::shared_strings::SharedStrings;
use super::styles::{DateStyles, Styles};
use crate::container::{OoxmlContainer, Relationships};
use crate::error::{Error, Result};
use crate::options::ReaderOptions;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::io::{Read, Seek};

/// Workbook descriptor member.
pub const WORKBOOK_PATH: &str = "xl/workbook.xml";

/// Style table member.
pub const STYLES_PATH: &str = "xl/styles.xml";

/// Shared string member names, in lookup order.
pub const SHARED_STRINGS_PATHS: [&str; 2] = ["xl/sharedStrings.xml", "xl/SharedStrings.xml"];

const SHARED_STRINGS_REL_SUFFIX: &str = "/sharedStrings";

/// Sheet info from workbook.xml.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetInfo {
    name: String,
    sheet_id: String,
    rel_id: String,
}

/// Everything resolved from the package when a workbook is opened.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTables {
    /// Sheet names in declaration order
    pub sheets: Vec<String>,
    /// Sheet name -> member path holding its rows
    pub sheet_members: HashMap<String, String>,
    /// Shared string table
    pub shared_strings: SharedStrings,
    /// Style indices that format dates
    pub date_styles: DateStyles,
}

/// Resolve the workbook structure and lookup tables of a package.
pub fn resolve<R: Read + Seek + Clone>(
    container: &OoxmlContainer<R>,
    options: &ReaderOptions,
) -> Result<ResolvedTables> {
    let workbook_xml = container.read_xml(WORKBOOK_PATH)?;
    let declared = parse_workbook(&workbook_xml)?;

    let relationships = container.read_relationships(WORKBOOK_PATH)?;
    if relationships.is_none() {
        if !options.positional_fallback {
            return Err(Error::MissingComponent(
                OoxmlContainer::<R>::rels_path(WORKBOOK_PATH),
            ));
        }
        log::debug!("workbook has no relationship table, resolving sheets by sheetId");
    }

    let mut sheets = Vec::with_capacity(declared.len());
    let mut sheet_members = HashMap::with_capacity(declared.len());
    for sheet in &declared {
        let member = sheet_member(container, relationships.as_ref(), sheet, options)?;
        if sheet_members.insert(sheet.name.clone(), member).is_some() {
            return Err(Error::InvalidData(format!(
                "duplicate sheet name {:?} in workbook",
                sheet.name
            )));
        }
        sheets.push(sheet.name.clone());
    }

    let shared_strings = load_shared_strings(container, relationships.as_ref())?;
    let date_styles = load_date_styles(container)?;

    log::debug!(
        "resolved {} sheets, {} shared strings, {} date styles",
        sheets.len(),
        shared_strings.len(),
        date_styles.len()
    );

    Ok(ResolvedTables {
        sheets,
        sheet_members,
        shared_strings,
        date_styles,
    })
}

/// Parse workbook.xml for the declared sheets, in order.
pub(crate) fn parse_workbook(xml: &str) -> Result<Vec<SheetInfo>> {
    let mut sheets = Vec::new();
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"sheet" =>
            {
                let sheet = parse_sheet_element(e)?;
                if !sheet.name.is_empty() {
                    sheets.push(sheet);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

fn parse_sheet_element(e: &BytesStart<'_>) -> Result<SheetInfo> {
    let mut name = String::new();
    let mut sheet_id = String::new();
    let mut rel_id = String::new();

    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?;
        match (attr.key.prefix().is_some(), attr.key.local_name().as_ref()) {
            (false, b"name") => name = value.into_owned(),
            (false, b"sheetId") => sheet_id = value.into_owned(),
            // r:id, whatever the relationships namespace is bound to
            (true, b"id") => rel_id = value.into_owned(),
            _ => {}
        }
    }

    Ok(SheetInfo {
        name,
        sheet_id,
        rel_id,
    })
}

/// Find the member holding a sheet's rows.
fn sheet_member<R: Read + Seek + Clone>(
    container: &OoxmlContainer<R>,
    relationships: Option<&Relationships>,
    sheet: &SheetInfo,
    options: &ReaderOptions,
) -> Result<String> {
    let not_found = |member: &str| Error::SheetMemberNotFound {
        sheet: sheet.name.clone(),
        member: member.to_string(),
    };

    let member = match relationships {
        Some(rels) if !sheet.rel_id.is_empty() => {
            let rel = rels.get(&sheet.rel_id).ok_or_else(|| not_found(&sheet.rel_id))?;
            OoxmlContainer::<R>::resolve_path(WORKBOOK_PATH, &rel.target)
        }
        _ if options.positional_fallback && !sheet.sheet_id.is_empty() => {
            format!("xl/worksheets/sheet{}.xml", sheet.sheet_id)
        }
        _ => return Err(not_found(&sheet.rel_id)),
    };

    if !container.exists(&member) {
        return Err(not_found(&member));
    }
    Ok(member)
}

/// Load the shared string table. A package without one has no string
/// cells, so absence yields an empty table.
fn load_shared_strings<R: Read + Seek + Clone>(
    container: &OoxmlContainer<R>,
    relationships: Option<&Relationships>,
) -> Result<SharedStrings> {
    let declared = relationships
        .and_then(|rels| rels.find_by_type_suffix(SHARED_STRINGS_REL_SUFFIX))
        .map(|rel| OoxmlContainer::<R>::resolve_path(WORKBOOK_PATH, &rel.target))
        .filter(|path| container.exists(path));

    let path = declared.or_else(|| {
        SHARED_STRINGS_PATHS
            .iter()
            .find(|path| container.exists(path))
            .map(|path| path.to_string())
    });

    match path {
        Some(path) => SharedStrings::parse(&container.read_xml(&path)?),
        None => {
            log::debug!("no shared strings member, using an empty table");
            Ok(SharedStrings::default())
        }
    }
}

/// Load the style table and collect its date styles.
fn load_date_styles<R: Read + Seek + Clone>(container: &OoxmlContainer<R>) -> Result<DateStyles> {
    let xml = container.read_xml(STYLES_PATH)?;
    Ok(Styles::parse(&xml)?.date_styles())
}
