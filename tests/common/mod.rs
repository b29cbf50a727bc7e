//! Shared fixtures for integration tests.
//!
//! Workbooks are assembled in memory with `zip::ZipWriter`, one member at a
//! time, so each test can describe exactly the package shape it needs.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub const WORKSHEET_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub const SHARED_STRINGS_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

pub const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
</Types>"#;

/// Style 1 is the built-in date format 14; styles 0 and 2 are not dates.
pub const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
    <xf numFmtId="4" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
  </cellXfs>
</styleSheet>"#;

/// A sheet declared in a fixture workbook.
pub struct Sheet<'a> {
    pub name: &'a str,
    pub sheet_id: u32,
    pub target: &'a str,
    pub rows: String,
}

impl<'a> Sheet<'a> {
    pub fn new(name: &'a str, sheet_id: u32, rows: impl Into<String>) -> Self {
        Self {
            name,
            sheet_id,
            target: "",
            rows: rows.into(),
        }
    }

    /// Override the relationship target (defaults to
    /// `worksheets/sheet{sheet_id}.xml`).
    pub fn target(mut self, target: &'a str) -> Self {
        self.target = target;
        self
    }

    fn relationship_target(&self) -> String {
        if self.target.is_empty() {
            format!("worksheets/sheet{}.xml", self.sheet_id)
        } else {
            self.target.to_string()
        }
    }

    fn member(&self) -> String {
        let target = self.relationship_target();
        match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("xl/{}", target),
        }
    }
}

/// Builds a ZIP package member by member.
#[derive(Default)]
pub struct Package {
    files: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.files.retain(|(existing, _)| existing != name);
        self.files.push((name.to_string(), content.as_ref().to_vec()));
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.files.retain(|(existing, _)| existing != name);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, content) in &self.files {
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}

/// A complete workbook package: content types, workbook, relationships,
/// styles, shared strings and one member per sheet.
pub fn workbook(sheets: &[Sheet<'_>], shared_strings: &[&str]) -> Package {
    let mut declared = String::new();
    let mut rels = String::new();
    for (n, sheet) in sheets.iter().enumerate() {
        declared.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            sheet.name,
            sheet.sheet_id,
            n + 1
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}" Target="{}"/>"#,
            n + 1,
            WORKSHEET_REL,
            sheet.relationship_target()
        ));
    }
    rels.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="{}" Target="sharedStrings.xml"/>"#,
        sheets.len() + 1,
        SHARED_STRINGS_REL
    ));

    let mut package = Package::new()
        .file("[Content_Types].xml", CONTENT_TYPES)
        .file(
            "xl/workbook.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{MAIN_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{declared}</sheets></workbook>"#
            ),
        )
        .file(
            "xl/_rels/workbook.xml.rels",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
            ),
        )
        .file("xl/styles.xml", STYLES)
        .file("xl/sharedStrings.xml", shared_strings_xml(shared_strings));

    for sheet in sheets {
        package = package.file(&sheet.member(), sheet_xml(&sheet.rows));
    }
    package
}

pub fn sheet_xml(rows: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{MAIN_NS}"><sheetData>{rows}</sheetData></worksheet>"#
    )
}

pub fn shared_strings_xml(strings: &[&str]) -> String {
    let items: String = strings
        .iter()
        .map(|s| format!("<si><t>{}</t></si>", s))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="{MAIN_NS}" count="{n}" uniqueCount="{n}">{items}</sst>"#,
        n = strings.len()
    )
}

/// `count` rows, each with a single numeric cell in column A.
pub fn numbered_rows(count: u32) -> String {
    (1..=count)
        .map(|i| format!(r#"<row r="{i}"><c r="A{i}"><v>{i}</v></c></row>"#))
        .collect()
}
