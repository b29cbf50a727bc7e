//! In-memory package fixtures for unit tests.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WORKSHEET_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

/// Style table whose positions 1 (built-in 14) and 3 (custom 164) are
/// dates. Position 2 is the built-in `0.00`.
pub(crate) const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd"/></numFmts>
  <cellXfs count="4">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
    <xf numFmtId="2" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
    <xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
  </cellXfs>
</styleSheet>"#;

/// Builds a ZIP package in memory, member by member.
#[derive(Debug, Default)]
pub(crate) struct PackageBuilder {
    files: Vec<(String, Vec<u8>)>,
}

impl PackageBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A workbook with one empty worksheet member per sheet name, wired
    /// through the relationship table, plus [`STYLES_XML`].
    pub(crate) fn workbook(names: &[&str]) -> Self {
        let ids: Vec<String> = (1..=names.len()).map(|n| n.to_string()).collect();
        let rel_ids: Vec<String> = ids.iter().map(|id| format!("rId{id}")).collect();
        let targets: Vec<String> = ids
            .iter()
            .map(|id| format!("worksheets/sheet{id}.xml"))
            .collect();

        let declared: Vec<(&str, &str, &str)> = names
            .iter()
            .zip(&ids)
            .zip(&rel_ids)
            .map(|((name, id), rel_id)| (*name, id.as_str(), rel_id.as_str()))
            .collect();
        let rels: Vec<(&str, &str)> = rel_ids
            .iter()
            .zip(&targets)
            .map(|(rel_id, target)| (rel_id.as_str(), target.as_str()))
            .collect();

        let mut builder = Self::new()
            .file("xl/workbook.xml", workbook_xml(&declared))
            .file("xl/_rels/workbook.xml.rels", rels_xml(&rels))
            .file("xl/styles.xml", STYLES_XML);
        for target in &targets {
            builder = builder.file(&format!("xl/{target}"), sheet_xml(""));
        }
        builder
    }

    /// Add or replace a member.
    pub(crate) fn file(mut self, name: &str, content: impl AsRef<[u8]>) -> Self {
        let content = content.as_ref().to_vec();
        match self.files.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = content,
            None => self.files.push((name.to_string(), content)),
        }
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in &self.files {
            writer.start_file(name.as_str(), options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

/// workbook.xml declaring `(name, sheetId, r:id)` triples.
pub(crate) fn workbook_xml(sheets: &[(&str, &str, &str)]) -> String {
    let sheets: String = sheets
        .iter()
        .map(|(name, id, rel_id)| {
            format!(r#"<sheet name="{name}" sheetId="{id}" r:id="{rel_id}"/>"#)
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets>{sheets}</sheets></workbook>"#
    )
}

/// Workbook relationships mapping `(Id, Target)` pairs to worksheets.
pub(crate) fn rels_xml(rels: &[(&str, &str)]) -> String {
    let entries: String = rels
        .iter()
        .map(|(id, target)| {
            format!(r#"<Relationship Id="{id}" Type="{WORKSHEET_REL}" Target="{target}"/>"#)
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{entries}</Relationships>"#
    )
}

/// A worksheet whose `sheetData` holds the given row markup.
pub(crate) fn sheet_xml(rows: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{MAIN_NS}"><sheetData>{rows}</sheetData></worksheet>"#
    )
}

/// A shared string table with one plain `<si>` per entry.
pub(crate) fn shared_strings_xml(strings: &[&str]) -> String {
    let items: String = strings
        .iter()
        .map(|s| format!("<si><t>{s}</t></si>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="{MAIN_NS}" count="{n}" uniqueCount="{n}">{items}</sst>"#,
        n = strings.len()
    )
}
