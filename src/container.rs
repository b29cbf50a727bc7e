//! ZIP container abstraction for OOXML spreadsheet packages.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use std::sync::Arc;
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

/// In-memory package bytes that can be cheaply cloned for each reader.
pub type SharedBytes = Cursor<Arc<[u8]>>;

/// One `<Relationship>` from a `.rels` member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    /// Full type URI, transitional or strict namespace.
    pub rel_type: String,
    /// Target as written, relative to the declaring part unless it starts
    /// with `/`.
    pub target: String,
    /// `TargetMode="External"`: the target is a URI, not a package member.
    pub external: bool,
}

/// Relationships of one part, in document order.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    /// Relationship with the given id. The first declaration wins when an
    /// id is repeated.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|rel| rel.id == id)
    }

    /// First internal relationship whose type URI ends with `suffix`.
    ///
    /// Transitional and strict packages use different namespace prefixes for
    /// the same relationship kinds, so matching on the final path segment
    /// covers both.
    pub fn find_by_type_suffix(&self, suffix: &str) -> Option<&Relationship> {
        self.entries
            .iter()
            .find(|rel| !rel.external && rel.rel_type.ends_with(suffix))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// After a UTF-16 member is decoded into a `String`, its declaration still
/// claims UTF-16. Rewrite that claim so quick-xml reads the text as it is.
fn declare_utf8(content: String) -> String {
    let Some(decl_end) = content
        .strip_prefix("<?xml")
        .and_then(|rest| rest.find("?>"))
        .map(|pos| pos + "<?xml".len())
    else {
        return content;
    };

    let lowered = content[..decl_end].to_ascii_lowercase();
    let Some(after_key) = lowered
        .find("encoding=")
        .map(|pos| pos + "encoding=".len())
    else {
        return content;
    };
    let is_utf16 = lowered
        .get(after_key..)
        .and_then(|rest| rest.strip_prefix(|c| c == '"' || c == '\''))
        .is_some_and(|value| value.starts_with("utf-16"));
    if !is_utf16 {
        return content;
    }

    let value_start = after_key + 1;
    let value_end = value_start + "utf-16".len();
    if let (Some(head), Some(tail)) = (content.get(..value_start), content.get(value_end..)) {
        return format!("{head}UTF-8{tail}");
    }
    content
}

/// Decode a member's bytes into text.
///
/// Package members are almost always UTF-8, but some producers write the
/// auxiliary tables as UTF-16, with or without a byte order mark.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec()).map_err(invalid_text),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes).map(declare_utf8),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes).map(declare_utf8),
        _ => match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.to_owned()),
            // ASCII markup in UTF-16 leaves every other byte zero.
            Err(_) => match bytes {
                [_, 0, _, 0, ..] => decode_utf16(bytes, u16::from_le_bytes).map(declare_utf8),
                [0, _, 0, _, ..] => decode_utf16(bytes, u16::from_be_bytes).map(declare_utf8),
                _ => Ok(String::from_utf8_lossy(bytes).into_owned()),
            },
        },
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    char::decode_utf16(bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]])))
        .collect::<std::result::Result<String, _>>()
        .map_err(invalid_text)
}

fn invalid_text<E>(err: E) -> Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
}

/// OOXML container abstraction over a ZIP archive.
///
/// The archive reader must be `Clone`: every member read works on its own
/// clone of the archive, so background sheet readers never share a cursor
/// with each other or with the owning workbook.
pub struct OoxmlContainer<R = SharedBytes> {
    archive: ZipArchive<R>,
}

impl OoxmlContainer<SharedBytes> {
    /// Open an OOXML container from a file path.
    ///
    /// The whole compressed file is loaded into shared memory; members are
    /// decompressed only when read.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use unxlsx::container::OoxmlContainer;
    ///
    /// let container = OoxmlContainer::open("data.xlsx")?;
    /// # Ok::<(), unxlsx::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Create an OOXML container from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let shared: Arc<[u8]> = Arc::from(data);
        let archive = ZipArchive::new(Cursor::new(shared))?;
        Ok(Self { archive })
    }

    /// Create an OOXML container from any reader.
    pub fn from_reader<Rd: Read>(mut reader: Rd) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }
}

impl<R: Read + Seek + Clone> OoxmlContainer<R> {
    /// Wrap an already-open archive.
    pub fn from_archive(archive: ZipArchive<R>) -> Self {
        Self { archive }
    }

    /// An independent handle on the archive, positioned separately from
    /// every other handle.
    pub fn archive(&self) -> ZipArchive<R> {
        self.archive.clone()
    }

    /// Read an XML file from the archive as a string.
    ///
    /// Handles UTF-8 (with or without BOM) and UTF-16 (LE/BE).
    pub fn read_xml(&self, path: &str) -> Result<String> {
        let bytes = self.read_binary(path)?;
        decode_xml_bytes(&bytes)
    }

    /// Read a binary file from the archive.
    pub fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.clone();
        let mut file = match archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(Error::MissingComponent(path.to_string())),
            Err(e) => return Err(e.into()),
        };
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read an XML file if it exists.
    pub fn read_xml_opt(&self, path: &str) -> Result<Option<String>> {
        match self.read_xml(path) {
            Ok(xml) => Ok(Some(xml)),
            Err(Error::MissingComponent(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Member names in archive order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.archive.file_names()
    }

    /// Whether the archive has a member with exactly this name.
    pub fn exists(&self, path: &str) -> bool {
        self.member_names().any(|name| name == path)
    }

    /// Read the relationships of a part, e.g. `xl/workbook.xml` reads
    /// `xl/_rels/workbook.xml.rels`.
    ///
    /// Returns `Ok(None)` when the part has no relationships file.
    pub fn read_relationships(&self, part_path: &str) -> Result<Option<Relationships>> {
        let rels_path = Self::rels_path(part_path);
        match self.read_xml_opt(&rels_path)? {
            Some(xml) => parse_relationships(&xml).map(Some),
            None => Ok(None),
        }
    }

    /// Path of the relationships file belonging to a part.
    pub fn rels_path(part_path: &str) -> String {
        if part_path.is_empty() || part_path == "/" {
            return "_rels/.rels".to_string();
        }
        match part_path.rsplit_once('/') {
            Some((parent, filename)) => format!("{}/_rels/{}.rels", parent, filename),
            None => format!("_rels/{}.rels", part_path),
        }
    }

    /// Resolve a relationship target relative to the part that declares it.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let mut parts: Vec<&str> = match base.rsplit_once('/') {
            Some((dir, _)) => dir.split('/').filter(|p| !p.is_empty()).collect(),
            None => Vec::new(),
        };
        for component in relative.split(['/', '\\']) {
            match component {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                c => parts.push(c),
            }
        }

        parts.join("/")
    }
}

/// Parse the contents of a relationships file. Entries without an `Id`
/// are skipped.
pub fn parse_relationships(content: &str) -> Result<Relationships> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut buf = Vec::new();
    loop {
        let element = match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => e,
            Event::Eof => break,
            _ => {
                buf.clear();
                continue;
            }
        };
        if element.local_name().as_ref() == b"Relationship" {
            let mut rel = Relationship {
                id: String::new(),
                rel_type: String::new(),
                target: String::new(),
                external: false,
            };
            for attr in element.attributes() {
                let attr = attr?;
                let value = attr.unescape_value()?;
                match attr.key.local_name().as_ref() {
                    b"Id" => rel.id = value.into_owned(),
                    b"Type" => rel.rel_type = value.into_owned(),
                    b"Target" => rel.target = value.into_owned(),
                    b"TargetMode" => rel.external = value.eq_ignore_ascii_case("external"),
                    _ => {}
                }
            }
            if !rel.id.is_empty() {
                entries.push(rel);
            }
        }
        buf.clear();
    }

    Ok(Relationships { entries })
}

impl<R: Read + Seek> std::fmt::Debug for OoxmlContainer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OoxmlContainer")
            .field("files", &self.archive.len())
            .finish()
    }
}
