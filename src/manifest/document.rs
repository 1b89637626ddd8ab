//! Package data manifests (`package.xml`)
//!
//! ```xml
//! <umbPackage>
//!   <info><package><name>Acme</name><version>1.0.0</version></package></info>
//!   <DocumentTypes><DocumentType alias="home" name="Home" /></DocumentTypes>
//!   <Documents><DocumentSet>
//!     <home id="1" key="..." nodeName="Welcome"><title>Hi</title></home>
//!   </DocumentSet></Documents>
//!   <MediaItems><MediaSet>
//!     <Image id="2" key="..." nodeName="Logo" mediaFilePath="/img/logo.png" />
//!   </MediaSet></MediaItems>
//! </umbPackage>
//! ```

use crate::core::{ParcelError, ParcelResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Read;
use uuid::Uuid;

pub const ROOT_ELEMENT: &str = "umbPackage";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTypeEntry {
    pub key: Option<Uuid>,
    pub alias: String,
    pub name: String,
}

/// A document or media item declared by the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    pub key: Uuid,
    pub name: String,
    pub type_alias: String,
    pub parent_key: Option<Uuid>,
    pub sort_order: i64,
    pub properties: BTreeMap<String, String>,
    /// Relative path of the media payload inside the package archive
    pub media_file_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Documents,
    Media,
}

enum Frame {
    Other,
    InfoField(InfoField, String),
    Entry { section: Section, index: usize },
    Property { section: Section, owner: usize, name: String, value: String },
}

#[derive(Clone, Copy)]
enum InfoField {
    Name,
    Version,
}

/// A parsed manifest; the original text is kept for hashing and repackaging
#[derive(Debug, Clone)]
pub struct PackageDataManifest {
    source: String,
    pub info: PackageInfo,
    pub document_types: Vec<DocumentTypeEntry>,
    pub documents: Vec<ContentEntry>,
    pub media: Vec<ContentEntry>,
}

impl PackageDataManifest {
    pub fn parse(source: &str) -> ParcelResult<Self> {
        let mut manifest = Self {
            source: source.to_string(),
            info: PackageInfo::default(),
            document_types: Vec::new(),
            documents: Vec::new(),
            media: Vec::new(),
        };

        let mut reader = Reader::from_str(source);
        reader.trim_text(true);
        let decoder = reader.decoder();

        let mut path: Vec<String> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();
        let mut seen_root = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let frame = manifest.open_element(&e, &path, &frames, &mut seen_root)?;
                    path.push(decoder.decode(e.local_name().as_ref())?.into_owned());
                    frames.push(frame);
                }
                Event::Empty(e) => {
                    let frame = manifest.open_element(&e, &path, &frames, &mut seen_root)?;
                    manifest.close_frame(frame);
                }
                Event::End(_) => {
                    path.pop();
                    if let Some(frame) = frames.pop() {
                        manifest.close_frame(frame);
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape()?;
                    append_text(&mut frames, &text);
                }
                Event::CData(c) => {
                    let bytes = c.into_inner();
                    let text = decoder.decode(&bytes)?;
                    append_text(&mut frames, &text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_root {
            return Err(ParcelError::Manifest(format!(
                "Manifest has no <{}> root element",
                ROOT_ELEMENT
            )));
        }

        manifest.check_unique_keys()?;
        Ok(manifest)
    }

    pub fn from_reader(reader: &mut dyn Read) -> ParcelResult<Self> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        Self::parse(&source)
    }

    /// The manifest text exactly as it was read
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Media keys mapped to the archive-relative path of their payload
    pub fn media_with_files(&self) -> HashMap<Uuid, String> {
        self.media
            .iter()
            .filter_map(|m| m.media_file_path.as_ref().map(|p| (m.key, p.clone())))
            .collect()
    }

    pub fn declares_media_files(&self) -> bool {
        self.media.iter().any(|m| m.media_file_path.is_some())
    }

    fn open_element(
        &mut self,
        e: &BytesStart<'_>,
        path: &[String],
        frames: &[Frame],
        seen_root: &mut bool,
    ) -> ParcelResult<Frame> {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

        if path.is_empty() {
            if name != ROOT_ELEMENT || *seen_root {
                return Err(ParcelError::Manifest(format!(
                    "Expected <{}> root element, found <{}>",
                    ROOT_ELEMENT, name
                )));
            }
            *seen_root = true;
            return Ok(Frame::Other);
        }

        let segments: Vec<&str> = path.iter().map(String::as_str).collect();
        match segments.as_slice() {
            [_, "info", "package"] => {
                return Ok(match name.as_str() {
                    "name" => Frame::InfoField(InfoField::Name, String::new()),
                    "version" => Frame::InfoField(InfoField::Version, String::new()),
                    _ => Frame::Other,
                })
            }
            [_, "DocumentTypes"] if name == "DocumentType" => {
                let attrs = read_attributes(e)?;
                self.document_types.push(parse_document_type(&attrs)?);
                return Ok(Frame::Other);
            }
            _ => {}
        }

        let section = match segments.as_slice() {
            [_, "Documents", "DocumentSet", ..] => Section::Documents,
            [_, "MediaItems", "MediaSet", ..] => Section::Media,
            _ => return Ok(Frame::Other),
        };

        let attrs = read_attributes(e)?;
        let parent = frames.iter().rev().find_map(|f| match f {
            Frame::Entry { section: s, index } if *s == section => Some(*index),
            _ => None,
        });

        if attrs.contains_key("id") {
            let parent_key = parent.map(|i| self.entries(section)[i].key);
            let entry = parse_entry(&name, &attrs, parent_key, section)?;
            let entries = self.entries_mut(section);
            entries.push(entry);
            return Ok(Frame::Entry {
                section,
                index: entries.len() - 1,
            });
        }

        match frames.last() {
            Some(Frame::Entry { index, .. }) => Ok(Frame::Property {
                section,
                owner: *index,
                name,
                value: String::new(),
            }),
            _ => Ok(Frame::Other),
        }
    }

    fn close_frame(&mut self, frame: Frame) {
        match frame {
            Frame::InfoField(field, value) => {
                let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                match field {
                    InfoField::Name => self.info.name = value,
                    InfoField::Version => self.info.version = value,
                }
            }
            Frame::Property {
                section,
                owner,
                name,
                value,
            } => {
                let value = value.trim();
                if !value.is_empty() {
                    self.entries_mut(section)[owner]
                        .properties
                        .insert(name, value.to_string());
                }
            }
            Frame::Entry { .. } | Frame::Other => {}
        }
    }

    fn entries(&self, section: Section) -> &[ContentEntry] {
        match section {
            Section::Documents => &self.documents,
            Section::Media => &self.media,
        }
    }

    fn entries_mut(&mut self, section: Section) -> &mut Vec<ContentEntry> {
        match section {
            Section::Documents => &mut self.documents,
            Section::Media => &mut self.media,
        }
    }

    fn check_unique_keys(&self) -> ParcelResult<()> {
        let mut seen = HashSet::new();
        for entry in self.documents.iter().chain(self.media.iter()) {
            if !seen.insert(entry.key) {
                return Err(ParcelError::Manifest(format!(
                    "Duplicate content key {} in manifest",
                    entry.key
                )));
            }
        }
        Ok(())
    }
}

fn append_text(frames: &mut [Frame], text: &str) {
    match frames.last_mut() {
        Some(Frame::Property { value, .. }) | Some(Frame::InfoField(_, value)) => {
            value.push_str(text)
        }
        _ => {}
    }
}

fn read_attributes(e: &BytesStart<'_>) -> ParcelResult<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn parse_key(value: &str, element: &str) -> ParcelResult<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|e| {
        ParcelError::Manifest(format!("Invalid key '{}' on <{}>: {}", value, element, e))
    })
}

fn parse_document_type(attrs: &HashMap<String, String>) -> ParcelResult<DocumentTypeEntry> {
    let alias = attrs
        .get("alias")
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| ParcelError::Manifest("DocumentType is missing an alias".to_string()))?
        .trim()
        .to_string();
    let key = match attrs.get("key") {
        Some(value) => Some(parse_key(value, "DocumentType")?),
        None => None,
    };
    Ok(DocumentTypeEntry {
        key,
        name: attrs.get("name").cloned().unwrap_or_else(|| alias.clone()),
        alias,
    })
}

fn parse_entry(
    element: &str,
    attrs: &HashMap<String, String>,
    parent_key: Option<Uuid>,
    section: Section,
) -> ParcelResult<ContentEntry> {
    let key = attrs
        .get("key")
        .ok_or_else(|| ParcelError::Manifest(format!("<{}> entry is missing a key", element)))
        .and_then(|k| parse_key(k, element))?;

    let sort_order = match attrs.get("sortOrder").map(|s| s.trim()) {
        Some(s) if !s.is_empty() => s.parse().map_err(|_| {
            ParcelError::Manifest(format!("Invalid sortOrder '{}' on <{}>", s, element))
        })?,
        _ => 0,
    };

    let media_file_path = match section {
        Section::Media => attrs
            .get("mediaFilePath")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
        Section::Documents => None,
    };

    Ok(ContentEntry {
        key,
        name: attrs
            .get("nodeName")
            .cloned()
            .unwrap_or_else(|| element.to_string()),
        type_alias: attrs
            .get("nodeTypeAlias")
            .cloned()
            .unwrap_or_else(|| element.to_string()),
        parent_key,
        sort_order,
        properties: BTreeMap::new(),
        media_file_path,
    })
}
