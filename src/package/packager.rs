//! Builds distributable package archives and unpacks them into a resources
//! directory.
//!
//! Layout of `<Namespace>.<version>.nupkg`:
//!
//! - `<Namespace>.nuspec`
//! - `[Content_Types].xml`, `_rels/.rels`
//! - `package/services/metadata/core-properties/<id>.psmdcp`
//! - `content/<Namespace>.package.xml`
//! - `content/<Namespace>.package.zip` (media payloads, when the manifest has any)
//! - `content/<Namespace>.plan.yaml`

use crate::core::path::{ensure_dir, media_entry_path, safe_join};
use crate::core::{ParcelError, ParcelResult, Version};
use crate::manifest::{PackageArchive, PackageDataManifest};
use crate::migration::automatic::{PackagePlanDescriptor, DESCRIPTOR_SUFFIX};
use crate::package::namespace::clean_namespace;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;
use zip::write::FileOptions;
use zip::ZipWriter;

const CONTENT_DIR: &str = "content/";
const DESCRIPTION: &str = "Auto generated package";
const NUSPEC_NS: &str = "http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CORE_PROPERTIES_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";

/// What to package, usually read from a YAML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDefinition {
    pub name: String,
    pub version: Version,
    /// Path of the data manifest
    pub package_xml: PathBuf,
    /// Directory holding the media files the manifest references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_dir: Option<PathBuf>,
}

impl PackageDefinition {
    /// Load a definition; relative paths are taken relative to the file
    pub fn load(path: &Path) -> ParcelResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut definition: Self = serde_yaml::from_str(&content).map_err(|e| {
            ParcelError::Config(format!(
                "Invalid package definition {}: {}",
                path.display(),
                e
            ))
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if definition.package_xml.is_relative() {
            definition.package_xml = base.join(&definition.package_xml);
        }
        if let Some(media_dir) = definition.media_dir.as_mut() {
            if media_dir.is_relative() {
                *media_dir = base.join(&*media_dir);
            }
        }
        Ok(definition)
    }
}

/// A built package, not yet written anywhere
#[derive(Debug, Clone)]
pub struct CompiledPackage {
    pub file_name: String,
    pub namespace: String,
    pub bytes: Vec<u8>,
}

impl CompiledPackage {
    pub fn write_to(&self, dir: &Path) -> ParcelResult<PathBuf> {
        ensure_dir(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

pub struct PackageRepackager {
    author: Option<String>,
    host_version: Version,
}

impl PackageRepackager {
    pub fn new(author: Option<String>, host_version: Version) -> Self {
        Self {
            author,
            host_version,
        }
    }

    pub fn create_package(&self, definition: &PackageDefinition) -> ParcelResult<CompiledPackage> {
        let namespace = clean_namespace(&definition.name)?;
        if namespace.is_empty() {
            return Err(ParcelError::Config(format!(
                "The package name is invalid: {}",
                definition.name
            )));
        }

        let author = self
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                ParcelError::Config("Could not determine the author while creating package".to_string())
            })?;

        let manifest_text = fs::read_to_string(&definition.package_xml)?;
        let manifest = PackageDataManifest::parse(&manifest_text)?;

        let media_archive = if manifest.declares_media_files() {
            Some(build_media_archive(&manifest, definition.media_dir.as_deref())?)
        } else {
            None
        };

        let descriptor = PackagePlanDescriptor {
            name: namespace.clone(),
            namespace: namespace.clone(),
            version: Some(definition.version.clone()),
        };

        let nuspec_name = format!("{}.nuspec", namespace);
        let metadata_path = format!(
            "package/services/metadata/core-properties/{}.psmdcp",
            Uuid::new_v4().simple()
        );

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();

        add_entry(
            &mut writer,
            &nuspec_name,
            &nuspec_xml(&namespace, &definition.version, author, &self.host_version)?,
            options,
        )?;
        add_entry(&mut writer, "[Content_Types].xml", &content_types_xml()?, options)?;
        add_entry(
            &mut writer,
            "_rels/.rels",
            &relationships_xml(&nuspec_name, &metadata_path)?,
            options,
        )?;
        add_entry(
            &mut writer,
            &metadata_path,
            &core_properties_xml(&namespace, &definition.version, author)?,
            options,
        )?;
        add_entry(
            &mut writer,
            &format!("{}{}.package.xml", CONTENT_DIR, namespace),
            manifest_text.as_bytes(),
            options,
        )?;
        if let Some(media) = &media_archive {
            add_entry(
                &mut writer,
                &format!("{}{}.package.zip", CONTENT_DIR, namespace),
                media,
                options,
            )?;
        }
        add_entry(
            &mut writer,
            &format!("{}{}{}", CONTENT_DIR, namespace, DESCRIPTOR_SUFFIX),
            descriptor.to_yaml()?.as_bytes(),
            options,
        )?;

        let bytes = writer.finish()?.into_inner();
        let file_name = format!("{}.{}.nupkg", namespace, definition.version);
        info!(package = %namespace, file = %file_name, size = bytes.len(), "Created package");

        Ok(CompiledPackage {
            file_name,
            namespace,
            bytes,
        })
    }
}

/// Unpack the `content/` entries of a package into `dir`
///
/// Returns the written files. Entries that would land outside `dir` are
/// rejected.
pub fn extract_resources(package: &Path, dir: &Path) -> ParcelResult<Vec<PathBuf>> {
    let mut archive = PackageArchive::open(package)?;
    ensure_dir(dir)?;

    let mut written = Vec::new();
    for name in archive.entry_names() {
        let Some(relative) = name.strip_prefix(CONTENT_DIR) else {
            continue;
        };
        if relative.is_empty() || relative.ends_with('/') {
            continue;
        }

        let target = safe_join(dir, relative)?;
        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }
        if let Some(mut entry) = archive.entry(&name)? {
            let mut out = File::create(&target)?;
            io::copy(&mut entry, &mut out)?;
        }
        debug!(entry = %name, path = %target.display(), "Extracted package resource");
        written.push(target);
    }

    Ok(written)
}

fn add_entry(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    bytes: &[u8],
    options: FileOptions,
) -> ParcelResult<()> {
    writer.start_file(name, options)?;
    writer.write_all(bytes)?;
    Ok(())
}

/// Zip of `media/<path>` entries for every media file the manifest declares
fn build_media_archive(manifest: &PackageDataManifest, media_dir: Option<&Path>) -> ParcelResult<Vec<u8>> {
    let paths: BTreeSet<String> = manifest.media_with_files().into_values().collect();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for path in paths {
        let entry_path = media_entry_path(&path);
        let source = match media_dir {
            Some(dir) => safe_join(dir, &path)?,
            None => return Err(ParcelError::MissingMediaFile { entry_path }),
        };
        if !source.is_file() {
            return Err(ParcelError::MissingMediaFile { entry_path });
        }

        writer.start_file(entry_path.as_str(), FileOptions::default())?;
        let mut file = File::open(&source)?;
        io::copy(&mut file, &mut writer)?;
    }

    Ok(writer.finish()?.into_inner())
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn xml_writer() -> ParcelResult<XmlWriter> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    Ok(writer)
}

fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> ParcelResult<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn nuspec_xml(
    namespace: &str,
    version: &Version,
    author: &str,
    host_version: &Version,
) -> ParcelResult<Vec<u8>> {
    let mut writer = xml_writer()?;
    writer.write_event(Event::Start(
        BytesStart::new("package").with_attributes([("xmlns", NUSPEC_NS)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("metadata")))?;
    text_element(&mut writer, "id", namespace)?;
    text_element(&mut writer, "version", &version.to_string())?;
    text_element(&mut writer, "authors", author)?;
    text_element(&mut writer, "description", DESCRIPTION)?;
    writer.write_event(Event::Start(BytesStart::new("dependencies")))?;
    let host = host_version.to_string();
    writer.write_event(Event::Empty(
        BytesStart::new("dependency").with_attributes([("id", "parcel"), ("version", host.as_str())]),
    ))?;
    writer.write_event(Event::End(BytesEnd::new("dependencies")))?;
    writer.write_event(Event::End(BytesEnd::new("metadata")))?;
    writer.write_event(Event::End(BytesEnd::new("package")))?;
    Ok(writer.into_inner().into_inner())
}

fn content_types_xml() -> ParcelResult<Vec<u8>> {
    let mut writer = xml_writer()?;
    writer.write_event(Event::Start(
        BytesStart::new("Types").with_attributes([("xmlns", CONTENT_TYPES_NS)]),
    ))?;
    for (extension, content_type) in [
        ("rels", "application/vnd.openxmlformats-package.relationships+xml"),
        ("psmdcp", "application/vnd.openxmlformats-package.core-properties+xml"),
        ("nuspec", "application/octet"),
        ("xml", "application/octet"),
        ("zip", "application/octet"),
        ("yaml", "application/octet"),
    ] {
        writer.write_event(Event::Empty(
            BytesStart::new("Default")
                .with_attributes([("Extension", extension), ("ContentType", content_type)]),
        ))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Types")))?;
    Ok(writer.into_inner().into_inner())
}

fn relationships_xml(nuspec_name: &str, metadata_path: &str) -> ParcelResult<Vec<u8>> {
    let nuspec_target = format!("/{}", nuspec_name);
    let metadata_target = format!("/{}", metadata_path);

    let mut writer = xml_writer()?;
    writer.write_event(Event::Start(
        BytesStart::new("Relationships").with_attributes([("xmlns", RELATIONSHIPS_NS)]),
    ))?;
    writer.write_event(Event::Empty(BytesStart::new("Relationship").with_attributes([
        ("Id", "R0"),
        ("Target", nuspec_target.as_str()),
        ("Type", "http://schemas.microsoft.com/packaging/2010/07/manifest"),
    ])))?;
    writer.write_event(Event::Empty(BytesStart::new("Relationship").with_attributes([
        ("Id", "R1"),
        ("Target", metadata_target.as_str()),
        (
            "Type",
            "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
        ),
    ])))?;
    writer.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(writer.into_inner().into_inner())
}

fn core_properties_xml(namespace: &str, version: &Version, author: &str) -> ParcelResult<Vec<u8>> {
    let mut writer = xml_writer()?;
    writer.write_event(Event::Start(BytesStart::new("coreProperties").with_attributes([
        ("xmlns", CORE_PROPERTIES_NS),
        ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
        ("xmlns:dcterms", "http://purl.org/dc/terms/"),
    ])))?;
    text_element(&mut writer, "dc:creator", author)?;
    text_element(&mut writer, "dc:description", DESCRIPTION)?;
    text_element(&mut writer, "dc:identifier", namespace)?;
    text_element(&mut writer, "version", &version.to_string())?;
    writer.write_event(Event::End(BytesEnd::new("coreProperties")))?;
    Ok(writer.into_inner().into_inner())
}
