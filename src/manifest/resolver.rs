//! Locating a package's data manifest and its companion archive.

use super::archive::PackageArchive;
use super::document::PackageDataManifest;
use super::hash::ContentHasher;
use crate::core::{ParcelError, ParcelResult};
use crate::di::{ReadSeek, ResourceLoader};
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::debug;

/// The namespace a package's resources are published under
///
/// A namespace `N` maps to the resources `N.package.xml` and `N.package.zip`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanIdentity {
    namespace: String,
}

impl PlanIdentity {
    pub fn new(namespace: impl Into<String>) -> ParcelResult<Self> {
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(ParcelError::Config(
                "Package namespace must not be empty".to_string(),
            ));
        }
        if namespace
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace())
            || namespace.starts_with('.')
            || namespace.ends_with('.')
            || namespace.contains("..")
        {
            return Err(ParcelError::Config(format!(
                "Invalid package namespace: '{}'",
                namespace
            )));
        }
        Ok(Self { namespace })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn manifest_resource(&self) -> String {
        format!("{}.package.xml", self.namespace)
    }

    pub fn archive_resource(&self) -> String {
        format!("{}.package.zip", self.namespace)
    }
}

impl fmt::Display for PlanIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.namespace)
    }
}

/// A manifest plus the archive holding its media, when there is one
#[derive(Debug)]
pub struct ResolvedManifest {
    pub manifest: PackageDataManifest,
    pub archive: Option<PackageArchive>,
}

pub struct ManifestResolver {
    loader: Arc<dyn ResourceLoader>,
}

impl ManifestResolver {
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self { loader }
    }

    /// Resolve the manifest published under `identity`
    ///
    /// A standalone `N.package.xml` always wins over the `package.xml` inside
    /// `N.package.zip`; the archive is still returned for its media. Returns
    /// `Ok(None)` only when neither source yields a manifest.
    pub fn try_resolve(&self, identity: &PlanIdentity) -> ParcelResult<Option<ResolvedManifest>> {
        let standalone = match self.loader.open(&identity.manifest_resource())? {
            Some(mut stream) => {
                let mut text = String::new();
                stream.read_to_string(&mut text)?;
                Some(text)
            }
            None => None,
        };

        let mut archive = match self.loader.open(&identity.archive_resource())? {
            Some(stream) => Some(PackageArchive::new(stream)?),
            None => None,
        };

        let text = match (standalone, archive.as_mut()) {
            (Some(text), _) => Some(text),
            (None, Some(archive)) => archive.read_manifest()?,
            (None, None) => None,
        };

        let Some(text) = text else {
            debug!(namespace = %identity, "No package manifest found");
            return Ok(None);
        };

        debug!(
            namespace = %identity,
            has_archive = archive.is_some(),
            "Resolved package manifest"
        );
        Ok(Some(ResolvedManifest {
            manifest: PackageDataManifest::parse(&text)?,
            archive,
        }))
    }

    /// Open an explicitly supplied archive along with its `package.xml`, if any
    pub fn open_archive(
        stream: Box<dyn ReadSeek>,
    ) -> ParcelResult<(PackageArchive, Option<PackageDataManifest>)> {
        let mut archive = PackageArchive::new(stream)?;
        let manifest = match archive.read_manifest()? {
            Some(text) => Some(PackageDataManifest::parse(&text)?),
            None => None,
        };
        Ok((archive, manifest))
    }

    /// Content hash of the published resources, `sha256:<hex>`
    ///
    /// Covers the standalone manifest bytes followed by the full archive
    /// stream; both are streamed into the hasher.
    pub fn content_hash(&self, identity: &PlanIdentity) -> ParcelResult<String> {
        let mut hasher = ContentHasher::new();
        let mut found = false;

        if let Some(mut stream) = self.loader.open(&identity.manifest_resource())? {
            hasher.update_reader(&mut stream)?;
            found = true;
        }
        if let Some(mut stream) = self.loader.open(&identity.archive_resource())? {
            hasher.update_reader(&mut stream)?;
            found = true;
        }

        if !found {
            return Err(ParcelError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Missing embedded resources for migration: {}", identity),
            )));
        }

        Ok(hasher.finish())
    }
}
