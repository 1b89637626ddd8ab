use crate::core::{ParcelError, ParcelResult};
use crate::di::ReadSeek;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

/// Name of the manifest entry inside a package archive
pub const MANIFEST_ENTRY: &str = "package.xml";

/// A read-only package archive (ZIP) addressed by entry name
///
/// Owned by whoever opened it; the underlying stream is released when the
/// archive is dropped.
pub struct PackageArchive {
    archive: ZipArchive<Box<dyn ReadSeek>>,
}

impl PackageArchive {
    /// Open an archive over an arbitrary seekable stream
    pub fn new(stream: Box<dyn ReadSeek>) -> ParcelResult<Self> {
        let archive = ZipArchive::new(stream)?;
        Ok(Self { archive })
    }

    /// Open an archive file on disk
    pub fn open(path: &Path) -> ParcelResult<Self> {
        let file = File::open(path)?;
        Self::new(Box::new(file)).map_err(|e| match e {
            ParcelError::Archive(inner) => ParcelError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Invalid package archive {}: {}", path.display(), inner),
            )),
            other => other,
        })
    }

    pub fn from_bytes(bytes: Vec<u8>) -> ParcelResult<Self> {
        Self::new(Box::new(Cursor::new(bytes)))
    }

    /// Contents of the embedded `package.xml`, if the archive has one
    pub fn read_manifest(&mut self) -> ParcelResult<Option<String>> {
        match self.entry(MANIFEST_ENTRY)? {
            Some(mut file) => {
                let mut content = String::new();
                file.read_to_string(&mut content)?;
                Ok(Some(content))
            }
            None => Ok(None),
        }
    }

    /// Look up an entry by its exact name
    pub fn entry(&mut self, name: &str) -> ParcelResult<Option<ZipFile<'_>>> {
        match self.archive.by_name(name) {
            Ok(file) => Ok(Some(file)),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }

    pub fn entry_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }
}

impl fmt::Debug for PackageArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageArchive")
            .field("entries", &self.archive.len())
            .finish()
    }
}
