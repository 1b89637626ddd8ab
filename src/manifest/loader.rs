//! Resource loaders: where `N.package.xml` and `N.package.zip` come from.

use crate::core::path::safe_join;
use crate::core::ParcelResult;
use crate::di::{ReadSeek, ResourceLoader};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

/// Serves resources from files under a root directory
#[derive(Debug, Clone)]
pub struct DirectoryResourceLoader {
    root: PathBuf,
}

impl DirectoryResourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceLoader for DirectoryResourceLoader {
    fn open(&self, path: &str) -> ParcelResult<Option<Box<dyn ReadSeek>>> {
        let full = safe_join(&self.root, path)?;
        match File::open(&full) {
            Ok(file) => Ok(Some(Box::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Resources compiled into the binary or assembled in memory
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
    entries: HashMap<String, Cow<'static, [u8]>>,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compiled-in resource (e.g. from `include_bytes!`)
    pub fn with_static(mut self, name: impl Into<String>, bytes: &'static [u8]) -> Self {
        self.entries.insert(name.into(), Cow::Borrowed(bytes));
        self
    }

    /// Register an owned resource
    pub fn with_bytes(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.entries.insert(name.into(), Cow::Owned(bytes));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(name.into(), Cow::Owned(bytes));
    }
}

impl ResourceLoader for EmbeddedResources {
    fn open(&self, path: &str) -> ParcelResult<Option<Box<dyn ReadSeek>>> {
        Ok(self.entries.get(path).map(|bytes| {
            let stream: Box<dyn ReadSeek> = Box::new(Cursor::new(bytes.to_vec()));
            stream
        }))
    }
}
