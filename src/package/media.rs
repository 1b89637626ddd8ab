use crate::core::path::{ensure_dir, safe_join};
use crate::core::{ParcelError, ParcelResult};
use crate::di::MediaFileStore;
use crate::package::content::ContentEntity;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

const STORED_PREFIX: &str = "/media/";

/// Stores media files as `<root>/<key>/<file_name>`
#[derive(Debug, Clone)]
pub struct FileSystemMediaStore {
    root: PathBuf,
}

impl FileSystemMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a stored path such as `/media/<key>/logo.png`
    pub fn resolve(&self, stored_path: &str) -> ParcelResult<PathBuf> {
        let relative = stored_path.strip_prefix(STORED_PREFIX).ok_or_else(|| {
            ParcelError::Path(format!("Not a stored media path: {}", stored_path))
        })?;
        safe_join(&self.root, relative)
    }
}

impl MediaFileStore for FileSystemMediaStore {
    fn set_file(
        &self,
        media: &mut ContentEntity,
        file_name: &str,
        content: &mut dyn Read,
    ) -> ParcelResult<String> {
        if file_name.contains('/') || file_name.contains('\\') {
            return Err(ParcelError::Path(format!("Invalid media file name: {}", file_name)));
        }

        let folder = media.key.to_string();
        let dir = safe_join(&self.root, &folder)?;
        ensure_dir(&dir)?;

        let target = safe_join(&dir, file_name)?;
        let temp = dir.join(format!(".{}.tmp", file_name));
        if let Err(e) = write_then_rename(content, &temp, &target) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        let stored = format!("{}{}/{}", STORED_PREFIX, folder, file_name);
        debug!(key = %media.key, path = %stored, "Stored media file");
        media.media_file = Some(stored.clone());
        Ok(stored)
    }

    fn remove_file(&self, stored_path: &str) -> ParcelResult<()> {
        let path = self.resolve(stored_path)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        // Drop the per-item folder once it is empty
        if let Some(parent) = path.parent() {
            if parent != self.root {
                let _ = fs::remove_dir(parent);
            }
        }
        Ok(())
    }
}

fn write_then_rename(content: &mut dyn Read, temp: &Path, target: &Path) -> io::Result<()> {
    let mut out = File::create(temp)?;
    io::copy(content, &mut out)?;
    out.sync_all()?;
    drop(out);
    fs::rename(temp, target)
}
