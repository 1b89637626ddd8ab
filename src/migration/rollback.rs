use crate::di::MediaFileStore;
use tracing::{error, info};

/// Removes media files written by a plan whose transaction did not commit
///
/// Database changes roll back with the transaction; files on disk do not, so
/// every file the plan journaled is deleted again.
pub struct MediaRollback<'a> {
    media: &'a dyn MediaFileStore,
    written_files: Vec<String>,
}

impl<'a> MediaRollback<'a> {
    pub fn new(media: &'a dyn MediaFileStore, written_files: Vec<String>) -> Self {
        Self {
            media,
            written_files,
        }
    }

    pub fn has_files(&self) -> bool {
        !self.written_files.is_empty()
    }

    /// Remove every journaled file; returns how many were removed
    ///
    /// Keeps going past individual failures so one stuck file doesn't leave
    /// the rest behind.
    pub fn rollback(&self) -> usize {
        let mut removed = 0;
        for stored in &self.written_files {
            match self.media.remove_file(stored) {
                Ok(()) => removed += 1,
                Err(e) => error!(path = %stored, error = %e, "Failed to remove media file during rollback"),
            }
        }
        if removed > 0 {
            info!(removed, "Rolled back media files");
        }
        removed
    }
}
