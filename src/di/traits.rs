//! Trait definitions for dependency injection
//!
//! Every collaborator that touches the relational store receives the
//! connection explicitly, so it participates in whatever transaction the
//! caller has open.

use crate::config::LockSettings;
use crate::core::ParcelResult;
use crate::manifest::PackageDataManifest;
use crate::migration::record::{AppliedPlan, InstalledPackageRecord};
use crate::package::content::{ContentEntity, InstallationSummary};
use rusqlite::Connection;
use std::io::{Read, Seek};
use std::path::PathBuf;

/// A readable, seekable byte stream that can move between threads.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Trait for configuration access
///
/// Provides read-only access to application configuration.
/// Implementations should be thread-safe (Send + Sync).
pub trait ConfigProvider: Send + Sync {
    /// Whether package schema and content migrations run at all
    fn run_schema_and_content_migrations(&self) -> bool;

    /// Path of the SQLite database file
    fn database_path(&self) -> ParcelResult<PathBuf>;

    /// Root directory for persisted media files
    fn media_root(&self) -> ParcelResult<PathBuf>;

    /// Directory scanned for package resources and plan descriptors
    fn resources_dir(&self) -> ParcelResult<PathBuf>;

    /// Identity of this process when holding migration locks
    fn instance_id(&self) -> String;

    /// Migration lock strategy and timings
    fn lock_settings(&self) -> LockSettings;
}

/// Opens package resources by well-known relative name.
pub trait ResourceLoader: Send + Sync {
    /// Open a resource, `Ok(None)` when it does not exist
    fn open(&self, path: &str) -> ParcelResult<Option<Box<dyn ReadSeek>>>;
}

/// Content/package installation service
///
/// Interprets a package data manifest and creates the entities it declares.
/// Entities whose key already exists are skipped, never updated.
pub trait PackageDataService: Send + Sync {
    /// Create every net-new entity declared by the manifest
    fn install_manifest(
        &self,
        conn: &Connection,
        manifest: &PackageDataManifest,
    ) -> ParcelResult<InstallationSummary>;

    /// Persist a media entity after its file has been stored
    fn save_media(&self, conn: &Connection, media: &ContentEntity) -> ParcelResult<()>;
}

/// Media storage abstraction
pub trait MediaFileStore: Send + Sync {
    /// Stream `content` into storage for `media` under `file_name`.
    ///
    /// Sets `media.media_file` and returns the stored path.
    fn set_file(
        &self,
        media: &mut ContentEntity,
        file_name: &str,
        content: &mut dyn Read,
    ) -> ParcelResult<String>;

    /// Remove a previously stored file (used to compensate rolled back installs)
    fn remove_file(&self, stored_path: &str) -> ParcelResult<()>;
}

/// Persisted installed-package state
pub trait InstalledPackageStore: Send + Sync {
    /// Current record for a package, if any plan has ever been applied
    fn installed_state(
        &self,
        conn: &Connection,
        package_name: &str,
    ) -> ParcelResult<Option<InstalledPackageRecord>>;

    /// Append to the history and move the package to `state`
    fn record_applied(
        &self,
        conn: &Connection,
        package_name: &str,
        plan_name: &str,
        state: &str,
    ) -> ParcelResult<()>;

    /// Applied plans for a package, oldest first
    fn history(&self, conn: &Connection, package_name: &str) -> ParcelResult<Vec<AppliedPlan>>;

    /// Every installed package, ordered by name
    fn all(&self, conn: &Connection) -> ParcelResult<Vec<InstalledPackageRecord>>;
}
