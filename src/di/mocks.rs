//! Mock implementations of service traits for testing

use super::container::ServiceContainer;
use super::traits::{ConfigProvider, MediaFileStore, PackageDataService};
use crate::config::LockSettings;
use crate::core::{ParcelError, ParcelResult};
use crate::manifest::{DirectoryResourceLoader, PackageDataManifest};
use crate::migration::record::SqliteInstalledPackageStore;
use crate::package::content::{ContentEntity, InstallationSummary, SqliteContentService};
use rusqlite::Connection;
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock configuration provider for testing
///
/// # Example
///
/// ```
/// use parcel::di::mocks::MockConfigProvider;
/// use parcel::di::ConfigProvider;
///
/// let mut config = MockConfigProvider::default();
/// config.run_schema_and_content_migrations = false;
///
/// assert!(!config.run_schema_and_content_migrations());
/// ```
#[derive(Clone)]
pub struct MockConfigProvider {
    pub run_schema_and_content_migrations: bool,
    pub database_path: PathBuf,
    pub media_root: PathBuf,
    pub resources_dir: PathBuf,
    pub instance_id: String,
    pub lock: LockSettings,
}

impl Default for MockConfigProvider {
    fn default() -> Self {
        Self {
            run_schema_and_content_migrations: true,
            database_path: PathBuf::from("/tmp/parcel-test/parcel.db"),
            media_root: PathBuf::from("/tmp/parcel-test/media"),
            resources_dir: PathBuf::from("/tmp/parcel-test/packages"),
            instance_id: "test-instance".to_string(),
            lock: LockSettings {
                wait_timeout_seconds: 5,
                poll_interval_ms: 10,
                ..LockSettings::default()
            },
        }
    }
}

impl ConfigProvider for MockConfigProvider {
    fn run_schema_and_content_migrations(&self) -> bool {
        self.run_schema_and_content_migrations
    }

    fn database_path(&self) -> ParcelResult<PathBuf> {
        Ok(self.database_path.clone())
    }

    fn media_root(&self) -> ParcelResult<PathBuf> {
        Ok(self.media_root.clone())
    }

    fn resources_dir(&self) -> ParcelResult<PathBuf> {
        Ok(self.resources_dir.clone())
    }

    fn instance_id(&self) -> String {
        self.instance_id.clone()
    }

    fn lock_settings(&self) -> LockSettings {
        self.lock.clone()
    }
}

/// In-memory media storage that counts writes
///
/// # Example
///
/// ```
/// use parcel::di::mocks::MemoryMediaStore;
///
/// let store = MemoryMediaStore::new();
/// assert_eq!(store.write_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MemoryMediaStore {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total `set_file` calls, including files later removed
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Files currently stored
    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn read(&self, stored_path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(stored_path).cloned()
    }
}

impl MediaFileStore for MemoryMediaStore {
    fn set_file(
        &self,
        media: &mut ContentEntity,
        file_name: &str,
        content: &mut dyn Read,
    ) -> ParcelResult<String> {
        let mut bytes = Vec::new();
        content.read_to_end(&mut bytes)?;

        let stored = format!("/media/{}/{}", media.key, file_name);
        self.files.lock().unwrap().insert(stored.clone(), bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        media.media_file = Some(stored.clone());
        Ok(stored)
    }

    fn remove_file(&self, stored_path: &str) -> ParcelResult<()> {
        self.files.lock().unwrap().remove(stored_path);
        Ok(())
    }
}

/// SQLite content service that records calls and can be told to fail
#[derive(Clone, Default)]
pub struct RecordingContentService {
    inner: SqliteContentService,
    install_calls: Arc<AtomicUsize>,
    saved_media: Arc<AtomicUsize>,
    fail_on_save_media: Arc<AtomicBool>,
}

impl RecordingContentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install_calls(&self) -> usize {
        self.install_calls.load(Ordering::SeqCst)
    }

    pub fn saved_media(&self) -> usize {
        self.saved_media.load(Ordering::SeqCst)
    }

    /// Make every following `save_media` call fail
    pub fn fail_on_save_media(&self) {
        self.fail_on_save_media.store(true, Ordering::SeqCst);
    }
}

impl PackageDataService for RecordingContentService {
    fn install_manifest(
        &self,
        conn: &Connection,
        manifest: &PackageDataManifest,
    ) -> ParcelResult<InstallationSummary> {
        self.install_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.install_manifest(conn, manifest)
    }

    fn save_media(&self, conn: &Connection, media: &ContentEntity) -> ParcelResult<()> {
        if self.fail_on_save_media.load(Ordering::SeqCst) {
            return Err(ParcelError::InvalidState(format!(
                "Simulated failure saving media {}",
                media.key
            )));
        }
        self.saved_media.fetch_add(1, Ordering::SeqCst);
        self.inner.save_media(conn, media)
    }
}

/// A container over SQLite services, in-memory media storage and resources
/// read from `config.resources_dir`
pub fn test_container(config: MockConfigProvider) -> ServiceContainer {
    let resources = Arc::new(DirectoryResourceLoader::new(config.resources_dir.clone()));
    ServiceContainer::with_providers(
        Arc::new(config),
        resources,
        Arc::new(SqliteContentService::new()),
        Arc::new(MemoryMediaStore::new()),
        Arc::new(SqliteInstalledPackageStore::new()),
    )
}
