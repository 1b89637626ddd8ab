//! Service container for dependency injection

use super::traits::{
    ConfigProvider, InstalledPackageStore, MediaFileStore, PackageDataService, ResourceLoader,
};
use crate::config::Config;
use crate::core::ParcelResult;
use crate::manifest::{DirectoryResourceLoader, ManifestResolver};
use crate::migration::record::SqliteInstalledPackageStore;
use crate::package::content::SqliteContentService;
use crate::package::media::FileSystemMediaStore;
use std::sync::Arc;

/// Service container for dependency injection
///
/// Holds every collaborator of the migration engine as a trait object, so
/// tests can swap in mocks and hosts can swap in their own storage.
///
/// # Example (Production)
///
/// ```no_run
/// use parcel::di::ServiceContainer;
///
/// # fn example() -> parcel::core::ParcelResult<()> {
/// let container = ServiceContainer::new()?;
/// let resolver = container.resolver();
/// # Ok(())
/// # }
/// ```
///
/// # Example (Testing)
///
/// ```
/// use parcel::di::mocks::{test_container, MockConfigProvider};
///
/// let container = test_container(MockConfigProvider::default());
/// assert!(container.config.run_schema_and_content_migrations());
/// ```
#[derive(Clone)]
pub struct ServiceContainer {
    pub config: Arc<dyn ConfigProvider>,
    pub resources: Arc<dyn ResourceLoader>,
    pub content: Arc<dyn PackageDataService>,
    pub media: Arc<dyn MediaFileStore>,
    pub installed: Arc<dyn InstalledPackageStore>,
}

impl ServiceContainer {
    /// Create a service container from the config file on disk
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or created
    pub fn new() -> ParcelResult<Self> {
        Self::from_config(Config::load()?)
    }

    /// Production implementations wired from `config`:
    /// - package resources from `resources_dir`
    /// - content and installed state in SQLite
    /// - media files under `media_root`
    pub fn from_config(config: Config) -> ParcelResult<Self> {
        let resources = DirectoryResourceLoader::new(config.resources_dir()?);
        let media = FileSystemMediaStore::new(config.media_root()?);

        Ok(Self {
            config: Arc::new(config),
            resources: Arc::new(resources),
            content: Arc::new(SqliteContentService::new()),
            media: Arc::new(media),
            installed: Arc::new(SqliteInstalledPackageStore::new()),
        })
    }

    /// Create a service container with custom provider implementations
    pub fn with_providers(
        config: Arc<dyn ConfigProvider>,
        resources: Arc<dyn ResourceLoader>,
        content: Arc<dyn PackageDataService>,
        media: Arc<dyn MediaFileStore>,
        installed: Arc<dyn InstalledPackageStore>,
    ) -> Self {
        Self {
            config,
            resources,
            content,
            media,
            installed,
        }
    }

    /// A resolver over this container's resource loader
    pub fn resolver(&self) -> ManifestResolver {
        ManifestResolver::new(self.resources.clone())
    }
}
