//! Dependency injection infrastructure for Parcel
//!
//! Every collaborator of the migration engine sits behind a trait so storage,
//! resources and configuration can be swapped without touching the engine.
//!
//! # Example (Production)
//! ```no_run
//! use parcel::di::ServiceContainer;
//!
//! # fn example() -> parcel::core::ParcelResult<()> {
//! let container = ServiceContainer::new()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example (Testing)
//! ```
//! use parcel::di::{ServiceContainer, mocks::*};
//! use parcel::manifest::EmbeddedResources;
//! use parcel::migration::SqliteInstalledPackageStore;
//! use std::sync::Arc;
//!
//! let container = ServiceContainer::with_providers(
//!     Arc::new(MockConfigProvider::default()),
//!     Arc::new(EmbeddedResources::new()),
//!     Arc::new(RecordingContentService::new()),
//!     Arc::new(MemoryMediaStore::new()),
//!     Arc::new(SqliteInstalledPackageStore::new()),
//! );
//! ```

pub mod container;
pub mod mocks;
pub mod traits;

// Re-export key types
pub use container::ServiceContainer;
pub use traits::{
    ConfigProvider, InstalledPackageStore, MediaFileStore, PackageDataService, ReadSeek,
    ResourceLoader,
};
