//! Package data manifests and where they are loaded from

pub mod archive;
pub mod document;
pub mod hash;
pub mod loader;
pub mod resolver;

pub use archive::PackageArchive;
pub use document::{ContentEntry, DocumentTypeEntry, PackageDataManifest, PackageInfo};
pub use loader::{DirectoryResourceLoader, EmbeddedResources};
pub use resolver::{ManifestResolver, PlanIdentity, ResolvedManifest};
