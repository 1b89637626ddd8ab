pub mod content;
pub mod domain;
pub mod installer;
pub mod media;
pub mod namespace;
pub mod packager;

pub use content::{ContentEntity, EntityKind, InstallationSummary, SqliteContentService};
pub use domain::{Domain, DomainRepository};
pub use installer::{ImportExecutor, ImportOutcome};
pub use media::FileSystemMediaStore;
pub use namespace::clean_namespace;
pub use packager::{CompiledPackage, PackageDefinition, PackageRepackager};
