//! Installs a package's data manifest and hydrates its media files.

use crate::core::path::{media_entry_path, media_file_name};
use crate::core::{ParcelError, ParcelResult};
use crate::di::ServiceContainer;
use crate::manifest::{PackageArchive, PackageDataManifest, PlanIdentity};
use crate::migration::context::MigrationContext;
use crate::package::content::InstallationSummary;
use std::io;
use tracing::{debug, info};

/// Where the manifest comes from
#[derive(Debug)]
enum ImportSource {
    /// `N.package.xml` / `N.package.zip` through the resource loader
    Embedded(PlanIdentity),
    Manifest(PackageDataManifest),
    /// The explicit archive's own `package.xml`
    Archive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Installed(InstallationSummary),
    /// Schema and content migrations are disabled by configuration
    SkippedByPolicy,
}

/// Single-use importer of one package data manifest
pub struct ImportExecutor {
    services: ServiceContainer,
    source: Option<ImportSource>,
    archive: Option<PackageArchive>,
    executed: bool,
}

impl ImportExecutor {
    /// An executor with nothing to import; `execute` fails with a configuration error
    pub fn new(services: ServiceContainer) -> Self {
        Self {
            services,
            source: None,
            archive: None,
            executed: false,
        }
    }

    pub fn from_embedded_resource(services: ServiceContainer, identity: PlanIdentity) -> Self {
        Self {
            source: Some(ImportSource::Embedded(identity)),
            ..Self::new(services)
        }
    }

    /// Embedded resources, with `archive` supplying media when there's no `N.package.zip`
    pub fn from_embedded_resource_with_archive(
        services: ServiceContainer,
        identity: PlanIdentity,
        archive: PackageArchive,
    ) -> Self {
        Self {
            source: Some(ImportSource::Embedded(identity)),
            archive: Some(archive),
            ..Self::new(services)
        }
    }

    pub fn from_manifest(services: ServiceContainer, manifest: PackageDataManifest) -> Self {
        Self {
            source: Some(ImportSource::Manifest(manifest)),
            ..Self::new(services)
        }
    }

    pub fn from_manifest_with_archive(
        services: ServiceContainer,
        manifest: PackageDataManifest,
        archive: PackageArchive,
    ) -> Self {
        Self {
            source: Some(ImportSource::Manifest(manifest)),
            archive: Some(archive),
            ..Self::new(services)
        }
    }

    /// The archive supplies both the manifest (`package.xml`) and the media
    pub fn from_archive(services: ServiceContainer, archive: PackageArchive) -> Self {
        Self {
            source: Some(ImportSource::Archive),
            archive: Some(archive),
            ..Self::new(services)
        }
    }

    pub fn has_executed(&self) -> bool {
        self.executed
    }

    /// Install the manifest, then store media files for newly created media
    ///
    /// Runs inside the context's transaction. Entities whose key already
    /// exists are skipped along with their files.
    pub fn execute(&mut self, ctx: &mut MigrationContext<'_>) -> ParcelResult<ImportOutcome> {
        if self.executed {
            return Err(ParcelError::InvalidState(
                "This import has already been executed.".to_string(),
            ));
        }
        self.executed = true;

        let source = self.source.take().ok_or_else(|| {
            ParcelError::Config(
                "No package data manifest or package archive was supplied to the import"
                    .to_string(),
            )
        })?;
        let explicit_archive = self.archive.take();

        if !self.services.config.run_schema_and_content_migrations() {
            info!(
                plan = %ctx.plan_name(),
                "Skipping package import, schema and content migrations are disabled"
            );
            return Ok(ImportOutcome::SkippedByPolicy);
        }

        let (manifest, archive) = self.resolve(source, explicit_archive)?;

        let mut summary = self
            .services
            .content
            .install_manifest(ctx.database(), &manifest)?;

        if let Some(archive) = archive {
            self.hydrate_media(ctx, &manifest, archive, &mut summary)?;
        }

        info!(plan = %ctx.plan_name(), "Package migration executed. Summary: {}", summary);
        Ok(ImportOutcome::Installed(summary))
    }

    fn resolve(
        &self,
        source: ImportSource,
        explicit_archive: Option<PackageArchive>,
    ) -> ParcelResult<(PackageDataManifest, Option<PackageArchive>)> {
        match source {
            ImportSource::Embedded(identity) => {
                match self.services.resolver().try_resolve(&identity)? {
                    Some(resolved) => Ok((resolved.manifest, resolved.archive.or(explicit_archive))),
                    None => match explicit_archive {
                        Some(mut archive) => match archive.read_manifest()? {
                            Some(text) => Ok((PackageDataManifest::parse(&text)?, Some(archive))),
                            None => Err(missing_embedded(&identity)),
                        },
                        None => Err(missing_embedded(&identity)),
                    },
                }
            }
            ImportSource::Manifest(manifest) => Ok((manifest, explicit_archive)),
            ImportSource::Archive => {
                let mut archive = explicit_archive.ok_or_else(|| {
                    ParcelError::Config("No package archive was supplied to the import".to_string())
                })?;
                let text = archive.read_manifest()?.ok_or_else(|| {
                    ParcelError::Config(
                        "The package archive does not contain a package.xml manifest".to_string(),
                    )
                })?;
                Ok((PackageDataManifest::parse(&text)?, Some(archive)))
            }
        }
    }

    /// Consumes the archive; it is closed on every exit path
    fn hydrate_media(
        &self,
        ctx: &mut MigrationContext<'_>,
        manifest: &PackageDataManifest,
        mut archive: PackageArchive,
        summary: &mut InstallationSummary,
    ) -> ParcelResult<()> {
        let files = manifest.media_with_files();

        for media in summary.media_installed.iter_mut() {
            let Some(media_file_path) = files.get(&media.key) else {
                continue;
            };

            let entry_path = media_entry_path(media_file_path);
            let file_name = media_file_name(media_file_path)?;
            let stored = {
                let mut entry = archive.entry(&entry_path)?.ok_or_else(|| {
                    ParcelError::MissingMediaFile {
                        entry_path: entry_path.clone(),
                    }
                })?;
                self.services.media.set_file(media, &file_name, &mut entry)?
            };
            ctx.record_written_file(stored.clone());
            self.services.content.save_media(ctx.database(), media)?;
            summary.media_files_written += 1;

            debug!(key = %media.key, entry = %entry_path, stored = %stored, "Hydrated media file");
        }

        Ok(())
    }
}

fn missing_embedded(identity: &PlanIdentity) -> ParcelError {
    ParcelError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("No embedded package XML/ZIP found for {}", identity),
    ))
}
