use super::open_runner;
use parcel::config::Config;
use parcel::core::{ParcelError, ParcelResult};
use parcel::di::ServiceContainer;
use parcel::manifest::{EmbeddedResources, PlanIdentity};
use parcel::migration::PackagePlanDescriptor;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MANIFEST_SUFFIX: &str = ".package.xml";
const ARCHIVE_SUFFIX: &str = ".package.zip";

/// Install the package at `path` under a plan keyed by its content hash
///
/// `path` is a `<namespace>.package.xml` or `<namespace>.package.zip`. A
/// sibling archive next to a manifest is picked up unless `archive` names one.
pub fn run(
    config: Config,
    path: PathBuf,
    archive: Option<PathBuf>,
    name: Option<String>,
) -> ParcelResult<()> {
    let (namespace, is_archive) = namespace_of(&path)?;
    let identity = PlanIdentity::new(namespace.clone())?;

    let mut resources = EmbeddedResources::new();
    if is_archive {
        resources.insert(identity.archive_resource(), fs::read(&path)?);
    } else {
        resources.insert(identity.manifest_resource(), fs::read(&path)?);
        let archive = archive.or_else(|| {
            let sibling = path.with_file_name(identity.archive_resource());
            sibling.is_file().then_some(sibling)
        });
        if let Some(archive) = archive {
            resources.insert(identity.archive_resource(), fs::read(&archive)?);
        }
    }

    let mut services = ServiceContainer::from_config(config.clone())?;
    services.resources = Arc::new(resources);

    let descriptor = PackagePlanDescriptor {
        name: name.unwrap_or_else(|| namespace.clone()),
        namespace,
        version: None,
    };
    let plan = descriptor.build_plan(&services)?;

    let runner = open_runner(&config, services)?;
    let outcome = runner.run(&plan)?;

    if outcome.was_applied() {
        println!("✓ {}: {}", descriptor.name, outcome);
    } else {
        println!("{}: {}", descriptor.name, outcome);
    }
    Ok(())
}

/// Namespace of a package resource file and whether it is the archive
fn namespace_of(path: &Path) -> ParcelResult<(String, bool)> {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let found = match file_name.strip_suffix(MANIFEST_SUFFIX) {
        Some(ns) => Some((ns, false)),
        None => file_name.strip_suffix(ARCHIVE_SUFFIX).map(|ns| (ns, true)),
    };
    found
        .filter(|(ns, _)| !ns.is_empty())
        .map(|(ns, is_archive)| (ns.to_string(), is_archive))
        .ok_or_else(|| {
            ParcelError::Config(format!(
                "Expected a <namespace>.package.xml or <namespace>.package.zip file: {}",
                path.display()
            ))
        })
}
