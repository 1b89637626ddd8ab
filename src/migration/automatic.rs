//! Plans generated from `*.plan.yaml` descriptors
//!
//! A descriptor names a package and the namespace its resources are published
//! under. The generated plan has a single step that imports
//! `<namespace>.package.xml` / `<namespace>.package.zip`. Without an explicit
//! version the plan targets the content hash of those resources, so
//! redeploying identical bits never re-runs it.

use super::plan::MigrationPlan;
use super::steps::{ImportPackageStep, CORE_PACKAGE};
use crate::core::{ParcelError, ParcelResult, Version};
use crate::di::ServiceContainer;
use crate::manifest::PlanIdentity;
use crate::package::installer::ImportExecutor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const DESCRIPTOR_SUFFIX: &str = ".plan.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePlanDescriptor {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

impl PackagePlanDescriptor {
    pub fn load(path: &Path) -> ParcelResult<Self> {
        let content = fs::read_to_string(path)?;
        let descriptor: Self = serde_yaml::from_str(&content).map_err(|e| {
            ParcelError::Config(format!("Invalid plan descriptor {}: {}", path.display(), e))
        })?;
        if descriptor.name.trim().is_empty() {
            return Err(ParcelError::Config(format!(
                "Plan descriptor {} has no package name",
                path.display()
            )));
        }
        Ok(descriptor)
    }

    pub fn to_yaml(&self) -> ParcelResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Build the import plan; hashes the resources when no version is set
    pub fn build_plan(&self, services: &ServiceContainer) -> ParcelResult<MigrationPlan> {
        let identity = PlanIdentity::new(self.namespace.clone())?;
        let builder = MigrationPlan::builder(self.name.clone());
        let builder = match &self.version {
            Some(version) => builder.target_version(version.clone()),
            None => builder.target_content_hash(services.resolver().content_hash(&identity)?),
        };

        let services = services.clone();
        builder
            .step("ImportPackage", move || {
                ImportPackageStep::new(ImportExecutor::from_embedded_resource(
                    services.clone(),
                    identity.clone(),
                ))
            })
            .build()
    }
}

/// Descriptors directly inside `dir`, sorted by file name
pub fn discover(dir: &Path) -> ParcelResult<Vec<PackagePlanDescriptor>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "No package resources directory");
        return Ok(Vec::new());
    }

    let mut descriptors = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let is_descriptor = entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .map(|n| n.ends_with(DESCRIPTOR_SUFFIX))
                .unwrap_or(false);
        if !is_descriptor {
            continue;
        }
        descriptors.push(PackagePlanDescriptor::load(entry.path())?);
    }

    let mut seen = std::collections::HashSet::new();
    for descriptor in &descriptors {
        if descriptor.name == CORE_PACKAGE {
            return Err(ParcelError::DuplicateName(format!(
                "Package name '{}' is reserved for the core plan",
                CORE_PACKAGE
            )));
        }
        if !seen.insert(descriptor.name.as_str()) {
            warn!(package = %descriptor.name, "Package declared by more than one plan descriptor");
            return Err(ParcelError::DuplicateName(format!(
                "Package '{}' is declared by more than one plan descriptor",
                descriptor.name
            )));
        }
    }
    Ok(descriptors)
}

/// Plans for every discovered descriptor, in discovery order
pub fn discover_plans(dir: &Path, services: &ServiceContainer) -> ParcelResult<Vec<MigrationPlan>> {
    discover(dir)?
        .iter()
        .map(|d| d.build_plan(services))
        .collect()
}
