pub mod add_domain_sort_order;
pub mod import_package;

pub use add_domain_sort_order::AddDomainSortOrder;
pub use import_package::ImportPackageStep;

use crate::core::{ParcelResult, Version};
use crate::migration::plan::MigrationPlan;

pub const CORE_PACKAGE: &str = "core";

/// Schema upgrades of the store itself, applied before any package plan
pub fn core_plan() -> ParcelResult<MigrationPlan> {
    MigrationPlan::builder(CORE_PACKAGE)
        .target_version(Version::new(10, 0, 0))
        .step("AddDomainSortOrder", || AddDomainSortOrder)
        .build()
}
