use crate::core::ParcelResult;
use crate::migration::context::MigrationContext;
use crate::migration::step::MigrationStep;
use crate::package::installer::{ImportExecutor, ImportOutcome};
use tracing::debug;

/// Installs a package's data manifest as part of its migration plan
pub struct ImportPackageStep {
    executor: ImportExecutor,
}

impl ImportPackageStep {
    pub fn new(executor: ImportExecutor) -> Self {
        Self { executor }
    }
}

impl MigrationStep for ImportPackageStep {
    fn migrate(&mut self, ctx: &mut MigrationContext<'_>) -> ParcelResult<()> {
        match self.executor.execute(ctx)? {
            ImportOutcome::Installed(summary) => {
                debug!(plan = %ctx.plan_name(), created = !summary.is_empty(), "Package data imported")
            }
            ImportOutcome::SkippedByPolicy => {}
        }
        Ok(())
    }
}
