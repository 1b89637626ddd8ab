use super::context::MigrationContext;
use crate::core::ParcelResult;

/// A single unit of a migration plan
///
/// Steps inspect the current schema before changing it, so running one again
/// after a partial failure is harmless. A fresh instance is created for every
/// execution and dropped afterwards.
pub trait MigrationStep {
    fn migrate(&mut self, ctx: &mut MigrationContext<'_>) -> ParcelResult<()>;
}
