//! Versioned, exactly-once migration plans

pub mod automatic;
pub mod context;
pub mod lock;
pub mod plan;
pub mod record;
pub mod rollback;
pub mod runner;
pub mod step;
pub mod steps;

pub use automatic::{discover_plans, PackagePlanDescriptor};
pub use context::MigrationContext;
pub use lock::{LockGuard, MigrationLock};
pub use plan::{MigrationPlan, PlanBuilder, PlanTarget};
pub use record::{AppliedPlan, InstalledPackageRecord, SqliteInstalledPackageStore};
pub use runner::{MigrationRunner, RunOutcome};
pub use step::MigrationStep;
pub use steps::core_plan;
