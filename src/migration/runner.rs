//! Applies migration plans exactly once per target state.

use super::context::MigrationContext;
use super::lock::MigrationLock;
use super::plan::MigrationPlan;
use super::rollback::MediaRollback;
use crate::core::{ParcelError, ParcelResult};
use crate::db::Database;
use crate::di::ServiceContainer;
use rusqlite::{Transaction, TransactionBehavior};
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing pending; the package already is at (or past) the target
    UpToDate { state: Option<String> },
    /// Another runner applied the plan while we waited for the lock
    AlreadyApplied { state: String },
    Applied {
        previous: Option<String>,
        state: String,
        steps: usize,
    },
}

impl RunOutcome {
    pub fn was_applied(&self) -> bool {
        matches!(self, RunOutcome::Applied { .. })
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::UpToDate { state: Some(state) } => write!(f, "up to date ({})", state),
            RunOutcome::UpToDate { state: None } => write!(f, "up to date"),
            RunOutcome::AlreadyApplied { state } => {
                write!(f, "applied by another instance ({})", state)
            }
            RunOutcome::Applied {
                previous: Some(previous),
                state,
                steps,
            } => write!(f, "{} -> {} ({} step(s))", previous, state, steps),
            RunOutcome::Applied {
                previous: None,
                state,
                steps,
            } => write!(f, "installed {} ({} step(s))", state, steps),
        }
    }
}

pub struct MigrationRunner {
    db: Database,
    services: ServiceContainer,
    lock: MigrationLock,
}

impl MigrationRunner {
    pub fn new(db: Database, services: ServiceContainer) -> Self {
        let lock =
            MigrationLock::from_settings(&services.config.lock_settings(), services.config.instance_id());
        Self { db, services, lock }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn services(&self) -> &ServiceContainer {
        &self.services
    }

    /// Recorded state of a package, `None` if it was never installed
    pub fn installed_state(&self, package_name: &str) -> ParcelResult<Option<String>> {
        Ok(self
            .services
            .installed
            .installed_state(self.db.connection(), package_name)?
            .map(|r| r.state))
    }

    pub fn is_pending(&self, plan: &MigrationPlan) -> ParcelResult<bool> {
        let recorded = self.installed_state(plan.package_name())?;
        Ok(plan.target().is_pending(recorded.as_deref()))
    }

    /// Apply `plan` if its package is not yet at the plan's target
    ///
    /// All steps and the installed-package record commit in one transaction.
    /// On failure the record is untouched and media files the plan wrote are
    /// removed again.
    pub fn run(&self, plan: &MigrationPlan) -> ParcelResult<RunOutcome> {
        let package = plan.package_name();
        let target = plan.target();

        let recorded = self.installed_state(package)?;
        if !target.is_pending(recorded.as_deref()) {
            info!(package, state = ?recorded, "Package is up to date");
            return Ok(RunOutcome::UpToDate { state: recorded });
        }

        let conn = self.db.connection();
        let _guard = self.lock.acquire(conn, package)?;

        // Someone may have applied it while we waited
        let recorded = self.installed_state(package)?;
        if !target.is_pending(recorded.as_deref()) {
            let state = recorded.unwrap_or_default();
            info!(package, state = %state, "Package was migrated by another instance");
            return Ok(RunOutcome::AlreadyApplied { state });
        }

        let state = target.state();
        info!(package, from = ?recorded, to = %state, "Running migration plan");

        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        let mut ctx = MigrationContext::new(&tx, plan.plan_name());
        let result = plan.execute(&mut ctx).and_then(|steps| {
            self.services
                .installed
                .record_applied(&tx, package, plan.plan_name(), &state)?;
            Ok(steps)
        });
        let written = ctx.into_written_files();

        let result = match result {
            Ok(steps) => tx.commit().map(|_| steps).map_err(ParcelError::from),
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(package, error = %rollback_err, "Transaction rollback failed");
                }
                Err(e)
            }
        };

        match result {
            Ok(steps) => {
                info!(package, state = %state, steps, "Migration plan applied");
                Ok(RunOutcome::Applied {
                    previous: recorded,
                    state,
                    steps,
                })
            }
            Err(e) => {
                error!(package, error = %e, "Migration plan failed; changes rolled back");
                let rollback = MediaRollback::new(self.services.media.as_ref(), written);
                if rollback.has_files() {
                    rollback.rollback();
                }
                Err(e)
            }
        }
    }

    /// Run plans in order, stopping at the first failure
    pub fn run_all(&self, plans: &[MigrationPlan]) -> ParcelResult<Vec<(String, RunOutcome)>> {
        let mut outcomes = Vec::with_capacity(plans.len());
        for plan in plans {
            let outcome = self.run(plan)?;
            outcomes.push((plan.package_name().to_string(), outcome));
        }
        Ok(outcomes)
    }
}
