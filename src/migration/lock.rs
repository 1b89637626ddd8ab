//! Cross-instance mutual exclusion for plan execution.
//!
//! A lease row in `migration_lock` marks the owner of a package's plan run.
//! Rows past `expires_at` belong to crashed owners and may be taken over.

use crate::config::{LockSettings, LockStrategy};
use crate::core::{ParcelError, ParcelResult};
use rusqlite::{params, Connection, ErrorCode, Transaction, TransactionBehavior};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

pub enum MigrationLock {
    Lease(LeaseLock),
    /// Only one instance ever migrates; acquisition always succeeds
    SingleWriter,
}

impl MigrationLock {
    pub fn from_settings(settings: &LockSettings, owner: impl Into<String>) -> Self {
        match settings.strategy {
            LockStrategy::Lease => MigrationLock::Lease(LeaseLock::new(owner, settings)),
            LockStrategy::SingleWriter => MigrationLock::SingleWriter,
        }
    }

    /// Block until `package` is ours or the wait timeout elapses
    pub fn acquire<'c>(&self, conn: &'c Connection, package: &str) -> ParcelResult<LockGuard<'c>> {
        match self {
            MigrationLock::Lease(lease) => lease.acquire(conn, package),
            MigrationLock::SingleWriter => Ok(LockGuard {
                conn: None,
                package: package.to_string(),
                owner: String::new(),
            }),
        }
    }
}

pub struct LeaseLock {
    owner: String,
    lease: Duration,
    wait_timeout: Duration,
    poll_interval: Duration,
}

enum Attempt {
    Acquired,
    Held(String),
    Busy,
}

impl LeaseLock {
    pub fn new(owner: impl Into<String>, settings: &LockSettings) -> Self {
        Self {
            owner: owner.into(),
            lease: settings.lease(),
            wait_timeout: settings.wait_timeout(),
            poll_interval: settings.poll_interval(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn acquire<'c>(&self, conn: &'c Connection, package: &str) -> ParcelResult<LockGuard<'c>> {
        let started = Instant::now();
        let mut holder = String::from("unknown");

        loop {
            match self.try_acquire(conn, package)? {
                Attempt::Acquired => {
                    debug!(package, owner = %self.owner, "Acquired migration lock");
                    return Ok(LockGuard {
                        conn: Some(conn),
                        package: package.to_string(),
                        owner: self.owner.clone(),
                    });
                }
                Attempt::Held(current) => holder = current,
                Attempt::Busy => {}
            }

            if started.elapsed() >= self.wait_timeout {
                return Err(ParcelError::LockTimeout {
                    package: package.to_string(),
                    holder,
                });
            }
            debug!(package, holder = %holder, "Waiting for migration lock");
            thread::sleep(self.poll_interval);
        }
    }

    fn try_acquire(&self, conn: &Connection, package: &str) -> ParcelResult<Attempt> {
        match self.claim(conn, package) {
            Ok(holder) if holder == self.owner => Ok(Attempt::Acquired),
            Ok(holder) => Ok(Attempt::Held(holder)),
            Err(e) if is_busy(&e) => Ok(Attempt::Busy),
            Err(e) => Err(e.into()),
        }
    }

    /// Take the row if it is free or expired; returns whoever holds it now
    fn claim(&self, conn: &Connection, package: &str) -> rusqlite::Result<String> {
        let now = now_millis();
        let lease_ms = i64::try_from(self.lease.as_millis()).unwrap_or(i64::MAX);
        let expires = now.saturating_add(lease_ms);

        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM migration_lock WHERE package_name = ?1 AND expires_at <= ?2",
            params![package, now],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO migration_lock (package_name, owner, acquired_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![package, self.owner, now, expires],
        )?;
        // Renew our own lease when we already held it
        tx.execute(
            "UPDATE migration_lock SET expires_at = ?3 WHERE package_name = ?1 AND owner = ?2",
            params![package, self.owner, expires],
        )?;
        let holder: String = tx.query_row(
            "SELECT owner FROM migration_lock WHERE package_name = ?1",
            [package],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(holder)
    }
}

/// Releases the lease when dropped
pub struct LockGuard<'c> {
    conn: Option<&'c Connection>,
    package: String,
    owner: String,
}

impl LockGuard<'_> {
    pub fn package(&self) -> &str {
        &self.package
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        let Some(conn) = self.conn else {
            return;
        };
        if let Err(e) = conn.execute(
            "DELETE FROM migration_lock WHERE package_name = ?1 AND owner = ?2",
            params![self.package, self.owner],
        ) {
            warn!(package = %self.package, error = %e, "Failed to release migration lock; it expires with its lease");
        }
    }
}

fn is_busy(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::DatabaseBusy || err.code == ErrorCode::DatabaseLocked
    )
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
