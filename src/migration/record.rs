use crate::core::ParcelResult;
use crate::di::InstalledPackageStore;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

/// The state a package was last moved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPackageRecord {
    pub package_name: String,
    /// Applied version or content hash
    pub state: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedPlan {
    pub plan_name: String,
    pub state: String,
    pub applied_at: String,
}

/// `installed_package` plus its append-only history table
#[derive(Debug, Clone, Default)]
pub struct SqliteInstalledPackageStore;

impl SqliteInstalledPackageStore {
    pub fn new() -> Self {
        Self
    }
}

impl InstalledPackageStore for SqliteInstalledPackageStore {
    fn installed_state(
        &self,
        conn: &Connection,
        package_name: &str,
    ) -> ParcelResult<Option<InstalledPackageRecord>> {
        let record = conn
            .query_row(
                "SELECT package_name, state, updated_at FROM installed_package WHERE package_name = ?1",
                [package_name],
                |row| {
                    Ok(InstalledPackageRecord {
                        package_name: row.get(0)?,
                        state: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn record_applied(
        &self,
        conn: &Connection,
        package_name: &str,
        plan_name: &str,
        state: &str,
    ) -> ParcelResult<()> {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO installed_package_history (package_name, plan_name, state, applied_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![package_name, plan_name, state, now],
        )?;
        conn.execute(
            "INSERT INTO installed_package (package_name, state, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(package_name) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
            params![package_name, state, now],
        )?;
        Ok(())
    }

    fn history(&self, conn: &Connection, package_name: &str) -> ParcelResult<Vec<AppliedPlan>> {
        let mut stmt = conn.prepare(
            "SELECT plan_name, state, applied_at FROM installed_package_history
             WHERE package_name = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([package_name], |row| {
            Ok(AppliedPlan {
                plan_name: row.get(0)?,
                state: row.get(1)?,
                applied_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn all(&self, conn: &Connection) -> ParcelResult<Vec<InstalledPackageRecord>> {
        let mut stmt = conn.prepare(
            "SELECT package_name, state, updated_at FROM installed_package ORDER BY package_name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(InstalledPackageRecord {
                package_name: row.get(0)?,
                state: row.get(1)?,
                updated_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
