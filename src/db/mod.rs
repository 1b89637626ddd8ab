//! SQLite-backed content store.

pub mod schema;

use crate::core::path::ensure_dir;
use crate::core::ParcelResult;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// An open store with the base schema in place
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file at `path`
    pub fn open(path: &Path) -> ParcelResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(path = %path.display(), journal_mode = %mode, "Opened database");

        Self::initialize(conn)
    }

    /// Private in-memory store, used by tests and dry runs
    pub fn open_in_memory() -> ParcelResult<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> ParcelResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(schema::BASE_SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

pub fn table_exists(conn: &Connection, table: &str) -> ParcelResult<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// `Some(not_null)` when the column exists, `None` otherwise
pub fn column_info(conn: &Connection, table: &str, column: &str) -> ParcelResult<Option<bool>> {
    let not_null: Option<bool> = conn
        .query_row(
            "SELECT \"notnull\" FROM pragma_table_info(?1) WHERE name = ?2",
            [table, column],
            |row| row.get(0),
        )
        .optional()?;
    Ok(not_null)
}
