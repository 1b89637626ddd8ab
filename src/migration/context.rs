use crate::core::ParcelResult;
use crate::db;
use rusqlite::{Connection, Params};

/// Everything a step may touch while its plan executes
///
/// Borrows the runner's open transaction; one context per execution attempt.
pub struct MigrationContext<'c> {
    conn: &'c Connection,
    plan_name: String,
    written_files: Vec<String>,
}

impl<'c> MigrationContext<'c> {
    pub fn new(conn: &'c Connection, plan_name: impl Into<String>) -> Self {
        Self {
            conn,
            plan_name: plan_name.into(),
            written_files: Vec::new(),
        }
    }

    /// The connection, inside the plan transaction
    pub fn database(&self) -> &'c Connection {
        self.conn
    }

    pub fn plan_name(&self) -> &str {
        &self.plan_name
    }

    /// Journal a stored media file so it can be removed if the plan rolls back
    pub fn record_written_file(&mut self, stored_path: impl Into<String>) {
        self.written_files.push(stored_path.into());
    }

    pub fn written_files(&self) -> &[String] {
        &self.written_files
    }

    pub fn into_written_files(self) -> Vec<String> {
        self.written_files
    }

    pub fn table_exists(&self, table: &str) -> ParcelResult<bool> {
        db::table_exists(self.conn, table)
    }

    pub fn column_exists(&self, table: &str, column: &str) -> ParcelResult<bool> {
        Ok(db::column_info(self.conn, table, column)?.is_some())
    }

    pub fn column_is_not_null(&self, table: &str, column: &str) -> ParcelResult<bool> {
        Ok(db::column_info(self.conn, table, column)?.unwrap_or(false))
    }

    pub fn execute<P: Params>(&self, sql: &str, params: P) -> ParcelResult<usize> {
        Ok(self.conn.execute(sql, params)?)
    }

    pub fn execute_batch(&self, sql: &str) -> ParcelResult<()> {
        Ok(self.conn.execute_batch(sql)?)
    }
}
