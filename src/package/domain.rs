//! Hostname bindings for content roots.
//!
//! Requires the `domain.sort_order` column added by the core plan.

use crate::core::{ParcelError, ParcelResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub id: Option<i64>,
    pub domain_name: String,
    pub root_content_id: Option<i64>,
    pub sort_order: i64,
}

impl Domain {
    pub fn new(domain_name: impl Into<String>, root_content_id: Option<i64>) -> Self {
        Self {
            id: None,
            domain_name: domain_name.into(),
            root_content_id,
            sort_order: 0,
        }
    }

    /// Nameless or `*`-prefixed domains match any host below a root
    pub fn is_wildcard(&self) -> bool {
        self.domain_name.is_empty() || self.domain_name.starts_with('*')
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            domain_name: row.get(1)?,
            root_content_id: row.get(2)?,
            sort_order: row.get(3)?,
        })
    }
}

const SELECT_DOMAIN: &str = "SELECT id, domain_name, root_content_id, sort_order FROM domain";

pub struct DomainRepository<'c> {
    conn: &'c Connection,
}

impl<'c> DomainRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert a new domain or update an existing one (by `id`)
    ///
    /// New domains are appended after their root's other domains; wildcards
    /// always get `-1`.
    pub fn save(&self, domain: &mut Domain) -> ParcelResult<()> {
        self.ensure_name_available(&domain.domain_name, domain.id)?;
        self.ensure_root_exists(domain.root_content_id)?;

        match domain.id {
            None => {
                domain.sort_order = self.new_sort_order(domain.root_content_id, domain.is_wildcard())?;
                self.conn.execute(
                    "INSERT INTO domain (domain_name, root_content_id, sort_order) VALUES (?1, ?2, ?3)",
                    params![domain.domain_name, domain.root_content_id, domain.sort_order],
                )?;
                domain.id = Some(self.conn.last_insert_rowid());
            }
            Some(id) => {
                let updated = self.conn.execute(
                    "UPDATE domain SET domain_name = ?1, root_content_id = ?2, sort_order = ?3 WHERE id = ?4",
                    params![domain.domain_name, domain.root_content_id, domain.sort_order, id],
                )?;
                if updated == 0 {
                    return Err(ParcelError::NotFound(format!("No domain exists with id {}", id)));
                }
            }
        }
        Ok(())
    }

    pub fn get_all(&self, include_wildcards: bool) -> ParcelResult<Vec<Domain>> {
        Ok(self
            .query(&format!("{} ORDER BY sort_order, id", SELECT_DOMAIN), [])?
            .into_iter()
            .filter(|d| include_wildcards || !d.is_wildcard())
            .collect())
    }

    /// Case-insensitive lookup
    pub fn get_by_name(&self, domain_name: &str) -> ParcelResult<Option<Domain>> {
        let domain = self
            .conn
            .query_row(
                &format!("{} WHERE lower(domain_name) = lower(?1)", SELECT_DOMAIN),
                [domain_name],
                Domain::from_row,
            )
            .optional()?;
        Ok(domain)
    }

    pub fn exists(&self, domain_name: &str) -> ParcelResult<bool> {
        Ok(self.get_by_name(domain_name)?.is_some())
    }

    pub fn assigned_domains(
        &self,
        content_id: i64,
        include_wildcards: bool,
    ) -> ParcelResult<Vec<Domain>> {
        Ok(self
            .query(
                &format!("{} WHERE root_content_id = ?1 ORDER BY sort_order, id", SELECT_DOMAIN),
                [content_id],
            )?
            .into_iter()
            .filter(|d| include_wildcards || !d.is_wildcard())
            .collect())
    }

    pub fn delete(&self, id: i64) -> ParcelResult<bool> {
        Ok(self.conn.execute("DELETE FROM domain WHERE id = ?1", [id])? > 0)
    }

    fn query<P: rusqlite::Params>(&self, sql: &str, params: P) -> ParcelResult<Vec<Domain>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, Domain::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn ensure_name_available(&self, domain_name: &str, own_id: Option<i64>) -> ParcelResult<()> {
        let taken: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM domain WHERE lower(domain_name) = lower(?1) AND id IS NOT ?2",
            params![domain_name, own_id],
            |row| row.get(0),
        )?;
        if taken > 0 {
            return Err(ParcelError::DuplicateName(format!(
                "The domain name {} is already assigned",
                domain_name
            )));
        }
        Ok(())
    }

    fn ensure_root_exists(&self, root_content_id: Option<i64>) -> ParcelResult<()> {
        let Some(root) = root_content_id else {
            return Ok(());
        };
        let exists: Option<i64> = self
            .conn
            .query_row("SELECT id FROM content_node WHERE id = ?1", [root], |row| row.get(0))
            .optional()?;
        if exists.is_none() {
            return Err(ParcelError::NotFound(format!("No content exists with id {}", root)));
        }
        Ok(())
    }

    fn new_sort_order(&self, root_content_id: Option<i64>, is_wildcard: bool) -> ParcelResult<i64> {
        if is_wildcard {
            return Ok(-1);
        }
        let next: i64 = self.conn.query_row(
            &format!(
                "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM domain
                 WHERE root_content_id IS ?1 AND NOT ({})",
                crate::migration::steps::add_domain_sort_order::WILDCARD_CONDITION
            ),
            [root_content_id],
            |row| row.get(0),
        )?;
        Ok(next)
    }
}
