use crate::core::{ParcelError, ParcelResult};
use crate::di::PackageDataService;
use crate::manifest::{ContentEntry, PackageDataManifest};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Document,
    Media,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Document => "document",
            EntityKind::Media => "media",
        }
    }
}

/// A content node created by an installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntity {
    pub id: i64,
    pub key: Uuid,
    pub name: String,
    pub kind: EntityKind,
    /// Stored path of the attached media file
    pub media_file: Option<String>,
}

/// What an installation actually created; existing keys are only counted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallationSummary {
    pub package_name: Option<String>,
    pub document_types_installed: Vec<String>,
    pub content_installed: Vec<ContentEntity>,
    pub media_installed: Vec<ContentEntity>,
    pub entities_skipped: usize,
    pub media_files_written: usize,
}

impl InstallationSummary {
    pub fn is_empty(&self) -> bool {
        self.document_types_installed.is_empty()
            && self.content_installed.is_empty()
            && self.media_installed.is_empty()
    }
}

impl fmt::Display for InstallationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} document type(s), {} document(s), {} media item(s) installed; {} skipped; {} media file(s) written",
            self.package_name.as_deref().unwrap_or("<unnamed package>"),
            self.document_types_installed.len(),
            self.content_installed.len(),
            self.media_installed.len(),
            self.entities_skipped,
            self.media_files_written
        )
    }
}

/// Installs manifests into the `content_type` and `content_node` tables
#[derive(Debug, Clone, Default)]
pub struct SqliteContentService;

impl SqliteContentService {
    pub fn new() -> Self {
        Self
    }

    fn node_exists(conn: &Connection, key: &Uuid) -> ParcelResult<bool> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM content_node WHERE key = ?1",
                [key.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_node(
        conn: &Connection,
        entry: &ContentEntry,
        kind: EntityKind,
    ) -> ParcelResult<ContentEntity> {
        let properties = serde_json::to_string(&entry.properties).map_err(|e| {
            ParcelError::Manifest(format!("Invalid properties on {}: {}", entry.key, e))
        })?;

        conn.execute(
            "INSERT INTO content_node
                (key, object_type, type_alias, name, parent_key, sort_order, properties, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.key.to_string(),
                kind.as_str(),
                entry.type_alias,
                entry.name,
                entry.parent_key.map(|k| k.to_string()),
                entry.sort_order,
                properties,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(ContentEntity {
            id: conn.last_insert_rowid(),
            key: entry.key,
            name: entry.name.clone(),
            kind,
            media_file: None,
        })
    }
}

impl PackageDataService for SqliteContentService {
    fn install_manifest(
        &self,
        conn: &Connection,
        manifest: &PackageDataManifest,
    ) -> ParcelResult<InstallationSummary> {
        let mut summary = InstallationSummary {
            package_name: manifest.info.name.clone(),
            ..InstallationSummary::default()
        };

        for doc_type in &manifest.document_types {
            let key = doc_type.key.unwrap_or_else(Uuid::new_v4).to_string();
            let exists: Option<i64> = conn
                .query_row(
                    "SELECT id FROM content_type WHERE alias = ?1 OR key = ?2",
                    params![doc_type.alias, key],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_some() {
                summary.entities_skipped += 1;
                continue;
            }
            conn.execute(
                "INSERT INTO content_type (key, alias, name, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![key, doc_type.alias, doc_type.name, Utc::now().to_rfc3339()],
            )?;
            summary.document_types_installed.push(doc_type.alias.clone());
        }

        for (entries, kind) in [
            (&manifest.documents, EntityKind::Document),
            (&manifest.media, EntityKind::Media),
        ] {
            for entry in entries {
                if Self::node_exists(conn, &entry.key)? {
                    debug!(key = %entry.key, "Skipping existing {}", kind.as_str());
                    summary.entities_skipped += 1;
                    continue;
                }
                let entity = Self::insert_node(conn, entry, kind)?;
                match kind {
                    EntityKind::Document => summary.content_installed.push(entity),
                    EntityKind::Media => summary.media_installed.push(entity),
                }
            }
        }

        Ok(summary)
    }

    fn save_media(&self, conn: &Connection, media: &ContentEntity) -> ParcelResult<()> {
        let updated = conn.execute(
            "UPDATE content_node SET media_file = ?1 WHERE key = ?2 AND object_type = 'media'",
            params![media.media_file, media.key.to_string()],
        )?;
        if updated == 0 {
            return Err(ParcelError::NotFound(format!("Media item {}", media.key)));
        }
        Ok(())
    }
}
