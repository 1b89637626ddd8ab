//! Base schema for the content store.
//!
//! Every statement is idempotent. Columns introduced by migration plans (such
//! as `domain.sort_order`) are deliberately absent here; the plans add them.

pub const BASE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS content_type (
    id          INTEGER PRIMARY KEY,
    key         TEXT NOT NULL UNIQUE,
    alias       TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS content_node (
    id           INTEGER PRIMARY KEY,
    key          TEXT NOT NULL UNIQUE,
    object_type  TEXT NOT NULL CHECK (object_type IN ('document', 'media')),
    type_alias   TEXT NOT NULL,
    name         TEXT NOT NULL,
    parent_key   TEXT,
    sort_order   INTEGER NOT NULL DEFAULT 0,
    properties   TEXT NOT NULL DEFAULT '{}',
    media_file   TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS domain (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    domain_name      TEXT NOT NULL,
    root_content_id  INTEGER
);

CREATE TABLE IF NOT EXISTS installed_package (
    package_name  TEXT PRIMARY KEY,
    state         TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS installed_package_history (
    id            INTEGER PRIMARY KEY,
    package_name  TEXT NOT NULL,
    plan_name     TEXT NOT NULL,
    state         TEXT NOT NULL,
    applied_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_installed_package_history_package
    ON installed_package_history (package_name, id);

CREATE TABLE IF NOT EXISTS migration_lock (
    package_name  TEXT PRIMARY KEY,
    owner         TEXT NOT NULL,
    acquired_at   INTEGER NOT NULL,
    expires_at    INTEGER NOT NULL
);
"#;
