//! Common utilities for integration tests

use parcel::db::Database;
use parcel::di::mocks::MockConfigProvider;
use parcel::di::ServiceContainer;
use parcel::manifest::DirectoryResourceLoader;
use parcel::migration::{MigrationPlan, MigrationRunner, PackagePlanDescriptor, SqliteInstalledPackageStore};
use parcel::package::{FileSystemMediaStore, SqliteContentService};
use parcel::Version;
use rusqlite::Connection;
use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::ZipWriter;

pub const HOME_KEY: &str = "a1b2c3d4-0000-4000-8000-000000000001";
pub const ABOUT_KEY: &str = "a1b2c3d4-0000-4000-8000-000000000002";
pub const LOGO_KEY: &str = "a1b2c3d4-0000-4000-8000-000000000003";

/// An isolated store: database file, media root and resources directory
pub struct Fixture {
    pub temp: TempDir,
    pub db_path: PathBuf,
    pub media_root: PathBuf,
    pub resources: PathBuf,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let resources = temp.path().join("packages");
        fs::create_dir_all(&resources).unwrap();
        Self {
            db_path: temp.path().join("parcel.db"),
            media_root: temp.path().join("media"),
            resources,
            temp,
        }
    }

    pub fn config(&self) -> MockConfigProvider {
        MockConfigProvider {
            database_path: self.db_path.clone(),
            media_root: self.media_root.clone(),
            resources_dir: self.resources.clone(),
            ..MockConfigProvider::default()
        }
    }

    pub fn services_with(&self, config: MockConfigProvider) -> ServiceContainer {
        ServiceContainer::with_providers(
            Arc::new(config),
            Arc::new(DirectoryResourceLoader::new(self.resources.clone())),
            Arc::new(SqliteContentService::new()),
            Arc::new(FileSystemMediaStore::new(self.media_root.clone())),
            Arc::new(SqliteInstalledPackageStore::new()),
        )
    }

    pub fn services(&self) -> ServiceContainer {
        self.services_with(self.config())
    }

    /// A runner over its own connection to the fixture database
    pub fn runner(&self) -> MigrationRunner {
        self.runner_with(self.services())
    }

    pub fn runner_with(&self, services: ServiceContainer) -> MigrationRunner {
        MigrationRunner::new(Database::open(&self.db_path).unwrap(), services)
    }

    pub fn write_resource(&self, name: &str, bytes: &[u8]) {
        fs::write(self.resources.join(name), bytes).unwrap();
    }

    /// Files currently stored under the media root
    pub fn media_files(&self) -> Vec<PathBuf> {
        if !self.media_root.exists() {
            return Vec::new();
        }
        WalkDir::new(&self.media_root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }
}

/// A manifest with one document type, two documents and optionally one media item
pub fn manifest_xml(with_media: bool) -> String {
    let media = if with_media {
        format!(
            r#"<MediaItems><MediaSet>
                 <Image id="3" key="{}" nodeName="Logo" mediaFilePath="/img/logo.png" />
               </MediaSet></MediaItems>"#,
            LOGO_KEY
        )
    } else {
        String::new()
    };

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<umbPackage>
  <info><package><name>Acme</name><version>1.0.0</version></package></info>
  <DocumentTypes><DocumentType alias="home" name="Home" /></DocumentTypes>
  <Documents><DocumentSet importMode="root">
    <home id="1" key="{}" nodeName="Welcome" sortOrder="0">
      <title>Hello</title>
      <page id="2" key="{}" nodeName="About" nodeTypeAlias="home" sortOrder="1" />
    </home>
  </DocumentSet></Documents>
  {}
</umbPackage>"#,
        HOME_KEY, ABOUT_KEY, media
    )
}

pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// The import plan a `*.plan.yaml` descriptor would produce
pub fn import_plan(
    services: &ServiceContainer,
    package: &str,
    namespace: &str,
    version: Option<Version>,
) -> MigrationPlan {
    PackagePlanDescriptor {
        name: package.to_string(),
        namespace: namespace.to_string(),
        version,
    }
    .build_plan(services)
    .unwrap()
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}
