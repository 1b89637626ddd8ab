use crate::core::path::{config_file, data_dir, ensure_dir};
use crate::core::{ParcelError, ParcelResult};
use crate::di::ConfigProvider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Run package schema and content migrations
    ///
    /// When disabled, package imports are recorded no-ops so operators can
    /// freeze content changes independently of core schema upgrades.
    #[serde(default = "default_true")]
    pub run_schema_and_content_migrations: bool,

    /// SQLite database file (defaults to `<data_dir>/parcel.db`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,

    /// Media file root (defaults to `<data_dir>/media`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_root: Option<String>,

    /// Package resources and `*.plan.yaml` descriptors (defaults to `<data_dir>/packages`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources_dir: Option<String>,

    /// Lock owner identity; a random one is generated per process when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,

    /// Migration lock settings
    #[serde(default)]
    pub lock: LockSettings,

    #[serde(skip, default = "generate_instance_id")]
    process_instance_id: String,
}

/// How concurrent runners are kept from applying the same plan twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockStrategy {
    /// A leased lock row in the shared database (multiple instances)
    Lease,
    /// No locking; only one instance ever runs migrations
    SingleWriter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSettings {
    #[serde(default = "default_lock_strategy")]
    pub strategy: LockStrategy,

    /// How long an acquired lease stays valid before others may take it over
    #[serde(default = "default_lease_seconds")]
    pub lease_seconds: u64,

    /// How long to wait for a lease held by someone else
    #[serde(default = "default_wait_timeout_seconds")]
    pub wait_timeout_seconds: u64,

    /// Delay between acquisition attempts
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl LockSettings {
    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_seconds)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            strategy: default_lock_strategy(),
            lease_seconds: default_lease_seconds(),
            wait_timeout_seconds: default_wait_timeout_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_lock_strategy() -> LockStrategy {
    LockStrategy::Lease
}

fn default_lease_seconds() -> u64 {
    300
}

fn default_wait_timeout_seconds() -> u64 {
    120
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn generate_instance_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run_schema_and_content_migrations: true,
            database_path: None,
            media_root: None,
            resources_dir: None,
            instance_id: None,
            lock: LockSettings::default(),
            process_instance_id: generate_instance_id(),
        }
    }
}

impl Config {
    /// Load config from the platform-specific config directory, creating a
    /// default one if it doesn't exist
    ///
    /// Config locations:
    /// - Windows: %APPDATA%\parcel\config.yaml
    /// - Linux: ~/.config/parcel/config.yaml
    /// - macOS: ~/Library/Application Support/parcel/config.yaml
    pub fn load() -> ParcelResult<Self> {
        let config_path = config_file()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load config from an explicit path; the file must exist
    pub fn load_from(path: &Path) -> ParcelResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ParcelError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ParcelError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: &Path) -> ParcelResult<()> {
        let config_dir = path
            .parent()
            .ok_or_else(|| ParcelError::Path("Invalid config path".to_string()))?;
        ensure_dir(config_dir)?;

        let content = serde_yaml::to_string(self)
            .map_err(|e| ParcelError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)?;
        Ok(())
    }

    /// Resolve a configured path, falling back to `<data_dir>/<default_name>`
    fn path_or_default(configured: &Option<String>, default_name: &str) -> ParcelResult<PathBuf> {
        match configured {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(data_dir()?.join(default_name)),
        }
    }
}

impl ConfigProvider for Config {
    fn run_schema_and_content_migrations(&self) -> bool {
        self.run_schema_and_content_migrations
    }

    fn database_path(&self) -> ParcelResult<PathBuf> {
        Self::path_or_default(&self.database_path, "parcel.db")
    }

    fn media_root(&self) -> ParcelResult<PathBuf> {
        Self::path_or_default(&self.media_root, "media")
    }

    fn resources_dir(&self) -> ParcelResult<PathBuf> {
        Self::path_or_default(&self.resources_dir, "packages")
    }

    fn instance_id(&self) -> String {
        self.instance_id
            .clone()
            .unwrap_or_else(|| self.process_instance_id.clone())
    }

    fn lock_settings(&self) -> LockSettings {
        self.lock.clone()
    }
}
