//! End-to-end tests for the `parcel` binary

use assert_cmd::Command;
use assert_fs::{prelude::*, TempDir};
use std::path::PathBuf;

pub mod install;
pub mod migrate;
pub mod pack;

/// Test context that provides an isolated store for each test
pub struct TestContext {
    pub temp: TempDir,
    pub config_path: PathBuf,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_string_lossy().replace('\\', "/");
        let config = temp.child("config.yaml");
        config
            .write_str(&format!(
                "database_path: {root}/data/parcel.db\n\
                 media_root: {root}/data/media\n\
                 resources_dir: {root}/packages\n\
                 instance_id: e2e\n\
                 lock:\n  wait_timeout_seconds: 5\n  poll_interval_ms: 10\n"
            ))
            .unwrap();
        temp.child("packages").create_dir_all().unwrap();

        Self {
            config_path: config.to_path_buf(),
            temp,
        }
    }

    /// A `parcel` command pointed at this context's config
    pub fn parcel(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("parcel").unwrap();
        cmd.current_dir(&self.temp);
        cmd.arg("--config").arg(&self.config_path);

        // Keep the platform config dir inside the temp dir too
        cmd.env("XDG_CONFIG_HOME", self.temp.child("xdg-config").path());
        cmd.env("XDG_DATA_HOME", self.temp.child("xdg-data").path());
        cmd.env("HOME", self.temp.path());
        cmd
    }

    pub fn packages(&self) -> PathBuf {
        self.temp.child("packages").to_path_buf()
    }

    pub fn media_root(&self) -> PathBuf {
        self.temp.child("data").child("media").to_path_buf()
    }
}

/// A minimal manifest with one document and, optionally, one media item
pub fn manifest_xml(with_media: bool) -> String {
    let media = if with_media {
        r#"<MediaItems><MediaSet>
             <Image id="2" key="c0ffee00-0000-4000-8000-000000000002" nodeName="Logo" mediaFilePath="/img/logo.png" />
           </MediaSet></MediaItems>"#
    } else {
        ""
    };
    format!(
        r#"<umbPackage>
  <info><package><name>Acme</name></package></info>
  <DocumentTypes><DocumentType alias="home" name="Home" /></DocumentTypes>
  <Documents><DocumentSet>
    <home id="1" key="c0ffee00-0000-4000-8000-000000000001" nodeName="Welcome" />
  </DocumentSet></Documents>
  {}
</umbPackage>"#,
        media
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use predicates::prelude::*;

    #[test]
    fn test_help_lists_commands() {
        let ctx = TestContext::new();
        ctx.parcel()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("migrate"))
            .stdout(predicate::str::contains("install"))
            .stdout(predicate::str::contains("pack"));
    }

    #[test]
    fn test_status_on_empty_store() {
        let ctx = TestContext::new();
        ctx.parcel()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No installed packages."));
    }

    #[test]
    fn test_invalid_config_file() {
        let ctx = TestContext::new();
        ctx.temp.child("config.yaml").write_str("lock: [unclosed").unwrap();
        ctx.parcel()
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration error"));
    }
}
