//! Installing packages through migration plans

use super::common::*;
use parcel::core::{ErrorKind, ParcelError, ParcelResult};
use parcel::migration::{MigrationContext, MigrationPlan, MigrationStep, RunOutcome};
use parcel::package::ImportExecutor;
use parcel::manifest::PlanIdentity;
use parcel::migration::steps::ImportPackageStep;
use parcel::Version;

#[test]
fn test_install_twice_is_idempotent() {
    let fx = Fixture::new();
    fx.write_resource("Acme.package.xml", manifest_xml(true).as_bytes());
    fx.write_resource(
        "Acme.package.zip",
        &zip_bytes(&[("media/img/logo.png", b"png-bytes")]),
    );

    let runner = fx.runner();
    let plan = import_plan(runner.services(), "Acme", "Acme", None);

    let first = runner.run(&plan).unwrap();
    assert!(first.was_applied());
    let conn = runner.database().connection();
    assert_eq!(count_rows(conn, "content_type"), 1);
    assert_eq!(count_rows(conn, "content_node"), 3);
    assert_eq!(fx.media_files().len(), 1);

    let second = runner.run(&plan).unwrap();
    assert!(matches!(second, RunOutcome::UpToDate { .. }));
    assert_eq!(count_rows(conn, "content_node"), 3);
    assert_eq!(fx.media_files().len(), 1);
    assert_eq!(count_rows(conn, "installed_package_history"), 1);
}

#[test]
fn test_media_file_is_hydrated_and_linked() {
    let fx = Fixture::new();
    fx.write_resource("Acme.package.xml", manifest_xml(true).as_bytes());
    fx.write_resource(
        "Acme.package.zip",
        &zip_bytes(&[("media/img/logo.png", b"png-bytes")]),
    );

    let runner = fx.runner();
    runner
        .run(&import_plan(runner.services(), "Acme", "Acme", None))
        .unwrap();

    let stored: Option<String> = runner
        .database()
        .connection()
        .query_row(
            "SELECT media_file FROM content_node WHERE key = ?1",
            [LOGO_KEY],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, Some(format!("/media/{}/logo.png", LOGO_KEY)));

    let files = fx.media_files();
    assert_eq!(std::fs::read(&files[0]).unwrap(), b"png-bytes");
}

#[test]
fn test_versions_only_move_forward() {
    let fx = Fixture::new();
    fx.write_resource("Acme.package.xml", manifest_xml(false).as_bytes());
    let runner = fx.runner();
    let services = runner.services().clone();

    let v1 = import_plan(&services, "Acme", "Acme", Some(Version::new(1, 0, 0)));
    assert!(runner.run(&v1).unwrap().was_applied());
    assert_eq!(runner.installed_state("Acme").unwrap().as_deref(), Some("1.0.0"));

    // Same version again
    let again = import_plan(&services, "Acme", "Acme", Some(Version::new(1, 0, 0)));
    assert!(!runner.run(&again).unwrap().was_applied());

    // Older version never downgrades
    let older = import_plan(&services, "Acme", "Acme", Some(Version::new(0, 9, 0)));
    assert!(!runner.run(&older).unwrap().was_applied());
    assert_eq!(runner.installed_state("Acme").unwrap().as_deref(), Some("1.0.0"));

    let newer = import_plan(&services, "Acme", "Acme", Some(Version::new(1, 1, 0)));
    let outcome = runner.run(&newer).unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Applied {
            previous: Some("1.0.0".to_string()),
            state: "1.1.0".to_string(),
            steps: 1,
        }
    );

    // Entities from 1.0.0 are kept; nothing is duplicated
    assert_eq!(count_rows(runner.database().connection(), "content_node"), 2);
    assert_eq!(count_rows(runner.database().connection(), "installed_package_history"), 2);
}

#[test]
fn test_changed_resources_rerun_content_hash_plan() {
    let fx = Fixture::new();
    fx.write_resource("Acme.package.xml", manifest_xml(false).as_bytes());
    let runner = fx.runner();

    let first = import_plan(runner.services(), "Acme", "Acme", None);
    runner.run(&first).unwrap();

    fx.write_resource("Acme.package.xml", manifest_xml(false).replace("Hello", "Hi").as_bytes());
    let second = import_plan(runner.services(), "Acme", "Acme", None);
    assert_ne!(first.target(), second.target());

    let outcome = runner.run(&second).unwrap();
    assert!(outcome.was_applied());
    // Existing keys are skipped, never updated
    assert_eq!(count_rows(runner.database().connection(), "content_node"), 2);
}

#[test]
fn test_missing_media_fails_closed() {
    let fx = Fixture::new();
    fx.write_resource("Acme.package.xml", manifest_xml(true).as_bytes());
    fx.write_resource(
        "Acme.package.zip",
        &zip_bytes(&[("media/img/other.png", b"not it")]),
    );

    let runner = fx.runner();
    let plan = import_plan(runner.services(), "Acme", "Acme", None);

    let err = runner.run(&plan).unwrap_err();
    match &err {
        ParcelError::MissingMediaFile { entry_path } => {
            assert_eq!(entry_path, "media/img/logo.png")
        }
        other => panic!("Expected MissingMediaFile, got {:?}", other),
    }
    assert_eq!(err.kind(), ErrorKind::DataIntegrity);

    let conn = runner.database().connection();
    assert_eq!(count_rows(conn, "content_node"), 0);
    assert_eq!(count_rows(conn, "content_type"), 0);
    assert_eq!(count_rows(conn, "installed_package"), 0);
    assert!(fx.media_files().is_empty());
}

struct CreateAudit;

impl MigrationStep for CreateAudit {
    fn migrate(&mut self, ctx: &mut MigrationContext<'_>) -> ParcelResult<()> {
        ctx.execute_batch("CREATE TABLE acme_audit (id INTEGER PRIMARY KEY)")
    }
}

struct Explode;

impl MigrationStep for Explode {
    fn migrate(&mut self, _ctx: &mut MigrationContext<'_>) -> ParcelResult<()> {
        Err(ParcelError::InvalidState("boom".to_string()))
    }
}

#[test]
fn test_failed_plan_rolls_back_every_step() {
    let fx = Fixture::new();
    fx.write_resource("Acme.package.xml", manifest_xml(true).as_bytes());
    fx.write_resource(
        "Acme.package.zip",
        &zip_bytes(&[("media/img/logo.png", b"png-bytes")]),
    );

    let runner = fx.runner();
    let services = runner.services().clone();
    let plan = MigrationPlan::builder("Acme")
        .target_version(Version::new(1, 0, 0))
        .step("CreateAudit", || CreateAudit)
        .step("ImportPackage", move || {
            ImportPackageStep::new(ImportExecutor::from_embedded_resource(
                services.clone(),
                PlanIdentity::new("Acme").unwrap(),
            ))
        })
        .step("Explode", || Explode)
        .build()
        .unwrap();

    assert!(runner.run(&plan).is_err());

    let conn = runner.database().connection();
    let audit_exists: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'acme_audit'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(audit_exists, 0);
    assert_eq!(count_rows(conn, "content_node"), 0);
    assert_eq!(runner.installed_state("Acme").unwrap(), None);
    assert!(fx.media_files().is_empty());

    // Still pending, so the next run retries
    assert!(runner.is_pending(&plan).unwrap());
}

#[test]
fn test_standalone_manifest_wins_over_archive_manifest() {
    let fx = Fixture::new();
    fx.write_resource("Acme.package.xml", manifest_xml(false).as_bytes());
    let archived = manifest_xml(false).replace("Welcome", "From the archive");
    fx.write_resource(
        "Acme.package.zip",
        &zip_bytes(&[("package.xml", archived.as_bytes())]),
    );

    let runner = fx.runner();
    runner
        .run(&import_plan(runner.services(), "Acme", "Acme", None))
        .unwrap();

    let name: String = runner
        .database()
        .connection()
        .query_row(
            "SELECT name FROM content_node WHERE key = ?1",
            [HOME_KEY],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(name, "Welcome");
}

#[test]
fn test_archive_only_package_installs() {
    let fx = Fixture::new();
    fx.write_resource(
        "Acme.package.zip",
        &zip_bytes(&[
            ("package.xml", manifest_xml(true).as_bytes()),
            ("media/img/logo.png", b"png-bytes"),
        ]),
    );

    let runner = fx.runner();
    let outcome = runner
        .run(&import_plan(runner.services(), "Acme", "Acme", None))
        .unwrap();
    assert!(outcome.was_applied());
    assert_eq!(count_rows(runner.database().connection(), "content_node"), 3);
    assert_eq!(fx.media_files().len(), 1);
}

#[test]
fn test_missing_resources_cannot_build_plan() {
    let fx = Fixture::new();
    let services = fx.services();
    let descriptor = parcel::migration::PackagePlanDescriptor {
        name: "Ghost".to_string(),
        namespace: "Ghost".to_string(),
        version: None,
    };

    let err = descriptor.build_plan(&services).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("Ghost"));
}

#[test]
fn test_disabled_policy_records_state_without_content() {
    let fx = Fixture::new();
    fx.write_resource("Acme.package.xml", manifest_xml(false).as_bytes());

    let mut config = fx.config();
    config.run_schema_and_content_migrations = false;
    let runner = fx.runner_with(fx.services_with(config));

    let plan = import_plan(runner.services(), "Acme", "Acme", Some(Version::new(1, 0, 0)));
    assert!(runner.run(&plan).unwrap().was_applied());
    assert_eq!(count_rows(runner.database().connection(), "content_node"), 0);
    assert_eq!(runner.installed_state("Acme").unwrap().as_deref(), Some("1.0.0"));
}
