//! Several instances starting against one shared database

use super::common::*;
use parcel::config::LockStrategy;
use parcel::migration::RunOutcome;
use parcel::Version;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_two_instances_apply_plan_once() {
    let fx = Arc::new(Fixture::new());
    fx.write_resource("Acme.package.xml", manifest_xml(true).as_bytes());
    fx.write_resource(
        "Acme.package.zip",
        &zip_bytes(&[("media/img/logo.png", b"png-bytes")]),
    );
    // Create the schema before the race
    drop(fx.runner());

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["web-01", "web-02"]
        .into_iter()
        .map(|instance| {
            let fx = fx.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let mut config = fx.config();
                config.instance_id = instance.to_string();
                assert_eq!(config.lock.strategy, LockStrategy::Lease);

                let runner = fx.runner_with(fx.services_with(config));
                let plan = import_plan(runner.services(), "Acme", "Acme", Some(Version::new(1, 0, 0)));
                barrier.wait();
                runner.run(&plan).unwrap()
            })
        })
        .collect();

    let outcomes: Vec<RunOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(outcomes.iter().filter(|o| o.was_applied()).count(), 1);

    let runner = fx.runner();
    let conn = runner.database().connection();
    assert_eq!(count_rows(conn, "content_node"), 3);
    assert_eq!(count_rows(conn, "installed_package_history"), 1);
    assert_eq!(count_rows(conn, "migration_lock"), 0);
    assert_eq!(fx.media_files().len(), 1);
}

#[test]
fn test_stale_lease_is_taken_over() {
    let fx = Fixture::new();
    fx.write_resource("Acme.package.xml", manifest_xml(false).as_bytes());
    let runner = fx.runner();
    runner
        .database()
        .connection()
        .execute(
            "INSERT INTO migration_lock (package_name, owner, acquired_at, expires_at)
             VALUES ('Acme', 'crashed-instance', 0, 1)",
            [],
        )
        .unwrap();

    let plan = import_plan(runner.services(), "Acme", "Acme", Some(Version::new(1, 0, 0)));
    assert!(runner.run(&plan).unwrap().was_applied());
}
