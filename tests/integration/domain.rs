//! The core plan's domain sort order upgrade and domain assignment afterwards

use super::common::*;
use parcel::core::ParcelError;
use parcel::migration::{core_plan, RunOutcome};
use parcel::package::{Domain, DomainRepository};

fn seed_pre_upgrade(fx: &Fixture) {
    let runner = fx.runner();
    runner
        .database()
        .connection()
        .execute_batch(
            "INSERT INTO content_node (id, key, object_type, type_alias, name, created_at)
                 VALUES (1, 'root-1', 'document', 'home', 'Site One', 'now');
             INSERT INTO content_node (id, key, object_type, type_alias, name, created_at)
                 VALUES (2, 'root-2', 'document', 'home', 'Site Two', 'now');
             INSERT INTO domain (domain_name, root_content_id) VALUES ('one.example', 1);
             INSERT INTO domain (domain_name, root_content_id) VALUES ('*.one.example', 1);
             INSERT INTO domain (domain_name, root_content_id) VALUES ('two.example', 2);",
        )
        .unwrap();
}

#[test]
fn test_core_plan_backfills_sort_order_once() {
    let fx = Fixture::new();
    seed_pre_upgrade(&fx);

    let runner = fx.runner();
    let plan = core_plan().unwrap();
    let outcome = runner.run(&plan).unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Applied {
            previous: None,
            state: "10.0.0".to_string(),
            steps: 1,
        }
    );

    let repo = DomainRepository::new(runner.database().connection());
    let orders: Vec<(String, i64)> = repo
        .get_all(true)
        .unwrap()
        .into_iter()
        .map(|d| (d.domain_name, d.sort_order))
        .collect();
    assert_eq!(
        orders,
        vec![
            ("*.one.example".to_string(), -1),
            ("one.example".to_string(), 1),
            ("two.example".to_string(), 3),
        ]
    );

    // A second process start finds nothing to do
    let again = fx.runner().run(&plan).unwrap();
    assert!(matches!(again, RunOutcome::UpToDate { .. }));
}

#[test]
fn test_new_domains_append_after_upgrade() {
    let fx = Fixture::new();
    seed_pre_upgrade(&fx);
    let runner = fx.runner();
    runner.run(&core_plan().unwrap()).unwrap();

    let repo = DomainRepository::new(runner.database().connection());
    let mut shop = Domain::new("shop.one.example", Some(1));
    repo.save(&mut shop).unwrap();
    assert_eq!(shop.sort_order, 2);

    let mut wildcard = Domain::new("*.two.example", Some(2));
    repo.save(&mut wildcard).unwrap();
    assert_eq!(wildcard.sort_order, -1);

    let assigned: Vec<String> = repo
        .assigned_domains(1, false)
        .unwrap()
        .into_iter()
        .map(|d| d.domain_name)
        .collect();
    assert_eq!(assigned, vec!["one.example", "shop.one.example"]);
}

#[test]
fn test_duplicate_domain_name_is_rejected() {
    let fx = Fixture::new();
    seed_pre_upgrade(&fx);
    let runner = fx.runner();
    runner.run(&core_plan().unwrap()).unwrap();

    let repo = DomainRepository::new(runner.database().connection());
    let mut duplicate = Domain::new("ONE.example", Some(2));
    match repo.save(&mut duplicate) {
        Err(ParcelError::DuplicateName(msg)) => {
            assert!(msg.contains("The domain name ONE.example is already assigned"))
        }
        other => panic!("Expected DuplicateName, got {:?}", other),
    }
    assert_eq!(duplicate.id, None);
}
