use super::*;
use predicates::prelude::*;

#[test]
fn test_migrate_applies_core_plan_once() {
    let ctx = TestContext::new();

    ctx.parcel()
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ core: installed 10.0.0"))
        .stdout(predicate::str::contains("1 applied"));

    ctx.parcel()
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 applied"));
}

#[test]
fn test_migrate_discovers_descriptors() {
    let ctx = TestContext::new();
    let packages = ctx.temp.child("packages");
    packages
        .child("Acme.package.xml")
        .write_str(&manifest_xml(false))
        .unwrap();
    packages
        .child("Acme.plan.yaml")
        .write_str("name: Acme\nnamespace: Acme\nversion: 1.0.0\n")
        .unwrap();

    ctx.parcel()
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Acme: installed 1.0.0"));

    ctx.parcel()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme 1.0.0"));
}

#[test]
fn test_migrate_selected_package_still_runs_core() {
    let ctx = TestContext::new();
    let packages = ctx.temp.child("packages");
    packages
        .child("Acme.package.xml")
        .write_str(&manifest_xml(false))
        .unwrap();
    packages
        .child("Acme.plan.yaml")
        .write_str("name: Acme\nnamespace: Acme\nversion: 1.0.0\n")
        .unwrap();

    ctx.parcel()
        .args(["migrate", "--package", "Acme"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ core: installed 10.0.0"))
        .stdout(predicate::str::contains("✓ Acme: installed 1.0.0"))
        .stdout(predicate::str::contains("2 plan(s) checked, 2 applied"));
}

#[test]
fn test_migrate_unknown_package() {
    let ctx = TestContext::new();
    ctx.parcel()
        .args(["migrate", "--package", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No migration plan for package 'Nope'"));
}

#[test]
fn test_hash_of_published_resources() {
    let ctx = TestContext::new();
    ctx.temp
        .child("packages")
        .child("Acme.package.xml")
        .write_str(&manifest_xml(false))
        .unwrap();

    ctx.parcel()
        .args(["hash", "Acme"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("sha256:"));

    ctx.parcel()
        .args(["hash", "Missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing embedded resources for migration: Missing"));
}
