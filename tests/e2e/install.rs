use super::*;
use predicates::prelude::*;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

fn zip_with_entry(name: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(name, FileOptions::default()).unwrap();
    writer.write_all(b"bytes").unwrap();
    writer.finish().unwrap().into_inner()
}

#[test]
fn test_install_manifest_then_status() {
    let ctx = TestContext::new();
    let manifest = ctx.temp.child("drop").child("Acme.package.xml");
    manifest.write_str(&manifest_xml(false)).unwrap();

    ctx.parcel()
        .arg("install")
        .arg(manifest.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Acme"));

    ctx.parcel()
        .arg("install")
        .arg(manifest.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));

    let output = ctx.parcel().args(["status", "--json"]).output().unwrap();
    assert!(output.status.success());
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let packages = status.as_array().unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["package_name"], "Acme");
    assert!(packages[0]["state"].as_str().unwrap().starts_with("sha256:"));
    assert_eq!(packages[0]["history"].as_array().unwrap().len(), 1);
}

#[test]
fn test_install_with_missing_media_fails() {
    let ctx = TestContext::new();
    let drop_dir = ctx.temp.child("drop");
    drop_dir
        .child("Acme.package.xml")
        .write_str(&manifest_xml(true))
        .unwrap();
    drop_dir
        .child("Acme.package.zip")
        .write_binary(&zip_with_entry("media/img/other.png"))
        .unwrap();

    ctx.parcel()
        .arg("install")
        .arg(drop_dir.child("Acme.package.xml").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No media file found"));

    ctx.parcel()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No installed packages."));
}

#[test]
fn test_install_rejects_unknown_file_name() {
    let ctx = TestContext::new();
    let file = ctx.temp.child("acme.xml");
    file.write_str(&manifest_xml(false)).unwrap();

    ctx.parcel()
        .arg("install")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("<namespace>.package.xml"));
}

#[test]
fn test_install_with_explicit_archive() {
    let ctx = TestContext::new();
    let manifest = ctx.temp.child("drop").child("Acme.package.xml");
    manifest.write_str(&manifest_xml(true)).unwrap();
    let archive = ctx.temp.child("elsewhere").child("media.zip");
    archive
        .write_binary(&zip_with_entry("media/img/logo.png"))
        .unwrap();

    ctx.parcel()
        .arg("install")
        .arg(manifest.path())
        .arg("--archive")
        .arg(archive.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Acme"));

    let stored = ctx
        .media_root()
        .join("c0ffee00-0000-4000-8000-000000000002")
        .join("logo.png");
    assert_eq!(std::fs::read(stored).unwrap(), b"bytes");
}
