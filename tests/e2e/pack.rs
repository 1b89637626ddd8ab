use super::*;
use predicates::prelude::*;

fn write_definition(ctx: &TestContext) -> PathBuf {
    let source = ctx.temp.child("source");
    source.child("package.xml").write_str(&manifest_xml(true)).unwrap();
    source
        .child("media")
        .child("img")
        .child("logo.png")
        .write_binary(b"png-bytes")
        .unwrap();
    let definition = source.child("package.yaml");
    definition
        .write_str("name: Acme\nversion: 2.0.0\npackage_xml: package.xml\nmedia_dir: media\n")
        .unwrap();
    definition.to_path_buf()
}

#[test]
fn test_pack_unpack_migrate() {
    let ctx = TestContext::new();
    let definition = write_definition(&ctx);
    let dist = ctx.temp.child("dist");

    ctx.parcel()
        .arg("pack")
        .arg(&definition)
        .arg("--out")
        .arg(dist.path())
        .args(["--author", "Acme Ltd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Created"));
    dist.child("Acme.2.0.0.nupkg").assert(predicate::path::exists());

    ctx.parcel()
        .arg("unpack")
        .arg(dist.child("Acme.2.0.0.nupkg").path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Unpacked 3 resource(s)"));
    assert!(ctx.packages().join("Acme.plan.yaml").exists());

    ctx.parcel()
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Acme: installed 2.0.0"));

    let stored = ctx
        .media_root()
        .join("c0ffee00-0000-4000-8000-000000000002")
        .join("logo.png");
    assert_eq!(std::fs::read(stored).unwrap(), b"png-bytes");
}

#[test]
fn test_pack_without_author_fails() {
    let ctx = TestContext::new();
    let definition = write_definition(&ctx);

    ctx.parcel()
        .arg("pack")
        .arg(&definition)
        .env_remove("PARCEL_AUTHOR")
        .assert()
        .failure()
        .stderr(predicate::str::contains("author"));
}
