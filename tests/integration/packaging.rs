//! Building a package, unpacking it and installing it through discovery

use super::common::*;
use parcel::migration::discover_plans;
use parcel::package::packager::extract_resources;
use parcel::package::{PackageDefinition, PackageRepackager};
use parcel::Version;
use std::fs;

fn definition(fx: &Fixture) -> PackageDefinition {
    let source = fx.temp.path().join("source");
    fs::create_dir_all(source.join("media").join("img")).unwrap();
    fs::write(source.join("package.xml"), manifest_xml(true)).unwrap();
    fs::write(source.join("media").join("img").join("logo.png"), b"png-bytes").unwrap();
    fs::write(
        source.join("package.yaml"),
        "name: Acme Site\nversion: 1.2.0\npackage_xml: package.xml\nmedia_dir: media\n",
    )
    .unwrap();
    PackageDefinition::load(&source.join("package.yaml")).unwrap()
}

#[test]
fn test_built_package_installs_through_discovery() {
    let fx = Fixture::new();
    let repackager = PackageRepackager::new(Some("Acme Ltd".to_string()), Version::new(0, 1, 0));
    let package = repackager.create_package(&definition(&fx)).unwrap();
    assert_eq!(package.namespace, "Acme.Site");
    assert_eq!(package.file_name, "Acme.Site.1.2.0.nupkg");

    let out = fx.temp.path().join("out");
    let path = package.write_to(&out).unwrap();
    let written = extract_resources(&path, &fx.resources).unwrap();
    assert_eq!(written.len(), 3);
    assert!(fx.resources.join("Acme.Site.package.xml").exists());
    assert!(fx.resources.join("Acme.Site.package.zip").exists());
    assert!(fx.resources.join("Acme.Site.plan.yaml").exists());

    let runner = fx.runner();
    let plans = discover_plans(&fx.resources, runner.services()).unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].package_name(), "Acme.Site");

    let outcomes = runner.run_all(&plans).unwrap();
    assert!(outcomes[0].1.was_applied());
    assert_eq!(runner.installed_state("Acme.Site").unwrap().as_deref(), Some("1.2.0"));
    assert_eq!(count_rows(runner.database().connection(), "content_node"), 3);
    assert_eq!(fx.media_files().len(), 1);

    // Redeploying the same package changes nothing
    let outcomes = runner.run_all(&plans).unwrap();
    assert!(!outcomes[0].1.was_applied());
}

#[test]
fn test_package_without_author_is_rejected() {
    let fx = Fixture::new();
    let repackager = PackageRepackager::new(None, Version::new(0, 1, 0));
    let err = repackager.create_package(&definition(&fx)).unwrap_err();
    assert!(err.to_string().contains("author"));
}
