use parcel::core::{ParcelResult, Version};
use parcel::package::{PackageDefinition, PackageRepackager};
use std::env;
use std::path::PathBuf;

pub fn run(definition: PathBuf, out: Option<PathBuf>, author: Option<String>) -> ParcelResult<()> {
    let definition = PackageDefinition::load(&definition)?;
    let author = author.or_else(|| env::var("PARCEL_AUTHOR").ok());
    let host_version = Version::parse(env!("CARGO_PKG_VERSION"))?;

    println!("Packing {} {}...", definition.name, definition.version);
    let package = PackageRepackager::new(author, host_version).create_package(&definition)?;

    let out_dir = match out {
        Some(dir) => dir,
        None => env::current_dir()?,
    };
    let path = package.write_to(&out_dir)?;

    println!("✓ Created {} ({} bytes)", path.display(), package.bytes.len());
    Ok(())
}
