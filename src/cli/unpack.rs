use parcel::config::Config;
use parcel::core::ParcelResult;
use parcel::di::ConfigProvider;
use parcel::package::packager::extract_resources;
use std::path::PathBuf;

pub fn run(config: Config, package: PathBuf, dir: Option<PathBuf>) -> ParcelResult<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => config.resources_dir()?,
    };

    let written = extract_resources(&package, &dir)?;
    for path in &written {
        println!("  {}", path.display());
    }
    println!("✓ Unpacked {} resource(s) into {}", written.len(), dir.display());
    Ok(())
}
