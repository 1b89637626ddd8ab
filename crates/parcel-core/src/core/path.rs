use crate::core::error::{ParcelError, ParcelResult};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Get the Parcel home directory
///
/// Platform-specific locations:
/// - Windows: %APPDATA%\parcel
/// - Linux: ~/.config/parcel
/// - macOS: ~/Library/Application Support/parcel
pub fn parcel_home() -> ParcelResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ParcelError::Path("Could not determine config directory".to_string()))?;
    Ok(config_dir.join("parcel"))
}

/// Get the config file path (`<parcel_home>/config.yaml`)
pub fn config_file() -> ParcelResult<PathBuf> {
    Ok(parcel_home()?.join("config.yaml"))
}

/// Get the data directory holding the database, media and package resources
///
/// Platform-specific locations:
/// - Windows: %APPDATA%\parcel\data
/// - Linux: ~/.local/share/parcel
/// - macOS: ~/Library/Application Support/parcel/data
pub fn data_dir() -> ParcelResult<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ParcelError::Path("Could not determine data directory".to_string()))?;
    if cfg!(target_os = "linux") {
        Ok(data_dir.join("parcel"))
    } else {
        Ok(data_dir.join("parcel").join("data"))
    }
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> ParcelResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Archive entry name for a manifest-declared media file path.
///
/// `"/img/logo.png"`, `"img/logo.png"` and `"\\img\\logo.png"` all map to
/// `"media/img/logo.png"`.
pub fn media_entry_path(media_file_path: &str) -> String {
    let normalized = media_file_path.trim().replace('\\', "/");
    if normalized.starts_with('/') {
        format!("media{}", normalized)
    } else {
        format!("media/{}", normalized)
    }
}

/// Final path segment of a manifest-declared media file path.
pub fn media_file_name(media_file_path: &str) -> ParcelResult<String> {
    media_file_path
        .replace('\\', "/")
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
        .ok_or_else(|| ParcelError::Manifest(format!("Invalid media file path: {}", media_file_path)))
}

/// Resolve a relative, forward-slash path under `root`, rejecting anything that
/// would escape it (absolute paths, `..`, drive prefixes).
pub fn safe_join(root: &Path, relative: &str) -> ParcelResult<PathBuf> {
    let relative = relative.replace('\\', "/");
    let candidate = Path::new(relative.trim_start_matches('/'));
    let mut joined = root.to_path_buf();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::CurDir => {}
            _ => {
                return Err(ParcelError::Path(format!(
                    "Refusing unsafe relative path: {}",
                    relative
                )))
            }
        }
    }
    Ok(joined)
}
