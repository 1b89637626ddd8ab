use crate::core::{ParcelError, ParcelResult};
use regex::Regex;

const NAMESPACE_PATTERN: &str = r"(@?[a-z_A-Z]\w+(?:\.@?[a-z_A-Z]\w+)*)";

/// Reduce a free-form package name to a dotted namespace
///
/// Identifier runs are kept and joined with `.`; everything else is dropped.
/// Returns an empty string when nothing usable remains.
pub fn clean_namespace(input: &str) -> ParcelResult<String> {
    let re = Regex::new(NAMESPACE_PATTERN)
        .map_err(|e| ParcelError::Config(format!("Invalid regex: {}", e)))?;
    let parts: Vec<&str> = re.find_iter(input).map(|m| m.as_str()).collect();
    Ok(parts.join("."))
}
