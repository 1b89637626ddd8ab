use crate::core::error::{ParcelError, ParcelResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A plan target version ("10.0.0", "1.0.0.1", "1.2.0-rc.1", "2.0.0+build.7").
///
/// Serialized as its string form so it reads naturally in plan descriptors
/// and in the installed-package table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Fourth component of assembly-style versions ("1.0.0.1")
    pub revision: Option<u64>,
    /// Pre-release identifiers (e.g., "alpha.1", "rc.2")
    pub prerelease: Option<String>,
    /// Build metadata, ignored for precedence
    pub build_metadata: Option<String>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            revision: None,
            prerelease: None,
            build_metadata: None,
        }
    }

    /// Parse "1", "1.2", "1.2.3", "1.2.3-rc.1", "1.2.3+build.5" and the four-part
    /// assembly style "1.0.0.1".
    pub fn parse(s: &str) -> ParcelResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParcelError::Version("Empty version string".to_string()));
        }

        let (rest, build_metadata) = match s.split_once('+') {
            Some((v, b)) => (v, Some(b.to_string())),
            None => (s, None),
        };

        let (core, prerelease) = match rest.split_once('-') {
            Some((v, p)) if !p.is_empty() => (v, Some(p.to_string())),
            Some(_) => {
                return Err(ParcelError::Version(format!(
                    "Invalid pre-release in version: {}",
                    s
                )))
            }
            None => (rest, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 4 {
            return Err(ParcelError::Version(format!(
                "Too many version components: {}",
                s
            )));
        }

        let mut numbers = [0u64; 4];
        for (i, part) in parts.iter().enumerate() {
            numbers[i] = part
                .parse()
                .map_err(|_| ParcelError::Version(format!("Invalid version component '{}' in {}", part, s)))?;
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            revision: (parts.len() == 4).then_some(numbers[3]),
            prerelease,
            build_metadata,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = ParcelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::parse(&value)
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

// Build metadata does not take part in equality or precedence
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch, self.revision.unwrap_or(0))
            .cmp(&(
                other.major,
                other.minor,
                other.patch,
                other.revision.unwrap_or(0),
            ))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => compare_prerelease(a, b),
            })
    }
}

fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let a_parts: Vec<&str> = a.split('.').collect();
    let b_parts: Vec<&str> = b.split('.').collect();

    for (a_part, b_part) in a_parts.iter().zip(b_parts.iter()) {
        let ordering = match (a_part.parse::<u64>(), b_part.parse::<u64>()) {
            (Ok(a_num), Ok(b_num)) => a_num.cmp(&b_num),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => a_part.cmp(b_part),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    a_parts.len().cmp(&b_parts.len())
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(revision) = self.revision {
            write!(f, ".{}", revision)?;
        }
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }
        if let Some(ref build) = self.build_metadata {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}
