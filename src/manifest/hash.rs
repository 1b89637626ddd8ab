use crate::core::ParcelResult;
use sha2::{Digest, Sha256};
use std::io::{self, Read};

pub const HASH_PREFIX: &str = "sha256:";

/// Incremental SHA-256 over a sequence of byte sources
pub struct ContentHasher {
    hasher: Sha256,
    bytes: u64,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            bytes: 0,
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
        self.bytes += bytes.len() as u64;
    }

    /// Stream a reader into the hash without buffering it whole
    pub fn update_reader(&mut self, reader: &mut dyn Read) -> ParcelResult<u64> {
        let copied = io::copy(reader, &mut self.hasher)?;
        self.bytes += copied;
        Ok(copied)
    }

    /// Total number of bytes hashed so far
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes
    }

    /// Finish as `sha256:<hex>`
    pub fn finish(self) -> String {
        format!("{}{}", HASH_PREFIX, hex::encode(self.hasher.finalize()))
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_content_hash(value: &str) -> bool {
    value
        .strip_prefix(HASH_PREFIX)
        .map(|hex| hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}
