//! Hashing utilities for archive checksums.

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Compute the SHA1 hash of a byte slice.
pub fn sha1_bytes(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

/// Compute the SHA256 hash of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hash algorithm implied by the length of a hex digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    Sha1,
    Sha256,
}

impl ChecksumKind {
    /// Detect the algorithm from a declared checksum.
    ///
    /// Declarations carry sha1 sums; a 64 digit value is taken as sha256.
    pub fn detect(expected: &str) -> ChecksumKind {
        if expected.trim().len() == 64 {
            ChecksumKind::Sha256
        } else {
            ChecksumKind::Sha1
        }
    }

    pub fn digest(self, data: &[u8]) -> String {
        match self {
            ChecksumKind::Sha1 => sha1_bytes(data),
            ChecksumKind::Sha256 => sha256_bytes(data),
        }
    }
}

/// Compare downloaded bytes against a declared checksum.
///
/// Returns the actual digest on mismatch.
pub fn verify_checksum(data: &[u8], expected: &str) -> std::result::Result<(), String> {
    let actual = ChecksumKind::detect(expected).digest(data);
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(actual)
    }
}
