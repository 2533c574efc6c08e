// testdeck-core/src/core/hashing.rs
// ============================================================================
// Module: Testdeck Credential Hashing
// Description: Content hashing utilities for credential fingerprints.
// Purpose: Derive deterministic cache keys without persisting raw credentials.
// Dependencies: serde, sha2
// ============================================================================

//! ## Overview
//! Testdeck never stores a raw bearer credential. The credential cache is
//! keyed by a one-way SHA-256 digest of the credential bytes, so presenting
//! the exact same credential string maps to the same cache row while the
//! stored value reveals nothing about the credential itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use super::identifiers::CredentialFingerprint;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported hash algorithms for credential fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing (FIPS-friendly default).
    Sha256,
}

/// Default hash algorithm for fingerprints.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Deterministic content hash representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Creates a new digest from raw bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Hashes raw bytes using the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            let digest = hasher.finalize();
            HashDigest::new(HashAlgorithm::Sha256, &digest)
        }
    }
}

/// Derives the cache-key fingerprint for a raw bearer credential.
#[must_use]
pub fn fingerprint_credential(raw_credential: &str) -> CredentialFingerprint {
    let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, raw_credential.as_bytes());
    CredentialFingerprint::new(digest.value)
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    //! Fingerprint determinism checks.
    #![allow(clippy::unwrap_used, reason = "Test-only assertions use unwrap for clarity.")]

    use super::fingerprint_credential;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = fingerprint_credential("credential-a");
        let b = fingerprint_credential("credential-a");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_distinguishes_inputs() {
        let a = fingerprint_credential("credential-a");
        let b = fingerprint_credential("credential-b");
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        let digest = fingerprint_credential("credential-a");
        assert_eq!(digest.as_str().len(), 64);
        assert!(digest.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
