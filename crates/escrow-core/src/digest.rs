//! # Content Digest — SHA-256 over Canonical Bytes
//!
//! `ContentDigest` can only be computed from [`CanonicalBytes`], so every
//! digest in the system is taken over the canonical encoding and never over
//! an ad-hoc serialization.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::bytes::bytes_to_hex;
use crate::canonical::CanonicalBytes;

/// The hash algorithm that produced a content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256.
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content-addressed digest with its algorithm tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Create a new content digest from raw bytes and algorithm.
    ///
    /// Prefer [`sha256_digest()`] for anything computed locally.
    pub fn new(algorithm: DigestAlgorithm, bytes: [u8; 32]) -> Self {
        Self { algorithm, bytes }
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(self.bytes)
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
///
/// Accepts only `&CanonicalBytes`, not raw `&[u8]`.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    ContentDigest::new(DigestAlgorithm::Sha256, hash.into())
}

/// Compute a SHA-256 hex string from canonical bytes.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    sha256_digest(data).to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TicketValue;

    #[test]
    fn test_sha256_digest_deterministic() {
        let cb = CanonicalBytes::encode(&TicketValue::map([("a", 1), ("b", 2)])).unwrap();
        let d1 = sha256_digest(&cb);
        let d2 = sha256_digest(&cb);
        assert_eq!(d1, d2);
        assert_eq!(d1.algorithm, DigestAlgorithm::Sha256);
    }

    #[test]
    fn test_known_sha256_vector() {
        // The empty map encodes as the single byte 0xa0.
        let cb = CanonicalBytes::encode(&TicketValue::map(Vec::<(String, TicketValue)>::new()))
            .unwrap();
        assert_eq!(cb.as_bytes(), [0xa0]);
        assert_eq!(
            sha256_hex(&cb),
            "c19a797fa1fd590cd2e5b42d1cf5f246e29b91684e2f87404b81dc345c7a56a0"
        );
    }

    #[test]
    fn test_content_digest_display() {
        let cb = CanonicalBytes::encode(&TicketValue::from(1)).unwrap();
        let s = sha256_digest(&cb).to_string();
        assert!(s.starts_with("sha256:"));
        assert_eq!(s.len(), 7 + 64);
    }

    #[test]
    fn test_different_inputs_different_digests() {
        let cb1 = CanonicalBytes::encode(&TicketValue::map([("a", 1)])).unwrap();
        let cb2 = CanonicalBytes::encode(&TicketValue::map([("a", 2)])).unwrap();
        assert_ne!(sha256_digest(&cb1), sha256_digest(&cb2));
    }
}
