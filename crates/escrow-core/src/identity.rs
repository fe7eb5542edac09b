//! # Ticket Identity — Content-Addressed Ticket IDs
//!
//! A ticket's identity is `ticket:v1:` followed by the lowercase hex SHA-256
//! of its canonical bytes. It depends only on the canonical encoding, never
//! on field interpretation, and is the sole key space for replay detection.
//!
//! ## Security Invariant
//!
//! Identities are recomputed from content, never trusted from transport.
//! [`verify_ticket_id`] exists so an envelope's claimed identity can be
//! checked against the ticket it actually carries.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bytes::hex_to_array;
use crate::canonical::CanonicalBytes;
use crate::digest::{sha256_digest, ContentDigest, DigestAlgorithm};
use crate::error::{EncodingError, EscrowError};
use crate::value::TicketValue;

/// Version tag prefixed to every ticket identity.
pub const TICKET_ID_PREFIX: &str = "ticket:v1:";

/// Content-derived identity of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TicketId([u8; 32]);

impl TicketId {
    /// Identity of already-encoded canonical bytes.
    pub fn from_canonical(bytes: &CanonicalBytes) -> Self {
        Self(sha256_digest(bytes).bytes)
    }

    /// The SHA-256 digest this identity wraps.
    pub fn digest(&self) -> ContentDigest {
        ContentDigest::new(DigestAlgorithm::Sha256, self.0)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{TICKET_ID_PREFIX}{}", self.digest().to_hex())
    }
}

impl FromStr for TicketId {
    type Err = EscrowError;

    /// Parse `ticket:v1:<64 hex>`. The digest must be lowercase so that the
    /// string form of an identity is unique.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix(TICKET_ID_PREFIX)
            .ok_or(EscrowError::SchemaMismatch {
                expected: TICKET_ID_PREFIX,
                actual: s.chars().take(TICKET_ID_PREFIX.len()).collect(),
            })?;
        if hex.len() != 64 || hex.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(EscrowError::FieldType {
                field: "ticket_id",
                expected: "64 lowercase hex characters after the version tag",
            });
        }
        Ok(Self(hex_to_array(hex)?))
    }
}

impl Serialize for TicketId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TicketId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Compute the identity of a ticket.
///
/// # Errors
///
/// Whatever the canonical encoder rejects.
pub fn ticket_id(ticket: &TicketValue) -> Result<TicketId, EncodingError> {
    let bytes = CanonicalBytes::encode(ticket)?;
    Ok(TicketId::from_canonical(&bytes))
}

/// Recompute a ticket's identity and compare it to a claimed one.
///
/// A claim that does not even parse as an identity is simply not a match.
pub fn verify_ticket_id(ticket: &TicketValue, claimed: &str) -> Result<bool, EncodingError> {
    let actual = ticket_id(ticket)?;
    Ok(actual.to_string() == claimed)
}
