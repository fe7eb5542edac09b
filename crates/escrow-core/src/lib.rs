//! # escrow-core — Foundational Types for Resolution Tickets
//!
//! A resolution ticket tells an escrow process how to finalize a disputed
//! transaction. Arbiters, verifiers, and escrow programs written against
//! different runtimes must agree byte-for-byte on what was signed. This
//! crate owns that agreement: the generic value model, its canonical CBOR
//! encoding, the SHA-256 digest over it, and the content-derived ticket
//! identity. Every other crate in the workspace depends on `escrow-core`; it
//! depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** All bytes that get signed or hashed at
//!    the ticket layer flow through `CanonicalBytes::encode()` or are proven
//!    canonical by `CanonicalBytes::from_encoded()`.
//!
//! 2. **Absence is unrepresentable on the wire.** `TicketValue::Absent`
//!    exists only so loosely typed callers can be rejected with a path to
//!    the offending field.
//!
//! 3. **`sha256_digest()` accepts only `&CanonicalBytes`.** Ticket identities
//!    are therefore always taken over the canonical encoding.
//!
//! 4. **Typed errors.** Malformed input is a typed error; a forged but
//!    well-formed signature is a `false`, handled in `escrow-crypto`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `escrow-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod bytes;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use bytes::{bytes_to_hex, bytes_to_hex_prefixed, hex_to_array, hex_to_bytes};
pub use canonical::{
    decode, decode_canonical, encode, is_deterministic, CanonicalBytes, MAX_DEPTH,
};
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use error::{CryptoError, DecodingError, EncodingError, EscrowError, HexError};
pub use identity::{ticket_id, verify_ticket_id, TicketId, TICKET_ID_PREFIX};
pub use value::TicketValue;
