//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout the escrow ticket stack. All
//! errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Every failure is a local, synchronous input-validation failure. Nothing
//!   here is transient, so nothing is retried internally.
//! - Malformed input (bad hex, wrong lengths, truncated CBOR) is always a
//!   typed error. A well-formed signature that does not verify is a boolean
//!   `false`, never an error, so auditors can tell "malformed" from "forged".
//! - No variant ever carries secret key material.

use thiserror::Error;

/// Top-level error type for the escrow ticket stack.
#[derive(Error, Debug)]
pub enum EscrowError {
    /// Hex input could not be decoded.
    #[error(transparent)]
    Hex(#[from] HexError),

    /// A ticket value could not be canonically encoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Canonical bytes could not be decoded.
    #[error(transparent)]
    Decoding(#[from] DecodingError),

    /// Key or signature material had the wrong shape.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A field the operation depends on is missing from the ticket.
    #[error("ticket is missing required field `{0}`")]
    MissingField(&'static str),

    /// A field the operation depends on has the wrong type.
    #[error("ticket field `{field}` must be {expected}")]
    FieldType {
        /// Field name.
        field: &'static str,
        /// Human-readable description of the expected type.
        expected: &'static str,
    },

    /// An envelope carried an unknown schema tag.
    #[error("schema mismatch: expected {expected:?}, got {actual:?}")]
    SchemaMismatch {
        /// The schema tag this implementation understands.
        expected: &'static str,
        /// The schema tag found in the input.
        actual: String,
    },

    /// A well-formed signature did not verify against its claimed key.
    #[error("signature rejected: not produced by the claimed public key over these bytes")]
    SignatureRejected,

    /// JSON serialization or parsing failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Hex input could not be decoded (`InvalidHexInput`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    /// Nothing left after trimming and prefix removal.
    #[error("invalid hex input: empty string")]
    Empty,

    /// Hex strings encode whole bytes, so their length must be even.
    #[error("invalid hex input: odd length {0}")]
    OddLength(usize),

    /// A character outside `[0-9a-fA-F]`.
    #[error("invalid hex input: character {character:?} at index {index}")]
    InvalidCharacter {
        /// The offending character.
        character: char,
        /// Its index in the (prefix-stripped) input.
        index: usize,
    },

    /// Valid hex, but the decoded byte count is not the one required.
    #[error("invalid hex input: expected {expected} bytes, got {actual}")]
    WrongLength {
        /// Required byte count.
        expected: usize,
        /// Decoded byte count.
        actual: usize,
    },
}

/// A ticket value could not be canonically encoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// An `Absent` marker was found. Absence is never encoded.
    #[error("absent value at {path}: every present key must map to an explicit value")]
    AbsentValue {
        /// Location of the offending node, e.g. `/parties/0/name`.
        path: String,
    },

    /// Integer outside the CBOR major type 0/1 range `[-2^64, 2^64 - 1]`.
    #[error("integer at {path} is outside the encodable range")]
    IntegerOutOfRange {
        /// Location of the offending node.
        path: String,
    },

    /// Arrays and maps nested deeper than the decoder will follow.
    #[error("value at {path} is nested more than {max} levels deep")]
    TooDeep {
        /// Location of the first container past the limit.
        path: String,
        /// The nesting limit.
        max: usize,
    },

    /// JSON numbers cannot carry NaN or infinities.
    #[error("float at {path} has no JSON representation")]
    NonFiniteFloat {
        /// Location of the offending node.
        path: String,
    },
}

/// Canonical bytes could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodingError {
    /// Truncated or otherwise invalid CBOR.
    #[error("malformed CBOR: {0}")]
    Malformed(String),

    /// Bytes remain after the top-level item.
    #[error("{0} trailing bytes after the encoded value")]
    TrailingBytes(usize),

    /// A well-formed CBOR item that the ticket data model has no room for.
    #[error("unsupported CBOR item: {0}")]
    UnsupportedItem(&'static str),

    /// Arrays and maps nested deeper than the encoder would ever produce.
    #[error("input is nested more than {0} levels deep")]
    TooDeep(usize),

    /// Map keys must be text strings.
    #[error("map key is not a text string")]
    NonStringKey,

    /// The same key appears twice in one map.
    #[error("duplicate map key {0:?}")]
    DuplicateKey(String),

    /// Well-formed, but not the byte image the canonical encoder produces.
    #[error("input is not in canonical form")]
    NonCanonical,
}

/// Key or signature material had the wrong shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Secret not 32/64 bytes, or public key not 32 bytes.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Accepted lengths, e.g. `"32"` or `"32 or 64"`.
        expected: &'static str,
        /// Supplied length.
        actual: usize,
    },

    /// Ed25519 signatures are exactly 64 bytes.
    #[error("invalid signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),
}
