//! # escrow-crypto — Signature Engine
//!
//! Detached Ed25519 signatures over resolution-ticket bytes:
//!
//! - **`sign`** with a 32-byte seed or 64-byte expanded secret.
//! - **`verify`** with length checks that fail loudly before any
//!   cryptographic comparison, so malformed input is distinguishable from
//!   a forgery.
//! - **`derive_public_key`** from the same secret forms.
//!
//! All operations are pure functions: no key storage, no randomness, no I/O.
//! Key generation and custody belong to the caller.
//!
//! ## Crate Policy
//!
//! - Depends only on `escrow-core` internally.
//! - No mocking of cryptographic operations in tests; all tests use real
//!   canonical bytes and real Ed25519.
//! - No `unsafe` code.

pub mod ed25519;

pub use ed25519::{
    derive_public_key, sign, verify, verify_canonical, verify_signature, Ed25519KeyPair,
    Ed25519PublicKey, Ed25519Signature,
};
