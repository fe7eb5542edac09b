//! # Signed Envelopes
//!
//! The wire/storage form of a signed ticket:
//!
//! ```json
//! {
//!   "schema": "escrow.v1.SignedResolveTicket",
//!   "ticket_cbor_hex": "a8666163…",
//!   "signature_hex": "<128 lowercase hex>",
//!   "pubkey_hex": "<64 lowercase hex>"
//! }
//! ```
//!
//! Hex is emitted lowercase without a prefix; input may carry `0x`.
//!
//! ## Opening
//!
//! [`SignedEnvelope::open`] follows the receiving-side data flow: check the
//! schema tag, verify the signature over the carried bytes, then require
//! those bytes to be canonical and decode them. Non-canonical bytes are
//! rejected even when correctly signed, because their identity would not
//! match the identity other parties compute for the same ticket.

use escrow_core::{
    hex_to_bytes, CanonicalBytes, EncodingError, EscrowError, TicketId, TicketValue,
};
use escrow_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use serde::{Deserialize, Serialize};

/// Schema tag of the envelope format.
pub const ENVELOPE_SCHEMA: &str = "escrow.v1.SignedResolveTicket";

/// A ticket's canonical bytes with a detached signature and the signer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    /// Always [`ENVELOPE_SCHEMA`].
    pub schema: String,
    /// Lowercase hex of the canonical bytes.
    pub ticket_cbor_hex: String,
    /// Lowercase hex of the 64-byte signature.
    pub signature_hex: String,
    /// Lowercase hex of the 32-byte public key.
    pub pubkey_hex: String,
}

/// A verified, decoded envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedTicket {
    /// The decoded ticket.
    pub ticket: TicketValue,
    /// Its content-derived identity.
    pub id: TicketId,
    /// The key that signed it.
    pub signer: Ed25519PublicKey,
    /// The signature that was verified.
    pub signature: Ed25519Signature,
    /// The exact bytes that were signed.
    pub canonical: CanonicalBytes,
}

impl SignedEnvelope {
    /// Encode and sign a ticket with a 32-byte seed or 64-byte expanded
    /// secret.
    pub fn seal(ticket: &TicketValue, secret: &[u8]) -> Result<Self, EscrowError> {
        let keypair = Ed25519KeyPair::from_secret(secret)?;
        Ok(Self::seal_with(ticket, &keypair)?)
    }

    /// Encode and sign a ticket with an existing key pair.
    pub fn seal_with(ticket: &TicketValue, keypair: &Ed25519KeyPair) -> Result<Self, EncodingError> {
        let canonical = CanonicalBytes::encode(ticket)?;
        let signature = keypair.sign_canonical(&canonical);
        Ok(Self {
            schema: ENVELOPE_SCHEMA.to_string(),
            ticket_cbor_hex: canonical.to_hex(),
            signature_hex: signature.to_hex(),
            pubkey_hex: keypair.public_key().to_hex(),
        })
    }

    /// Check the signature over the carried bytes.
    ///
    /// # Errors
    ///
    /// Unknown schema tag, bad hex, or wrong signature/key lengths. A
    /// well-formed signature that does not verify is `Ok(false)`.
    pub fn verify(&self) -> Result<bool, EscrowError> {
        self.check_schema()?;
        let message = hex_to_bytes(&self.ticket_cbor_hex)?;
        let signature = hex_to_bytes(&self.signature_hex)?;
        let public_key = hex_to_bytes(&self.pubkey_hex)?;
        Ok(escrow_crypto::verify(&message, &signature, &public_key)?)
    }

    /// Verify, then decode the ticket from its canonical bytes.
    ///
    /// # Errors
    ///
    /// Everything [`verify`](Self::verify) reports, plus
    /// [`EscrowError::SignatureRejected`] for a forged or tampered envelope
    /// and [`EscrowError::Decoding`] for bytes that are not canonical.
    pub fn open(&self) -> Result<OpenedTicket, EscrowError> {
        if !self.verify()? {
            let signer = Ed25519PublicKey::from_hex(&self.pubkey_hex)?;
            tracing::warn!(signer = %signer.short(), "envelope signature rejected");
            return Err(EscrowError::SignatureRejected);
        }
        let canonical = CanonicalBytes::from_hex(&self.ticket_cbor_hex)?;
        let ticket = canonical.decode()?;
        Ok(OpenedTicket {
            id: TicketId::from_canonical(&canonical),
            signer: Ed25519PublicKey::from_hex(&self.pubkey_hex)?,
            signature: Ed25519Signature::from_hex(&self.signature_hex)?,
            ticket,
            canonical,
        })
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self, EscrowError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render as pretty JSON.
    pub fn to_json(&self) -> Result<String, EscrowError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check_schema(&self) -> Result<(), EscrowError> {
        if self.schema != ENVELOPE_SCHEMA {
            return Err(EscrowError::SchemaMismatch {
                expected: ENVELOPE_SCHEMA,
                actual: self.schema.clone(),
            });
        }
        Ok(())
    }
}
