//! # Quorum Verification
//!
//! Counts independent, authorized, valid signatures over one ticket and
//! compares the count to a threshold.
//!
//! ## Counting Rules
//!
//! Signatures are considered in the order supplied. Each one is:
//!
//! 1. skipped if its key is not byte-equal to an authorized key;
//! 2. skipped if its key already contributed a counted signature in this
//!    evaluation (one signer, one vote, however many signatures it sends);
//! 3. skipped if it does not verify over the ticket's canonical bytes;
//! 4. otherwise counted, and its key marked as used.
//!
//! Deduplication is by public key only. A key listed under two roles is
//! still one signer.
//!
//! A threshold of 0 is met with no signatures at all. That is a policy
//! choice for the caller, not an error.
//!
//! Each signer's outcome is kept in the [`QuorumReport`] so audit logs can
//! separate "not an authorized signer" from "signature invalid".

use std::collections::HashSet;

use escrow_core::{CanonicalBytes, EncodingError, EscrowError, TicketValue};
use escrow_crypto::{verify_canonical, Ed25519PublicKey, Ed25519Signature};
use serde::{Deserialize, Serialize};

/// One piece of quorum evidence: a signer's key and its detached signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumSignature {
    /// Claimed signer.
    #[serde(rename = "pubkey_hex")]
    pub public_key: Ed25519PublicKey,
    /// Detached signature over the ticket's canonical bytes.
    #[serde(rename = "signature_hex")]
    pub signature: Ed25519Signature,
}

impl QuorumSignature {
    /// Pair an already-parsed key and signature.
    pub fn new(public_key: Ed25519PublicKey, signature: Ed25519Signature) -> Self {
        Self {
            public_key,
            signature,
        }
    }

    /// Parse raw bytes, enforcing the 32/64-byte lengths.
    pub fn from_bytes(public_key: &[u8], signature: &[u8]) -> Result<Self, EscrowError> {
        Ok(Self::new(
            Ed25519PublicKey::try_from(public_key)?,
            Ed25519Signature::try_from(signature)?,
        ))
    }

    /// Parse hex (optional `0x`).
    pub fn from_hex(public_key: &str, signature: &str) -> Result<Self, EscrowError> {
        Ok(Self::new(
            Ed25519PublicKey::from_hex(public_key)?,
            Ed25519Signature::from_hex(signature)?,
        ))
    }
}

/// What happened to one submitted signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerOutcome {
    /// Authorized, first counted signature from this key, and valid.
    Counted,
    /// Key is not on the allowlist.
    Unauthorized,
    /// Key already contributed a counted signature.
    DuplicateSigner,
    /// Authorized, but the signature does not verify.
    InvalidSignature,
}

impl std::fmt::Display for SignerOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Counted => "counted",
            Self::Unauthorized => "unauthorized",
            Self::DuplicateSigner => "duplicate_signer",
            Self::InvalidSignature => "invalid_signature",
        };
        f.write_str(s)
    }
}

/// Outcome for one submitted signature, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerReport {
    /// The key the signature claimed.
    pub public_key: Ed25519PublicKey,
    /// What happened to it.
    pub outcome: SignerOutcome,
}

/// Result of a quorum evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumReport {
    /// Per-signature outcomes, in submission order.
    pub signers: Vec<SignerReport>,
    /// Number of counted signatures.
    pub valid_count: usize,
    /// Required count.
    pub threshold: usize,
}

impl QuorumReport {
    /// Whether enough independent signers approved.
    pub fn is_met(&self) -> bool {
        self.valid_count >= self.threshold
    }

    /// How many submissions ended with `outcome`.
    pub fn count(&self, outcome: SignerOutcome) -> usize {
        self.signers.iter().filter(|s| s.outcome == outcome).count()
    }
}

/// Evaluate quorum evidence for a ticket, keeping each signer's outcome.
///
/// # Errors
///
/// Only if the ticket itself cannot be canonically encoded.
pub fn evaluate_quorum(
    ticket: &TicketValue,
    signatures: &[QuorumSignature],
    authorized_keys: &[Ed25519PublicKey],
    threshold: usize,
) -> Result<QuorumReport, EncodingError> {
    let canonical = CanonicalBytes::encode(ticket)?;
    Ok(evaluate_canonical(&canonical, signatures, authorized_keys, threshold))
}

/// Evaluate quorum evidence over bytes that are already canonical.
pub fn evaluate_canonical(
    canonical: &CanonicalBytes,
    signatures: &[QuorumSignature],
    authorized_keys: &[Ed25519PublicKey],
    threshold: usize,
) -> QuorumReport {
    let authorized: HashSet<&Ed25519PublicKey> = authorized_keys.iter().collect();
    let mut counted: HashSet<Ed25519PublicKey> = HashSet::new();
    let mut signers = Vec::with_capacity(signatures.len());

    for submission in signatures {
        let key = submission.public_key;
        let outcome = if !authorized.contains(&key) {
            SignerOutcome::Unauthorized
        } else if counted.contains(&key) {
            SignerOutcome::DuplicateSigner
        } else if !verify_canonical(canonical, &submission.signature, &key) {
            SignerOutcome::InvalidSignature
        } else {
            counted.insert(key);
            SignerOutcome::Counted
        };
        tracing::debug!(signer = %key.short(), %outcome, "quorum signature evaluated");
        signers.push(SignerReport {
            public_key: key,
            outcome,
        });
    }

    let report = QuorumReport {
        signers,
        valid_count: counted.len(),
        threshold,
    };
    tracing::debug!(
        valid = report.valid_count,
        threshold,
        met = report.is_met(),
        "quorum evaluated"
    );
    report
}

/// Whether at least `threshold` distinct authorized keys validly signed the
/// ticket.
pub fn verify_quorum(
    ticket: &TicketValue,
    signatures: &[QuorumSignature],
    authorized_keys: &[Ed25519PublicKey],
    threshold: usize,
) -> Result<bool, EncodingError> {
    Ok(evaluate_quorum(ticket, signatures, authorized_keys, threshold)?.is_met())
}

/// An allowlist and threshold, loadable from configuration.
///
/// ```yaml
/// authorized_keys:
///   - "8a88e3dd7409f195fd52db2d3cba5d72ca6709bf1d94121bf3748801b40f6f5c"
///   - "0x8139770ea87d175f56a35466c34c7ecccb8d8a91b4ee37a25df60f5b8fc9b394"
/// threshold: 2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuorumPolicy {
    /// Keys whose signatures count.
    pub authorized_keys: Vec<Ed25519PublicKey>,
    /// Required number of distinct valid signers.
    pub threshold: usize,
}

impl QuorumPolicy {
    /// Evaluate evidence against this policy.
    pub fn evaluate(
        &self,
        ticket: &TicketValue,
        signatures: &[QuorumSignature],
    ) -> Result<QuorumReport, EncodingError> {
        evaluate_quorum(ticket, signatures, &self.authorized_keys, self.threshold)
    }

    /// Whether the evidence meets this policy.
    pub fn verify(
        &self,
        ticket: &TicketValue,
        signatures: &[QuorumSignature],
    ) -> Result<bool, EncodingError> {
        Ok(self.evaluate(ticket, signatures)?.is_met())
    }
}
