//! # Ed25519 Signing and Verification
//!
//! Detached Ed25519 signatures over ticket bytes, plus public-key derivation
//! from a secret.
//!
//! ## Security Invariant
//!
//! - Length checks come before any cryptographic comparison. A 63-byte
//!   signature or a 31-byte key is a [`CryptoError`], never a quiet `false`,
//!   so callers can log "malformed" and "forged" differently.
//! - A well-formed signature that does not verify is `Ok(false)`. That
//!   includes a 32-byte public key that is not a valid curve point.
//! - Verification is strict: small-order public keys and non-canonical
//!   signature scalars never verify.
//! - Secrets are never serialized or logged. `Ed25519KeyPair` does not
//!   implement `Serialize` and its `Debug` output is redacted. No error
//!   variant carries key bytes.
//!
//! ## Secret Forms
//!
//! A secret is either a 32-byte seed or a 64-byte expanded form whose first
//! 32 bytes are the seed. Only the seed is used; the trailing half is
//! ignored.
//!
//! ## Serde
//!
//! Public keys and signatures serialize as lowercase hex strings and
//! deserialize from hex with an optional `0x` prefix.

use ed25519_dalek::Signer;
use escrow_core::bytes::{bytes_to_hex, hex_prefix, hex_to_bytes};
use escrow_core::{CanonicalBytes, CryptoError, EscrowError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of a secret seed.
pub const SEED_LENGTH: usize = 32;
/// Length of an expanded secret (seed followed by 32 more bytes).
pub const EXPANDED_SECRET_LENGTH: usize = 64;
/// Length of a public key.
pub const PUBLIC_KEY_LENGTH: usize = 32;
/// Length of a signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// An Ed25519 public key (32 bytes) for signature verification.
///
/// Serializes as a hex-encoded string for JSON interoperability.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ed25519PublicKey(pub [u8; PUBLIC_KEY_LENGTH]);

/// An Ed25519 signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519Signature(pub [u8; SIGNATURE_LENGTH]);

/// An Ed25519 key pair for signing operations.
///
/// Does not implement `Serialize`; private keys must not end up in logs,
/// envelopes, or error messages.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// Ed25519PublicKey impls
// ---------------------------------------------------------------------------

impl Ed25519PublicKey {
    /// Create a public key from raw 32 bytes.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Return the raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Render the public key as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(self.0)
    }

    /// Parse a public key from 64 hex characters (optional `0x`).
    pub fn from_hex(hex: &str) -> Result<Self, EscrowError> {
        let bytes = hex_to_bytes(hex)?;
        Ok(Self::try_from(bytes.as_slice())?)
    }

    /// Short form for log lines.
    pub fn short(&self) -> String {
        hex_prefix(&self.0)
    }

    /// Convert to an `ed25519_dalek::VerifyingKey`.
    ///
    /// Returns `None` for byte strings that are not a valid curve point.
    pub fn to_verifying_key(&self) -> Option<ed25519_dalek::VerifyingKey> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0).ok()
    }
}

impl TryFrom<&[u8]> for Ed25519PublicKey {
    type Error = CryptoError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: "32",
                actual: bytes.len(),
            })
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519PublicKey({}...)", self.short())
    }
}

impl std::fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Ed25519Signature impls
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    /// Create a signature from raw 64 bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Return the raw 64-byte signature.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Render the signature as a lowercase hex string (128 characters).
    pub fn to_hex(&self) -> String {
        bytes_to_hex(self.0)
    }

    /// Parse a signature from 128 hex characters (optional `0x`).
    pub fn from_hex(hex: &str) -> Result<Self, EscrowError> {
        let bytes = hex_to_bytes(hex)?;
        Ok(Self::try_from(bytes.as_slice())?)
    }
}

impl TryFrom<&[u8]> for Ed25519Signature {
    type Error = CryptoError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", hex_prefix(&self.0))
    }
}

impl std::fmt::Display for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Ed25519KeyPair impls
// ---------------------------------------------------------------------------

impl Ed25519KeyPair {
    /// Create a key pair from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Create a key pair from a 32-byte seed or a 64-byte expanded secret.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidKeyLength`] for any other length.
    pub fn from_secret(secret: &[u8]) -> Result<Self, CryptoError> {
        let seed = match secret.len() {
            SEED_LENGTH | EXPANDED_SECRET_LENGTH => &secret[..SEED_LENGTH],
            actual => {
                return Err(CryptoError::InvalidKeyLength {
                    expected: "32 or 64",
                    actual,
                })
            }
        };
        let signing_key = ed25519_dalek::SigningKey::try_from(seed).map_err(|_| {
            CryptoError::InvalidKeyLength {
                expected: "32 or 64",
                actual: secret.len(),
            }
        })?;
        Ok(Self { signing_key })
    }

    /// Create a key pair from a hex-encoded secret (optional `0x`).
    pub fn from_secret_hex(hex: &str) -> Result<Self, EscrowError> {
        let secret = hex_to_bytes(hex)?;
        Ok(Self::from_secret(&secret)?)
    }

    /// Get the public key from this key pair.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign arbitrary bytes. Deterministic: same bytes, same signature.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(message).to_bytes())
    }

    /// Sign canonical ticket bytes.
    pub fn sign_canonical(&self, data: &CanonicalBytes) -> Ed25519Signature {
        self.sign(data.as_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>)")
    }
}

// ---------------------------------------------------------------------------
// Byte-level operations
// ---------------------------------------------------------------------------

/// Sign `message` with a 32-byte seed or 64-byte expanded secret.
///
/// # Errors
///
/// [`CryptoError::InvalidKeyLength`] if the secret is neither 32 nor 64
/// bytes.
pub fn sign(message: &[u8], secret: &[u8]) -> Result<Ed25519Signature, CryptoError> {
    Ok(Ed25519KeyPair::from_secret(secret)?.sign(message))
}

/// Derive the public key for a 32-byte seed or 64-byte expanded secret.
pub fn derive_public_key(secret: &[u8]) -> Result<Ed25519PublicKey, CryptoError> {
    Ok(Ed25519KeyPair::from_secret(secret)?.public_key())
}

/// Verify a detached signature over `message`.
///
/// Returns `Ok(true)` only if `signature` was produced by the private key
/// matching `public_key` over exactly these bytes.
///
/// # Errors
///
/// - [`CryptoError::InvalidSignatureLength`] if `signature` is not 64 bytes.
/// - [`CryptoError::InvalidKeyLength`] if `public_key` is not 32 bytes.
pub fn verify(message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<bool, CryptoError> {
    let signature = Ed25519Signature::try_from(signature)?;
    let public_key = Ed25519PublicKey::try_from(public_key)?;
    Ok(verify_signature(message, &signature, &public_key))
}

/// Verify with already length-checked types.
pub fn verify_signature(
    message: &[u8],
    signature: &Ed25519Signature,
    public_key: &Ed25519PublicKey,
) -> bool {
    let Some(vk) = public_key.to_verifying_key() else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify_strict(message, &sig).is_ok()
}

/// Verify a signature over canonical ticket bytes.
pub fn verify_canonical(
    data: &CanonicalBytes,
    signature: &Ed25519Signature,
    public_key: &Ed25519PublicKey,
) -> bool {
    verify_signature(data.as_bytes(), signature, public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use escrow_core::TicketValue;

    fn seed(byte: u8) -> [u8; 32] {
        [byte; 32]
    }

    fn sequential_seed() -> [u8; 32] {
        let mut s = [0u8; 32];
        for (i, b) in s.iter_mut().enumerate() {
            *b = i as u8;
        }
        s
    }

    #[test]
    fn rfc8032_test_vector_1() {
        let secret =
            hex_to_bytes("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60")
                .unwrap();
        let pk = derive_public_key(&secret).unwrap();
        assert_eq!(
            pk.to_hex(),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
        let sig = sign(b"", &secret).unwrap();
        assert_eq!(
            sig.to_hex(),
            "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e065224901555fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b"
        );
        assert!(verify(b"", sig.as_bytes(), pk.as_bytes()).unwrap());
    }

    #[test]
    fn sequential_seed_public_key() {
        let pk = derive_public_key(&sequential_seed()).unwrap();
        assert_eq!(
            pk.to_hex(),
            "03a107bff3ce10be1d70dd18e74bc09967e4d6309ba50d5f1ddc8664125531b8"
        );
    }

    #[test]
    fn sign_and_verify_canonical() {
        let kp = Ed25519KeyPair::from_seed(&seed(7));
        let data = CanonicalBytes::encode(&TicketValue::map([("message", "hello")])).unwrap();
        let sig = kp.sign_canonical(&data);
        assert!(verify_canonical(&data, &sig, &kp.public_key()));
    }

    #[test]
    fn signing_is_deterministic() {
        let a = sign(b"ticket", &seed(9)).unwrap();
        let b = sign(b"ticket", &seed(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn expanded_secret_uses_only_seed_half() {
        let mut expanded = [0u8; 64];
        expanded[..32].copy_from_slice(&seed(5));
        expanded[32..].copy_from_slice(&[0xee; 32]);
        assert_eq!(
            derive_public_key(&expanded).unwrap(),
            derive_public_key(&seed(5)).unwrap()
        );
        assert_eq!(
            sign(b"m", &expanded).unwrap(),
            sign(b"m", &seed(5)).unwrap()
        );
    }

    #[test]
    fn secret_length_rejected() {
        for len in [0usize, 16, 31, 33, 63, 65] {
            let secret = vec![1u8; len];
            assert_eq!(
                sign(b"m", &secret),
                Err(CryptoError::InvalidKeyLength {
                    expected: "32 or 64",
                    actual: len
                })
            );
            assert!(derive_public_key(&secret).is_err());
        }
    }

    #[test]
    fn wrong_key_is_false_not_error() {
        let sig = sign(b"m", &seed(1)).unwrap();
        let other = derive_public_key(&seed(2)).unwrap();
        assert_eq!(verify(b"m", sig.as_bytes(), other.as_bytes()), Ok(false));
    }

    #[test]
    fn any_single_bit_flip_fails() {
        let message = b"resolve D-1 RELEASE".to_vec();
        let sig = sign(&message, &seed(3)).unwrap();
        let pk = derive_public_key(&seed(3)).unwrap();
        for i in 0..message.len() {
            for bit in 0..8 {
                let mut tampered = message.clone();
                tampered[i] ^= 1 << bit;
                assert!(!verify(&tampered, sig.as_bytes(), pk.as_bytes()).unwrap());
            }
        }
    }

    #[test]
    fn signature_length_checked_before_crypto() {
        let pk = derive_public_key(&seed(4)).unwrap();
        assert_eq!(
            verify(b"m", &[0u8; 63], pk.as_bytes()),
            Err(CryptoError::InvalidSignatureLength(63))
        );
        assert_eq!(
            verify(b"m", &[0u8; 65], pk.as_bytes()),
            Err(CryptoError::InvalidSignatureLength(65))
        );
    }

    #[test]
    fn public_key_length_checked_before_crypto() {
        let sig = sign(b"m", &seed(4)).unwrap();
        assert_eq!(
            verify(b"m", sig.as_bytes(), &[0u8; 31]),
            Err(CryptoError::InvalidKeyLength {
                expected: "32",
                actual: 31
            })
        );
        assert!(verify(b"m", sig.as_bytes(), &[0u8; 64]).is_err());
    }

    #[test]
    fn invalid_point_is_false() {
        let sig = sign(b"m", &seed(4)).unwrap();
        // y = 2 does not decompress to a curve point.
        let mut not_a_point = [0u8; 32];
        not_a_point[0] = 2;
        assert_eq!(verify(b"m", sig.as_bytes(), &not_a_point), Ok(false));
    }

    #[test]
    fn small_order_key_never_verifies() {
        // The identity point; every signature "verifies" under lax rules.
        let mut identity = [0u8; 32];
        identity[0] = 1;
        let mut sig = [0u8; 64];
        sig[0] = 1;
        assert_eq!(verify(b"anything", &sig, &identity), Ok(false));
    }

    #[test]
    fn hex_round_trips_and_prefix() {
        let kp = Ed25519KeyPair::from_seed(&seed(8));
        let pk = kp.public_key();
        assert_eq!(pk.to_hex().len(), 64);
        assert_eq!(Ed25519PublicKey::from_hex(&format!("0x{}", pk.to_hex())).unwrap(), pk);

        let sig = kp.sign(b"x");
        assert_eq!(sig.to_hex().len(), 128);
        assert_eq!(Ed25519Signature::from_hex(&sig.to_hex()).unwrap(), sig);
    }

    #[test]
    fn hex_errors_are_typed() {
        assert!(matches!(
            Ed25519PublicKey::from_hex("zz"),
            Err(EscrowError::Hex(_))
        ));
        assert!(matches!(
            Ed25519PublicKey::from_hex("aabb"),
            Err(EscrowError::Crypto(CryptoError::InvalidKeyLength { .. }))
        ));
        assert!(matches!(
            Ed25519Signature::from_hex("aabb"),
            Err(EscrowError::Crypto(CryptoError::InvalidSignatureLength(2)))
        ));
        assert!(matches!(
            Ed25519KeyPair::from_secret_hex("0x"),
            Err(EscrowError::Hex(_))
        ));
    }

    #[test]
    fn serde_json_round_trip() {
        let kp = Ed25519KeyPair::from_seed(&seed(6));
        let pk = kp.public_key();
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json.len(), 64 + 2);
        let pk2: Ed25519PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(pk, pk2);

        let sig = kp.sign(b"y");
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json.len(), 128 + 2);
        let sig2: Ed25519Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, sig2);
    }

    #[test]
    fn debug_does_not_leak_private_key() {
        let kp = Ed25519KeyPair::from_seed(&seed(0xab));
        let debug = format!("{kp:?}");
        assert_eq!(debug, "Ed25519KeyPair(<private>)");
        assert!(!debug.contains("abab"));
    }

    #[test]
    fn debug_public_key_shows_prefix() {
        let pk = derive_public_key(&sequential_seed()).unwrap();
        assert_eq!(format!("{pk:?}"), "Ed25519PublicKey(03a107bf...)");
    }
}
