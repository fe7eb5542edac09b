//! # Byte Codec Utilities
//!
//! Hex conversions shared by every other component. Output is always
//! lowercase without a prefix; input tolerates an optional `0x`/`0X` prefix,
//! surrounding whitespace, and mixed case.

use crate::error::HexError;

/// Render bytes as lowercase hex with no prefix.
pub fn bytes_to_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}

/// Render bytes as lowercase hex with a `0x` prefix.
pub fn bytes_to_hex_prefixed(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a hex string into bytes.
///
/// # Errors
///
/// Returns [`HexError::Empty`] when nothing is left after trimming and
/// removing the prefix, [`HexError::OddLength`] for an odd digit count, and
/// [`HexError::InvalidCharacter`] for anything outside `[0-9a-fA-F]`.
pub fn hex_to_bytes(input: &str) -> Result<Vec<u8>, HexError> {
    let digits = strip_prefix(input);
    if digits.is_empty() {
        return Err(HexError::Empty);
    }
    hex::decode(digits).map_err(|e| match e {
        hex::FromHexError::InvalidHexCharacter { c, index } => HexError::InvalidCharacter {
            character: c,
            index,
        },
        hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
            HexError::OddLength(digits.len())
        }
    })
}

/// Parse a hex string into exactly `N` bytes.
///
/// # Errors
///
/// Everything [`hex_to_bytes`] rejects, plus [`HexError::WrongLength`] when
/// the decoded length is not `N`.
pub fn hex_to_array<const N: usize>(input: &str) -> Result<[u8; N], HexError> {
    let bytes = hex_to_bytes(input)?;
    bytes.try_into().map_err(|v: Vec<u8>| HexError::WrongLength {
        expected: N,
        actual: v.len(),
    })
}

/// First four bytes as hex, for log lines and `Debug` output.
pub fn hex_prefix(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(4)])
}

fn strip_prefix(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}
