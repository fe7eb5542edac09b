//! # Canonical Encoding — Deterministic CBOR
//!
//! This module defines the byte image that every arbiter, verifier, and
//! escrow program signs and hashes. Two implementations that agree on the
//! logical content of a ticket must agree on these bytes exactly, or their
//! signatures will not verify against each other.
//!
//! ## Encoding Rules
//!
//! The output is a strict subset of CBOR (RFC 8949):
//!
//! 1. **Integers** use major type 0 (non-negative) or 1 (negative) with the
//!    shortest head that holds the argument. Range is `[-2^64, 2^64 - 1]`.
//! 2. **Text** uses major type 3 with an explicit byte length. Never
//!    null-terminated, never indefinite-length.
//! 3. **Arrays and maps** use major types 4 and 5 with definite lengths.
//! 4. **Map keys** are text only, emitted in byte-wise lexicographic order
//!    of their UTF-8 encoding. This is plain lexicographic order, not the
//!    length-first order of RFC 7049 §3.9.
//! 5. **Floats** are always binary64 (`0xfb`). `-0.0` is written as `+0.0`
//!    and every NaN is written as `0x7ff8000000000000`.
//! 6. **`false` / `true` / `null`** are `0xf4` / `0xf5` / `0xf6`.
//! 7. **`Absent`** is rejected with [`EncodingError::AbsentValue`] at any
//!    depth. A verifier cannot tell "omitted" from "explicitly unset" unless
//!    both are defined identically, so neither is ever written.
//! 8. **Nesting** is limited to [`MAX_DEPTH`] arrays and maps, on both sides.
//!    Anything the encoder writes, the decoder reads back.
//!
//! ## Decoding
//!
//! [`decode`] reads any well-formed CBOR item that fits the ticket data
//! model (so half- and single-precision floats or indefinite lengths from a
//! lenient encoder are still readable). [`decode_canonical`] additionally
//! requires that re-encoding reproduces the input byte-for-byte, and is the
//! path for untrusted bytes arriving in envelopes.
//!
//! CBOR `undefined` (`0xf7`) is refused by both. It is the wire form of an
//! absent value, and reading it as `null` would reintroduce the ambiguity
//! rule 7 removes.

use std::collections::BTreeMap;

use ciborium::value::Value as CborValue;
use ciborium_ll::{simple, Decoder, Header};

use crate::bytes::{bytes_to_hex, hex_to_bytes};
use crate::error::{DecodingError, EncodingError, EscrowError};
use crate::value::{display_path, push_segment, TicketValue};

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;

const FALSE: u8 = 0xf4;
const TRUE: u8 = 0xf5;
const NULL: u8 = 0xf6;
const FLOAT64: u8 = 0xfb;

const CANONICAL_NAN_BITS: u64 = 0x7ff8_0000_0000_0000;

/// Deepest nesting of arrays and maps that is encoded or decoded.
pub const MAX_DEPTH: usize = 128;

/// Bytes produced exclusively by the canonical encoder.
///
/// # Invariants
///
/// - Constructed only by [`CanonicalBytes::encode`] or by
///   [`CanonicalBytes::from_encoded`], which proves the input is already in
///   canonical form.
/// - Always decodes to a value that re-encodes to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonically encode a ticket value.
    ///
    /// # Errors
    ///
    /// See [`encode`].
    pub fn encode(value: &TicketValue) -> Result<Self, EncodingError> {
        encode(value).map(Self)
    }

    /// Accept bytes from elsewhere after proving they are canonical.
    ///
    /// # Errors
    ///
    /// Any [`DecodingError`], including [`DecodingError::NonCanonical`] for
    /// well-formed input that the encoder would not have produced.
    pub fn from_encoded(bytes: impl Into<Vec<u8>>) -> Result<Self, DecodingError> {
        let bytes = bytes.into();
        decode_canonical(&bytes)?;
        Ok(Self(bytes))
    }

    /// Parse lowercase or uppercase hex (optional `0x`) into canonical bytes.
    pub fn from_hex(input: &str) -> Result<Self, EscrowError> {
        let bytes = hex_to_bytes(input)?;
        Ok(Self::from_encoded(bytes)?)
    }

    /// Decode back into the value these bytes encode.
    pub fn decode(&self) -> Result<TicketValue, DecodingError> {
        decode(&self.0)
    }

    /// Access the raw bytes for signing or hashing.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex of the bytes, as carried in `ticket_cbor_hex`.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.0)
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Canonically encode a value.
///
/// # Errors
///
/// - [`EncodingError::AbsentValue`] if any node is `Absent`.
/// - [`EncodingError::IntegerOutOfRange`] for integers outside
///   `[-2^64, 2^64 - 1]`.
/// - [`EncodingError::TooDeep`] past [`MAX_DEPTH`] nested containers.
pub fn encode(value: &TicketValue) -> Result<Vec<u8>, EncodingError> {
    let mut out = Vec::new();
    let mut path = String::new();
    encode_into(value, &mut out, &mut path, 0)?;
    Ok(out)
}

/// Encode twice and compare. A self-check, not a production code path.
pub fn is_deterministic(value: &TicketValue) -> Result<bool, EncodingError> {
    Ok(encode(value)? == encode(value)?)
}

/// `depth` counts the containers enclosing `value`.
fn encode_into(
    value: &TicketValue,
    out: &mut Vec<u8>,
    path: &mut String,
    depth: usize,
) -> Result<(), EncodingError> {
    if matches!(value, TicketValue::Array(_) | TicketValue::Map(_)) && depth >= MAX_DEPTH {
        return Err(EncodingError::TooDeep {
            path: display_path(path),
            max: MAX_DEPTH,
        });
    }
    match value {
        TicketValue::Absent => {
            return Err(EncodingError::AbsentValue {
                path: display_path(path),
            })
        }
        TicketValue::Null => out.push(NULL),
        TicketValue::Bool(false) => out.push(FALSE),
        TicketValue::Bool(true) => out.push(TRUE),
        TicketValue::Integer(i) => encode_integer(*i, out, path)?,
        TicketValue::Float(f) => {
            out.push(FLOAT64);
            out.extend_from_slice(&canonical_f64_bits(*f).to_be_bytes());
        }
        TicketValue::Text(s) => encode_text(s, out),
        TicketValue::Array(items) => {
            write_head(out, MAJOR_ARRAY, items.len() as u64);
            for (i, item) in items.iter().enumerate() {
                let mark = push_segment(path, &i.to_string());
                encode_into(item, out, path, depth + 1)?;
                path.truncate(mark);
            }
        }
        TicketValue::Map(entries) => {
            write_head(out, MAJOR_MAP, entries.len() as u64);
            // BTreeMap<String, _> iterates in byte-wise key order.
            for (key, item) in entries {
                encode_text(key, out);
                let mark = push_segment(path, key);
                encode_into(item, out, path, depth + 1)?;
                path.truncate(mark);
            }
        }
    }
    Ok(())
}

fn encode_integer(i: i128, out: &mut Vec<u8>, path: &str) -> Result<(), EncodingError> {
    let out_of_range = || EncodingError::IntegerOutOfRange {
        path: display_path(path),
    };
    if i >= 0 {
        let arg = u64::try_from(i).map_err(|_| out_of_range())?;
        write_head(out, MAJOR_UNSIGNED, arg);
    } else {
        // Major type 1 carries -1 - n.
        let arg = u64::try_from(-1 - i).map_err(|_| out_of_range())?;
        write_head(out, MAJOR_NEGATIVE, arg);
    }
    Ok(())
}

fn encode_text(s: &str, out: &mut Vec<u8>) {
    write_head(out, MAJOR_TEXT, s.len() as u64);
    out.extend_from_slice(s.as_bytes());
}

/// Write a CBOR head using the shortest argument width.
fn write_head(out: &mut Vec<u8>, major: u8, arg: u64) {
    let major = major << 5;
    if arg < 24 {
        out.push(major | arg as u8);
    } else if let Ok(a) = u8::try_from(arg) {
        out.push(major | 24);
        out.push(a);
    } else if let Ok(a) = u16::try_from(arg) {
        out.push(major | 25);
        out.extend_from_slice(&a.to_be_bytes());
    } else if let Ok(a) = u32::try_from(arg) {
        out.push(major | 26);
        out.extend_from_slice(&a.to_be_bytes());
    } else {
        out.push(major | 27);
        out.extend_from_slice(&arg.to_be_bytes());
    }
}

/// One bit pattern per numeric value.
fn canonical_f64_bits(f: f64) -> u64 {
    if f.is_nan() {
        CANONICAL_NAN_BITS
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode bytes into a generic value.
///
/// Does not validate business shape; it only reconstructs the tree.
///
/// # Errors
///
/// [`DecodingError`] for empty, truncated, or trailing input, for nesting
/// past [`MAX_DEPTH`], and for items outside the data model (byte strings,
/// tags, `undefined`, non-text map keys).
pub fn decode(bytes: &[u8]) -> Result<TicketValue, DecodingError> {
    let mut reader = bytes;
    let item: CborValue = ciborium::de::from_reader_with_recursion_limit(&mut reader, MAX_DEPTH)
        .map_err(|e| match e {
            ciborium::de::Error::RecursionLimitExceeded => DecodingError::TooDeep(MAX_DEPTH),
            other => DecodingError::Malformed(other.to_string()),
        })?;
    if !reader.is_empty() {
        return Err(DecodingError::TrailingBytes(reader.len()));
    }
    reject_undefined(bytes)?;
    from_cbor(item)
}

/// Walk the item's headers looking for `undefined`.
///
/// `bytes` has already been decoded in full; the walk stops at end of input.
fn reject_undefined(bytes: &[u8]) -> Result<(), DecodingError> {
    let mut decoder = Decoder::from(bytes);
    let mut scratch = [0u8; 256];
    while let Ok(header) = decoder.pull() {
        match header {
            Header::Simple(simple::UNDEFINED) => {
                return Err(DecodingError::UnsupportedItem("undefined"))
            }
            // String payloads are skipped; a 0xf7 inside one is just data.
            Header::Bytes(len) => {
                let mut segments = decoder.bytes(len);
                while let Ok(Some(mut segment)) = segments.pull() {
                    while let Ok(Some(_)) = segment.pull(&mut scratch) {}
                }
            }
            Header::Text(len) => {
                let mut segments = decoder.text(len);
                while let Ok(Some(mut segment)) = segments.pull() {
                    while let Ok(Some(_)) = segment.pull(&mut scratch) {}
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Decode bytes and require that they are exactly what [`encode`] would
/// produce for the decoded value.
pub fn decode_canonical(bytes: &[u8]) -> Result<TicketValue, DecodingError> {
    let value = decode(bytes)?;
    match encode(&value) {
        Ok(reencoded) if reencoded == bytes => Ok(value),
        _ => Err(DecodingError::NonCanonical),
    }
}

fn from_cbor(item: CborValue) -> Result<TicketValue, DecodingError> {
    Ok(match item {
        CborValue::Null => TicketValue::Null,
        CborValue::Bool(b) => TicketValue::Bool(b),
        CborValue::Integer(i) => TicketValue::Integer(i128::from(i)),
        CborValue::Float(f) => TicketValue::Float(f),
        CborValue::Text(s) => TicketValue::Text(s),
        CborValue::Array(items) => TicketValue::Array(
            items
                .into_iter()
                .map(from_cbor)
                .collect::<Result<_, _>>()?,
        ),
        CborValue::Map(entries) => {
            let mut map = BTreeMap::new();
            for (k, v) in entries {
                let CborValue::Text(key) = k else {
                    return Err(DecodingError::NonStringKey);
                };
                if map.contains_key(&key) {
                    return Err(DecodingError::DuplicateKey(key));
                }
                let v = from_cbor(v)?;
                map.insert(key, v);
            }
            TicketValue::Map(map)
        }
        CborValue::Bytes(_) => return Err(DecodingError::UnsupportedItem("byte string")),
        CborValue::Tag(..) => return Err(DecodingError::UnsupportedItem("tag")),
        _ => return Err(DecodingError::UnsupportedItem("simple value")),
    })
}
