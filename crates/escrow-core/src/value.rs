//! # Ticket Values — Generic Structured Data
//!
//! `TicketValue` is the shape the canonical encoder understands: a tree of
//! maps, sequences, and scalars. The core never interprets field meaning;
//! a resolution ticket is just a `TicketValue::Map` that an upstream shape
//! validator has already accepted.
//!
//! Maps are `BTreeMap<String, _>`. `String` orders byte-wise over its UTF-8
//! encoding, which is exactly the canonical key order, so two maps with the
//! same entries are equal and encode identically no matter how they were
//! built.
//!
//! `Absent` models an "undefined" field coming from a loosely typed caller.
//! It can be constructed so callers can represent what they were given, but
//! the encoder rejects it at any depth.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::error::EncodingError;

/// A generic structured value: the input to canonical encoding and the
/// output of decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum TicketValue {
    /// Field present but undefined. Never encodable.
    Absent,
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer. Encodable range is `[-2^64, 2^64 - 1]`.
    Integer(i128),
    /// IEEE-754 binary64.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Ordered sequence.
    Array(Vec<TicketValue>),
    /// String-keyed mapping, ordered byte-wise by key.
    Map(BTreeMap<String, TicketValue>),
}

impl TicketValue {
    /// Build a map from `(key, value)` pairs. Later duplicates win.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<TicketValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Look up a key if this is a map.
    pub fn get(&self, key: &str) -> Option<&TicketValue> {
        match self {
            Self::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// The integer payload, if any.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The text payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value` for display and transport.
    ///
    /// # Errors
    ///
    /// `Absent`, integers outside `i64`/`u64`, and non-finite floats have no
    /// JSON form.
    pub fn to_json(&self) -> Result<JsonValue, EncodingError> {
        to_json_at(self, &mut String::new())
    }
}

fn to_json_at(value: &TicketValue, path: &mut String) -> Result<JsonValue, EncodingError> {
    Ok(match value {
        TicketValue::Absent => {
            return Err(EncodingError::AbsentValue {
                path: display_path(path),
            })
        }
        TicketValue::Null => JsonValue::Null,
        TicketValue::Bool(b) => JsonValue::Bool(*b),
        TicketValue::Integer(i) => {
            if let Ok(n) = i64::try_from(*i) {
                JsonValue::from(n)
            } else if let Ok(n) = u64::try_from(*i) {
                JsonValue::from(n)
            } else {
                return Err(EncodingError::IntegerOutOfRange {
                    path: display_path(path),
                });
            }
        }
        TicketValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| EncodingError::NonFiniteFloat {
                path: display_path(path),
            })?,
        TicketValue::Text(s) => JsonValue::String(s.clone()),
        TicketValue::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let mark = push_segment(path, &i.to_string());
                out.push(to_json_at(item, path)?);
                path.truncate(mark);
            }
            JsonValue::Array(out)
        }
        TicketValue::Map(m) => {
            let mut out = serde_json::Map::new();
            for (k, v) in m {
                let mark = push_segment(path, k);
                out.insert(k.clone(), to_json_at(v, path)?);
                path.truncate(mark);
            }
            JsonValue::Object(out)
        }
    })
}

/// Append `/segment` to `path`, returning the length to truncate back to.
pub(crate) fn push_segment(path: &mut String, segment: &str) -> usize {
    let mark = path.len();
    path.push('/');
    path.push_str(segment);
    mark
}

/// The root is rendered as `/`.
pub(crate) fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

impl From<JsonValue> for TicketValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    Self::Integer(i128::from(u))
                } else {
                    // Without arbitrary_precision every other number is an f64.
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Self::Text(s),
            JsonValue::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(m) => Self::Map(m.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

impl From<bool> for TicketValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for TicketValue {
            fn from(n: $t) -> Self {
                Self::Integer(i128::from(n))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f64> for TicketValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for TicketValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for TicketValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<TicketValue>> for TicketValue {
    fn from(items: Vec<TicketValue>) -> Self {
        Self::Array(items)
    }
}

impl<T: Into<TicketValue>> From<Option<T>> for TicketValue {
    /// `None` becomes an explicit `Null`, never `Absent`.
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}
