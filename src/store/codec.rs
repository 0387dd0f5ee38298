// SPDX-License-Identifier: MIT

//! Bidirectional codec between native values and the document store's
//! tagged wire format.
//!
//! Every field the store exchanges is wrapped in a single-key object
//! naming its type (`{"stringValue": "x"}`, `{"mapValue": {"fields": ..}}`
//! and so on). `TaggedValue` models that encoding as a closed enum so
//! encode/decode are total over the enumerated cases instead of
//! duck-typed branches.
//!
//! Round-trip contract: `decode(encode(x)) == x` for every value built
//! from the supported types, except that the wire format collapses
//! integers and floats into one numeric type.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum nesting depth the encoder will follow.
///
/// Rust values cannot be cyclic, but a runaway recursive structure from
/// a caller is still rejected instead of overflowing the stack.
pub const MAX_VALUE_DEPTH: usize = 64;

/// A native value as the rest of the crate sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The store omitted this field entirely. Produced only by decoding;
    /// it has no wire representation of its own.
    Absent,
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Numeric value. The wire format does not preserve the distinction
    /// between integers and floats, so neither do we.
    Number(f64),
    /// UTF-8 text.
    Text(String),
    /// Point in time, exchanged as RFC 3339.
    Timestamp(DateTime<Utc>),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Keyed structure with canonical (sorted) key order.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// True for the absent-field sentinel.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }
}

/// The store's tagged wire representation of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaggedValue {
    /// `{"nullValue": null}`
    #[serde(rename = "nullValue")]
    Null(Option<()>),
    /// `{"booleanValue": true}`
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    /// `{"integerValue": "42"}` — int64 travels as a decimal string.
    #[serde(rename = "integerValue")]
    Integer(String),
    /// `{"doubleValue": 1.5}`
    #[serde(rename = "doubleValue")]
    Double(f64),
    /// `{"timestampValue": "2024-01-15T10:00:00Z"}`
    #[serde(rename = "timestampValue")]
    Timestamp(String),
    /// `{"stringValue": "x"}`
    #[serde(rename = "stringValue")]
    String(String),
    /// `{"arrayValue": {"values": [..]}}`
    #[serde(rename = "arrayValue")]
    Array(ArrayPayload),
    /// `{"mapValue": {"fields": {..}}}`
    #[serde(rename = "mapValue")]
    Map(MapPayload),
}

/// Payload of an array tag. The store omits `values` when empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayPayload {
    #[serde(default)]
    pub values: Vec<TaggedValue>,
}

/// Payload of a map tag. The store omits `fields` when empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapPayload {
    #[serde(default)]
    pub fields: BTreeMap<String, TaggedValue>,
}

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The encoder was handed a value with no wire representation.
    #[error("unsupported value: {0}")]
    UnsupportedType(String),

    /// The decoder received a payload it cannot interpret.
    #[error("malformed wire value: {0}")]
    Malformed(String),
}

/// Encode a native value into the tagged wire format.
pub fn encode(value: &Value) -> Result<TaggedValue, CodecError> {
    encode_at_depth(value, 0)
}

fn encode_at_depth(value: &Value, depth: usize) -> Result<TaggedValue, CodecError> {
    if depth > MAX_VALUE_DEPTH {
        return Err(CodecError::UnsupportedType(format!(
            "value nesting exceeds supported depth of {}",
            MAX_VALUE_DEPTH
        )));
    }

    match value {
        Value::Absent => Err(CodecError::UnsupportedType(
            "absent field sentinel has no wire representation".to_string(),
        )),
        Value::Null => Ok(TaggedValue::Null(None)),
        Value::Bool(b) => Ok(TaggedValue::Boolean(*b)),
        Value::Number(n) => Ok(TaggedValue::Double(*n)),
        Value::Text(s) => Ok(TaggedValue::String(s.clone())),
        // Full nanosecond precision; the store's RFC 3339 timestamp
        // field accepts it and anything coarser loses sub-microsecond
        // clock readings on the way through.
        Value::Timestamp(ts) => Ok(TaggedValue::Timestamp(
            ts.to_rfc3339_opts(SecondsFormat::Nanos, true),
        )),
        Value::Array(items) => {
            let values = items
                .iter()
                .map(|item| encode_at_depth(item, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TaggedValue::Array(ArrayPayload { values }))
        }
        Value::Map(entries) => {
            let mut fields = BTreeMap::new();
            for (key, item) in entries {
                fields.insert(key.clone(), encode_at_depth(item, depth + 1)?);
            }
            Ok(TaggedValue::Map(MapPayload { fields }))
        }
    }
}

/// Encode a keyed structure as a document field map, skipping absent entries.
pub fn encode_fields(
    entries: &BTreeMap<String, Value>,
) -> Result<BTreeMap<String, TaggedValue>, CodecError> {
    let mut fields = BTreeMap::new();
    for (key, value) in entries {
        if value.is_absent() {
            continue;
        }
        fields.insert(key.clone(), encode(value)?);
    }
    Ok(fields)
}

/// Decode a tagged wire value back into a native value.
pub fn decode(tagged: &TaggedValue) -> Result<Value, CodecError> {
    match tagged {
        TaggedValue::Null(_) => Ok(Value::Null),
        TaggedValue::Boolean(b) => Ok(Value::Bool(*b)),
        TaggedValue::Integer(raw) => raw
            .parse::<i64>()
            .map(|n| Value::Number(n as f64))
            .map_err(|_| CodecError::Malformed(format!("integer payload {:?}", raw))),
        TaggedValue::Double(n) => Ok(Value::Number(*n)),
        TaggedValue::Timestamp(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
            .map_err(|_| CodecError::Malformed(format!("timestamp payload {:?}", raw))),
        TaggedValue::String(s) => Ok(Value::Text(s.clone())),
        TaggedValue::Array(payload) => {
            let items = payload
                .values
                .iter()
                .map(decode)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(items))
        }
        TaggedValue::Map(payload) => Ok(Value::Map(decode_fields(&payload.fields)?)),
    }
}

/// Decode a document field map into a keyed structure.
pub fn decode_fields(
    fields: &BTreeMap<String, TaggedValue>,
) -> Result<BTreeMap<String, Value>, CodecError> {
    let mut entries = BTreeMap::new();
    for (key, tagged) in fields {
        entries.insert(key.clone(), decode(tagged)?);
    }
    Ok(entries)
}

/// Look up a field in a decoded map, yielding the absent sentinel when
/// the store omitted it.
pub fn field(fields: &BTreeMap<String, TaggedValue>, name: &str) -> Result<Value, CodecError> {
    match fields.get(name) {
        Some(tagged) => decode(tagged),
        None => Ok(Value::Absent),
    }
}
