//! Conversion between plain JSON and Firestore typed values
//!
//! The REST API wraps every field in a single-key object naming its type
//! (`{"stringValue": "a"}`, `{"mapValue": {"fields": {...}}}`, ...).

use super::types::{FirestoreError, Result};
use serde_json::{json, Map, Number, Value};

/// Encode a document body as Firestore `fields`
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

/// Encode one JSON value as a Firestore typed value
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => encode_number(n),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn encode_number(n: &Number) -> Value {
    // int64 travels as a decimal string; anything wider is a double
    if let Some(i) = n.as_i64() {
        return json!({ "integerValue": i.to_string() });
    }
    match n.as_f64() {
        Some(f) => json!({ "doubleValue": f }),
        None => json!({ "doubleValue": n.to_string() }),
    }
}

/// Decode Firestore `fields` back to a plain JSON object
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>> {
    fields
        .iter()
        .map(|(k, v)| decode_value(v).map(|decoded| (k.clone(), decoded)))
        .collect()
}

/// Decode one Firestore typed value
pub fn decode_value(value: &Value) -> Result<Value> {
    let (kind, inner) = value
        .as_object()
        .and_then(|obj| obj.iter().next())
        .ok_or_else(|| FirestoreError::DeserializeFailed(format!("not a typed value: {}", value)))?;

    match (kind.as_str(), inner) {
        ("nullValue", _) => Ok(Value::Null),
        ("booleanValue", Value::Bool(b)) => Ok(Value::Bool(*b)),
        ("integerValue", v) => decode_integer(v),
        ("doubleValue", v) => Ok(decode_double(v)),
        ("stringValue", Value::String(s))
        | ("timestampValue", Value::String(s))
        | ("referenceValue", Value::String(s))
        | ("bytesValue", Value::String(s)) => Ok(Value::String(s.clone())),
        ("geoPointValue", Value::Object(point)) => Ok(json!({
            "latitude": point.get("latitude").cloned().unwrap_or(Value::from(0.0)),
            "longitude": point.get("longitude").cloned().unwrap_or(Value::from(0.0)),
        })),
        ("arrayValue", Value::Object(array)) => {
            let values = match array.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        ("mapValue", Value::Object(map)) => match map.get("fields") {
            Some(Value::Object(fields)) => Ok(Value::Object(decode_fields(fields)?)),
            _ => Ok(Value::Object(Map::new())),
        },
        (kind, _) => Err(FirestoreError::DeserializeFailed(format!(
            "unsupported value type: {}",
            kind
        ))),
    }
}

fn decode_integer(value: &Value) -> Result<Value> {
    let parsed = match value {
        Value::String(s) => s.parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    };

    parsed
        .map(Value::from)
        .ok_or_else(|| FirestoreError::DeserializeFailed(format!("bad integerValue: {}", value)))
}

fn decode_double(value: &Value) -> Value {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };

    // NaN and infinities have no JSON representation
    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
