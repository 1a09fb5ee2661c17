//! Conversion between plain JSON and Firestore typed values.
//!
//! Firestore wraps every value in a single-key object naming its type
//! (`{"stringValue": "x"}`, `{"integerValue": "42"}`, ...). Integers travel as
//! strings; timestamps come back as RFC 3339 strings and are surfaced as
//! plain strings.

use serde_json::{Map, Number, Value, json};

use crate::documents::{DocumentError, Fields};

/// Encode a JSON value as a Firestore value.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => n.as_i64().map_or_else(
            || json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
            |i| json!({ "integerValue": i.to_string() }),
        ),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode top-level document fields.
pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

/// Decode a Firestore value into plain JSON.
///
/// # Errors
///
/// Returns `DocumentError::Encoding` for unknown or malformed value types.
pub fn decode_value(value: &Value) -> Result<Value, DocumentError> {
    let Some((kind, inner)) = value.as_object().and_then(|obj| obj.iter().next()) else {
        return Err(DocumentError::Encoding(format!("not a typed value: {value}")));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "integerValue" => decode_integer(inner),
        "booleanValue" | "doubleValue" | "stringValue" | "timestampValue" | "referenceValue"
        | "bytesValue" | "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            values
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            decode_fields(&fields).map(Value::Object)
        }
        other => Err(DocumentError::Encoding(format!("unknown value type {other}"))),
    }
}

/// Decode a Firestore `fields` object.
///
/// # Errors
///
/// Returns `DocumentError::Encoding` if any field fails to decode.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Fields, DocumentError> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

fn decode_integer(inner: &Value) -> Result<Value, DocumentError> {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map(|i| Value::Number(Number::from(i)))
            .map_err(|e| DocumentError::Encoding(format!("bad integerValue {s}: {e}"))),
        Value::Number(_) => Ok(inner.clone()),
        other => Err(DocumentError::Encoding(format!(
            "bad integerValue {other}"
        ))),
    }
}
