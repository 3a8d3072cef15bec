//! Firestore typed-value encoding.
//!
//! Firestore REST wraps every value in a single-key object naming its type
//! (`stringValue`, `integerValue`, `mapValue`, ...). Integers travel as strings.

use crate::domain::DomainError;
use crate::ports::{Fields, StoredDocument};
use serde_json::{Map, Number, Value, json};

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

pub fn decode_value(value: &Value) -> Result<Value, DomainError> {
    let obj = value
        .as_object()
        .ok_or_else(|| DomainError::Store("firestore value is not an object".into()))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| DomainError::Store("empty firestore value".into()))?;
    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" => Ok(inner.clone()),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(|i| Value::Number(Number::from(i)))
                .ok_or_else(|| DomainError::Store(format!("bad integerValue: {inner}")))
        }
        "arrayValue" => {
            let items = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|vals| vals.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(items))
        }
        "mapValue" => Ok(Value::Object(decode_fields(inner.get("fields"))?)),
        "geoPointValue" => Ok(inner.clone()),
        other => Err(DomainError::Store(format!(
            "unsupported firestore value type: {other}"
        ))),
    }
}

/// `fields` may be absent for an empty document.
pub fn decode_fields(fields: Option<&Value>) -> Result<Fields, DomainError> {
    let Some(fields) = fields else {
        return Ok(Fields::new());
    };
    let obj = fields
        .as_object()
        .ok_or_else(|| DomainError::Store("firestore fields is not an object".into()))?;
    obj.iter()
        .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
        .collect()
}

/// Decode a REST `Document`; the id is the last segment of its resource name.
pub fn decode_document(doc: &Value) -> Result<StoredDocument, DomainError> {
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| DomainError::Store("firestore document without name".into()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();
    Ok(StoredDocument {
        id,
        fields: decode_fields(doc.get("fields"))?,
    })
}
