//! Typed value encoding of the document API.
//!
//! Every value is an object with a single key naming its type, e.g.
//! `{"stringValue": "Kandy"}` or `{"integerValue": "50"}` (64-bit integers
//! travel as strings).

use engine::{FieldValue, Fields};
use serde_json::{Map, Value, json};
use tracing::debug;

pub(crate) fn encode(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Bool(value) => json!({ "booleanValue": value }),
        FieldValue::Integer(value) => json!({ "integerValue": value.to_string() }),
        FieldValue::Double(value) => json!({ "doubleValue": value }),
        FieldValue::String(value) => json!({ "stringValue": value }),
    }
}

/// `None` for value kinds the engine does not model (maps, arrays,
/// timestamps, references, ...).
pub(crate) fn decode(value: &Value) -> Option<FieldValue> {
    let object = value.as_object()?;
    let (kind, inner) = object.iter().next()?;
    match kind.as_str() {
        "nullValue" => Some(FieldValue::Null),
        "booleanValue" => inner.as_bool().map(FieldValue::Bool),
        "integerValue" => match inner {
            Value::String(raw) => raw.parse().ok().map(FieldValue::Integer),
            other => other.as_i64().map(FieldValue::Integer),
        },
        "doubleValue" => inner.as_f64().map(FieldValue::Double),
        "stringValue" => inner.as_str().map(|s| FieldValue::String(s.to_string())),
        _ => None,
    }
}

pub(crate) fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), encode(value)))
        .collect()
}

pub(crate) fn decode_fields(fields: &Map<String, Value>) -> Fields {
    fields
        .iter()
        .filter_map(|(name, value)| match decode(value) {
            Some(decoded) => Some((name.clone(), decoded)),
            None => {
                debug!("skipping field '{name}' of unsupported type");
                None
            }
        })
        .collect()
}
