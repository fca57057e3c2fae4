//! Schemaless document model shared by every [`DocumentStore`].
//!
//! [`DocumentStore`]: crate::DocumentStore

use std::collections::BTreeMap;

use crate::{EngineError, ResultEngine};

/// A scalar field value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

pub type Fields = BTreeMap<String, FieldValue>;

/// A stored document: provider-assigned id plus its fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub(crate) fn string(&self, name: &str) -> ResultEngine<String> {
        self.fields
            .get(name)
            .and_then(FieldValue::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| self.bad_field(name, "text"))
    }

    pub(crate) fn number(&self, name: &str) -> ResultEngine<f64> {
        self.fields
            .get(name)
            .and_then(FieldValue::as_f64)
            .ok_or_else(|| self.bad_field(name, "number"))
    }

    fn bad_field(&self, name: &str, expected: &str) -> EngineError {
        EngineError::ReadFailed(format!(
            "document {}: field '{name}' is missing or not a {expected}",
            self.id
        ))
    }
}
