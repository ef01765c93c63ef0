use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey(pub i64);

impl From<i64> for RecordKey {
    fn from(value: i64) -> Self {
        RecordKey(value)
    }
}

impl From<i32> for RecordKey {
    fn from(value: i32) -> Self {
        RecordKey(value as i64)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single field value in a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl FieldValue {
    /// Parse user input as a number, integers first.
    /// Non-finite floats ("NaN", "inf") are not numbers for our purposes.
    pub fn parse_number(input: &str) -> Option<FieldValue> {
        let trimmed = input.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return Some(FieldValue::Integer(i));
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(FieldValue::Float(f)),
            _ => None,
        }
    }

    /// True for empty or whitespace-only text. Numbers are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Integer(_) | FieldValue::Float(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

/// Field name -> value
pub type Fields = BTreeMap<String, FieldValue>;

/// One row of domain data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: RecordKey,
    pub fields: Fields,
}

impl Record {
    pub fn new(key: impl Into<RecordKey>) -> Self {
        Self {
            key: key.into(),
            fields: Fields::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Stringified field value, empty when the field is absent
    pub fn get_as_string(&self, field: &str) -> String {
        self.fields
            .get(field)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    /// Overlay `fields` onto this record, keeping anything not mentioned
    pub fn merge(&mut self, fields: &Fields) {
        for (name, value) in fields {
            self.fields.insert(name.clone(), value.clone());
        }
    }
}

/// Convert a JSON scalar to a FieldValue. Null and nested values have no
/// field representation.
pub fn json_value_to_field_value(json: &JsonValue) -> Option<FieldValue> {
    match json {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(FieldValue::Integer(i))
            } else {
                n.as_f64().map(FieldValue::Float)
            }
        }
        JsonValue::String(s) => Some(FieldValue::Text(s.clone())),
        JsonValue::Bool(b) => Some(FieldValue::Text(b.to_string())),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}
