//! Flat output records and destination rows

use crate::entity::value_as_key;
use crate::keys::{NaturalKey, RowId};
use crate::time::format_utc;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Prefix written into a field whose enrichment lookup failed.
pub const ERROR_MARKER_PREFIX: &str = "Error: ";

/// Delimiter used when flattening list-valued fields.
pub const DEFAULT_LIST_DELIMITER: &str = "; ";

/// A single scalar in an output record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl FieldValue {
    /// Error marker carrying the lookup failure message.
    pub fn error(message: impl std::fmt::Display) -> Self {
        FieldValue::Text(format!("{}{}", ERROR_MARKER_PREFIX, message))
    }

    /// Whether this value is an error marker.
    pub fn is_error_marker(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.starts_with(ERROR_MARKER_PREFIX))
    }

    /// Text rendering used by tables and CSV.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(true) => "True".to_string(),
            FieldValue::Bool(false) => "False".to_string(),
            FieldValue::Timestamp(ts) => format_utc(ts),
            FieldValue::Text(s) => s.clone(),
        }
    }

    /// JSON rendering used by list stores and JSON output.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Timestamp(ts) => Value::String(format_utc(ts)),
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Timestamp(ts) => serializer.serialize_str(&format_utc(ts)),
            FieldValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(ts: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(ts)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// One report row: natural key, display key, and ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    key: NaturalKey,
    display: String,
    fields: Vec<(String, FieldValue)>,
}

impl OutputRecord {
    pub fn new(key: NaturalKey, display: impl Into<String>) -> Self {
        Self {
            key,
            display: display.into(),
            fields: Vec::new(),
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing an existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn key(&self) -> &NaturalKey {
        &self.key
    }

    /// Key used to order records for review (usually the display name).
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Whether any field carries an enrichment error marker.
    pub fn has_errors(&self) -> bool {
        self.fields.iter().any(|(_, v)| v.is_error_marker())
    }

    /// Fields as a JSON object, in record order.
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }
}

impl Serialize for OutputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// An existing row in a list store.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationRecord {
    /// Store-assigned identifier
    pub row_id: RowId,

    /// Column values as stored
    pub fields: Map<String, Value>,
}

impl DestinationRecord {
    pub fn new(row_id: RowId, fields: Map<String, Value>) -> Self {
        Self { row_id, fields }
    }

    /// The row's natural key, read from `key_field`.
    pub fn key(&self, key_field: &str) -> Option<NaturalKey> {
        self.fields.get(key_field).and_then(value_as_key)
    }
}

/// Flatten list values into one delimited string.
///
/// Values are trimmed, blanks dropped, sorted case-insensitively (ties by
/// exact bytes) and de-duplicated so the output is stable between runs.
pub fn join_sorted<I, S>(values: I, delimiter: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut items: Vec<String> = values
        .into_iter()
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    items.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    items.dedup();
    items.join(delimiter)
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
