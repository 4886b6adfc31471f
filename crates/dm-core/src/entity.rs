//! Source entities returned by the directory service

use crate::error::{CoreError, CoreResult};
use crate::keys::{EntityId, NaturalKey};
use crate::time::parse_utc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A read-only directory object: its `id` plus whatever attributes were selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntity {
    /// Directory-assigned identifier
    pub id: EntityId,

    /// Selected attributes, including `id`
    pub attributes: Map<String, Value>,
}

impl SourceEntity {
    /// Build an entity from a JSON object carrying a non-blank string `id`.
    pub fn from_json(value: Value) -> CoreResult<Self> {
        let Value::Object(attributes) = value else {
            return Err(CoreError::MalformedEntity {
                reason: "expected a JSON object".to_string(),
            });
        };

        let id = attributes
            .get("id")
            .and_then(Value::as_str)
            .and_then(EntityId::try_new)
            .ok_or_else(|| CoreError::MalformedEntity {
                reason: "missing 'id' attribute".to_string(),
            })?;

        Ok(Self { id, attributes })
    }

    /// Look up an attribute; `/` separates nested properties.
    pub fn attribute(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.attributes, path)
    }

    /// Attribute as a string slice, if it is a JSON string.
    pub fn str_attr(&self, path: &str) -> Option<&str> {
        self.attribute(path).and_then(Value::as_str)
    }

    /// Attribute as a boolean, if it is a JSON boolean.
    pub fn bool_attr(&self, path: &str) -> Option<bool> {
        self.attribute(path).and_then(Value::as_bool)
    }

    /// Attribute parsed as a UTC timestamp.
    pub fn timestamp_attr(&self, path: &str) -> Option<DateTime<Utc>> {
        self.str_attr(path).and_then(parse_utc)
    }

    /// The value of `field` as a natural key.
    ///
    /// Numbers are accepted and rendered in their JSON form; anything else
    /// (missing, null, blank) is an error since the record could not be
    /// matched against the sink.
    pub fn natural_key(&self, field: &str) -> CoreResult<NaturalKey> {
        self.attribute(field)
            .and_then(value_as_key)
            .ok_or_else(|| CoreError::MissingNaturalKey {
                id: self.id.to_string(),
                field: field.to_string(),
            })
    }

    /// `displayName`, falling back to the entity id.
    pub fn display_name(&self) -> &str {
        self.str_attr("displayName")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(self.id.as_str())
    }
}

/// Resolve a `/`-separated property path inside a JSON object.
pub fn lookup_path<'a>(object: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('/');
    let first = segments.next()?;
    let mut current = object.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Same as [`lookup_path`], starting from an arbitrary JSON value.
pub fn lookup_value<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    value.as_object().and_then(|obj| lookup_path(obj, path))
}

/// Convert a scalar JSON value to a natural key.
pub fn value_as_key(value: &Value) -> Option<NaturalKey> {
    match value {
        Value::String(s) => NaturalKey::try_new(s),
        Value::Number(n) => NaturalKey::try_new(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> SourceEntity {
        SourceEntity::from_json(json!({
            "id": "sp-1",
            "appId": "app-1",
            "displayName": "Payroll",
            "appRoleAssignmentRequired": true,
            "signInActivity": { "lastSignInDateTime": "2024-03-01T09:00:00Z" }
        }))
        .unwrap()
    }

    #[test]
    fn test_from_json_requires_id() {
        assert!(SourceEntity::from_json(json!({ "displayName": "x" })).is_err());
        assert!(SourceEntity::from_json(json!({ "id": "" })).is_err());
        assert!(SourceEntity::from_json(json!(["id"])).is_err());
    }

    #[test]
    fn test_attribute_accessors() {
        let entity = sample();
        assert_eq!(entity.str_attr("appId"), Some("app-1"));
        assert_eq!(entity.bool_attr("appRoleAssignmentRequired"), Some(true));
        assert!(entity
            .timestamp_attr("signInActivity/lastSignInDateTime")
            .is_some());
        assert!(entity.attribute("signInActivity/missing").is_none());
        assert_eq!(entity.display_name(), "Payroll");
    }

    #[test]
    fn test_natural_key() {
        let entity = sample();
        assert_eq!(entity.natural_key("appId").unwrap(), "app-1");
        assert!(matches!(
            entity.natural_key("nope"),
            Err(CoreError::MissingNaturalKey { .. })
        ));
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let entity = SourceEntity::from_json(json!({ "id": "u-9", "displayName": " " })).unwrap();
        assert_eq!(entity.display_name(), "u-9");
    }
}
