use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The `type` field can be a single type or an array of types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(String),
    Multiple(Vec<String>),
}

/// `additionalProperties` can be a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

/// A JSON-schema-like node covering the OpenAPI v2 and v3 schema objects and
/// the JSON schemas found in MCP tool manifests.
///
/// Deserialization is lenient: a keyword whose value has an unexpected shape
/// is treated as absent instead of failing the whole schema. A schema that
/// was inlined from a `$ref` keeps the reference in `ref_path`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(
        rename = "$ref",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub ref_path: Option<String>,

    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_type: Option<TypeSet>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        rename = "default",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<Value>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(
        rename = "additionalProperties",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(
        rename = "allOf",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub all_of: Vec<Schema>,

    #[serde(
        rename = "oneOf",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub one_of: Vec<Schema>,

    #[serde(
        rename = "anyOf",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub any_of: Vec<Schema>,

    #[serde(
        rename = "enum",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub enum_values: Vec<Value>,

    #[serde(
        rename = "readOnly",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub read_only: Option<bool>,

    #[serde(
        rename = "writeOnly",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub write_only: Option<bool>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl Schema {
    /// Build a schema from an already-resolved JSON node. Non-object nodes
    /// yield `None`.
    pub fn from_value(value: &Value) -> Option<Schema> {
        if !value.is_object() {
            return None;
        }
        match serde_json::from_value(value.clone()) {
            Ok(schema) => Some(schema),
            Err(e) => {
                log::warn!("ignoring malformed schema node: {e}");
                None
            }
        }
    }

    /// The declared type when it is a single string.
    pub fn single_type(&self) -> Option<&str> {
        match &self.schema_type {
            Some(TypeSet::Single(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Whether `type` is, or includes, the given type name.
    pub fn has_type(&self, name: &str) -> bool {
        match &self.schema_type {
            Some(TypeSet::Single(t)) => t == name,
            Some(TypeSet::Multiple(types)) => types.iter().any(|t| t == name),
            None => false,
        }
    }

    /// A bare `{"$ref": ...}` left in place of a schema that was not inlined.
    pub fn is_ref_marker(&self) -> bool {
        self.ref_path.is_some()
            && *self
                == Schema {
                    ref_path: self.ref_path.clone(),
                    ..Schema::default()
                }
    }

    /// Final path segment of the `$ref` this schema came from.
    pub fn ref_name(&self) -> Option<&str> {
        self.ref_path.as_deref().map(ref_name)
    }

    pub fn is_binary(&self) -> bool {
        self.has_type("string") && self.format.as_deref() == Some("binary")
    }

    /// Whether the schema enumerates discrete string values.
    pub fn is_string_enum(&self) -> bool {
        !self.enum_values.is_empty() && self.enum_values.iter().all(Value::is_string)
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}

/// Final path segment of a `$ref`, e.g. `Pet` for `#/definitions/Pet`.
pub fn ref_name(ref_path: &str) -> &str {
    ref_path.rsplit('/').next().unwrap_or(ref_path)
}

/// Render a JSON scalar the way a form field shows it: strings unquoted,
/// everything else as JSON text.
pub fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_keywords_degrade_to_absent() {
        let schema = Schema::from_value(&json!({
            "type": "object",
            "required": true,
            "properties": {"id": {"type": "integer"}},
            "items": "not-a-schema"
        }))
        .unwrap();
        assert_eq!(schema.single_type(), Some("object"));
        assert!(schema.required.is_empty());
        assert!(schema.items.is_none());
        assert_eq!(schema.properties.len(), 1);
    }

    #[test]
    fn test_type_array() {
        let schema = Schema::from_value(&json!({"type": ["string", "null"]})).unwrap();
        assert!(schema.has_type("string"));
        assert!(schema.has_type("null"));
        assert_eq!(schema.single_type(), None);
    }

    #[test]
    fn test_ref_name() {
        assert_eq!(ref_name("#/components/schemas/Pet"), "Pet");
        assert_eq!(ref_name("Pet"), "Pet");
    }

    #[test]
    fn test_ref_marker() {
        let marker = Schema::from_value(&json!({"$ref": "#/definitions/Pet"})).unwrap();
        assert!(marker.is_ref_marker());
        let inlined =
            Schema::from_value(&json!({"$ref": "#/definitions/Pet", "type": "object"})).unwrap();
        assert!(!inlined.is_ref_marker());
        assert!(!Schema::default().is_ref_marker());
    }

    #[test]
    fn test_non_object_is_not_a_schema() {
        assert!(Schema::from_value(&json!("string")).is_none());
    }

    #[test]
    fn test_value_to_display() {
        assert_eq!(value_to_display(&json!("available")), "available");
        assert_eq!(value_to_display(&json!(10)), "10");
        assert_eq!(value_to_display(&json!(true)), "true");
    }
}
