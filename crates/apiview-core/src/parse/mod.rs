pub mod ref_resolve;
pub mod schema;

use serde_json::{Map, Number, Value};

use crate::error::SpecError;

/// Parse a specification document from YAML into a JSON tree.
pub fn from_yaml(input: &str) -> Result<Value, SpecError> {
    let yaml: serde_yaml_ng::Value = serde_yaml_ng::from_str(input)?;
    Ok(yaml_to_json(yaml))
}

/// Parse a specification document from JSON.
pub fn from_json(input: &str) -> Result<Value, SpecError> {
    Ok(serde_json::from_str(input)?)
}

/// Parse a document that may be either JSON or YAML.
pub fn parse_document(input: &str) -> Result<Value, SpecError> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        from_json(input)
    } else {
        from_yaml(input)
    }
}

/// YAML allows non-string mapping keys (`200:` under `responses`); JSON
/// pointers and the readers expect strings, so keys are stringified.
fn yaml_to_json(value: serde_yaml_ng::Value) -> Value {
    use serde_yaml_ng::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml_ng::Value) -> String {
    use serde_yaml_ng::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Null => "null".to_string(),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        other => serde_yaml_ng::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
