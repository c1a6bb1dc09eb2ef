//! Display concerns derived from schema nodes: type labels, form field
//! classification, definition metadata, and sample payloads.

mod sample;

pub use sample::{SampleBuilder, gather_sample_json_data, is_empty_sample};

use serde_json::Value;

use crate::model::{
    DefinitionKind, FieldType, OperationParameterMetadata, ParameterLocation, RawSchema,
    SchemaMetadata,
};
use crate::parse::schema::{AdditionalProperties, Schema, TypeSet, value_to_display};

/// Label used where a schema carries nothing to name.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Human-readable type label for a schema, or `None` when it declares no type.
pub fn schema_to_type_label(schema: &Schema) -> Option<String> {
    if !schema.one_of.is_empty() || !schema.any_of.is_empty() || !schema.all_of.is_empty() {
        return Some("union".to_string());
    }

    if schema.single_type() == Some("array") {
        let inner = schema
            .items
            .as_deref()
            .and_then(schema_to_type_label)
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        return Some(format!("[{inner}]"));
    }

    if let Some(name) = schema.ref_name() {
        return Some(name.to_string());
    }

    if schema.single_type() == Some("object") {
        if !schema.properties.is_empty() {
            return Some("object".to_string());
        }
        return Some(match &schema.additional_properties {
            Some(AdditionalProperties::Schema(inner)) => {
                let inner =
                    schema_to_type_label(inner).unwrap_or_else(|| UNKNOWN_LABEL.to_string());
                format!("{{ [key]: {inner} }}")
            }
            _ => format!("{{ [key]: {UNKNOWN_LABEL} }}"),
        });
    }

    match &schema.schema_type {
        Some(TypeSet::Multiple(types)) => Some(types.join(" | ")),
        Some(TypeSet::Single(t)) => Some(match &schema.format {
            Some(format) => format!("{t}({format})"),
            None => t.clone(),
        }),
        None => None,
    }
}

/// Input widget a test console should offer for the schema.
pub fn schema_to_field_type(schema: &Schema) -> Option<FieldType> {
    match schema.single_type()? {
        "string" if schema.is_binary() => Some(FieldType::File),
        "string" if !schema.enum_values.is_empty() => Some(FieldType::Select),
        "string" => Some(FieldType::Text),
        "integer" | "number" => Some(FieldType::Number),
        "object" => Some(FieldType::Object),
        "array" => Some(FieldType::Array),
        _ => None,
    }
}

/// Flatten one level of `allOf`: branch properties are merged into the
/// schema (later branches win on collisions) and `required` lists are
/// concatenated. Branches' own nested `allOf` are left alone.
pub fn prepare_schema(schema: &Schema) -> Schema {
    if schema.all_of.is_empty() {
        return schema.clone();
    }

    let mut merged = schema.clone();
    merged.all_of = Vec::new();
    for branch in &schema.all_of {
        for (name, property) in &branch.properties {
            merged.properties.insert(name.clone(), property.clone());
        }
        merged.required.extend(branch.required.iter().cloned());
        if merged.schema_type.is_none() {
            merged.schema_type = branch.schema_type.clone();
        }
    }
    if merged.schema_type.is_none() && !merged.properties.is_empty() {
        merged.schema_type = Some(TypeSet::Single("object".to_string()));
    }
    merged
}

/// Parameter row for a named schema (a property, argument, or parameter).
pub fn parameter_from_schema(
    name: &str,
    location: ParameterLocation,
    schema: &Schema,
    required: bool,
) -> OperationParameterMetadata {
    let type_label = schema_to_type_label(schema).unwrap_or_else(|| UNKNOWN_LABEL.to_string());
    let mut param = OperationParameterMetadata::new(name, location, type_label);
    param.field_type = schema_to_field_type(schema);
    param.description = schema.description.clone().or_else(|| schema.title.clone());
    param.required = required;
    param.read_only = schema.read_only.unwrap_or(false);
    param.enum_values = enum_labels(schema);
    param.default_value = schema.default_value.as_ref().map(value_to_display);
    param.examples = schema
        .example
        .iter()
        .chain(schema.examples.iter())
        .cloned()
        .collect();
    param
}

/// Display metadata for a schema, including its flattened properties.
///
/// Enumerations list their values as properties so a definition table can
/// render them the same way as fields.
pub fn schema_metadata(schema: &Schema) -> SchemaMetadata {
    let prepared = prepare_schema(schema);
    let is_enum = schema.is_string_enum();

    let properties = if is_enum {
        let value_label = schema.single_type().unwrap_or("string");
        schema
            .enum_values
            .iter()
            .map(|v| {
                OperationParameterMetadata::new(
                    value_to_display(v),
                    ParameterLocation::Body,
                    value_label,
                )
            })
            .collect()
    } else {
        prepared
            .properties
            .iter()
            .map(|(name, property)| {
                parameter_from_schema(
                    name,
                    ParameterLocation::Body,
                    property,
                    prepared.is_required(name),
                )
            })
            .collect()
    };

    let kind = if is_enum {
        DefinitionKind::Enum
    } else if prepared.has_type("object") || !prepared.properties.is_empty() {
        DefinitionKind::Object
    } else {
        DefinitionKind::Other
    };

    SchemaMetadata {
        ref_path: schema.ref_path.clone(),
        ref_label: schema.ref_name().map(str::to_string),
        type_label: schema_to_type_label(schema),
        properties,
        raw_schema: raw_json(schema),
        is_enum,
        is_binary: schema.is_binary(),
        kind,
    }
}

/// Pretty-printed JSON of a schema for a source view.
pub fn raw_json(schema: &Schema) -> Option<RawSchema> {
    serde_json::to_string_pretty(schema).ok().map(|text| RawSchema {
        schema: text,
        language: "json".to_string(),
    })
}

fn enum_labels(schema: &Schema) -> Vec<String> {
    schema
        .enum_values
        .iter()
        .chain(schema.items.iter().flat_map(|items| items.enum_values.iter()))
        .filter(|v| !v.is_null())
        .map(value_to_display)
        .collect()
}

/// Serialize a sample as the body of a JSON editor.
pub fn sample_text(sample: &Value) -> String {
    serde_json::to_string_pretty(sample).unwrap_or_default()
}
