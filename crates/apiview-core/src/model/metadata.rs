use serde::Serialize;

/// Where a parameter travels when the operation is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Arguments,
    Body,
}

/// Input widget classification used by the test console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    File,
    Select,
    Text,
    Number,
    Object,
    Array,
}

/// A single parameter, argument, header, or body property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationParameterMetadata {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Display label of the parameter type.
    #[serde(rename = "type")]
    pub type_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<serde_json::Value>,
}

impl OperationParameterMetadata {
    /// A bare parameter with only the mandatory fields set.
    pub fn new(
        name: impl Into<String>,
        location: ParameterLocation,
        type_label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            type_label: type_label.into(),
            field_type: None,
            description: None,
            required: false,
            read_only: false,
            enum_values: Vec::new(),
            default_value: None,
            examples: Vec::new(),
        }
    }
}

/// How a named definition renders in the "Definitions" section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Enum,
    Object,
    Other,
}

/// Source text shown alongside a schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawSchema {
    pub schema: String,
    pub language: String,
}

/// Display metadata for a schema, named or inline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaMetadata {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub ref_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_label: Option<String>,
    pub properties: Vec<OperationParameterMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_schema: Option<RawSchema>,
    pub is_enum: bool,
    pub is_binary: bool,
    pub kind: DefinitionKind,
}

/// Synthesized example payload for an editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleData {
    pub data: String,
    pub language: String,
}

/// One media type variant of a request or response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaContentMetadata {
    #[serde(rename = "type")]
    pub media_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_data: Option<SampleData>,
}

/// Everything needed to render an operation's request side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Path, query, and argument parameters.
    pub parameters: Vec<OperationParameterMetadata>,
    pub headers: Vec<OperationParameterMetadata>,
    pub body: Vec<MediaContentMetadata>,
}

/// One declared response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseMetadata {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub headers: Vec<OperationParameterMetadata>,
    pub body: Vec<MediaContentMetadata>,
}
