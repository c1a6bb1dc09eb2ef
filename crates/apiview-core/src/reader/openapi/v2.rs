use serde_json::Value;

use crate::error::SpecError;
use crate::labeler::{parameter_from_schema, schema_metadata};
use crate::model::{
    DefinitionKind, FieldType, MediaContentMetadata, OperationCategory, OperationMetadata,
    OperationParameterMetadata, ParameterLocation, RequestMetadata, ResponseMetadata,
    SchemaMetadata, SpecKind,
};
use crate::parse::schema::Schema;
use crate::reader::{ApiSpecReader, SCHEMA_INLINE_DEPTH};

use super::{
    OpenApiDocument, declared_media_types, media_content, parameter_row, schema_at, str_field,
};

const MULTIPART: &str = "multipart/form-data";
const URL_ENCODED: &str = "application/x-www-form-urlencoded";

/// Reader for Swagger 2.0 documents.
#[derive(Debug)]
pub struct OpenApiV2Reader {
    doc: OpenApiDocument,
}

impl OpenApiV2Reader {
    pub fn new(text: &str) -> Result<Self, SpecError> {
        Ok(Self {
            doc: OpenApiDocument::parse(text)?,
        })
    }
}

impl ApiSpecReader for OpenApiV2Reader {
    fn kind(&self) -> SpecKind {
        SpecKind::OpenApiV2
    }

    /// `scheme://host/basePath`, with the first declared scheme (or https).
    fn base_url(&self) -> Option<String> {
        let root = self.doc.root();
        let host = str_field(root, "host");
        let base_path = str_field(root, "basePath").unwrap_or_default();
        match host {
            Some(host) => {
                let scheme = root
                    .get("schemes")
                    .and_then(Value::as_array)
                    .and_then(|schemes| schemes.first())
                    .and_then(Value::as_str)
                    .unwrap_or("https");
                Some(format!("{scheme}://{host}{base_path}"))
            }
            None if !base_path.is_empty() => Some(base_path.to_string()),
            None => None,
        }
    }

    fn tag_labels(&self) -> Vec<String> {
        self.doc.tag_labels()
    }

    fn operation_categories(&self) -> Vec<OperationCategory> {
        self.doc.categories()
    }

    fn operation(&self, name: &str) -> Option<OperationMetadata> {
        self.doc.operation(name).cloned()
    }

    fn request_metadata(&self, name: &str) -> Option<RequestMetadata> {
        let op = self.doc.operation(name)?;
        let nodes = self.doc.nodes(name)?;
        let mut request = RequestMetadata {
            description: op.description.clone(),
            ..RequestMetadata::default()
        };
        let mut form_fields = Vec::new();
        let mut has_file = false;

        for param in self.doc.parameters(&nodes) {
            let location = str_field(&param, "in").unwrap_or_default();
            match location {
                "path" | "query" | "header" => {
                    let schema = Schema::from_value(&param).unwrap_or_default();
                    let (target, loc) = match location {
                        "path" => (&mut request.parameters, ParameterLocation::Path),
                        "query" => (&mut request.parameters, ParameterLocation::Query),
                        _ => (&mut request.headers, ParameterLocation::Header),
                    };
                    target.push(parameter_row(&param, loc, &schema));
                }
                "body" => {
                    let schema = param.get("schema").and_then(Schema::from_value);
                    let media_types =
                        declared_media_types(self.doc.root(), nodes.operation.value(), "consumes");
                    let resolver = self.doc.resolver();
                    for media_type in media_types {
                        request
                            .body
                            .push(media_content(resolver, &media_type, schema.as_ref(), None));
                    }
                }
                "formData" => {
                    let schema = Schema::from_value(&param).unwrap_or_default();
                    let mut row = parameter_row(&param, ParameterLocation::Body, &schema);
                    if schema.has_type("file") {
                        has_file = true;
                        row.field_type = Some(FieldType::File);
                    }
                    form_fields.push(row);
                }
                other => log::debug!("ignoring parameter location {other}"),
            }
        }

        if !form_fields.is_empty() {
            let consumes =
                declared_media_types(self.doc.root(), nodes.operation.value(), "consumes");
            let media_type = if has_file || consumes.iter().any(|m| m == MULTIPART) {
                MULTIPART
            } else {
                URL_ENCODED
            };
            request.body.push(form_content(media_type, form_fields));
        }

        Some(request)
    }

    fn responses_metadata(&self, name: &str) -> Vec<ResponseMetadata> {
        let Some(nodes) = self.doc.nodes(name) else {
            return Vec::new();
        };
        let Some(responses) = nodes.operation.node("responses") else {
            return Vec::new();
        };
        let produces = declared_media_types(self.doc.root(), nodes.operation.value(), "produces");

        responses
            .entries()
            .into_iter()
            .filter_map(|(code, response)| {
                let response = response.node()?;
                let headers = response
                    .node("headers")
                    .map(|headers| {
                        headers
                            .entries()
                            .into_iter()
                            .filter_map(|(header, node)| {
                                let schema =
                                    Schema::from_value(&node.materialize(SCHEMA_INLINE_DEPTH))?;
                                Some(parameter_from_schema(
                                    header,
                                    ParameterLocation::Header,
                                    &schema,
                                    false,
                                ))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                let body = match schema_at(&response, "schema") {
                    Some(schema) => produces
                        .iter()
                        .map(|media_type| response_content(media_type, &schema))
                        .collect(),
                    None => Vec::new(),
                };
                Some(ResponseMetadata {
                    code: code.to_string(),
                    description: response.str("description").map(str::to_string),
                    headers,
                    body,
                })
            })
            .collect()
    }

    fn operation_definitions(&self, name: &str) -> Vec<SchemaMetadata> {
        self.doc.definitions(name)
    }
}

/// Response bodies only list the direct properties of an inline object
/// schema. Arrays and referenced schemas keep their label but no rows.
fn response_content(media_type: &str, schema: &Schema) -> MediaContentMetadata {
    let mut metadata = schema_metadata(schema);
    metadata.properties = if schema.ref_path.is_none() && schema.single_type() == Some("object") {
        schema
            .properties
            .iter()
            .map(|(name, property)| {
                parameter_from_schema(
                    name,
                    ParameterLocation::Body,
                    property,
                    schema.is_required(name),
                )
            })
            .collect()
    } else {
        Vec::new()
    };
    MediaContentMetadata {
        media_type: media_type.to_string(),
        schema: Some(metadata),
        sample_data: None,
    }
}

fn form_content(media_type: &str, fields: Vec<OperationParameterMetadata>) -> MediaContentMetadata {
    MediaContentMetadata {
        media_type: media_type.to_string(),
        schema: Some(SchemaMetadata {
            ref_path: None,
            ref_label: None,
            type_label: Some("object".to_string()),
            properties: fields,
            raw_schema: None,
            is_enum: false,
            is_binary: false,
            kind: DefinitionKind::Object,
        }),
        sample_data: None,
    }
}
