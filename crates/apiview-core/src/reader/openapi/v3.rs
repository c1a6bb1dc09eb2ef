use serde_json::Value;

use crate::error::SpecError;
use crate::model::{
    MediaContentMetadata, OperationCategory, OperationMetadata, OperationParameterMetadata,
    ParameterLocation, RequestMetadata, ResponseMetadata, SchemaMetadata, SpecKind,
};
use crate::parse::ref_resolve::NodeView;
use crate::parse::schema::Schema;
use crate::reader::{ApiSpecReader, SCHEMA_INLINE_DEPTH};

use super::{OpenApiDocument, media_content, parameter_row, schema_at, str_field};

/// Reader for OpenAPI 3.x documents.
#[derive(Debug)]
pub struct OpenApiV3Reader {
    doc: OpenApiDocument,
}

impl OpenApiV3Reader {
    pub fn new(text: &str) -> Result<Self, SpecError> {
        Ok(Self {
            doc: OpenApiDocument::parse(text)?,
        })
    }
}

impl ApiSpecReader for OpenApiV3Reader {
    fn kind(&self) -> SpecKind {
        SpecKind::OpenApiV3
    }

    /// First server URL with its variables replaced by their defaults.
    fn base_url(&self) -> Option<String> {
        let server = self.doc.root().get("servers")?.as_array()?.first()?;
        let mut url = str_field(server, "url")?.to_string();
        if let Some(variables) = server.get("variables").and_then(Value::as_object) {
            for (name, variable) in variables {
                if let Some(default) = variable.get("default").and_then(Value::as_str) {
                    url = url.replace(&format!("{{{name}}}"), default);
                }
            }
        }
        Some(url)
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

        for param in self.doc.parameters(&nodes) {
            let schema = param
                .get("schema")
                .and_then(Schema::from_value)
                .unwrap_or_default();
            match str_field(&param, "in").unwrap_or_default() {
                "path" => request
                    .parameters
                    .push(parameter_row(&param, ParameterLocation::Path, &schema)),
                "query" => request
                    .parameters
                    .push(parameter_row(&param, ParameterLocation::Query, &schema)),
                "header" => request
                    .headers
                    .push(parameter_row(&param, ParameterLocation::Header, &schema)),
                other => log::debug!("ignoring parameter location {other}"),
            }
        }

        if let Some(body) = nodes.operation.node("requestBody") {
            if request.description.is_none() {
                request.description = body.str("description").map(str::to_string);
            }
            request.body = content_variants(&body, true);
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

        responses
            .entries()
            .into_iter()
            .filter_map(|(code, response)| {
                let response = response.node()?;
                Some(ResponseMetadata {
                    code: code.to_string(),
                    description: response.str("description").map(str::to_string),
                    headers: response_headers(&response),
                    body: content_variants(&response, false),
                })
            })
            .collect()
    }

    fn operation_definitions(&self, name: &str) -> Vec<SchemaMetadata> {
        self.doc.definitions(name)
    }
}

/// Media variants under `content`. Request bodies are sorted by media type;
/// responses keep declaration order.
fn content_variants(owner: &NodeView<'_>, sorted: bool) -> Vec<MediaContentMetadata> {
    let Some(content) = owner.node("content") else {
        return Vec::new();
    };
    let mut entries = content.entries();
    if sorted {
        entries.sort_by(|a, b| a.0.cmp(b.0));
    }
    entries
        .into_iter()
        .filter_map(|(media_type, media)| {
            let media = media.node()?;
            let schema = schema_at(&media, "schema");
            let example = media.value().get("example");
            Some(media_content(media.resolver(), media_type, schema.as_ref(), example))
        })
        .collect()
}

fn response_headers(response: &NodeView<'_>) -> Vec<OperationParameterMetadata> {
    let Some(headers) = response.node("headers") else {
        return Vec::new();
    };
    headers
        .entries()
        .into_iter()
        .map(|(name, header)| {
            let header = header.materialize(SCHEMA_INLINE_DEPTH + 1);
            let schema = header
                .get("schema")
                .and_then(Schema::from_value)
                .unwrap_or_default();
            let mut named = header;
            if let Value::Object(map) = &mut named {
                map.insert("name".to_string(), Value::String(name.to_string()));
            }
            parameter_row(&named, ParameterLocation::Header, &schema)
        })
        .collect()
}
