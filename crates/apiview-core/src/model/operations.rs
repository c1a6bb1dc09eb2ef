use std::fmt;

use serde::Serialize;

/// The specification dialect a reader was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecKind {
    OpenApiV2,
    OpenApiV3,
    GraphQl,
    Mcp,
}

impl SpecKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecKind::OpenApiV2 => "openapi-v2",
            SpecKind::OpenApiV3 => "openapi-v3",
            SpecKind::GraphQl => "graphql",
            SpecKind::Mcp => "mcp",
        }
    }
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// Every method an OpenAPI path item may declare, in document key order.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// Lowercase form, as used for OpenAPI path item keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }

    /// Method for a path item key. Keys are matched exactly, so `GET` is not
    /// an operation.
    pub fn from_key(key: &str) -> Option<Self> {
        HttpMethod::ALL.into_iter().find(|m| m.as_str() == key)
    }

    /// Methods whose requests conventionally carry a body.
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// One invocable unit of an API: an HTTP method + path, a GraphQL root
/// field, or an MCP tool/resource/prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationMetadata {
    /// Stable composite name, unique within a reader.
    pub name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    pub url_template: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Dialect-specific raw node. Only the reader that produced the
    /// operation looks inside it.
    #[serde(skip)]
    pub spec: serde_json::Value,
}

/// A named grouping of operations (OpenAPI bucket, GraphQL root type,
/// MCP capability kind).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationCategory {
    pub name: String,
    pub label: String,
    pub operations: Vec<OperationMetadata>,
}
