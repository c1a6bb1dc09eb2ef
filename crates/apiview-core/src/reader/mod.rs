pub mod graphql;
pub mod mcp;
pub mod openapi;

use std::fmt;

use serde_json::Value;

use crate::error::SpecError;
use crate::model::{
    OperationCategory, OperationMetadata, RequestMetadata, ResponseMetadata, SchemaMetadata,
    SpecKind,
};
use crate::parse::parse_document;

pub use graphql::GraphQlReader;
pub use mcp::McpReader;
pub use openapi::{OpenApiV2Reader, OpenApiV3Reader};

/// Ref hops inlined when a schema is read for display: the schema's own
/// members are resolved, anything referenced from those stays a `$ref`
/// marker.
pub(crate) const SCHEMA_INLINE_DEPTH: usize = 1;

/// Dialect-agnostic view of an API specification.
///
/// Lookups by operation name never fail: an unknown name yields `None` or an
/// empty list. Readers are immutable once built.
pub trait ApiSpecReader: Send + Sync {
    fn kind(&self) -> SpecKind;

    fn base_url(&self) -> Option<String>;

    fn tag_labels(&self) -> Vec<String>;

    fn operation_categories(&self) -> Vec<OperationCategory>;

    /// All operations across categories, in category order.
    fn operations(&self) -> Vec<OperationMetadata> {
        self.operation_categories()
            .into_iter()
            .flat_map(|category| category.operations)
            .collect()
    }

    fn operation(&self, name: &str) -> Option<OperationMetadata> {
        self.operations().into_iter().find(|op| op.name == name)
    }

    fn request_metadata(&self, name: &str) -> Option<RequestMetadata>;

    fn responses_metadata(&self, name: &str) -> Vec<ResponseMetadata>;

    /// Named definitions reachable from the operation.
    fn operation_definitions(&self, name: &str) -> Vec<SchemaMetadata>;
}

/// Which reader to build for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecDialect {
    OpenApiV2,
    OpenApiV3,
    GraphQl,
    Mcp,
}

impl SpecDialect {
    /// Select a dialect from its declared name and version. `openapi` with
    /// version `2.0` is Swagger; any other `openapi` version is v3.
    pub fn from_declared(name: &str, version: Option<&str>) -> Result<Self, SpecError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openapi" => match version.map(str::trim) {
                Some("2.0") | Some("2") => Ok(SpecDialect::OpenApiV2),
                _ => Ok(SpecDialect::OpenApiV3),
            },
            "graphql" => Ok(SpecDialect::GraphQl),
            "mcp" => Ok(SpecDialect::Mcp),
            _ => Err(SpecError::UnsupportedDialect(name.to_string())),
        }
    }

    /// Guess the dialect from document content. Anything that is not a
    /// recognizable OpenAPI or MCP document is treated as GraphQL SDL.
    pub fn detect(text: &str) -> SpecDialect {
        let Ok(Value::Object(doc)) = parse_document(text) else {
            return SpecDialect::GraphQl;
        };
        if doc.contains_key("swagger") {
            SpecDialect::OpenApiV2
        } else if let Some(version) = doc.get("openapi") {
            match version {
                Value::String(v) if v.starts_with("2.") => SpecDialect::OpenApiV2,
                _ => SpecDialect::OpenApiV3,
            }
        } else if ["tools", "resources", "prompts"]
            .iter()
            .any(|key| doc.contains_key(*key))
        {
            SpecDialect::Mcp
        } else {
            SpecDialect::GraphQl
        }
    }

    pub fn kind(self) -> SpecKind {
        match self {
            SpecDialect::OpenApiV2 => SpecKind::OpenApiV2,
            SpecDialect::OpenApiV3 => SpecKind::OpenApiV3,
            SpecDialect::GraphQl => SpecKind::GraphQl,
            SpecDialect::Mcp => SpecKind::Mcp,
        }
    }
}

impl fmt::Display for SpecDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// Build the reader for a dialect over the given document text.
pub fn create_reader(
    dialect: SpecDialect,
    text: &str,
) -> Result<Box<dyn ApiSpecReader>, SpecError> {
    log::debug!("building {dialect} reader");
    let reader: Box<dyn ApiSpecReader> = match dialect {
        SpecDialect::OpenApiV2 => Box::new(OpenApiV2Reader::new(text)?),
        SpecDialect::OpenApiV3 => Box::new(OpenApiV3Reader::new(text)?),
        SpecDialect::GraphQl => Box::new(GraphQlReader::new(text)?),
        SpecDialect::Mcp => Box::new(McpReader::new(text)?),
    };
    Ok(reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_dialects() {
        assert_eq!(
            SpecDialect::from_declared("openapi", Some("2.0")).unwrap(),
            SpecDialect::OpenApiV2
        );
        assert_eq!(
            SpecDialect::from_declared("openapi", Some("3.1")).unwrap(),
            SpecDialect::OpenApiV3
        );
        assert_eq!(
            SpecDialect::from_declared("OpenAPI", None).unwrap(),
            SpecDialect::OpenApiV3
        );
        assert_eq!(
            SpecDialect::from_declared("graphql", None).unwrap(),
            SpecDialect::GraphQl
        );
        assert_eq!(SpecDialect::from_declared("mcp", None).unwrap(), SpecDialect::Mcp);
    }

    #[test]
    fn test_unsupported_dialect_names_it() {
        let err = SpecDialect::from_declared("wsdl", Some("1.1")).unwrap_err();
        assert!(matches!(&err, SpecError::UnsupportedDialect(name) if name == "wsdl"));
        assert!(err.to_string().contains("wsdl"));
    }

    #[test]
    fn test_detect() {
        assert_eq!(SpecDialect::detect("swagger: 2.0\npaths: {}\n"), SpecDialect::OpenApiV2);
        assert_eq!(
            SpecDialect::detect("swagger: \"2.0\"\npaths: {}\n"),
            SpecDialect::OpenApiV2
        );
        assert_eq!(SpecDialect::detect("openapi: 3.0.3\npaths: {}\n"), SpecDialect::OpenApiV3);
        assert_eq!(SpecDialect::detect(r#"{"tools": []}"#), SpecDialect::Mcp);
        assert_eq!(
            SpecDialect::detect("type Query {\n  pets: [String]\n}\n"),
            SpecDialect::GraphQl
        );
    }

    #[test]
    fn test_create_reader_reports_kind() {
        let reader = create_reader(SpecDialect::Mcp, r#"{"tools": []}"#).unwrap();
        assert_eq!(reader.kind(), SpecKind::Mcp);
    }
}
