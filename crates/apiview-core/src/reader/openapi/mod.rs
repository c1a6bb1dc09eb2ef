//! Shared machinery for the Swagger 2.0 and OpenAPI 3.x readers.

mod v2;
mod v3;

pub use v2::OpenApiV2Reader;
pub use v3::OpenApiV3Reader;

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::SpecError;
use crate::labeler::{SampleBuilder, parameter_from_schema, sample_text, schema_metadata};
use crate::model::{
    HttpMethod, MediaContentMetadata, OperationCategory, OperationMetadata,
    OperationParameterMetadata, ParameterLocation, SampleData, SchemaMetadata,
};
use crate::parse::parse_document;
use crate::parse::ref_resolve::{NodeView, RefResolver, RefTrail, Resolved};
use crate::parse::schema::Schema;
use crate::reader::SCHEMA_INLINE_DEPTH;

/// Ref prefixes that address reusable schema definitions.
const DEFINITION_PREFIXES: [&str; 2] = ["#/definitions/", "#/components/schemas/"];

pub(crate) const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// A parsed OpenAPI document and the operations enumerated from it.
#[derive(Debug)]
pub(crate) struct OpenApiDocument {
    root: Value,
    operations: IndexMap<String, OperationMetadata>,
}

/// An operation node together with the path item that declares it.
pub(crate) struct OperationNodes<'a> {
    pub operation: NodeView<'a>,
    pub path_item: NodeView<'a>,
}

impl OpenApiDocument {
    pub fn parse(text: &str) -> Result<Self, SpecError> {
        let root = parse_document(text)?;
        if !root.is_object() {
            return Err(SpecError::InvalidDocument(
                "expected a mapping at the document root".to_string(),
            ));
        }
        let operations = enumerate_operations(&root);
        log::debug!("enumerated {} operations", operations.len());
        Ok(Self { root, operations })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn resolver(&self) -> RefResolver<'_> {
        RefResolver::new(&self.root)
    }

    pub fn operation(&self, name: &str) -> Option<&OperationMetadata> {
        self.operations.get(name)
    }

    pub fn categories(&self) -> Vec<OperationCategory> {
        vec![OperationCategory {
            name: "default".to_string(),
            label: "Operations".to_string(),
            operations: self.operations.values().cloned().collect(),
        }]
    }

    /// Declared tags in document order, then tags only used by operations
    /// in first-seen order.
    pub fn tag_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .root
            .get("tags")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|tag| tag.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        for op in self.operations.values() {
            for tag in &op.tags {
                if !labels.contains(tag) {
                    labels.push(tag.clone());
                }
            }
        }
        labels
    }

    /// Locate an operation's node and its path item for further reads.
    pub fn nodes(&self, name: &str) -> Option<OperationNodes<'_>> {
        let op = self.operations.get(name)?;
        let method = op.method?;
        let path_item = self
            .resolver()
            .root_view()
            .node("paths")?
            .node(&op.url_template)?;
        let operation = path_item.node(method.as_str())?;
        Some(OperationNodes {
            operation,
            path_item,
        })
    }

    /// Operation-level parameters followed by path-level ones, deduplicated
    /// by `(in, name)` with the first occurrence kept. Each is materialized
    /// one hop deeper than a schema, since a parameter wraps its schema.
    pub fn parameters(&self, nodes: &OperationNodes<'_>) -> Vec<Value> {
        let mut seen = HashSet::new();
        let mut params = Vec::new();
        for owner in [&nodes.operation, &nodes.path_item] {
            let Some(list) = owner.node("parameters") else {
                continue;
            };
            for entry in list.elements() {
                let mut param = match entry {
                    Resolved::Node(view) => view.materialize(SCHEMA_INLINE_DEPTH + 1),
                    Resolved::Cycle(r) | Resolved::Dangling(r) => {
                        log::warn!("skipping unresolvable parameter {r}");
                        continue;
                    }
                };
                // A v2 parameter doubles as its own schema; a kept origin
                // ref would be mistaken for a schema reference.
                if let Value::Object(map) = &mut param {
                    map.remove("$ref");
                }
                let key = (
                    str_field(&param, "in").unwrap_or_default().to_string(),
                    str_field(&param, "name").unwrap_or_default().to_string(),
                );
                if key.1.is_empty() {
                    continue;
                }
                if seen.insert(key) {
                    params.push(param);
                }
            }
        }
        params
    }

    /// Named definitions reachable from an operation. Dangling refs are
    /// skipped with a warning.
    pub fn definitions(&self, name: &str) -> Vec<SchemaMetadata> {
        let Some(op) = self.operations.get(name) else {
            return Vec::new();
        };
        let resolver = self.resolver();
        let mut refs = resolver.collect_refs(&op.spec);
        if let Some(nodes) = self.nodes(name)
            && let Some(shared) = nodes.path_item.value().get("parameters")
        {
            for r in resolver.collect_refs(shared) {
                if !refs.contains(&r) {
                    refs.push(r);
                }
            }
        }

        refs.into_iter()
            .filter(|r| DEFINITION_PREFIXES.iter().any(|p| r.starts_with(p)))
            .filter_map(|r| match resolver.resolve_ref(r, &RefTrail::default()) {
                Resolved::Node(view) => {
                    Schema::from_value(&view.materialize(SCHEMA_INLINE_DEPTH))
                }
                Resolved::Cycle(_) | Resolved::Dangling(_) => {
                    log::warn!("skipping unresolvable definition {r}");
                    None
                }
            })
            .map(|schema| schema_metadata(&schema))
            .collect()
    }
}

fn enumerate_operations(root: &Value) -> IndexMap<String, OperationMetadata> {
    let resolver = RefResolver::new(root);
    let mut operations = IndexMap::new();
    let Some(paths) = resolver.root_view().node("paths") else {
        return operations;
    };

    for (path, item) in paths.entries() {
        let Some(item) = item.node() else {
            log::warn!("skipping unresolvable path item {path}");
            continue;
        };
        let Some(methods) = item.value().as_object() else {
            continue;
        };
        for (key, node) in methods {
            let Some(method) = HttpMethod::from_key(key) else {
                continue;
            };
            let name = format!("{}{}", method.as_str(), path);
            let display_name = str_field(node, "summary").unwrap_or(path).to_string();
            let tags = node
                .get("tags")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            operations.insert(
                name.clone(),
                OperationMetadata {
                    name,
                    display_name,
                    description: str_field(node, "description").map(str::to_string),
                    category: None,
                    method: Some(method),
                    url_template: path.to_string(),
                    tags,
                    spec: node.clone(),
                },
            );
        }
    }
    operations
}

pub(crate) fn str_field<'v>(value: &'v Value, key: &str) -> Option<&'v str> {
    value.get(key).and_then(Value::as_str)
}

pub(crate) fn bool_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Row for a parameter whose type is described by `schema`; name,
/// description, and `required` come from the parameter object.
pub(crate) fn parameter_row(
    param: &Value,
    location: ParameterLocation,
    schema: &Schema,
) -> OperationParameterMetadata {
    let name = str_field(param, "name").unwrap_or_default();
    let mut row = parameter_from_schema(name, location, schema, bool_field(param, "required"));
    if let Some(description) = str_field(param, "description") {
        row.description = Some(description.to_string());
    }
    row
}

pub(crate) fn is_json_media(media_type: &str) -> bool {
    let essence = media_type.split(';').next().unwrap_or_default().trim();
    essence == "application/json" || essence.ends_with("+json")
}

/// Body variant for a media type. JSON media get a synthesized sample,
/// following refs through `resolver`, unless an explicit example is supplied.
pub(crate) fn media_content(
    resolver: RefResolver<'_>,
    media_type: &str,
    schema: Option<&Schema>,
    example: Option<&Value>,
) -> MediaContentMetadata {
    let sample = match example {
        Some(example) => Some(example.clone()),
        None if is_json_media(media_type) => {
            schema.and_then(|s| SampleBuilder::new(resolver).sample(s, true))
        }
        None => None,
    };
    MediaContentMetadata {
        media_type: media_type.to_string(),
        schema: schema.map(schema_metadata),
        sample_data: sample.map(|data| SampleData {
            data: sample_text(&data),
            language: "json".to_string(),
        }),
    }
}

/// Schema under `key` of a node, if it parses as one.
pub(crate) fn schema_at(node: &NodeView<'_>, key: &str) -> Option<Schema> {
    let resolved = node.get(key)?;
    Schema::from_value(&resolved.materialize(SCHEMA_INLINE_DEPTH))
}

/// Media types declared by `key` (`consumes`/`produces`) on the operation,
/// falling back to the document root, then to JSON.
pub(crate) fn declared_media_types(root: &Value, operation: &Value, key: &str) -> Vec<String> {
    let declared = operation
        .get(key)
        .or_else(|| root.get(key))
        .and_then(Value::as_array)
        .map(|types| {
            types
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if declared.is_empty() {
        vec![DEFAULT_MEDIA_TYPE.to_string()]
    } else {
        declared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_json_media() {
        assert!(is_json_media("application/json"));
        assert!(is_json_media("application/json; charset=utf-8"));
        assert!(is_json_media("application/problem+json"));
        assert!(!is_json_media("application/xml"));
        assert!(!is_json_media("multipart/form-data"));
    }

    #[test]
    fn test_non_mapping_root_is_invalid() {
        assert!(matches!(
            OpenApiDocument::parse("- a\n- b\n"),
            Err(SpecError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_parameters_dedup_first_wins() {
        let doc = OpenApiDocument::parse(
            r##"
swagger: "2.0"
parameters:
  TraceId:
    name: X-Trace
    in: header
    type: string
    description: shared
paths:
  /pets:
    parameters:
      - $ref: "#/parameters/TraceId"
      - name: limit
        in: query
        type: integer
    get:
      parameters:
        - name: X-Trace
          in: header
          type: string
          description: explicit
"##,
        )
        .unwrap();
        let nodes = doc.nodes("get/pets").unwrap();
        let params = doc.parameters(&nodes);
        assert_eq!(params.len(), 2);
        assert_eq!(params[0]["description"], "explicit");
        assert_eq!(params[1]["name"], "limit");
    }
}
