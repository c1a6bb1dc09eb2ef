//! Reader over a static MCP capability manifest: the `tools`, `resources`,
//! and `prompts` a server advertised from its `*/list` methods.

use std::collections::HashSet;

use heck::ToTitleCase;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SpecError;
use crate::labeler::{
    SampleBuilder, parameter_from_schema, prepare_schema, sample_text, schema_metadata,
};
use crate::model::{
    MediaContentMetadata, OperationCategory, OperationMetadata, OperationParameterMetadata,
    ParameterLocation, RequestMetadata, ResponseMetadata, SampleData, SchemaMetadata, SpecKind,
};
use crate::parse::ref_resolve::{RefResolver, RefTrail, Resolved};
use crate::parse::schema::Schema;
use crate::reader::{ApiSpecReader, SCHEMA_INLINE_DEPTH};

/// Ref prefixes that address definitions local to a tool schema.
const LOCAL_DEFINITION_PREFIXES: [&str; 2] = ["#/$defs/", "#/definitions/"];

const DEFAULT_RESOURCE_MIME: &str = "text/plain";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct McpManifest {
    #[serde(default)]
    pub tools: Vec<McpTool>,
    #[serde(default)]
    pub resources: Vec<McpResource>,
    #[serde(default)]
    pub prompts: Vec<McpPrompt>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpTool {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Value,
    pub output_schema: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpResource {
    pub name: String,
    pub uri: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpPrompt {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: Vec<McpPromptArgument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct McpPromptArgument {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capability {
    Tools,
    Resources,
    Prompts,
}

impl Capability {
    const ALL: [Capability; 3] = [Capability::Tools, Capability::Resources, Capability::Prompts];

    fn as_str(self) -> &'static str {
        match self {
            Capability::Tools => "tools",
            Capability::Resources => "resources",
            Capability::Prompts => "prompts",
        }
    }

    fn from_prefix(name: &str) -> Option<(Capability, &str)> {
        let (prefix, rest) = name.split_once('/')?;
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == prefix)
            .map(|c| (c, rest))
    }
}

enum Entry<'a> {
    Tool(&'a McpTool),
    Resource(&'a McpResource),
    Prompt(&'a McpPrompt),
}

#[derive(Debug)]
pub struct McpReader {
    manifest: McpManifest,
}

impl McpReader {
    pub fn new(text: &str) -> Result<Self, SpecError> {
        let manifest: McpManifest = serde_json::from_str(text)?;
        log::debug!(
            "MCP manifest: {} tools, {} resources, {} prompts",
            manifest.tools.len(),
            manifest.resources.len(),
            manifest.prompts.len()
        );
        Ok(Self { manifest })
    }

    pub fn manifest(&self) -> &McpManifest {
        &self.manifest
    }

    fn entry(&self, name: &str) -> Option<Entry<'_>> {
        let (capability, rest) = Capability::from_prefix(name)?;
        match capability {
            Capability::Tools => self
                .manifest
                .tools
                .iter()
                .find(|t| t.name == rest)
                .map(Entry::Tool),
            Capability::Resources => self
                .manifest
                .resources
                .iter()
                .find(|r| r.name == rest)
                .map(Entry::Resource),
            Capability::Prompts => self
                .manifest
                .prompts
                .iter()
                .find(|p| p.name == rest)
                .map(Entry::Prompt),
        }
    }

    fn operations_of(&self, capability: Capability) -> Vec<OperationMetadata> {
        let category = capability.as_str();
        let op = |name: &str,
                  title: &Option<String>,
                  description: &Option<String>,
                  url_template: &str,
                  spec: Value| OperationMetadata {
            name: format!("{category}/{name}"),
            display_name: title.clone().unwrap_or_else(|| name.to_string()),
            description: description.clone(),
            category: Some(category.to_string()),
            method: None,
            url_template: url_template.to_string(),
            tags: Vec::new(),
            spec,
        };
        let mut operations: Vec<OperationMetadata> = match capability {
            Capability::Tools => self
                .manifest
                .tools
                .iter()
                .map(|t| op(&t.name, &t.title, &t.description, &t.name, t.input_schema.clone()))
                .collect(),
            Capability::Resources => self
                .manifest
                .resources
                .iter()
                .map(|r| {
                    let spec = Value::String(r.uri.clone());
                    op(&r.name, &r.title, &r.description, &r.uri, spec)
                })
                .collect(),
            Capability::Prompts => self
                .manifest
                .prompts
                .iter()
                .map(|p| op(&p.name, &p.title, &p.description, &p.name, Value::Null))
                .collect(),
        };

        // Names are unique; the first entry wins, as in `entry`.
        let mut seen = HashSet::new();
        operations.retain(|op| {
            let first = seen.insert(op.name.clone());
            if !first {
                log::warn!("ignoring duplicate MCP entry {}", op.name);
            }
            first
        });
        operations
    }
}

impl ApiSpecReader for McpReader {
    fn kind(&self) -> SpecKind {
        SpecKind::Mcp
    }

    fn base_url(&self) -> Option<String> {
        None
    }

    fn tag_labels(&self) -> Vec<String> {
        Vec::new()
    }

    fn operation_categories(&self) -> Vec<OperationCategory> {
        Capability::ALL
            .into_iter()
            .map(|capability| OperationCategory {
                name: capability.as_str().to_string(),
                label: capability.as_str().to_title_case(),
                operations: self.operations_of(capability),
            })
            .filter(|category| !category.operations.is_empty())
            .collect()
    }

    fn request_metadata(&self, name: &str) -> Option<RequestMetadata> {
        let request = match self.entry(name)? {
            Entry::Tool(tool) => {
                let schema = materialized_schema(&tool.input_schema).unwrap_or_default();
                let prepared = prepare_schema(&schema);
                let parameters = prepared
                    .properties
                    .iter()
                    .map(|(arg, property)| {
                        parameter_from_schema(
                            arg,
                            ParameterLocation::Arguments,
                            property,
                            prepared.is_required(arg),
                        )
                    })
                    .collect();
                let sample = SampleBuilder::new(RefResolver::new(&tool.input_schema))
                    .sample(&schema, true);
                RequestMetadata {
                    description: tool.description.clone(),
                    parameters,
                    headers: Vec::new(),
                    body: vec![MediaContentMetadata {
                        media_type: "application/json".to_string(),
                        schema: Some(schema_metadata(&schema)),
                        sample_data: sample.map(|data| SampleData {
                            data: sample_text(&data),
                            language: "json".to_string(),
                        }),
                    }],
                }
            }
            Entry::Prompt(prompt) => RequestMetadata {
                description: prompt.description.clone(),
                parameters: prompt
                    .arguments
                    .iter()
                    .map(|arg| {
                        let mut row = OperationParameterMetadata::new(
                            &arg.name,
                            ParameterLocation::Arguments,
                            "string",
                        );
                        row.description = arg.description.clone();
                        row.required = arg.required;
                        row
                    })
                    .collect(),
                headers: Vec::new(),
                body: Vec::new(),
            },
            Entry::Resource(resource) => RequestMetadata {
                description: resource.description.clone(),
                ..RequestMetadata::default()
            },
        };
        Some(request)
    }

    fn responses_metadata(&self, name: &str) -> Vec<ResponseMetadata> {
        let Some(entry) = self.entry(name) else {
            return Vec::new();
        };
        let response = |code: &str, media_type: &str, schema: Option<SchemaMetadata>| {
            ResponseMetadata {
                code: code.to_string(),
                description: None,
                headers: Vec::new(),
                body: vec![MediaContentMetadata {
                    media_type: media_type.to_string(),
                    schema,
                    sample_data: None,
                }],
            }
        };
        match entry {
            Entry::Tool(tool) => tool
                .output_schema
                .as_ref()
                .and_then(materialized_schema)
                .map(|schema| {
                    let metadata = schema_metadata(&schema);
                    vec![response("result", "application/json", Some(metadata))]
                })
                .unwrap_or_default(),
            Entry::Resource(resource) => vec![response(
                "contents",
                resource.mime_type.as_deref().unwrap_or(DEFAULT_RESOURCE_MIME),
                None,
            )],
            Entry::Prompt(_) => vec![response("messages", "application/json", None)],
        }
    }

    fn operation_definitions(&self, name: &str) -> Vec<SchemaMetadata> {
        let Some(Entry::Tool(tool)) = self.entry(name) else {
            return Vec::new();
        };
        let mut seen = Vec::new();
        let mut definitions = Vec::new();
        for root in std::iter::once(&tool.input_schema).chain(tool.output_schema.iter()) {
            let resolver = RefResolver::new(root);
            for r in resolver.collect_refs(root) {
                let local = LOCAL_DEFINITION_PREFIXES.iter().any(|p| r.starts_with(p));
                if !local || seen.contains(&r) {
                    continue;
                }
                seen.push(r);
                match resolver.resolve_ref(r, &RefTrail::default()) {
                    Resolved::Node(view) => {
                        let value = view.materialize(SCHEMA_INLINE_DEPTH);
                        if let Some(schema) = Schema::from_value(&value) {
                            definitions.push(schema_metadata(&schema));
                        }
                    }
                    Resolved::Cycle(_) | Resolved::Dangling(_) => {
                        log::warn!("skipping unresolvable definition {r} in tool {}", tool.name);
                    }
                }
            }
        }
        definitions
    }
}

/// A tool schema with its direct local refs inlined.
fn materialized_schema(root: &Value) -> Option<Schema> {
    let resolver = RefResolver::new(root);
    Schema::from_value(&resolver.resolve(root).materialize(SCHEMA_INLINE_DEPTH))
}
