//! GraphQL SDL reader.
//!
//! The schema is parsed once with `apollo-compiler` and flattened into a
//! small type table; everything after construction works on that table.

use std::collections::HashSet;

use apollo_compiler::Schema as GqlSchema;
use apollo_compiler::ast::{FieldDefinition, InputValueDefinition, OperationType, Type};
use apollo_compiler::schema::ExtendedType;
use heck::ToUpperCamelCase;
use indexmap::IndexMap;
use serde_json::json;

use crate::error::SpecError;
use crate::model::{
    DefinitionKind, FieldType, MediaContentMetadata, OperationCategory, OperationMetadata,
    OperationParameterMetadata, ParameterLocation, RawSchema, RequestMetadata, ResponseMetadata,
    SchemaMetadata, SpecKind,
};
use crate::reader::ApiSpecReader;

const ROOT_KINDS: [(OperationType, &str); 3] = [
    (OperationType::Query, "query"),
    (OperationType::Mutation, "mutation"),
    (OperationType::Subscription, "subscription"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    Input,
}

impl TypeKind {
    fn keyword(self) -> &'static str {
        match self {
            TypeKind::Scalar => "scalar",
            TypeKind::Object => "type",
            TypeKind::Interface => "interface",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::Input => "input",
        }
    }
}

/// A field, argument, or input field, with its type already rendered.
#[derive(Debug, Clone)]
struct GqlField {
    name: String,
    description: Option<String>,
    /// `T`, `T!`, `[T]`, ...
    type_label: String,
    /// Innermost named type.
    named_type: String,
    required: bool,
    is_list: bool,
    default_value: Option<String>,
    arguments: Vec<GqlField>,
}

#[derive(Debug, Clone)]
struct GqlType {
    name: String,
    kind: TypeKind,
    description: Option<String>,
    fields: Vec<GqlField>,
    enum_values: Vec<String>,
    members: Vec<String>,
}

#[derive(Debug, Clone)]
struct RootOperation {
    category: &'static str,
    field: GqlField,
}

/// Reader over a GraphQL schema document.
#[derive(Debug)]
pub struct GraphQlReader {
    types: IndexMap<String, GqlType>,
    operations: IndexMap<String, RootOperation>,
    categories: Vec<&'static str>,
}

impl GraphQlReader {
    /// Parse SDL. Build errors are logged and the partial schema is used, as
    /// long as it still defines at least one root operation type.
    pub fn new(text: &str) -> Result<Self, SpecError> {
        let schema = match GqlSchema::parse(text, "schema.graphql") {
            Ok(schema) => schema,
            Err(with_errors) => {
                let roots = ROOT_KINDS
                    .iter()
                    .filter(|(kind, _)| with_errors.partial.root_operation(*kind).is_some())
                    .count();
                if roots == 0 {
                    return Err(SpecError::GraphQl(with_errors.errors.to_string()));
                }
                log::warn!(
                    "GraphQL schema has errors, using partial schema: {}",
                    with_errors.errors
                );
                with_errors.partial
            }
        };

        let types: IndexMap<String, GqlType> = schema
            .types
            .iter()
            .filter(|(_, ty)| !ty.is_built_in())
            .map(|(name, ty)| (name.to_string(), convert_type(name.as_str(), ty)))
            .collect();

        let mut operations = IndexMap::new();
        let mut categories = Vec::new();
        for (kind, category) in ROOT_KINDS {
            let Some(root_name) = schema.root_operation(kind) else {
                continue;
            };
            let Some(root) = types.get(root_name.as_str()) else {
                continue;
            };
            categories.push(category);
            for field in &root.fields {
                operations.insert(
                    format!("{category}/{}", field.name),
                    RootOperation {
                        category,
                        field: field.clone(),
                    },
                );
            }
        }

        if categories.is_empty() {
            return Err(SpecError::GraphQl(
                "schema defines no query, mutation, or subscription type".to_string(),
            ));
        }

        Ok(Self {
            types,
            operations,
            categories,
        })
    }

    fn metadata(&self, name: &str, op: &RootOperation) -> OperationMetadata {
        OperationMetadata {
            name: name.to_string(),
            display_name: op.field.name.clone(),
            description: op.field.description.clone(),
            category: Some(op.category.to_string()),
            method: None,
            url_template: op.field.name.clone(),
            tags: Vec::new(),
            spec: json!({"category": op.category, "field": op.field.name}),
        }
    }

    fn kind_of(&self, named_type: &str) -> Option<TypeKind> {
        self.types.get(named_type).map(|t| t.kind)
    }

    fn argument_row(&self, arg: &GqlField) -> OperationParameterMetadata {
        let mut row = OperationParameterMetadata::new(
            &arg.name,
            ParameterLocation::Arguments,
            &arg.type_label,
        );
        row.description = arg.description.clone();
        row.required = arg.required;
        row.default_value = arg.default_value.clone();
        row.field_type = self.field_type(arg);
        if let Some(ty) = self.types.get(&arg.named_type)
            && ty.kind == TypeKind::Enum
        {
            row.enum_values = ty.enum_values.clone();
        }
        row
    }

    fn field_type(&self, field: &GqlField) -> Option<FieldType> {
        if field.is_list {
            return Some(FieldType::Array);
        }
        match self.kind_of(&field.named_type) {
            Some(TypeKind::Enum) => Some(FieldType::Select),
            Some(TypeKind::Input) => Some(FieldType::Object),
            _ => match field.named_type.as_str() {
                "String" | "ID" => Some(FieldType::Text),
                "Int" | "Float" => Some(FieldType::Number),
                _ => None,
            },
        }
    }

    /// Ref label for a named type that has its own definition entry.
    fn link(&self, named_type: &str) -> Option<String> {
        match self.kind_of(named_type)? {
            TypeKind::Scalar | TypeKind::Union => None,
            _ => Some(named_type.to_string()),
        }
    }

    /// Every object, input, interface, and enum type reachable from the
    /// operation's arguments and return type, each listed once.
    fn reachable_types(&self, op: &RootOperation) -> Vec<&GqlType> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        let mut stack: Vec<&str> = op
            .field
            .arguments
            .iter()
            .rev()
            .map(|a| a.named_type.as_str())
            .collect();
        stack.push(op.field.named_type.as_str());

        while let Some(name) = stack.pop() {
            if !seen.insert(name) {
                continue;
            }
            let Some(ty) = self.types.get(name) else {
                continue;
            };
            match ty.kind {
                TypeKind::Scalar => continue,
                TypeKind::Union => {
                    stack.extend(ty.members.iter().rev().map(String::as_str));
                    continue;
                }
                _ => ordered.push(ty),
            }
            for field in ty.fields.iter().rev() {
                stack.extend(field.arguments.iter().rev().map(|a| a.named_type.as_str()));
                stack.push(field.named_type.as_str());
            }
        }
        ordered
    }

    fn definition(&self, ty: &GqlType) -> SchemaMetadata {
        let properties = match ty.kind {
            TypeKind::Enum => ty
                .enum_values
                .iter()
                .map(|v| OperationParameterMetadata::new(v, ParameterLocation::Body, &ty.name))
                .collect(),
            _ => ty
                .fields
                .iter()
                .map(|field| {
                    let mut row = OperationParameterMetadata::new(
                        &field.name,
                        ParameterLocation::Body,
                        &field.type_label,
                    );
                    row.description = field.description.clone();
                    row.required = field.required;
                    row.default_value = field.default_value.clone();
                    row.field_type = self.field_type(field);
                    row
                })
                .collect(),
        };
        SchemaMetadata {
            ref_path: Some(format!("#/types/{}", ty.name)),
            ref_label: Some(ty.name.clone()),
            type_label: Some(ty.kind.keyword().to_string()),
            properties,
            raw_schema: Some(RawSchema {
                schema: render_sdl(ty),
                language: "graphql".to_string(),
            }),
            is_enum: ty.kind == TypeKind::Enum,
            is_binary: false,
            kind: match ty.kind {
                TypeKind::Enum => DefinitionKind::Enum,
                TypeKind::Object | TypeKind::Interface | TypeKind::Input => DefinitionKind::Object,
                _ => DefinitionKind::Other,
            },
        }
    }
}

impl ApiSpecReader for GraphQlReader {
    fn kind(&self) -> SpecKind {
        SpecKind::GraphQl
    }

    fn base_url(&self) -> Option<String> {
        None
    }

    fn tag_labels(&self) -> Vec<String> {
        Vec::new()
    }

    fn operation_categories(&self) -> Vec<OperationCategory> {
        self.categories
            .iter()
            .map(|category| OperationCategory {
                name: category.to_string(),
                label: category.to_upper_camel_case(),
                operations: self
                    .operations
                    .iter()
                    .filter(|(_, op)| op.category == *category)
                    .map(|(name, op)| self.metadata(name, op))
                    .collect(),
            })
            .collect()
    }

    fn operation(&self, name: &str) -> Option<OperationMetadata> {
        self.operations.get(name).map(|op| self.metadata(name, op))
    }

    fn request_metadata(&self, name: &str) -> Option<RequestMetadata> {
        let op = self.operations.get(name)?;
        Some(RequestMetadata {
            description: op.field.description.clone(),
            parameters: op.field.arguments.iter().map(|a| self.argument_row(a)).collect(),
            headers: Vec::new(),
            body: Vec::new(),
        })
    }

    fn responses_metadata(&self, name: &str) -> Vec<ResponseMetadata> {
        let Some(op) = self.operations.get(name) else {
            return Vec::new();
        };
        vec![ResponseMetadata {
            code: "200".to_string(),
            description: op.field.description.clone(),
            headers: Vec::new(),
            body: vec![MediaContentMetadata {
                media_type: "application/json".to_string(),
                schema: Some(SchemaMetadata {
                    ref_path: None,
                    ref_label: self.link(&op.field.named_type),
                    type_label: Some(op.field.type_label.clone()),
                    properties: Vec::new(),
                    raw_schema: None,
                    is_enum: self.kind_of(&op.field.named_type) == Some(TypeKind::Enum),
                    is_binary: false,
                    kind: DefinitionKind::Other,
                }),
                sample_data: None,
            }],
        }]
    }

    fn operation_definitions(&self, name: &str) -> Vec<SchemaMetadata> {
        let Some(op) = self.operations.get(name) else {
            return Vec::new();
        };
        self.reachable_types(op)
            .into_iter()
            .map(|ty| self.definition(ty))
            .collect()
    }
}

fn convert_type(name: &str, ty: &ExtendedType) -> GqlType {
    let mut converted = GqlType {
        name: name.to_string(),
        kind: TypeKind::Scalar,
        description: None,
        fields: Vec::new(),
        enum_values: Vec::new(),
        members: Vec::new(),
    };
    match ty {
        ExtendedType::Scalar(scalar) => {
            converted.description = scalar.description.as_deref().map(str::to_string);
        }
        ExtendedType::Object(object) => {
            converted.kind = TypeKind::Object;
            converted.description = object.description.as_deref().map(str::to_string);
            converted.fields = object.fields.values().map(|f| convert_field(f)).collect();
        }
        ExtendedType::Interface(interface) => {
            converted.kind = TypeKind::Interface;
            converted.description = interface.description.as_deref().map(str::to_string);
            converted.fields = interface.fields.values().map(|f| convert_field(f)).collect();
        }
        ExtendedType::Union(union) => {
            converted.kind = TypeKind::Union;
            converted.description = union.description.as_deref().map(str::to_string);
            converted.members = union.members.iter().map(|m| m.name.to_string()).collect();
        }
        ExtendedType::Enum(enumeration) => {
            converted.kind = TypeKind::Enum;
            converted.description = enumeration.description.as_deref().map(str::to_string);
            converted.enum_values = enumeration.values.keys().map(|v| v.to_string()).collect();
        }
        ExtendedType::InputObject(input) => {
            converted.kind = TypeKind::Input;
            converted.description = input.description.as_deref().map(str::to_string);
            converted.fields = input.fields.values().map(|f| convert_input(f)).collect();
        }
    }
    converted
}

fn convert_field(field: &FieldDefinition) -> GqlField {
    GqlField {
        name: field.name.to_string(),
        description: field.description.as_deref().map(str::to_string),
        type_label: type_label(&field.ty),
        named_type: field.ty.inner_named_type().to_string(),
        required: field.ty.is_non_null(),
        is_list: is_list(&field.ty),
        default_value: None,
        arguments: field.arguments.iter().map(|a| convert_input(a)).collect(),
    }
}

fn convert_input(value: &InputValueDefinition) -> GqlField {
    GqlField {
        name: value.name.to_string(),
        description: value.description.as_deref().map(str::to_string),
        type_label: type_label(&value.ty),
        named_type: value.ty.inner_named_type().to_string(),
        required: value.ty.is_non_null(),
        is_list: is_list(&value.ty),
        default_value: value.default_value.as_ref().map(|v| (**v).to_string()),
        arguments: Vec::new(),
    }
}

/// Render a type reference with its wrappers: `T!`, `[T]`, `[T!]!`.
fn type_label(ty: &Type) -> String {
    match ty {
        Type::Named(name) => name.to_string(),
        Type::NonNullNamed(name) => format!("{name}!"),
        Type::List(inner) => format!("[{}]", type_label(inner)),
        Type::NonNullList(inner) => format!("[{}]!", type_label(inner)),
    }
}

fn is_list(ty: &Type) -> bool {
    matches!(ty, Type::List(_) | Type::NonNullList(_))
}

fn render_sdl(ty: &GqlType) -> String {
    let mut out = String::new();
    if let Some(description) = &ty.description {
        out.push_str(&format!("\"\"\"{description}\"\"\"\n"));
    }
    match ty.kind {
        TypeKind::Scalar => out.push_str(&format!("scalar {}", ty.name)),
        TypeKind::Union => {
            out.push_str(&format!("union {} = {}", ty.name, ty.members.join(" | ")));
        }
        TypeKind::Enum => {
            out.push_str(&format!("enum {} {{\n", ty.name));
            for value in &ty.enum_values {
                out.push_str(&format!("  {value}\n"));
            }
            out.push('}');
        }
        kind => {
            out.push_str(&format!("{} {} {{\n", kind.keyword(), ty.name));
            for field in &ty.fields {
                out.push_str(&format!("  {}", field.name));
                if !field.arguments.is_empty() {
                    let args: Vec<String> = field
                        .arguments
                        .iter()
                        .map(|a| format!("{}: {}", a.name, a.type_label))
                        .collect();
                    out.push_str(&format!("({})", args.join(", ")));
                }
                out.push_str(&format!(": {}", field.type_label));
                if let Some(default) = &field.default_value {
                    out.push_str(&format!(" = {default}"));
                }
                out.push('\n');
            }
            out.push('}');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDL: &str = r#"
type Query {
  pet(id: ID!): Pet
  pets(status: Status = AVAILABLE, limit: Int): [Pet!]!
}

type Pet {
  id: ID!
  name: String
  owner: Owner
}

type Owner {
  name: String!
}

enum Status {
  AVAILABLE
  SOLD
}
"#;

    #[test]
    fn test_type_labels_mirror_wrappers() {
        let reader = GraphQlReader::new(SDL).unwrap();
        let response = reader.responses_metadata("query/pets");
        let schema = response[0].body[0].schema.as_ref().unwrap();
        assert_eq!(schema.type_label.as_deref(), Some("[Pet!]!"));
        assert_eq!(schema.ref_label.as_deref(), Some("Pet"));
    }

    #[test]
    fn test_enum_argument_lists_values() {
        let reader = GraphQlReader::new(SDL).unwrap();
        let request = reader.request_metadata("query/pets").unwrap();
        let status = &request.parameters[0];
        assert_eq!(status.location, ParameterLocation::Arguments);
        assert_eq!(status.enum_values, vec!["AVAILABLE", "SOLD"]);
        assert_eq!(status.default_value.as_deref(), Some("AVAILABLE"));
        assert!(!status.required);
    }

    #[test]
    fn test_render_sdl() {
        let reader = GraphQlReader::new(SDL).unwrap();
        let status = reader.types.get("Status").unwrap();
        assert_eq!(render_sdl(status), "enum Status {\n  AVAILABLE\n  SOLD\n}");
    }
}
