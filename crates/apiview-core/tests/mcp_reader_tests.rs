use apiview_core::model::{DefinitionKind, FieldType, ParameterLocation, SpecKind};
use apiview_core::reader::{ApiSpecReader, McpReader, SpecDialect, create_reader};
use serde_json::json;

const MANIFEST: &str = include_str!("fixtures/mcp-manifest.json");

fn reader() -> McpReader {
    McpReader::new(MANIFEST).expect("should parse mcp-manifest.json")
}

#[test]
fn categories_in_capability_order() {
    let categories = reader().operation_categories();
    let names: Vec<(&str, &str, usize)> = categories
        .iter()
        .map(|c| (c.name.as_str(), c.label.as_str(), c.operations.len()))
        .collect();
    assert_eq!(
        names,
        vec![("tools", "Tools", 2), ("resources", "Resources", 1), ("prompts", "Prompts", 1)]
    );
}

#[test]
fn operations_carry_capability_prefix() {
    let reader = reader();
    let names: Vec<String> = reader.operations().into_iter().map(|op| op.name).collect();
    assert_eq!(
        names,
        vec!["tools/get_forecast", "tools/ping", "resources/readme", "prompts/summarize"]
    );

    let forecast = reader.operation("tools/get_forecast").expect("tool");
    assert_eq!(forecast.display_name, "Weather forecast");
    assert_eq!(forecast.url_template, "get_forecast");
    assert_eq!(forecast.category.as_deref(), Some("tools"));

    let ping = reader.operation("tools/ping").expect("tool");
    assert_eq!(ping.display_name, "ping");

    let readme = reader.operation("resources/readme").expect("resource");
    assert_eq!(readme.url_template, "file:///project/README.md");
}

#[test]
fn tool_arguments_come_from_input_schema() {
    let request = reader()
        .request_metadata("tools/get_forecast")
        .expect("request metadata");
    let rows: Vec<(&str, &str, bool)> = request
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.type_label.as_str(), p.required))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("location", "string", true),
            ("days", "integer", false),
            ("units", "Units", false),
        ]
    );
    assert!(request.parameters.iter().all(|p| p.location == ParameterLocation::Arguments));
    assert_eq!(request.parameters[1].default_value.as_deref(), Some("3"));
    assert_eq!(request.parameters[2].enum_values, vec!["metric", "imperial"]);
    assert_eq!(request.parameters[2].field_type, Some(FieldType::Select));

    let body = &request.body[0];
    assert_eq!(body.media_type, "application/json");
    let data = &body.sample_data.as_ref().expect("sample").data;
    let sample: serde_json::Value = serde_json::from_str(data).unwrap();
    assert_eq!(sample, json!({"location": ""}));
}

#[test]
fn prompt_arguments_are_strings() {
    let request = reader()
        .request_metadata("prompts/summarize")
        .expect("request metadata");
    assert_eq!(request.description.as_deref(), Some("Summarize a document"));
    assert_eq!(request.parameters.len(), 2);
    assert!(request.parameters.iter().all(|p| p.type_label == "string"));
    assert!(request.parameters[0].required);
    assert!(!request.parameters[1].required);
    assert!(request.body.is_empty());
}

#[test]
fn responses_per_capability() {
    let reader = reader();

    let tool = reader.responses_metadata("tools/get_forecast");
    assert_eq!(tool.len(), 1);
    assert_eq!(tool[0].code, "result");
    let schema = tool[0].body[0].schema.as_ref().expect("output schema");
    assert_eq!(schema.properties[0].type_label, "[Day]");

    assert!(reader.responses_metadata("tools/ping").is_empty());

    let resource = reader.responses_metadata("resources/readme");
    assert_eq!(resource[0].code, "contents");
    assert_eq!(resource[0].body[0].media_type, "text/markdown");

    let prompt = reader.responses_metadata("prompts/summarize");
    assert_eq!(prompt[0].code, "messages");
}

#[test]
fn tool_definitions_resolve_local_refs() {
    let definitions = reader().operation_definitions("tools/get_forecast");
    let summary: Vec<(&str, DefinitionKind)> = definitions
        .iter()
        .map(|d| (d.ref_label.as_deref().unwrap_or_default(), d.kind))
        .collect();
    assert_eq!(
        summary,
        vec![("Units", DefinitionKind::Enum), ("Day", DefinitionKind::Object)]
    );
    assert!(reader().operation_definitions("resources/readme").is_empty());
}

#[test]
fn factory_builds_mcp_reader() {
    let dialect = SpecDialect::from_declared("mcp", None).unwrap();
    let reader = create_reader(dialect, MANIFEST).expect("reader");
    assert_eq!(reader.kind(), SpecKind::Mcp);
    assert_eq!(SpecDialect::detect(MANIFEST), SpecDialect::Mcp);
}

#[test]
fn malformed_manifest_is_an_error() {
    assert!(McpReader::new("{\"tools\": 3}").is_err());
}
