use apiview_core::model::{DefinitionKind, FieldType, ParameterLocation, SpecKind};
use apiview_core::reader::{ApiSpecReader, OpenApiV3Reader, SpecDialect, create_reader};
use serde_json::json;

const PETSTORE: &str = include_str!("fixtures/petstore-v3.yaml");

fn reader() -> OpenApiV3Reader {
    OpenApiV3Reader::new(PETSTORE).expect("should parse petstore-v3.yaml")
}

fn sample(data: &str) -> serde_json::Value {
    serde_json::from_str(data).expect("sample is JSON")
}

#[test]
fn base_url_substitutes_server_variables() {
    assert_eq!(
        reader().base_url().as_deref(),
        Some("https://api.example.com/v1")
    );
}

#[test]
fn operations_skip_path_level_keys() {
    let names: Vec<String> = reader().operations().into_iter().map(|op| op.name).collect();
    assert_eq!(
        names,
        vec!["get/pets", "post/pets", "get/pets/{petId}", "put/pets/{petId}"]
    );
}

#[test]
fn tag_labels_include_undeclared_tags() {
    assert_eq!(reader().tag_labels(), vec!["pets", "admin"]);
}

#[test]
fn parameter_schema_supplies_type_enum_default() {
    let request = reader().request_metadata("get/pets").expect("request metadata");
    assert_eq!(request.parameters.len(), 2, "cookie parameters are ignored");

    let limit = &request.parameters[0];
    assert_eq!(limit.type_label, "integer(int32)");
    assert_eq!(limit.default_value.as_deref(), Some("25"));
    assert_eq!(limit.description.as_deref(), Some("How many items to return"));
    assert_eq!(limit.field_type, Some(FieldType::Number));

    let kind = &request.parameters[1];
    assert_eq!(kind.type_label, "Kind");
    assert_eq!(kind.enum_values, vec!["dog", "cat"]);
    assert_eq!(kind.field_type, Some(FieldType::Select));
    assert!(kind.required);
}

#[test]
fn explicit_parameter_beats_inherited() {
    let request = reader()
        .request_metadata("get/pets/{petId}")
        .expect("request metadata");
    assert_eq!(request.parameters.len(), 1);
    assert_eq!(request.parameters[0].location, ParameterLocation::Path);
    assert_eq!(
        request.parameters[0].description.as_deref(),
        Some("The id of the pet to retrieve")
    );

    let put = reader()
        .request_metadata("put/pets/{petId}")
        .expect("request metadata");
    assert_eq!(put.parameters[0].description.as_deref(), Some("inherited"));
}

#[test]
fn referenced_request_body_is_sorted_by_media_type() {
    let request = reader().request_metadata("post/pets").expect("request metadata");
    assert_eq!(request.description.as_deref(), Some("Pet to add"));

    let media: Vec<&str> = request.body.iter().map(|b| b.media_type.as_str()).collect();
    assert_eq!(media, vec!["application/json", "application/xml"]);

    let json_body = &request.body[0];
    let schema = json_body.schema.as_ref().expect("schema");
    assert_eq!(schema.type_label.as_deref(), Some("NewPet"));
    let data = &json_body.sample_data.as_ref().expect("sample").data;
    assert_eq!(sample(data), json!({"name": ""}));

    assert!(request.body[1].sample_data.is_none());
}

#[test]
fn media_example_short_circuits_sample() {
    let request = reader()
        .request_metadata("put/pets/{petId}")
        .expect("request metadata");
    let data = &request.body[0].sample_data.as_ref().expect("sample").data;
    assert_eq!(sample(data), json!({"name": "Rex"}));
}

#[test]
fn responses_resolve_refs_and_headers() {
    let responses = reader().responses_metadata("get/pets");
    let codes: Vec<&str> = responses.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["200", "default"]);

    let ok = &responses[0];
    assert_eq!(ok.headers.len(), 1);
    assert_eq!(ok.headers[0].name, "x-next");
    assert_eq!(ok.headers[0].type_label, "string");
    assert_eq!(ok.headers[0].description.as_deref(), Some("Link to the next page"));
    assert_eq!(
        ok.body[0].schema.as_ref().and_then(|s| s.type_label.as_deref()),
        Some("[Pet]")
    );

    let error = &responses[1];
    assert_eq!(error.description.as_deref(), Some("Unexpected error"));
    let schema = error.body[0].schema.as_ref().expect("schema");
    assert_eq!(schema.ref_label.as_deref(), Some("Error"));
    let names: Vec<&str> = schema.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["code", "message"]);
}

#[test]
fn definitions_follow_indirect_refs() {
    let definitions = reader().operation_definitions("get/pets");
    let labels: Vec<&str> = definitions
        .iter()
        .filter_map(|d| d.ref_label.as_deref())
        .collect();
    assert_eq!(labels, vec!["Kind", "Pet", "NewPet", "Error"]);
}

#[test]
fn all_of_definition_is_flattened() {
    let definitions = reader().operation_definitions("get/pets/{petId}");
    let pet = definitions
        .iter()
        .find(|d| d.ref_label.as_deref() == Some("Pet"))
        .expect("Pet definition");
    assert_eq!(pet.kind, DefinitionKind::Object);
    let names: Vec<&str> = pet.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["name", "tag", "kind", "nicknames", "id", "labels"]);

    let required: Vec<&str> = pet
        .properties
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(required, vec!["name", "id"]);

    let labels = pet.properties.iter().find(|p| p.name == "labels").unwrap();
    assert_eq!(labels.type_label, "{ [key]: string }");
}

#[test]
fn factory_selects_v3_for_other_versions() {
    let dialect = SpecDialect::from_declared("openapi", Some("3.0")).unwrap();
    let reader = create_reader(dialect, PETSTORE).expect("reader");
    assert_eq!(reader.kind(), SpecKind::OpenApiV3);
    assert_eq!(SpecDialect::detect(PETSTORE), SpecDialect::OpenApiV3);
}

#[test]
fn json_document_is_accepted() {
    let doc = json!({
        "openapi": "3.1.0",
        "paths": {
            "/health": {"get": {"responses": {"200": {"description": "ok"}}}}
        }
    });
    let reader = OpenApiV3Reader::new(&doc.to_string()).expect("JSON document");
    assert!(reader.base_url().is_none());
    assert_eq!(reader.operations().len(), 1);
    assert_eq!(reader.responses_metadata("get/health")[0].code, "200");
}

#[test]
fn uppercase_method_keys_are_not_operations() {
    let doc = json!({
        "openapi": "3.0.3",
        "paths": {
            "/pets": {
                "GET": {"responses": {"200": {"description": "ignored"}}},
                "get": {"responses": {"200": {"description": "ok"}}}
            }
        }
    });
    let reader = OpenApiV3Reader::new(&doc.to_string()).expect("JSON document");
    let names: Vec<String> = reader.operations().into_iter().map(|op| op.name).collect();
    assert_eq!(names, vec!["get/pets"]);
    let responses = reader.responses_metadata("get/pets");
    assert_eq!(responses[0].description.as_deref(), Some("ok"));
}

#[test]
fn shared_schema_chains_stay_small() {
    let mut schemas = serde_json::Map::new();
    for i in 0..24 {
        let next = json!({"$ref": format!("#/components/schemas/N{}", i + 1)});
        schemas.insert(
            format!("N{i}"),
            json!({
                "type": "object",
                "required": ["left"],
                "properties": {"left": next, "right": next}
            }),
        );
    }
    schemas.insert("N24".to_string(), json!({"type": "integer"}));
    let doc = json!({
        "openapi": "3.0.3",
        "paths": {
            "/x": {
                "post": {
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": {"$ref": "#/components/schemas/N0"}
                            }
                        }
                    },
                    "responses": {
                        "200": {
                            "description": "ok",
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/N0"}
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {"schemas": schemas}
    });
    let reader = OpenApiV3Reader::new(&doc.to_string()).expect("JSON document");

    let responses = reader.responses_metadata("post/x");
    let schema = responses[0].body[0].schema.as_ref().expect("schema");
    assert_eq!(schema.type_label.as_deref(), Some("N0"));
    let raw = schema.raw_schema.as_ref().expect("raw schema");
    assert!(raw.schema.len() < 4096, "raw schema is {} bytes", raw.schema.len());

    let request = reader.request_metadata("post/x").expect("request metadata");
    let data = &request.body[0].sample_data.as_ref().expect("sample").data;
    assert!(data.len() < 64 * 1024, "sample is {} bytes", data.len());
    assert!(sample(data)["left"]["left"].is_object());

    let definitions = reader.operation_definitions("post/x");
    assert_eq!(definitions.len(), 25);
    assert!(
        definitions
            .iter()
            .filter_map(|d| d.raw_schema.as_ref())
            .all(|raw| raw.schema.len() < 4096)
    );
}
