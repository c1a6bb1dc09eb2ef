//! Turning an operation plus user-supplied values into a concrete request.

mod preview;

pub use preview::render_preview;

use std::sync::LazyLock;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::model::{HttpMethod, OperationMetadata, ParameterLocation, RequestMetadata};
use crate::reader::openapi::is_json_media;

static TEMPLATE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([^{}]+)\}").expect("template parameter pattern is valid")
});

static REPEATED_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/{2,}").expect("slash pattern is valid"));

static COLLAPSED_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):/([^/])").expect("scheme pattern is valid")
});

/// Escaped in a path parameter value so it stays within one segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Where an API is deployed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deployment {
    /// Runtime base URIs; the first one is used.
    pub runtime_uri: Vec<String>,
}

/// A named value entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParameter {
    pub name: String,
    pub value: String,
}

impl RequestParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Editable request values, seeded by [`default_request_payload`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestPayload {
    pub url_params: Vec<RequestParameter>,
    pub query: Vec<RequestParameter>,
    pub headers: Vec<RequestParameter>,
    pub body: Option<String>,
    /// Media type of the body variant the sample came from.
    pub content_type: Option<String>,
}

impl RequestPayload {
    /// Set the value of a parameter in whichever list declares it.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        for list in [&mut self.url_params, &mut self.query, &mut self.headers] {
            if let Some(param) = list.iter_mut().find(|p| p.name == name) {
                param.value = value;
                return true;
            }
        }
        false
    }
}

/// A fully resolved HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<RequestParameter>,
    pub body: Option<String>,
}

/// Deployment base joined with the operation's URL template.
pub fn operation_url(deployment: &Deployment, operation: &OperationMetadata) -> String {
    let base = deployment.runtime_uri.first().map(String::as_str).unwrap_or_default();
    let joined = format!("{base}/{}", operation.url_template);
    let collapsed = REPEATED_SLASHES.replace_all(&joined, "/");
    COLLAPSED_SCHEME.replace(&collapsed, "$1://$2").into_owned()
}

/// Substitute `{name}` placeholders. Placeholders without a supplied value
/// stay as they are.
pub fn resolve_url_template(template: &str, params: &[RequestParameter]) -> String {
    TEMPLATE_PARAM
        .replace_all(template, |caps: &Captures<'_>| {
            params
                .iter()
                .find(|p| p.name == caps[1] && !p.value.is_empty())
                .map(|p| p.value.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Initial payload for an operation: declared parameters grouped by
/// location, required ones first, seeded with their defaults. Methods that
/// carry a body always get one.
pub fn default_request_payload(
    operation: &OperationMetadata,
    request: &RequestMetadata,
) -> RequestPayload {
    let mut payload = RequestPayload::default();
    let mut params: Vec<_> = request.parameters.iter().chain(&request.headers).collect();
    params.sort_by_key(|p| !p.required);

    for param in params {
        let seeded = RequestParameter::new(
            &param.name,
            param.default_value.clone().unwrap_or_default(),
        );
        match param.location {
            ParameterLocation::Path => payload.url_params.push(seeded),
            ParameterLocation::Query => payload.query.push(seeded),
            ParameterLocation::Header => payload.headers.push(seeded),
            ParameterLocation::Arguments | ParameterLocation::Body => {}
        }
    }

    let variant = request
        .body
        .iter()
        .find(|b| is_json_media(&b.media_type) && b.sample_data.is_some())
        .or_else(|| request.body.first());
    if let Some(variant) = variant {
        payload.content_type = Some(variant.media_type.clone());
        payload.body = variant.sample_data.as_ref().map(|s| s.data.clone());
    }
    if payload.body.is_none() && operation.method.is_some_and(|m| m.carries_body()) {
        payload.body = Some(String::new());
    }
    payload
}

/// Assemble the request to send: path parameters percent-encoded and
/// substituted, non-empty query parameters URL-encoded, and empty headers
/// dropped.
pub fn build_request(
    operation: &OperationMetadata,
    deployment: &Deployment,
    payload: &RequestPayload,
) -> HttpRequest {
    let url_params: Vec<RequestParameter> = payload
        .url_params
        .iter()
        .map(|p| {
            let value = utf8_percent_encode(&p.value, PATH_SEGMENT).to_string();
            RequestParameter::new(&p.name, value)
        })
        .collect();
    let mut url = resolve_url_template(&operation_url(deployment, operation), &url_params);

    let query: Vec<_> = payload.query.iter().filter(|q| !q.value.is_empty()).collect();
    if !query.is_empty() {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query.iter().map(|q| (q.name.as_str(), q.value.as_str())))
            .finish();
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&encoded);
    }

    let mut headers: Vec<RequestParameter> = payload
        .headers
        .iter()
        .filter(|h| !h.value.is_empty())
        .cloned()
        .collect();

    let body = payload.body.clone().filter(|b| !b.is_empty());
    if body.is_some()
        && let Some(content_type) = &payload.content_type
        && !headers.iter().any(|h| h.name.eq_ignore_ascii_case("content-type"))
    {
        headers.push(RequestParameter::new("Content-Type", content_type));
    }

    HttpRequest {
        method: operation.method.unwrap_or(HttpMethod::Post),
        url,
        headers,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MediaContentMetadata, OperationParameterMetadata, SampleData};

    fn operation(method: Option<HttpMethod>, template: &str) -> OperationMetadata {
        OperationMetadata {
            name: "op".to_string(),
            display_name: "op".to_string(),
            description: None,
            category: None,
            method,
            url_template: template.to_string(),
            tags: Vec::new(),
            spec: serde_json::Value::Null,
        }
    }

    fn param(
        name: &str,
        location: ParameterLocation,
        required: bool,
    ) -> OperationParameterMetadata {
        let mut p = OperationParameterMetadata::new(name, location, "string");
        p.required = required;
        p
    }

    #[test]
    fn test_resolve_url_template_leaves_missing_literal() {
        let url = resolve_url_template(
            "/pets/{petId}/toys/{toyId}",
            &[RequestParameter::new("petId", "7")],
        );
        assert_eq!(url, "/pets/7/toys/{toyId}");
    }

    #[test]
    fn test_operation_url_collapses_slashes() {
        let deployment = Deployment {
            runtime_uri: vec!["https://api.example.com/v1/".to_string()],
        };
        let url = operation_url(&deployment, &operation(Some(HttpMethod::Get), "/pets"));
        assert_eq!(url, "https://api.example.com/v1/pets");
    }

    #[test]
    fn test_operation_url_without_deployment() {
        let url = operation_url(&Deployment::default(), &operation(Some(HttpMethod::Get), "/pets"));
        assert_eq!(url, "/pets");
    }

    #[test]
    fn test_default_payload_orders_required_first() {
        let mut limit = param("limit", ParameterLocation::Query, false);
        limit.default_value = Some("20".to_string());
        let request = RequestMetadata {
            parameters: vec![
                limit,
                param("status", ParameterLocation::Query, true),
                param("petId", ParameterLocation::Path, true),
            ],
            headers: vec![param("X-Trace", ParameterLocation::Header, false)],
            ..RequestMetadata::default()
        };
        let payload = default_request_payload(&operation(Some(HttpMethod::Get), "/pets"), &request);
        assert_eq!(
            payload.query,
            vec![RequestParameter::new("status", ""), RequestParameter::new("limit", "20")]
        );
        assert_eq!(payload.url_params, vec![RequestParameter::new("petId", "")]);
        assert_eq!(payload.headers, vec![RequestParameter::new("X-Trace", "")]);
        assert_eq!(payload.body, None);
    }

    #[test]
    fn test_body_methods_always_get_a_body() {
        let payload = default_request_payload(
            &operation(Some(HttpMethod::Patch), "/pets"),
            &RequestMetadata::default(),
        );
        assert_eq!(payload.body.as_deref(), Some(""));
    }

    #[test]
    fn test_default_payload_prefers_json_sample() {
        let request = RequestMetadata {
            body: vec![
                MediaContentMetadata {
                    media_type: "application/xml".to_string(),
                    schema: None,
                    sample_data: None,
                },
                MediaContentMetadata {
                    media_type: "application/json".to_string(),
                    schema: None,
                    sample_data: Some(SampleData {
                        data: "{\"name\": \"\"}".to_string(),
                        language: "json".to_string(),
                    }),
                },
            ],
            ..RequestMetadata::default()
        };
        let post = operation(Some(HttpMethod::Post), "/pets");
        let payload = default_request_payload(&post, &request);
        assert_eq!(payload.body.as_deref(), Some("{\"name\": \"\"}"));
        assert_eq!(payload.content_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_build_request_encodes_query() {
        let deployment = Deployment {
            runtime_uri: vec!["https://api.example.com".to_string()],
        };
        let payload = RequestPayload {
            url_params: vec![RequestParameter::new("petId", "7")],
            query: vec![
                RequestParameter::new("q", "a b&c"),
                RequestParameter::new("empty", ""),
            ],
            headers: vec![
                RequestParameter::new("X-Trace", "abc"),
                RequestParameter::new("X-Empty", ""),
            ],
            body: Some(String::new()),
            content_type: Some("application/json".to_string()),
        };
        let request = build_request(
            &operation(Some(HttpMethod::Put), "/pets/{petId}"),
            &deployment,
            &payload,
        );
        assert_eq!(request.url, "https://api.example.com/pets/7?q=a+b%26c");
        assert_eq!(request.headers, vec![RequestParameter::new("X-Trace", "abc")]);
        assert_eq!(request.body, None);
        assert_eq!(request.method, HttpMethod::Put);
    }

    #[test]
    fn test_build_request_keeps_path_values_in_one_segment() {
        let payload = RequestPayload {
            url_params: vec![RequestParameter::new("petId", "a/b?c#d e")],
            ..RequestPayload::default()
        };
        let request = build_request(
            &operation(Some(HttpMethod::Get), "/pets/{petId}"),
            &Deployment::default(),
            &payload,
        );
        assert_eq!(request.url, "/pets/a%2Fb%3Fc%23d%20e");
        assert_eq!(
            resolve_url_template("/pets/{petId}", &payload.url_params),
            "/pets/a/b?c#d e"
        );
    }

    #[test]
    fn test_payload_set() {
        let mut payload = RequestPayload {
            query: vec![RequestParameter::new("limit", "")],
            ..RequestPayload::default()
        };
        assert!(payload.set("limit", "5"));
        assert!(!payload.set("missing", "1"));
        assert_eq!(payload.query[0].value, "5");
    }
}
