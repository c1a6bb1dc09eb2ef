//! Sending built requests, directly or through the CORS relay.

use apiview_core::config::RelayConfig;
use apiview_core::request::{HttpRequest, RequestParameter};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use url::Url;

use crate::error::CallError;

/// Header naming the URL the relay should forward to.
pub const TARGET_URL_HEADER: &str = "X-Target-Url";
/// Header naming the method the relay should forward with.
pub const TARGET_METHOD_HEADER: &str = "X-Target-Method";

/// What came back from the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<RequestParameter>,
    pub body: String,
}

/// Start a request to `target`, or to the relay with the target carried in
/// headers when one is configured.
pub(crate) fn route(
    client: &reqwest::Client,
    relay: Option<&RelayConfig>,
    method: Method,
    target: &str,
) -> RequestBuilder {
    let Some(relay) = relay else {
        return client.request(method, target);
    };
    let mut builder = client
        .request(method.clone(), &relay.url)
        .header(TARGET_URL_HEADER, target)
        .header(TARGET_METHOD_HEADER, method.as_str());
    if let Some(token) = &relay.token {
        builder = builder.bearer_auth(token);
    }
    builder
}

/// Send `request` and collect the response.
pub async fn execute(
    client: &reqwest::Client,
    request: &HttpRequest,
    relay: Option<&RelayConfig>,
) -> Result<HttpResponse, CallError> {
    let target = Url::parse(&request.url)
        .map_err(|e| CallError::InvalidRequest(format!("{}: {e}", request.url)))?;
    let method = Method::from_bytes(request.method.to_string().as_bytes())
        .map_err(|e| CallError::InvalidRequest(e.to_string()))?;

    let mut builder = route(client, relay, method, target.as_str());
    for header in &request.headers {
        builder = builder.header(&header.name, &header.value);
    }
    if let Some(body) = &request.body {
        builder = builder.body(body.clone());
    }

    log::debug!(
        "{} {}{}",
        request.method,
        target,
        if relay.is_some() { " (relayed)" } else { "" }
    );
    let sent_to = relay.map_or(request.url.as_str(), |r| r.url.as_str());
    let response = builder
        .send()
        .await
        .map_err(|error| classify(error, sent_to))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            RequestParameter::new(name.as_str(), String::from_utf8_lossy(value.as_bytes()))
        })
        .collect();
    let body = response.text().await?;
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn classify(error: reqwest::Error, url: &str) -> CallError {
    if error.is_connect() || error.is_timeout() {
        CallError::Unreachable {
            url: url.to_string(),
            source: error,
        }
    } else if error.is_builder() {
        CallError::InvalidRequest(error.to_string())
    } else {
        CallError::Request(error)
    }
}
