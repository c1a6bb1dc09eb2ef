use apiview_client::{CallError, execute};
use apiview_core::config::RelayConfig;
use apiview_core::model::HttpMethod;
use apiview_core::request::{HttpRequest, RequestParameter};
use axum::Router;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::{Value, json};

async fn get_pet() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json"), ("x-rate-limit", "99")],
        r#"{"id":42,"name":"Rex"}"#,
    )
}

async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    (
        StatusCode::CREATED,
        axum::Json(json!({
            "content_type": content_type,
            "body": String::from_utf8_lossy(&body),
        })),
    )
}

async fn forward(headers: HeaderMap) -> impl IntoResponse {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    axum::Json(json!({
        "target": header("x-target-url"),
        "method": header("x-target-method"),
        "authorization": header("authorization"),
    }))
}

async fn start_server() -> String {
    let app = Router::new()
        .route("/pets/42", get(get_pet))
        .route("/echo", post(echo))
        .route("/forward", post(forward));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind a local port");
    let addr = listener.local_addr().expect("should have a local address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn request(method: HttpMethod, url: String) -> HttpRequest {
    HttpRequest {
        method,
        url,
        headers: Vec::new(),
        body: None,
    }
}

#[tokio::test]
async fn executes_direct_request() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let response = execute(&client, &request(HttpMethod::Get, format!("{base}/pets/42")), None)
        .await
        .expect("should execute request");
    assert_eq!(response.status, 200);
    assert!(
        response
            .headers
            .contains(&RequestParameter::new("x-rate-limit", "99"))
    );
    let body: Value = serde_json::from_str(&response.body).expect("body is JSON");
    assert_eq!(body, json!({"id": 42, "name": "Rex"}));
}

#[tokio::test]
async fn sends_headers_and_body() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let mut req = request(HttpMethod::Post, format!("{base}/echo"));
    req.headers
        .push(RequestParameter::new("Content-Type", "application/json"));
    req.body = Some(r#"{"name":"Rex"}"#.to_string());

    let response = execute(&client, &req, None)
        .await
        .expect("should execute request");
    assert_eq!(response.status, 201);
    let body: Value = serde_json::from_str(&response.body).expect("body is JSON");
    assert_eq!(body["content_type"], "application/json");
    assert_eq!(body["body"], r#"{"name":"Rex"}"#);
}

#[tokio::test]
async fn relay_receives_target_headers() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let relay = RelayConfig {
        url: format!("{base}/forward"),
        token: Some("secret".to_string()),
    };
    let req = request(HttpMethod::Post, "https://api.example.com/pets".to_string());

    let response = execute(&client, &req, Some(&relay))
        .await
        .expect("should reach relay");
    let body: Value = serde_json::from_str(&response.body).expect("body is JSON");
    assert_eq!(
        body,
        json!({
            "target": "https://api.example.com/pets",
            "method": "POST",
            "authorization": "Bearer secret",
        })
    );
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind a local port");
    let addr = listener.local_addr().expect("should have a local address");
    drop(listener);

    let client = reqwest::Client::new();
    let err = execute(&client, &request(HttpMethod::Get, format!("http://{addr}/")), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CallError::Unreachable { .. }));
    assert!(err.to_string().contains("hint:"));
}

#[tokio::test]
async fn unparseable_url_is_invalid() {
    let client = reqwest::Client::new();
    let err = execute(&client, &request(HttpMethod::Get, "/pets/{petId}".to_string()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CallError::InvalidRequest(_)));
}
