//! A live MCP session over the server-sent-events transport.
//!
//! The server pushes an `endpoint` event naming where to POST messages, then
//! answers each POST with a `message` event on the same stream. A session
//! owns one background task reading the stream and correlating responses
//! with pending calls by JSON-RPC id.

pub mod protocol;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use apiview_core::config::{McpConfig, RelayConfig};
use futures::StreamExt as _;
use futures::stream::BoxStream;
use parking_lot::Mutex;
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Value, json};
use sse_stream::{Sse, SseStream};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use url::Url;

use crate::error::McpError;
use crate::http::route;
use protocol::{
    INITIALIZE_ID, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, initialize_params,
};

type PendingCalls = HashMap<i64, oneshot::Sender<Result<Value, McpError>>>;
type EventStream = BoxStream<'static, Result<Sse, sse_stream::Error>>;

/// Lifecycle of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Initializing,
    Ready,
    Closed,
    Failed(String),
}

impl SessionState {
    fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed(_))
    }
}

/// Capability lists a server can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Tools,
    Resources,
    Prompts,
}

impl CapabilityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CapabilityKind::Tools => "tools",
            CapabilityKind::Resources => "resources",
            CapabilityKind::Prompts => "prompts",
        }
    }
}

/// Handle to a running session. Dropping it stops the background task.
pub struct McpSession {
    inner: Arc<Inner>,
    task: JoinHandle<()>,
}

struct Inner {
    http: reqwest::Client,
    config: McpConfig,
    relay: Option<RelayConfig>,
    endpoint: Mutex<Option<String>>,
    pending: Mutex<PendingCalls>,
    next_id: AtomicI64,
    state: watch::Sender<SessionState>,
}

impl McpSession {
    /// Open the event stream and start the handshake in the background.
    /// Must be called within a tokio runtime.
    pub fn connect(config: McpConfig, relay: Option<RelayConfig>) -> Self {
        Self::connect_with(reqwest::Client::new(), config, relay)
    }

    pub fn connect_with(
        http: reqwest::Client,
        config: McpConfig,
        relay: Option<RelayConfig>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Connecting);
        let inner = Arc::new(Inner {
            http,
            config,
            relay,
            endpoint: Mutex::new(None),
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(INITIALIZE_ID + 1),
            state,
        });
        let task = tokio::spawn(Inner::run(inner.clone()));
        Self { inner, task }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Wait until the handshake has completed.
    pub async fn ready(&self) -> Result<(), McpError> {
        let mut state = self.inner.state.subscribe();
        let settled = state
            .wait_for(|s| !matches!(s, SessionState::Connecting | SessionState::Initializing))
            .await
            .map_err(|_| McpError::Closed)?;
        match &*settled {
            SessionState::Ready => Ok(()),
            SessionState::Failed(reason) => Err(McpError::Handshake(reason.clone())),
            _ => Err(McpError::Closed),
        }
    }

    /// Items of one capability list, e.g. `tools/list` → `result.tools`.
    pub async fn list_capability(&self, kind: CapabilityKind) -> Result<Vec<Value>, McpError> {
        let method = format!("{}/list", kind.as_str());
        let result = self.request(&method, None).await?;
        Ok(result
            .get(kind.as_str())
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpError> {
        self.request("tools/call", Some(json!({"name": name, "arguments": arguments})))
            .await
    }

    pub async fn read_resource(&self, uri: &str) -> Result<Value, McpError> {
        self.request("resources/read", Some(json!({"uri": uri}))).await
    }

    pub async fn get_prompt(&self, name: &str, arguments: Value) -> Result<Value, McpError> {
        self.request("prompts/get", Some(json!({"name": name, "arguments": arguments})))
            .await
    }

    /// Send a request once the session is ready and wait for its response.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        self.ready().await?;
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.call(id, method, params).await
    }

    /// Stop the session. Outstanding calls fail with [`McpError::Closed`].
    pub fn close(&self) {
        self.inner.shutdown(SessionState::Closed);
        self.task.abort();
    }
}

impl Drop for McpSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Inner {
    async fn run(self: Arc<Self>) {
        let reason = match self.open_stream().await {
            Ok(mut events) => {
                let mut reason = "event stream ended".to_string();
                while let Some(event) = events.next().await {
                    match event {
                        Ok(sse) => self.handle_event(sse),
                        Err(e) => {
                            reason = format!("event stream failed: {e}");
                            break;
                        }
                    }
                }
                reason
            }
            Err(e) => e.to_string(),
        };

        let was_ready = matches!(*self.state.borrow(), SessionState::Ready);
        if was_ready {
            log::warn!("MCP session closed: {reason}");
            self.shutdown(SessionState::Closed);
        } else {
            log::warn!("MCP session failed before it was ready: {reason}");
            self.shutdown(SessionState::Failed(reason));
        }
    }

    async fn open_stream(&self) -> Result<EventStream, McpError> {
        let url = format!("{}/sse", self.config.server_uri.trim_end_matches('/'));
        log::debug!("opening MCP event stream at {url}");
        let response = route(&self.http, self.relay.as_ref(), Method::GET, &url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(McpError::Http {
                status: status.as_u16(),
            });
        }
        Ok(SseStream::from_byte_stream(response.bytes_stream()).boxed())
    }

    fn handle_event(self: &Arc<Self>, sse: Sse) {
        let data = sse.data.unwrap_or_default();
        match sse.event.as_deref() {
            Some("endpoint") => {
                let endpoint = data.trim().to_string();
                log::debug!("MCP endpoint: {endpoint}");
                *self.endpoint.lock() = Some(endpoint);
                let started = self.state.send_if_modified(|state| {
                    if *state == SessionState::Connecting {
                        *state = SessionState::Initializing;
                        true
                    } else {
                        false
                    }
                });
                if started {
                    tokio::spawn(Inner::handshake(self.clone()));
                }
            }
            Some("message") | None => self.dispatch(&data),
            Some(other) => log::debug!("ignoring MCP event {other}"),
        }
    }

    fn dispatch(&self, data: &str) {
        let message: JsonRpcMessage = match serde_json::from_str(data) {
            Ok(message) => message,
            Err(e) => {
                log::debug!("ignoring malformed MCP message: {e}");
                return;
            }
        };
        let Some(id) = message.response_id() else {
            log::debug!("ignoring MCP message {:?}", message.method);
            return;
        };
        let Some(sender) = self.pending.lock().remove(&id) else {
            log::debug!("dropping MCP response for unknown id {id}");
            return;
        };
        let _ = sender.send(message.into_result());
    }

    async fn handshake(self: Arc<Self>) {
        let params = initialize_params(&self.config);
        match self.call(INITIALIZE_ID, "initialize", Some(params)).await {
            Ok(result) => {
                log::debug!(
                    "MCP server initialized: {}",
                    result
                        .pointer("/serverInfo/name")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown server")
                );
                if let Err(e) = self.notify("notifications/initialized").await {
                    log::warn!("failed to send initialized notification: {e}");
                }
                self.state.send_if_modified(|state| {
                    if *state == SessionState::Initializing {
                        *state = SessionState::Ready;
                        true
                    } else {
                        false
                    }
                });
            }
            Err(e) => self.shutdown(SessionState::Failed(format!("initialize: {e}"))),
        }
    }

    async fn call(&self, id: i64, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let (sender, receiver) = oneshot::channel();
        self.pending.lock().insert(id, sender);
        if self.state.borrow().is_terminal() {
            self.pending.lock().remove(&id);
            return Err(McpError::Closed);
        }

        let message = serde_json::to_value(JsonRpcRequest::new(id, method, params))?;
        log::debug!("MCP request {id}: {method}");
        if let Err(e) = self.post(&message).await {
            self.pending.lock().remove(&id);
            return Err(e);
        }
        receiver.await.unwrap_or(Err(McpError::Closed))
    }

    async fn notify(&self, method: &str) -> Result<(), McpError> {
        let message = serde_json::to_value(JsonRpcNotification::new(method))?;
        self.post(&message).await
    }

    async fn post(&self, message: &Value) -> Result<(), McpError> {
        let url = self.message_url()?;
        let response = route(&self.http, self.relay.as_ref(), Method::POST, &url)
            .header(CONTENT_TYPE, "application/json")
            .body(message.to_string())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(McpError::Http {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    /// `{server}{endpoint}`, or the endpoint itself when it is absolute.
    fn message_url(&self) -> Result<String, McpError> {
        let endpoint = self
            .endpoint
            .lock()
            .clone()
            .ok_or_else(|| McpError::Handshake("no endpoint announced".to_string()))?;
        if Url::parse(&endpoint).is_ok() {
            return Ok(endpoint);
        }
        Ok(format!(
            "{}{}",
            self.config.server_uri.trim_end_matches('/'),
            endpoint
        ))
    }

    /// Move to a terminal state and fail every outstanding call. A closed
    /// session stays closed.
    fn shutdown(&self, next: SessionState) {
        self.state.send_if_modified(|state| {
            if *state == SessionState::Closed {
                return false;
            }
            *state = next;
            true
        });
        let pending: Vec<_> = self.pending.lock().drain().collect();
        if !pending.is_empty() {
            log::debug!("rejecting {} pending MCP calls", pending.len());
        }
        for (_, sender) in pending {
            let _ = sender.send(Err(McpError::Closed));
        }
    }
}
