//! JSON-RPC 2.0 envelopes exchanged with an MCP server.

use apiview_core::config::McpConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::McpError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Id reserved for the `initialize` request.
pub const INITIALIZE_ID: i64 = 0;

#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: i64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(id: i64, method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcNotification<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
}

impl<'a> JsonRpcNotification<'a> {
    pub fn new(method: &'a str) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
        }
    }
}

/// Anything the server sends over the event stream.
#[derive(Debug, Deserialize)]
pub struct JsonRpcMessage {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl JsonRpcMessage {
    /// Id of a response to one of our requests. Server-initiated requests
    /// and notifications have none.
    pub fn response_id(&self) -> Option<i64> {
        if self.method.is_some() {
            return None;
        }
        self.id.as_ref().and_then(Value::as_i64)
    }

    pub fn into_result(self) -> Result<Value, McpError> {
        match self.error {
            Some(error) => Err(McpError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

pub fn initialize_params(config: &McpConfig) -> Value {
    json!({
        "protocolVersion": config.protocol_version,
        "capabilities": {},
        "clientInfo": {
            "name": config.client_name,
            "version": config.client_version,
        },
    })
}
