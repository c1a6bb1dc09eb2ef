use serde_json::Value;
use thiserror::Error;

/// Failures of an MCP session or of a single call made through it.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server responded with HTTP {status}")]
    Http { status: u16 },

    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("session closed")]
    Closed,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for McpError {
    fn from(error: reqwest::Error) -> Self {
        McpError::Transport(error.to_string())
    }
}

/// Failures of sending a built request.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(
        "could not reach {url}: {source}\n\
         hint: the server may be down, or it may only accept requests from \
         allowed origins; configure a relay to forward the request"
    )]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
