pub mod error;
pub mod http;
pub mod mcp;

pub use error::{CallError, McpError};
pub use http::{HttpResponse, execute};
pub use mcp::{CapabilityKind, McpSession, SessionState};
