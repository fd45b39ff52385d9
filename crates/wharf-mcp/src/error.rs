//! Error types for MCP operations.

use thiserror::Error;

/// Errors from MCP server communication.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Failed to spawn MCP server '{name}': {source}")]
    SpawnFailed {
        name: String,
        source: std::io::Error,
    },

    #[error("MCP server '{name}' is not connected")]
    NotConnected { name: String },

    #[error("MCP server '{name}' is already configured")]
    DuplicateServer { name: String },

    #[error("Invalid MCP tool name '{name}': expected mcp_<server>_<tool>")]
    InvalidToolName { name: String },

    #[error("JSON-RPC error from '{server}' (code {code}): {message}")]
    Rpc {
        server: String,
        code: i64,
        message: String,
    },

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("Request '{method}' timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },

    #[error("Connection to MCP server '{server}' closed")]
    ConnectionClosed { server: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
