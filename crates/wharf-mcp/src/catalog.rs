//! Tool catalog records and qualified-name routing.

use crate::error::McpError;
use serde::Serialize;

/// Prefix applied to every MCP tool name exposed to the LLM layer.
pub const TOOL_NAME_PREFIX: &str = "mcp_";

/// Immutable record of one tool advertised by one server.
///
/// The lifetime of a descriptor is bounded by its owning client's current
/// catalog snapshot; discovery replaces the whole list, never merges.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
    pub server_name: String,
}

impl ToolDescriptor {
    /// Globally unique name routing an invocation back to its server.
    pub fn qualified_name(&self) -> String {
        qualify(&self.server_name, &self.name)
    }
}

/// Form the qualified name `mcp_{server}_{tool}`.
pub fn qualify(server: &str, tool: &str) -> String {
    format!("{TOOL_NAME_PREFIX}{server}_{tool}")
}

/// Split a qualified name back into (server, tool).
///
/// The boundary is the first underscore after the prefix, so a server name
/// that itself contains an underscore cannot round-trip.
pub fn dequalify(qualified: &str) -> Result<(&str, &str), McpError> {
    let rest = qualified
        .strip_prefix(TOOL_NAME_PREFIX)
        .ok_or_else(|| McpError::InvalidToolName {
            name: qualified.to_string(),
        })?;
    rest.split_once('_').ok_or_else(|| McpError::InvalidToolName {
        name: qualified.to_string(),
    })
}

/// One entry of the function-calling schema handed to the LLM layer.
#[derive(Debug, Clone, Serialize)]
pub struct LlmToolSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: LlmFunction,
}

/// The function body of an [`LlmToolSpec`].
#[derive(Debug, Clone, Serialize)]
pub struct LlmFunction {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl From<&ToolDescriptor> for LlmToolSpec {
    fn from(tool: &ToolDescriptor) -> Self {
        Self {
            kind: "function",
            function: LlmFunction {
                name: tool.qualified_name(),
                description: format!("[MCP:{}] {}", tool.server_name, tool.description),
                parameters: tool.input_schema.clone(),
            },
        }
    }
}
