//! MCP client — manages one server connection.
//!
//! Handles the MCP protocol handshake (initialize + initialized notification),
//! tool discovery (tools/list), tool invocation (tools/call), and the optional
//! resource capability (resources/list, resources/read).

use crate::catalog::ToolDescriptor;
use crate::config::ServerConfig;
use crate::error::McpError;
use crate::transport::StdioTransport;
use serde::{Deserialize, Serialize};

/// MCP protocol version we support.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Client for a single MCP server.
///
/// Construction is connection: a value of this type always began life with a
/// completed handshake. A crashed or exited server is observable through
/// [`McpClient::is_connected`].
pub struct McpClient {
    name: String,
    transport: StdioTransport,
    tools: Vec<ToolDescriptor>,
}

/// Deserialization helpers for MCP protocol messages.
#[derive(Deserialize)]
struct ToolsListResult {
    tools: Vec<ToolEntry>,
}

#[derive(Deserialize)]
struct ToolEntry {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_schema", rename = "inputSchema")]
    input_schema: serde_json::Value,
}

fn default_schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

#[derive(Deserialize)]
struct ResourcesListResult {
    #[serde(default)]
    resources: Vec<ResourceInfo>,
}

/// A resource advertised by an MCP server (optional capability).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub uri: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
}

impl McpClient {
    /// Connect to an MCP server: spawn, handshake, discover tools.
    pub async fn connect(name: String, config: &ServerConfig) -> Result<Self, McpError> {
        let transport = StdioTransport::spawn(
            &name,
            &config.command,
            &config.args,
            &config.env,
            config.timeout_ms,
        )?;

        // Send `initialize` request
        let init_params = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "roots": {"listChanged": true},
                "sampling": {}
            },
            "clientInfo": {
                "name": "wharf",
                "version": env!("CARGO_PKG_VERSION")
            }
        });

        let resp = transport
            .send_request("initialize", Some(init_params))
            .await?;

        if let Some(err) = resp.error {
            return Err(McpError::Rpc {
                server: name,
                code: err.code,
                message: err.message,
            });
        }

        // Send `notifications/initialized`
        transport
            .send_notification("notifications/initialized", None)
            .await?;

        // Discover tools via `tools/list`. The catalog is replaced wholesale,
        // never merged.
        let tools_resp = transport.send_request("tools/list", None).await?;

        let tools = if let Some(result) = tools_resp.result {
            let list: ToolsListResult = serde_json::from_value(result).map_err(|e| {
                McpError::Protocol(format!("Failed to parse tools/list response: {e}"))
            })?;
            list.tools
                .into_iter()
                .map(|t| ToolDescriptor {
                    name: t.name,
                    description: t.description.unwrap_or_default(),
                    input_schema: t.input_schema,
                    server_name: name.clone(),
                })
                .collect()
        } else if let Some(err) = tools_resp.error {
            return Err(McpError::Rpc {
                server: name,
                code: err.code,
                message: err.message,
            });
        } else {
            Vec::new()
        };

        tracing::info!("MCP server '{}' connected with {} tools", name, tools.len());

        Ok(Self {
            name,
            transport,
            tools,
        })
    }

    /// Call a tool on this server, returning the raw result payload.
    pub async fn call_tool(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, McpError> {
        let params = serde_json::json!({
            "name": tool_name,
            "arguments": arguments,
        });

        let resp = self
            .transport
            .send_request("tools/call", Some(params))
            .await?;

        if let Some(err) = resp.error {
            return Err(McpError::Rpc {
                server: self.name.clone(),
                code: err.code,
                message: err.message,
            });
        }

        resp.result.ok_or_else(|| {
            McpError::Protocol("tools/call response has neither result nor error".to_string())
        })
    }

    /// List the resources this server advertises.
    pub async fn list_resources(&self) -> Result<Vec<ResourceInfo>, McpError> {
        let resp = self.transport.send_request("resources/list", None).await?;

        if let Some(err) = resp.error {
            return Err(McpError::Rpc {
                server: self.name.clone(),
                code: err.code,
                message: err.message,
            });
        }

        let result = resp.result.ok_or_else(|| {
            McpError::Protocol("resources/list response has neither result nor error".to_string())
        })?;

        let list: ResourcesListResult = serde_json::from_value(result).map_err(|e| {
            McpError::Protocol(format!("Failed to parse resources/list response: {e}"))
        })?;

        Ok(list.resources)
    }

    /// Read one resource by URI, returning the raw result payload.
    pub async fn read_resource(&self, uri: &str) -> Result<serde_json::Value, McpError> {
        let params = serde_json::json!({ "uri": uri });

        let resp = self
            .transport
            .send_request("resources/read", Some(params))
            .await?;

        if let Some(err) = resp.error {
            return Err(McpError::Rpc {
                server: self.name.clone(),
                code: err.code,
                message: err.message,
            });
        }

        resp.result.ok_or_else(|| {
            McpError::Protocol("resources/read response has neither result nor error".to_string())
        })
    }

    /// The tools exposed by this server.
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// The server name.
    pub fn server_name(&self) -> &str {
        &self.name
    }

    /// Whether the transport still has a live stream to the child.
    pub fn is_connected(&self) -> bool {
        !self.transport.is_closed()
    }

    /// Shut down the server connection.
    pub async fn shutdown(self) {
        self.transport.shutdown().await;
        tracing::info!("MCP server '{}' disconnected", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_tool_entry() {
        let json = r#"{
            "name": "read_file",
            "description": "Read a file",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "path": {"type": "string"}
                },
                "required": ["path"]
            }
        }"#;
        let entry: ToolEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.name, "read_file");
        assert_eq!(entry.description.as_deref(), Some("Read a file"));
    }

    #[test]
    fn deserialize_tool_entry_without_description() {
        let json = r#"{
            "name": "list",
            "inputSchema": {"type": "object"}
        }"#;
        let entry: ToolEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.name, "list");
        assert!(entry.description.is_none());
    }

    #[test]
    fn deserialize_tool_entry_without_schema_uses_default() {
        let json = r#"{"name": "bare"}"#;
        let entry: ToolEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.input_schema["type"], "object");
        assert!(entry.input_schema["properties"].is_object());
    }

    #[test]
    fn deserialize_tools_list_result() {
        let json = r#"{
            "tools": [
                {"name": "a", "description": "Tool A", "inputSchema": {"type": "object"}},
                {"name": "b", "inputSchema": {"type": "object"}}
            ]
        }"#;
        let result: ToolsListResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.tools.len(), 2);
        assert_eq!(result.tools[0].name, "a");
        assert!(result.tools[1].description.is_none());
    }

    #[test]
    fn deserialize_resource_info() {
        let json = r#"{
            "uri": "file:///var/data/report.txt",
            "name": "report.txt",
            "mimeType": "text/plain"
        }"#;
        let resource: ResourceInfo = serde_json::from_str(json).unwrap();
        assert_eq!(resource.uri, "file:///var/data/report.txt");
        assert_eq!(resource.name.as_deref(), Some("report.txt"));
        assert_eq!(resource.mime_type.as_deref(), Some("text/plain"));
        assert!(resource.description.is_none());
    }

    #[test]
    fn deserialize_resources_list_result_defaults_to_empty() {
        let result: ResourcesListResult = serde_json::from_str("{}").unwrap();
        assert!(result.resources.is_empty());
    }
}
