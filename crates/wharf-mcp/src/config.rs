//! Server configuration and config-file loading.
//!
//! Two equivalent JSON shapes are accepted: an explicit array of server
//! objects under `"mcpServers"` or `"servers"`, and the name-keyed object map
//! under `"mcpServers"` used by desktop MCP clients.

use crate::error::McpError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

fn default_enabled() -> bool {
    true
}

fn default_timeout() -> u64 {
    30_000
}

/// Declarative descriptor of one external MCP tool provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Unique key across the manager.
    pub name: String,
    /// Command to run (e.g., "npx", "python", "node").
    pub command: String,
    /// Arguments to pass to the command.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment overrides merged over the parent environment.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Disabled servers are skipped by `connect_all`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Timeout for requests in milliseconds (default: 30000).
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

/// One entry of the name-keyed object shape; the name is the map key.
#[derive(Debug, Deserialize)]
struct ServerEntry {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default = "default_timeout")]
    timeout_ms: u64,
}

impl ServerEntry {
    fn into_config(self, name: String) -> ServerConfig {
        ServerConfig {
            name,
            command: self.command,
            args: self.args,
            env: self.env,
            enabled: self.enabled,
            timeout_ms: self.timeout_ms,
        }
    }
}

/// `mcpServers` accepts either an explicit array or a name-keyed map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServerSet {
    List(Vec<ServerConfig>),
    Map(BTreeMap<String, ServerEntry>),
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default, rename = "mcpServers")]
    mcp_servers: Option<ServerSet>,
    #[serde(default)]
    servers: Option<Vec<ServerConfig>>,
}

/// Parse a config document into an ordered server list.
///
/// Array-shaped entries load first, with `mcpServers` taking precedence over
/// `servers`. Map-shaped `mcpServers` entries whose name is already loaded
/// are skipped as duplicates.
pub fn parse_server_configs(raw: &str) -> Result<Vec<ServerConfig>, McpError> {
    let file: ConfigFile = serde_json::from_str(raw)?;
    let mut configs: Vec<ServerConfig> = Vec::new();
    let mut map_entries: Option<BTreeMap<String, ServerEntry>> = None;

    match file.mcp_servers {
        Some(ServerSet::List(list)) => configs.extend(list),
        Some(ServerSet::Map(map)) => {
            map_entries = Some(map);
            if let Some(list) = file.servers {
                configs.extend(list);
            }
        }
        None => {
            if let Some(list) = file.servers {
                configs.extend(list);
            }
        }
    }

    if let Some(map) = map_entries {
        for (name, entry) in map {
            if configs.iter().any(|c| c.name == name) {
                tracing::debug!("Skipping duplicate server config '{name}'");
                continue;
            }
            configs.push(entry.into_config(name));
        }
    }

    Ok(configs)
}

/// Load server configs from a JSON file on disk.
pub fn load_server_configs(path: &Path) -> Result<Vec<ServerConfig>, McpError> {
    let raw = std::fs::read_to_string(path)?;
    parse_server_configs(&raw)
}
