//! MCP manager — owns the server directory and routes invocations.
//!
//! The manager is an explicitly constructed state object: the host creates
//! it, drives `load_config`/`connect_all` at startup and `disconnect_all` at
//! shutdown, and passes it through its own dependency graph.

use crate::catalog::{LlmToolSpec, ToolDescriptor, dequalify};
use crate::client::{McpClient, ResourceInfo};
use crate::config::{ServerConfig, load_server_configs};
use crate::error::McpError;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Snapshot of one configured server for the administrative surface.
#[derive(Debug, Clone, Serialize)]
pub struct ServerStatus {
    pub name: String,
    pub enabled: bool,
    pub connected: bool,
    pub tools_count: usize,
}

/// Read-only status snapshot across all configured servers.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerStatus {
    pub initialized: bool,
    pub servers: Vec<ServerStatus>,
}

/// Manages connections to multiple MCP servers.
#[derive(Default)]
pub struct McpManager {
    configs: Vec<ServerConfig>,
    clients: HashMap<String, McpClient>,
    initialized: bool,
}

impl McpManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load server configs from a JSON file, replacing the current set.
    ///
    /// A missing file is not an error and leaves the current set untouched.
    /// Returns the number of configs loaded.
    pub fn load_config(&mut self, path: &Path) -> Result<usize, McpError> {
        if !path.exists() {
            tracing::info!("No MCP config file found at {}", path.display());
            return Ok(0);
        }
        let configs = load_server_configs(path)?;
        tracing::info!("Loaded {} MCP server configs", configs.len());
        self.configs = configs;
        Ok(self.configs.len())
    }

    /// Register one server config.
    pub fn add_server(&mut self, config: ServerConfig) -> Result<(), McpError> {
        if self.configs.iter().any(|c| c.name == config.name) {
            return Err(McpError::DuplicateServer { name: config.name });
        }
        self.configs.push(config);
        Ok(())
    }

    /// Drop a server config, disconnecting its client if one is live.
    ///
    /// Returns whether a config was removed.
    pub async fn remove_server(&mut self, name: &str) -> bool {
        if let Some(client) = self.clients.remove(name) {
            client.shutdown().await;
        }
        let before = self.configs.len();
        self.configs.retain(|c| c.name != name);
        self.configs.len() < before
    }

    /// Connect every enabled, not-yet-connected server, in config order.
    ///
    /// Servers that fail to connect are logged and skipped — startup
    /// continues with whatever servers are available.
    pub async fn connect_all(&mut self) {
        let configs = self.configs.clone();
        for config in configs {
            if !config.enabled {
                tracing::debug!("MCP server '{}' is disabled, skipping", config.name);
                continue;
            }
            if self.clients.contains_key(&config.name) {
                continue;
            }
            match McpClient::connect(config.name.clone(), &config).await {
                Ok(client) => {
                    self.clients.insert(config.name, client);
                }
                Err(e) => {
                    tracing::warn!("Failed to connect MCP server '{}': {e}", config.name);
                }
            }
        }
        self.initialized = true;
    }

    /// Disconnect every live client and clear the registry.
    pub async fn disconnect_all(&mut self) {
        for (_, client) in self.clients.drain() {
            client.shutdown().await;
        }
        self.initialized = false;
    }

    /// Disconnect one server. Returns false if it had no live client.
    pub async fn disconnect_server(&mut self, name: &str) -> bool {
        match self.clients.remove(name) {
            Some(client) => {
                client.shutdown().await;
                true
            }
            None => false,
        }
    }

    /// Tear down any existing client for `name` and connect a fresh one.
    ///
    /// Explicit reconnect ignores the `enabled` flag; only `connect_all`
    /// honors it.
    pub async fn reconnect(&mut self, name: &str) -> bool {
        if let Some(client) = self.clients.remove(name) {
            client.shutdown().await;
        }
        let Some(config) = self.configs.iter().find(|c| c.name == name).cloned() else {
            return false;
        };
        match McpClient::connect(config.name.clone(), &config).await {
            Ok(client) => {
                self.clients.insert(name.to_string(), client);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to reconnect MCP server '{name}': {e}");
                false
            }
        }
    }

    /// The current catalog across all connected servers.
    pub fn all_tools(&self) -> Vec<ToolDescriptor> {
        self.clients
            .values()
            .flat_map(|c| c.tools().iter().cloned())
            .collect()
    }

    /// The function-calling schema consumed by the LLM layer.
    pub fn tools_for_llm(&self) -> Vec<LlmToolSpec> {
        self.all_tools().iter().map(LlmToolSpec::from).collect()
    }

    /// Invoke a tool by its qualified `mcp_{server}_{tool}` name.
    pub async fn call_tool(
        &self,
        qualified_name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, McpError> {
        let (server, tool) = dequalify(qualified_name)?;
        let client = self
            .clients
            .get(server)
            .ok_or_else(|| McpError::NotConnected {
                name: server.to_string(),
            })?;
        client.call_tool(tool, arguments).await
    }

    /// List resources from one connected server.
    pub async fn list_resources(&self, server: &str) -> Result<Vec<ResourceInfo>, McpError> {
        let client = self
            .clients
            .get(server)
            .ok_or_else(|| McpError::NotConnected {
                name: server.to_string(),
            })?;
        client.list_resources().await
    }

    /// Read a resource from one connected server.
    pub async fn read_resource(
        &self,
        server: &str,
        uri: &str,
    ) -> Result<serde_json::Value, McpError> {
        let client = self
            .clients
            .get(server)
            .ok_or_else(|| McpError::NotConnected {
                name: server.to_string(),
            })?;
        client.read_resource(uri).await
    }

    /// The configured server list.
    pub fn servers(&self) -> &[ServerConfig] {
        &self.configs
    }

    /// Whether a server currently has a live, unbroken connection.
    pub fn is_connected(&self, name: &str) -> bool {
        self.clients.get(name).is_some_and(|c| c.is_connected())
    }

    /// Read-only snapshot for the administrative surface.
    pub fn status(&self) -> ManagerStatus {
        ManagerStatus {
            initialized: self.initialized,
            servers: self
                .configs
                .iter()
                .map(|config| {
                    let client = self.clients.get(&config.name);
                    ServerStatus {
                        name: config.name.clone(),
                        enabled: config.enabled,
                        connected: client.is_some_and(|c| c.is_connected()),
                        tools_count: client.map_or(0, |c| c.tools().len()),
                    }
                })
                .collect(),
        }
    }
}
