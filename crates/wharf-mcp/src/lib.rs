//! MCP (Model Context Protocol) client core for Wharf.
//!
//! Connects to stdio-based MCP servers that communicate via newline-delimited
//! JSON-RPC 2.0 messages. Each configured server is spawned as a child
//! process, initialized with a handshake, and its tools are discovered and
//! exposed to the LLM function-calling layer under qualified
//! `mcp_{server}_{tool}` names.

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod manager;
mod transport;

pub use catalog::{LlmFunction, LlmToolSpec, ToolDescriptor, dequalify, qualify};
pub use client::{McpClient, ResourceInfo};
pub use config::ServerConfig;
pub use error::McpError;
pub use manager::{ManagerStatus, McpManager, ServerStatus};
