// MCP (Model Context Protocol) server exposing AbraFlexi records as tools

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
pub use tools::{register_all, ToolRegistry};
