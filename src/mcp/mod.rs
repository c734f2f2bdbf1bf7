//! Tool-process protocol (MCP over stdio).
//!
//! Newline-delimited JSON-RPC 2.0. [`McpClient`] is the bridge side: it
//! performs the `initialize` handshake, lists tools and calls them.
//! [`ToolServer`] is the serving side used by `toolbridge-tools`.

mod client;
pub mod jsonrpc;
mod server;
mod transport;

pub use client::{InitializeResult, McpClient, ServerInfo, StdioMcpClient, PROTOCOL_VERSION};
pub use server::{ToolServer, SERVER_NAME};
pub use transport::LineTransport;
