//! Model Context Protocol (MCP) implementation.
//!
//! - `protocol` - JSON-RPC and MCP message types
//! - `transport` - stdio transport
//! - `server` - request dispatch and cancellation
//! - `handler` - tool registry and argument helpers
//! - `context` - per-call log and progress notifications
//! - `resources` - `user://` and `group://` resource templates

pub mod context;
pub mod handler;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod transport;

pub use context::ToolContext;
pub use handler::{McpHandler, ToolHandler};
pub use protocol::*;
pub use resources::ResourceRegistry;
pub use server::McpServer;
pub use transport::{StdioTransport, Transport};
