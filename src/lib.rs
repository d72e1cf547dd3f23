//! Entra ID MCP Server
//!
//! A Model Context Protocol server that lets an agent query and manage a
//! Microsoft Entra ID tenant through Microsoft Graph.
//!
//! # Architecture
//!
//! 1. **Graph Layer** (`graph`) - client credentials, token cache, REST client with OData paging
//! 2. **Service Layer** (`service`) - one service per directory area, returning `types` models
//! 3. **MCP Layer** (`mcp`) - protocol types, stdio transport, dispatch, resources
//! 4. **Tools Layer** (`tools`) - tool definitions binding MCP calls to services
//! 5. **HTTP** (`http`) - JSON-RPC over HTTP with health and metrics routes

pub mod config;
pub mod error;
pub mod graph;
pub mod http;
pub mod mcp;
pub mod metrics;
pub mod service;
pub mod tools;
pub mod types;

pub use error::{Error, Result};

/// Server version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
