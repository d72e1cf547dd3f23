//! Tool registry and argument helpers.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::{ContentBlock, Tool, ToolResult};
use crate::metrics::{Metrics, Timer};

/// Handler for MCP tool calls.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> Tool;

    /// Execute the tool with the given arguments.
    ///
    /// Errors are turned into an `isError` result by [`McpHandler::call`].
    async fn execute(&self, arguments: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult>;
}

/// Registry of tool handlers.
pub struct McpHandler {
    tools: BTreeMap<String, Arc<dyn ToolHandler>>,
    metrics: Arc<Metrics>,
}

impl McpHandler {
    /// Create a new handler registry.
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            tools: BTreeMap::new(),
            metrics,
        }
    }

    /// Register a tool handler.
    pub fn register<T: ToolHandler + 'static>(&mut self, handler: T) {
        let tool = handler.definition();
        self.tools.insert(tool.name.clone(), Arc::new(handler));
    }

    /// Get all registered tools, sorted by name.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.values().map(|h| h.definition()).collect()
    }

    /// Get a tool by name.
    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the number of registered tools.
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Run a tool. Only an unknown tool name is an `Err`; every failure
    /// inside the tool becomes an error result carrying its JSON payload.
    pub async fn call(
        &self,
        name: &str,
        arguments: HashMap<String, Value>,
        ctx: &ToolContext,
    ) -> Result<ToolResult> {
        let tool = self
            .get_tool(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        self.metrics.inc_tool_calls();
        let timer = Timer::start();

        match tool.execute(arguments, ctx).await {
            Ok(result) => {
                info!("Tool {} completed in {}ms", name, timer.elapsed_ms());
                Ok(result)
            }
            Err(e) => {
                self.metrics.inc_tool_failures();
                error!("Tool {} failed after {}ms: {}", name, timer.elapsed_ms(), e);
                ctx.error(e.to_string()).await;
                Ok(failure_result(&e))
            }
        }
    }
}

/// Helper macro for creating tool input schemas.
#[macro_export]
macro_rules! tool_schema {
    (required: [$($req:expr),* $(,)?], $($json:tt)+) => {
        serde_json::json!({
            "type": "object",
            "properties": {
                $($json)+
            },
            "required": [$($req),*]
        })
    };
    ($($json:tt)*) => {
        serde_json::json!({
            "type": "object",
            "properties": {
                $($json)*
            }
        })
    };
}

/// Helper to create a text content block.
pub fn text_content(text: impl Into<String>) -> ContentBlock {
    ContentBlock::Text { text: text.into() }
}

/// Helper to create a successful tool result.
pub fn success_result(text: impl Into<String>) -> ToolResult {
    ToolResult {
        content: vec![text_content(text)],
        is_error: false,
    }
}

/// Serialize a value as the pretty-printed JSON text of a successful result.
pub fn json_result<T: Serialize + ?Sized>(value: &T) -> Result<ToolResult> {
    Ok(success_result(serde_json::to_string_pretty(value)?))
}

/// Error result whose text is the error's JSON payload.
pub fn failure_result(error: &Error) -> ToolResult {
    ToolResult {
        content: vec![text_content(error.to_payload().to_string())],
        is_error: true,
    }
}

/// Helper to extract a required, non-empty string argument.
pub fn get_string_arg(args: &HashMap<String, Value>, name: &str) -> Result<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| Error::InvalidToolArguments(format!("Missing required argument: {}", name)))
}

/// Helper to extract an optional string argument.
pub fn get_optional_string_arg(args: &HashMap<String, Value>, name: &str) -> Option<String> {
    args.get(name).and_then(|v| v.as_str()).map(String::from)
}

/// Helper to extract an integer argument with a default.
pub fn get_int_arg(args: &HashMap<String, Value>, name: &str, default: i64) -> Result<i64> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v.as_i64().ok_or_else(|| {
            Error::InvalidToolArguments(format!("Argument {} must be an integer", name))
        }),
    }
}

/// Helper to extract a result limit (at least 1) with a default.
pub fn get_limit_arg(args: &HashMap<String, Value>, name: &str, default: usize) -> Result<usize> {
    let value = get_int_arg(args, name, default as i64)?;
    if value < 1 {
        return Err(Error::InvalidToolArguments(format!(
            "Argument {} must be at least 1",
            name
        )));
    }
    Ok(value as usize)
}

/// Helper to extract a boolean argument with a default.
pub fn get_bool_arg(args: &HashMap<String, Value>, name: &str, default: bool) -> Result<bool> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v.as_bool().ok_or_else(|| {
            Error::InvalidToolArguments(format!("Argument {} must be a boolean", name))
        }),
    }
}

/// Helper to extract a required JSON object argument.
pub fn get_object_arg(args: &HashMap<String, Value>, name: &str) -> Result<Value> {
    match args.get(name) {
        Some(v @ Value::Object(_)) => Ok(v.clone()),
        Some(_) => Err(Error::InvalidToolArguments(format!(
            "Argument {} must be an object",
            name
        ))),
        None => Err(Error::InvalidToolArguments(format!(
            "Missing required argument: {}",
            name
        ))),
    }
}
