//! Conditional access policy tools.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::mcp::context::ToolContext;
use crate::mcp::handler::{get_string_arg, ToolHandler};
use crate::mcp::protocol::{Tool, ToolResult};
use crate::service::ConditionalAccessService;
use crate::tools::finish;

/// Get conditional access policies tool.
pub struct GetConditionalAccessPoliciesTool {
    service: Arc<ConditionalAccessService>,
}

impl GetConditionalAccessPoliciesTool {
    pub fn new(service: Arc<ConditionalAccessService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetConditionalAccessPoliciesTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_conditional_access_policies".to_string(),
            description: "List conditional access policies as flattened summaries of their conditions, grant controls and session controls. Group IDs are shown with their display names.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn execute(&self, _args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        ctx.info("Listing conditional access policies...").await;
        let policies = self.service.get_conditional_access_policies().await?;
        finish(ctx, &policies).await
    }
}

/// Get conditional access policy by ID tool.
pub struct GetConditionalAccessPolicyByIdTool {
    service: Arc<ConditionalAccessService>,
}

impl GetConditionalAccessPolicyByIdTool {
    pub fn new(service: Arc<ConditionalAccessService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetConditionalAccessPolicyByIdTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_conditional_access_policy_by_id".to_string(),
            description: "Get one conditional access policy as a flattened summary.".to_string(),
            input_schema: crate::tool_schema!(
                required: ["policy_id"],
                "policy_id": {
                    "type": "string",
                    "description": "Conditional access policy ID"
                }
            ),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let policy_id = get_string_arg(&args, "policy_id")?;

        ctx.info(format!("Getting conditional access policy {}...", policy_id)).await;
        let policy = self.service.get_conditional_access_policy_by_id(&policy_id).await?;
        finish(ctx, &policy).await
    }
}
