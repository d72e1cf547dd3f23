//! MFA status tools.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::mcp::context::ToolContext;
use crate::mcp::handler::{get_string_arg, ToolHandler};
use crate::mcp::protocol::{Tool, ToolResult};
use crate::service::MfaService;
use crate::tools::finish;

/// Get user MFA status tool.
pub struct GetUserMfaStatusTool {
    service: Arc<MfaService>,
}

impl GetUserMfaStatusTool {
    pub fn new(service: Arc<MfaService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetUserMfaStatusTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_user_mfa_status".to_string(),
            description: "Get a user's registered authentication methods and whether MFA is enabled. A password alone does not count as MFA.".to_string(),
            input_schema: crate::tool_schema!(
                required: ["user_id"],
                "user_id": {
                    "type": "string",
                    "description": "User object ID or user principal name"
                }
            ),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let user_id = get_string_arg(&args, "user_id")?;

        ctx.info(format!("Getting MFA status of {}...", user_id)).await;
        let status = self.service.get_user_mfa_status(&user_id).await?;
        finish(ctx, &status).await
    }
}

/// Get group MFA status tool.
pub struct GetGroupMfaStatusTool {
    service: Arc<MfaService>,
}

impl GetGroupMfaStatusTool {
    pub fn new(service: Arc<MfaService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetGroupMfaStatusTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_group_mfa_status".to_string(),
            description: "Get the MFA status of every user in a group. Members whose methods cannot be read are skipped.".to_string(),
            input_schema: crate::tool_schema!(
                required: ["group_id"],
                "group_id": {
                    "type": "string",
                    "description": "Group object ID"
                }
            ),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let group_id = get_string_arg(&args, "group_id")?;

        ctx.info(format!("Getting MFA status of members of group {}...", group_id)).await;
        ctx.report_progress(0, Some(100), Some("Reading group members")).await;
        let statuses = self.service.get_group_mfa_status(&group_id).await?;

        let without_mfa = statuses.iter().filter(|s| !s.is_enabled()).count();
        ctx.info(format!(
            "{} of {} users have no second factor registered",
            without_mfa,
            statuses.len()
        ))
        .await;
        finish(ctx, &statuses).await
    }
}
