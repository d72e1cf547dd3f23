//! Sign-in and directory audit log tools.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::mcp::context::ToolContext;
use crate::mcp::handler::{get_int_arg, get_string_arg, ToolHandler};
use crate::mcp::protocol::{Tool, ToolResult};
use crate::service::logs::{DEFAULT_AUDIT_DAYS, DEFAULT_SIGN_IN_DAYS, MAX_RETENTION_DAYS};
use crate::service::LogService;
use crate::tools::finish;

/// Get user sign-ins tool.
pub struct GetUserSignInsTool {
    service: Arc<LogService>,
}

impl GetUserSignInsTool {
    pub fn new(service: Arc<LogService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetUserSignInsTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_user_sign_ins".to_string(),
            description: "Get a user's sign-in events for the last N days, newest first, with status, risk, device and location details.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "user_id": {
                        "type": "string",
                        "description": "User object ID"
                    },
                    "days": {
                        "type": "integer",
                        "description": "Number of days to look back (default: 7)",
                        "default": DEFAULT_SIGN_IN_DAYS,
                        "minimum": 1,
                        "maximum": MAX_RETENTION_DAYS
                    }
                },
                "required": ["user_id"]
            }),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let user_id = get_string_arg(&args, "user_id")?;
        let days = get_int_arg(&args, "days", DEFAULT_SIGN_IN_DAYS)?;

        ctx.info(format!("Getting sign-ins of {} for the last {} days...", user_id, days)).await;
        let sign_ins = self.service.get_user_sign_ins(&user_id, days).await?;
        finish(ctx, &sign_ins).await
    }
}

/// Get user audit logs tool.
pub struct GetUserAuditLogsTool {
    service: Arc<LogService>,
}

impl GetUserAuditLogsTool {
    pub fn new(service: Arc<LogService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetUserAuditLogsTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_user_audit_logs".to_string(),
            description: "Get directory audit events initiated by a user in the last N days.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "user_id": {
                        "type": "string",
                        "description": "User object ID"
                    },
                    "days": {
                        "type": "integer",
                        "description": "Number of days to look back (default: 30)",
                        "default": DEFAULT_AUDIT_DAYS,
                        "minimum": 1,
                        "maximum": MAX_RETENTION_DAYS
                    }
                },
                "required": ["user_id"]
            }),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let user_id = get_string_arg(&args, "user_id")?;
        let days = get_int_arg(&args, "days", DEFAULT_AUDIT_DAYS)?;

        ctx.info(format!("Getting audit logs of {} for the last {} days...", user_id, days)).await;
        let audits = self.service.get_user_audit_logs(&user_id, days).await?;
        finish(ctx, &audits).await
    }
}
