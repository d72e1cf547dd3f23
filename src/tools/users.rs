//! User lookup tools.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::mcp::context::ToolContext;
use crate::mcp::handler::{get_limit_arg, get_string_arg, ToolHandler};
use crate::mcp::protocol::{Tool, ToolResult};
use crate::service::UserService;
use crate::tools::finish;

/// Search users tool.
pub struct SearchUsersTool {
    service: Arc<UserService>,
}

impl SearchUsersTool {
    pub fn new(service: Arc<UserService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for SearchUsersTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "search_users".to_string(),
            description: "Search for users by name or email. Matches display name, mail, user principal name, given name, surname and other mails.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query (name or email)"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results to return (default: 10)",
                        "default": 10,
                        "minimum": 1
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let query = get_string_arg(&args, "query")?;
        let limit = get_limit_arg(&args, "limit", 10)?;

        ctx.info(format!("Searching for users matching '{}'...", query)).await;
        let users = self.service.search_users(&query, limit).await?;
        finish(ctx, &users).await
    }
}

/// Get user by ID tool.
pub struct GetUserByIdTool {
    service: Arc<UserService>,
}

impl GetUserByIdTool {
    pub fn new(service: Arc<UserService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetUserByIdTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_user_by_id".to_string(),
            description: "Get a user's profile by object ID or user principal name.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "user_id": {
                        "type": "string",
                        "description": "User object ID or user principal name"
                    }
                },
                "required": ["user_id"]
            }),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let user_id = get_string_arg(&args, "user_id")?;

        ctx.info(format!("Getting user {}...", user_id)).await;
        let user = self.service.get_user_by_id(&user_id).await?;
        finish(ctx, &user).await
    }
}

/// Get privileged users tool.
pub struct GetPrivilegedUsersTool {
    service: Arc<UserService>,
}

impl GetPrivilegedUsersTool {
    pub fn new(service: Arc<UserService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetPrivilegedUsersTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_privileged_users".to_string(),
            description: "List every user holding an activated directory role, with the names of their roles.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn execute(&self, _args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        ctx.info("Collecting members of activated directory roles...").await;
        let users = self.service.get_privileged_users().await?;
        ctx.info(format!("Found {} privileged users", users.len())).await;
        finish(ctx, &users).await
    }
}

/// Get user roles tool.
pub struct GetUserRolesTool {
    service: Arc<UserService>,
}

impl GetUserRolesTool {
    pub fn new(service: Arc<UserService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetUserRolesTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_user_roles".to_string(),
            description: "Get the directory roles assigned to a user.".to_string(),
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

        ctx.info(format!("Getting directory roles of {}...", user_id)).await;
        let roles = self.service.get_user_roles(&user_id).await?;
        finish(ctx, &roles).await
    }
}

/// Get user groups tool.
pub struct GetUserGroupsTool {
    service: Arc<UserService>,
}

impl GetUserGroupsTool {
    pub fn new(service: Arc<UserService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetUserGroupsTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_user_groups".to_string(),
            description: "Get the groups a user belongs to, including through nested groups.".to_string(),
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

        ctx.info(format!("Getting group memberships of {}...", user_id)).await;
        let groups = self.service.get_user_groups(&user_id).await?;
        finish(ctx, &groups).await
    }
}
