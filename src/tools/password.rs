//! Password method and reset tools.

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::mcp::context::ToolContext;
use crate::mcp::handler::{get_bool_arg, get_int_arg, get_optional_string_arg, get_string_arg, ToolHandler};
use crate::mcp::protocol::{Tool, ToolResult};
use crate::service::password::{DEFAULT_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::service::{PasswordReset, PasswordService};
use crate::tools::finish;

/// Read the reset arguments. The password is wrapped before anything can log it.
fn reset_from_args(args: &HashMap<String, Value>) -> Result<PasswordReset> {
    let password_length = get_int_arg(args, "password_length", DEFAULT_PASSWORD_LENGTH as i64)?;
    let password_length = usize::try_from(password_length)
        .map_err(|_| Error::validation("password_length must be positive"))?;

    Ok(PasswordReset {
        password: get_optional_string_arg(args, "password").map(SecretString::from),
        require_change_on_next_sign_in: get_bool_arg(args, "require_change_on_next_sign_in", true)?,
        generate_password: get_bool_arg(args, "generate_password", false)?,
        password_length,
    })
}

/// Reset user password tool.
pub struct ResetUserPasswordDirectTool {
    service: Arc<PasswordService>,
}

impl ResetUserPasswordDirectTool {
    pub fn new(service: Arc<PasswordService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for ResetUserPasswordDirectTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "reset_user_password_direct".to_string(),
            description: "Set a new password on a user account. Supply a password or ask for one to be generated; a generated password is returned once in the result.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "user_id": {
                        "type": "string",
                        "description": "User object ID or user principal name"
                    },
                    "password": {
                        "type": "string",
                        "description": "New password (required unless generate_password is true)"
                    },
                    "require_change_on_next_sign_in": {
                        "type": "boolean",
                        "description": "Force the user to change the password at next sign-in (default: true)",
                        "default": true
                    },
                    "generate_password": {
                        "type": "boolean",
                        "description": "Generate a random password (default: false)",
                        "default": false
                    },
                    "password_length": {
                        "type": "integer",
                        "description": "Length of a generated password (default: 12)",
                        "default": DEFAULT_PASSWORD_LENGTH,
                        "minimum": MIN_PASSWORD_LENGTH,
                        "maximum": MAX_PASSWORD_LENGTH
                    }
                },
                "required": ["user_id"]
            }),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let user_id = get_string_arg(&args, "user_id")?;
        let reset = reset_from_args(&args)?;

        ctx.info(format!("Resetting password of {}...", user_id)).await;
        let result = self.service.reset_user_password_direct(&user_id, reset).await?;
        finish(ctx, &result).await
    }
}

/// List user password methods tool.
pub struct ListUserPasswordMethodsTool {
    service: Arc<PasswordService>,
}

impl ListUserPasswordMethodsTool {
    pub fn new(service: Arc<PasswordService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for ListUserPasswordMethodsTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "list_user_password_methods".to_string(),
            description: "List a user's password authentication methods.".to_string(),
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

        ctx.info(format!("Listing password methods of {}...", user_id)).await;
        let methods = self.service.list_user_password_methods(&user_id).await?;
        finish(ctx, &methods).await
    }
}

/// Get user password method tool.
pub struct GetUserPasswordMethodTool {
    service: Arc<PasswordService>,
}

impl GetUserPasswordMethodTool {
    pub fn new(service: Arc<PasswordService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetUserPasswordMethodTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_user_password_method".to_string(),
            description: "Get one of a user's password authentication methods.".to_string(),
            input_schema: crate::tool_schema!(
                required: ["user_id", "method_id"],
                "user_id": {
                    "type": "string",
                    "description": "User object ID or user principal name"
                },
                "method_id": {
                    "type": "string",
                    "description": "Password method ID"
                }
            ),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let user_id = get_string_arg(&args, "user_id")?;
        let method_id = get_string_arg(&args, "method_id")?;

        ctx.info(format!("Getting password method {} of {}...", method_id, user_id)).await;
        let method = self.service.get_user_password_method(&user_id, &method_id).await?;
        finish(ctx, &method).await
    }
}
