//! App registration tools.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::mcp::context::ToolContext;
use crate::mcp::handler::{get_limit_arg, get_object_arg, get_string_arg, ToolHandler};
use crate::mcp::protocol::{Tool, ToolResult};
use crate::service::ApplicationService;
use crate::tools::{deleted, finish};

fn app_data_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "description": description,
        "properties": {
            "displayName": { "type": "string" },
            "signInAudience": {
                "type": "string",
                "enum": ["AzureADMyOrg", "AzureADMultipleOrgs", "AzureADandPersonalMicrosoftAccount", "PersonalMicrosoftAccount"]
            },
            "tags": { "type": "array", "items": { "type": "string" } },
            "identifierUris": { "type": "array", "items": { "type": "string" } },
            "web": { "type": "object", "description": "Redirect URIs and implicit grant settings" },
            "api": { "type": "object", "description": "Exposed scopes and app roles" },
            "requiredResourceAccess": { "type": "array", "items": { "type": "object" } }
        }
    })
}

fn app_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "app_id": {
                "type": "string",
                "description": "Application object ID (not the client ID)"
            }
        },
        "required": ["app_id"]
    })
}

/// List applications tool.
pub struct ListApplicationsTool {
    service: Arc<ApplicationService>,
}

impl ListApplicationsTool {
    pub fn new(service: Arc<ApplicationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for ListApplicationsTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "list_applications".to_string(),
            description: "List app registrations in the tenant.".to_string(),
            input_schema: crate::tool_schema!(
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of applications to return (default: 100)",
                    "default": 100,
                    "minimum": 1
                }
            ),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let limit = get_limit_arg(&args, "limit", 100)?;

        ctx.info(format!("Listing up to {} applications...", limit)).await;
        let apps = self.service.list_applications(limit).await?;
        finish(ctx, &apps).await
    }
}

/// Get application by ID tool.
pub struct GetApplicationByIdTool {
    service: Arc<ApplicationService>,
}

impl GetApplicationByIdTool {
    pub fn new(service: Arc<ApplicationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetApplicationByIdTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_application_by_id".to_string(),
            description: "Get an app registration, with the app role assignments and OAuth2 grants of its service principal.".to_string(),
            input_schema: app_id_schema(),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let app_id = get_string_arg(&args, "app_id")?;

        ctx.info(format!("Getting application {}...", app_id)).await;
        let app = self.service.get_application_by_id(&app_id).await?;
        finish(ctx, &app).await
    }
}

/// Create application tool.
pub struct CreateApplicationTool {
    service: Arc<ApplicationService>,
}

impl CreateApplicationTool {
    pub fn new(service: Arc<ApplicationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for CreateApplicationTool {
    fn definition(&self) -> Tool {
        let mut app_data = app_data_schema("Application properties");
        app_data["required"] = json!(["displayName"]);
        Tool {
            name: "create_application".to_string(),
            description: "Register a new application.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": { "app_data": app_data },
                "required": ["app_data"]
            }),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let app_data = get_object_arg(&args, "app_data")?;

        ctx.info("Creating application...").await;
        let app = self.service.create_application(app_data).await?;
        finish(ctx, &app).await
    }
}

/// Update application tool.
pub struct UpdateApplicationTool {
    service: Arc<ApplicationService>,
}

impl UpdateApplicationTool {
    pub fn new(service: Arc<ApplicationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for UpdateApplicationTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "update_application".to_string(),
            description: "Update an app registration. Returns the refreshed application.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "app_id": {
                        "type": "string",
                        "description": "Application object ID"
                    },
                    "app_data": app_data_schema("Properties to change")
                },
                "required": ["app_id", "app_data"]
            }),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let app_id = get_string_arg(&args, "app_id")?;
        let app_data = get_object_arg(&args, "app_data")?;

        ctx.info(format!("Updating application {}...", app_id)).await;
        let app = self.service.update_application(&app_id, app_data).await?;
        finish(ctx, &app).await
    }
}

/// Delete application tool.
pub struct DeleteApplicationTool {
    service: Arc<ApplicationService>,
}

impl DeleteApplicationTool {
    pub fn new(service: Arc<ApplicationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for DeleteApplicationTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "delete_application".to_string(),
            description: "Delete an app registration.".to_string(),
            input_schema: app_id_schema(),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let app_id = get_string_arg(&args, "app_id")?;

        self.service.delete_application(&app_id).await?;
        deleted(ctx, "Application", &app_id).await
    }
}
