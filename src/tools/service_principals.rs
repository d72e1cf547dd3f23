//! Service principal tools.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::mcp::context::ToolContext;
use crate::mcp::handler::{get_limit_arg, get_object_arg, get_string_arg, ToolHandler};
use crate::mcp::protocol::{Tool, ToolResult};
use crate::service::ServicePrincipalService;
use crate::tools::{deleted, finish};

fn sp_data_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "description": description,
        "properties": {
            "appId": { "type": "string", "description": "Client ID of the application (create only)" },
            "displayName": { "type": "string" },
            "accountEnabled": { "type": "boolean" },
            "tags": { "type": "array", "items": { "type": "string" } },
            "appRoleAssignmentRequired": { "type": "boolean" }
        }
    })
}

fn sp_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "sp_id": {
                "type": "string",
                "description": "Service principal object ID"
            }
        },
        "required": ["sp_id"]
    })
}

/// List service principals tool.
pub struct ListServicePrincipalsTool {
    service: Arc<ServicePrincipalService>,
}

impl ListServicePrincipalsTool {
    pub fn new(service: Arc<ServicePrincipalService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for ListServicePrincipalsTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "list_service_principals".to_string(),
            description: "List service principals (enterprise applications) in the tenant.".to_string(),
            input_schema: crate::tool_schema!(
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of service principals to return (default: 100)",
                    "default": 100,
                    "minimum": 1
                }
            ),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let limit = get_limit_arg(&args, "limit", 100)?;

        ctx.info(format!("Listing up to {} service principals...", limit)).await;
        let sps = self.service.list_service_principals(limit).await?;
        finish(ctx, &sps).await
    }
}

/// Get service principal by ID tool.
pub struct GetServicePrincipalByIdTool {
    service: Arc<ServicePrincipalService>,
}

impl GetServicePrincipalByIdTool {
    pub fn new(service: Arc<ServicePrincipalService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetServicePrincipalByIdTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_service_principal_by_id".to_string(),
            description: "Get a service principal with its app role assignments and OAuth2 permission grants.".to_string(),
            input_schema: sp_id_schema(),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let sp_id = get_string_arg(&args, "sp_id")?;

        ctx.info(format!("Getting service principal {}...", sp_id)).await;
        let sp = self.service.get_service_principal_by_id(&sp_id).await?;
        finish(ctx, &sp).await
    }
}

/// Create service principal tool.
pub struct CreateServicePrincipalTool {
    service: Arc<ServicePrincipalService>,
}

impl CreateServicePrincipalTool {
    pub fn new(service: Arc<ServicePrincipalService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for CreateServicePrincipalTool {
    fn definition(&self) -> Tool {
        let mut sp_data = sp_data_schema("Service principal properties");
        sp_data["required"] = json!(["appId"]);
        Tool {
            name: "create_service_principal".to_string(),
            description: "Create a service principal for an existing application.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": { "sp_data": sp_data },
                "required": ["sp_data"]
            }),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let sp_data = get_object_arg(&args, "sp_data")?;

        ctx.info("Creating service principal...").await;
        let sp = self.service.create_service_principal(sp_data).await?;
        finish(ctx, &sp).await
    }
}

/// Update service principal tool.
pub struct UpdateServicePrincipalTool {
    service: Arc<ServicePrincipalService>,
}

impl UpdateServicePrincipalTool {
    pub fn new(service: Arc<ServicePrincipalService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for UpdateServicePrincipalTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "update_service_principal".to_string(),
            description: "Update a service principal. appId cannot be changed. Returns the refreshed service principal.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "sp_id": {
                        "type": "string",
                        "description": "Service principal object ID"
                    },
                    "sp_data": sp_data_schema("Properties to change")
                },
                "required": ["sp_id", "sp_data"]
            }),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let sp_id = get_string_arg(&args, "sp_id")?;
        let sp_data = get_object_arg(&args, "sp_data")?;

        ctx.info(format!("Updating service principal {}...", sp_id)).await;
        let sp = self.service.update_service_principal(&sp_id, sp_data).await?;
        finish(ctx, &sp).await
    }
}

/// Delete service principal tool.
pub struct DeleteServicePrincipalTool {
    service: Arc<ServicePrincipalService>,
}

impl DeleteServicePrincipalTool {
    pub fn new(service: Arc<ServicePrincipalService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for DeleteServicePrincipalTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "delete_service_principal".to_string(),
            description: "Delete a service principal.".to_string(),
            input_schema: sp_id_schema(),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let sp_id = get_string_arg(&args, "sp_id")?;

        self.service.delete_service_principal(&sp_id).await?;
        deleted(ctx, "Service principal", &sp_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests::offline_client;

    #[tokio::test]
    async fn test_create_requires_app_id() {
        let tool = CreateServicePrincipalTool::new(Arc::new(ServicePrincipalService::new(offline_client())));
        let mut args = HashMap::new();
        args.insert("sp_data".to_string(), json!({"displayName": "Payroll"}));

        let err = tool
            .execute(args, &ToolContext::detached("create_service_principal"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("appId is required"));
    }

    #[test]
    fn test_create_schema_requires_app_id() {
        let tool = CreateServicePrincipalTool::new(Arc::new(ServicePrincipalService::new(offline_client())));
        let schema = tool.definition().input_schema;
        assert_eq!(schema["properties"]["sp_data"]["required"], json!(["appId"]));
    }
}
