//! Managed device tools.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::mcp::context::ToolContext;
use crate::mcp::handler::{get_optional_string_arg, get_string_arg, ToolHandler};
use crate::mcp::protocol::{Tool, ToolResult};
use crate::service::DeviceService;
use crate::tools::finish;

/// Get all managed devices tool.
pub struct GetAllManagedDevicesTool {
    service: Arc<DeviceService>,
}

impl GetAllManagedDevicesTool {
    pub fn new(service: Arc<DeviceService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetAllManagedDevicesTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_all_managed_devices".to_string(),
            description: "List devices managed by Intune, optionally restricted to one operating system.".to_string(),
            input_schema: crate::tool_schema!(
                "filter_os": {
                    "type": "string",
                    "description": "Operating system to filter by, e.g. 'Windows', 'iOS', 'Android', 'macOS'"
                }
            ),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let filter_os = get_optional_string_arg(&args, "filter_os").filter(|os| !os.trim().is_empty());

        match filter_os {
            Some(ref os) => ctx.info(format!("Listing managed {} devices...", os)).await,
            None => ctx.info("Listing managed devices...").await,
        }
        let devices = self.service.get_all_managed_devices(filter_os.as_deref()).await?;
        finish(ctx, &devices).await
    }
}

/// Get managed devices by user tool.
pub struct GetManagedDevicesByUserTool {
    service: Arc<DeviceService>,
}

impl GetManagedDevicesByUserTool {
    pub fn new(service: Arc<DeviceService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetManagedDevicesByUserTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_managed_devices_by_user".to_string(),
            description: "List the Intune managed devices enrolled by a user.".to_string(),
            input_schema: crate::tool_schema!(
                required: ["user_id"],
                "user_id": {
                    "type": "string",
                    "description": "User object ID"
                }
            ),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let user_id = get_string_arg(&args, "user_id")?;

        ctx.info(format!("Listing managed devices of {}...", user_id)).await;
        let devices = self.service.get_managed_devices_by_user(&user_id).await?;
        finish(ctx, &devices).await
    }
}
