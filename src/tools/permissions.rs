//! Permission suggestion and catalogue tools.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::mcp::context::ToolContext;
use crate::mcp::handler::{get_optional_string_arg, get_string_arg, ToolHandler};
use crate::mcp::protocol::{Tool, ToolResult};
use crate::service::permissions::{
    list_permission_categories_and_tasks, suggest_permissions_for_task, PermissionType,
};
use crate::service::PermissionService;
use crate::tools::finish;
use crate::types::permission::category_names;

/// Suggest permissions for a task tool. Answers from the built-in table.
pub struct SuggestPermissionsForTaskTool;

#[async_trait]
impl ToolHandler for SuggestPermissionsForTaskTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "suggest_permissions_for_task".to_string(),
            description: "Suggest the Microsoft Graph permissions needed for a common task. Use list_permission_categories_and_tasks to see the choices.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "task_category": {
                        "type": "string",
                        "description": "Task category",
                        "enum": category_names()
                    },
                    "task_name": {
                        "type": "string",
                        "description": "Task within the category, e.g. 'read_user_profile'"
                    }
                },
                "required": ["task_category", "task_name"]
            }),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let task_category = get_string_arg(&args, "task_category")?;
        let task_name = get_string_arg(&args, "task_name")?;

        ctx.info(format!("Looking up permissions for {}/{}...", task_category, task_name)).await;
        let suggestion = suggest_permissions_for_task(&task_category, &task_name)?;
        finish(ctx, &suggestion).await
    }
}

/// List permission categories and tasks tool.
pub struct ListPermissionCategoriesTool;

#[async_trait]
impl ToolHandler for ListPermissionCategoriesTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "list_permission_categories_and_tasks".to_string(),
            description: "List the task categories and tasks known to suggest_permissions_for_task.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn execute(&self, _args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        finish(ctx, &list_permission_categories_and_tasks()).await
    }
}

/// Get all Graph permissions tool.
pub struct GetAllGraphPermissionsTool {
    service: Arc<PermissionService>,
}

impl GetAllGraphPermissionsTool {
    pub fn new(service: Arc<PermissionService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetAllGraphPermissionsTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_all_graph_permissions".to_string(),
            description: "List every delegated scope and application role published by the Microsoft Graph service principal.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn execute(&self, _args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        ctx.info("Reading the Microsoft Graph permission catalogue...").await;
        let permissions = self.service.get_all_graph_permissions().await?;
        finish(ctx, &permissions).await
    }
}

/// Search permissions tool.
pub struct SearchPermissionsTool {
    service: Arc<PermissionService>,
}

impl SearchPermissionsTool {
    pub fn new(service: Arc<PermissionService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for SearchPermissionsTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "search_permissions".to_string(),
            description: "Search Microsoft Graph permissions by value, display name or description (case-insensitive).".to_string(),
            input_schema: crate::tool_schema!(
                required: ["search_term"],
                "search_term": {
                    "type": "string",
                    "description": "Text to look for, e.g. 'mail' or 'User.Read'"
                },
                "permission_type": {
                    "type": "string",
                    "description": "Restrict to one kind of permission",
                    "enum": ["delegated", "application"]
                }
            ),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let search_term = get_string_arg(&args, "search_term")?;
        let permission_type = get_optional_string_arg(&args, "permission_type")
            .map(|t| t.parse::<PermissionType>())
            .transpose()?;

        ctx.info(format!("Searching permissions for '{}'...", search_term)).await;
        let found = self.service.search_permissions(&search_term, permission_type).await?;
        finish(ctx, &found).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::ContentBlock;
    use serde_json::json;

    fn text(result: &ToolResult) -> Value {
        let ContentBlock::Text { text } = &result.content[0];
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_suggest_known_task() {
        let mut args = HashMap::new();
        args.insert("task_category".to_string(), json!("users"));
        args.insert("task_name".to_string(), json!("read_user_profile"));

        let result = SuggestPermissionsForTaskTool
            .execute(args, &ToolContext::detached("suggest_permissions_for_task"))
            .await
            .unwrap();
        assert!(!result.is_error);
        let body = text(&result);
        assert_eq!(body["task_category"], "users");
        assert!(body["delegated_permissions"].as_array().is_some());
    }

    #[tokio::test]
    async fn test_suggest_unknown_category_lists_choices() {
        let mut args = HashMap::new();
        args.insert("task_category".to_string(), json!("printers"));
        args.insert("task_name".to_string(), json!("print"));

        let err = SuggestPermissionsForTaskTool
            .execute(args, &ToolContext::detached("suggest_permissions_for_task"))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("printers"));
        assert!(message.contains("users"));
    }

    #[tokio::test]
    async fn test_list_categories() {
        let result = ListPermissionCategoriesTool
            .execute(HashMap::new(), &ToolContext::detached("list_permission_categories_and_tasks"))
            .await
            .unwrap();
        let body = text(&result);
        assert!(body["groups"].is_object());
        assert!(body["audit_logs"].is_object());
    }

    #[test]
    fn test_suggest_schema_enumerates_categories() {
        let schema = SuggestPermissionsForTaskTool.definition().input_schema;
        let choices = schema["properties"]["task_category"]["enum"].as_array().unwrap();
        assert_eq!(choices.len(), 8);
    }
}
