//! Group lookup and management tools.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::mcp::context::ToolContext;
use crate::mcp::handler::{get_limit_arg, get_object_arg, get_string_arg, ToolHandler};
use crate::mcp::protocol::{Tool, ToolResult};
use crate::service::GroupService;
use crate::tools::{deleted, finish};

fn group_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "group_id": {
                "type": "string",
                "description": "Group object ID"
            }
        },
        "required": ["group_id"]
    })
}

fn membership_schema(field: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "group_id": {
                "type": "string",
                "description": "Group object ID"
            },
            field: {
                "type": "string",
                "description": description
            }
        },
        "required": ["group_id", field]
    })
}

/// Get all groups tool.
pub struct GetAllGroupsTool {
    service: Arc<GroupService>,
}

impl GetAllGroupsTool {
    pub fn new(service: Arc<GroupService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetAllGroupsTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_all_groups".to_string(),
            description: "List groups in the tenant.".to_string(),
            input_schema: crate::tool_schema!(
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of groups to return (default: 100)",
                    "default": 100,
                    "minimum": 1
                }
            ),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let limit = get_limit_arg(&args, "limit", 100)?;

        ctx.info(format!("Listing up to {} groups...", limit)).await;
        let groups = self.service.get_all_groups(limit).await?;
        finish(ctx, &groups).await
    }
}

/// Get group by ID tool.
pub struct GetGroupByIdTool {
    service: Arc<GroupService>,
}

impl GetGroupByIdTool {
    pub fn new(service: Arc<GroupService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetGroupByIdTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_group_by_id".to_string(),
            description: "Get a group's details by object ID.".to_string(),
            input_schema: group_id_schema(),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let group_id = get_string_arg(&args, "group_id")?;

        ctx.info(format!("Getting group {}...", group_id)).await;
        let group = self.service.get_group_by_id(&group_id).await?;
        finish(ctx, &group).await
    }
}

/// Search groups by name tool.
pub struct SearchGroupsByNameTool {
    service: Arc<GroupService>,
}

impl SearchGroupsByNameTool {
    pub fn new(service: Arc<GroupService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for SearchGroupsByNameTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "search_groups_by_name".to_string(),
            description: "Find groups whose display name starts with the given text.".to_string(),
            input_schema: crate::tool_schema!(
                required: ["name"],
                "name": {
                    "type": "string",
                    "description": "Display name prefix"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of groups to return (default: 50)",
                    "default": 50,
                    "minimum": 1
                }
            ),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let name = get_string_arg(&args, "name")?;
        let limit = get_limit_arg(&args, "limit", 50)?;

        ctx.info(format!("Searching for groups starting with '{}'...", name)).await;
        let groups = self.service.search_groups_by_name(&name, limit).await?;
        finish(ctx, &groups).await
    }
}

/// Get group members tool.
pub struct GetGroupMembersTool {
    service: Arc<GroupService>,
}

impl GetGroupMembersTool {
    pub fn new(service: Arc<GroupService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for GetGroupMembersTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "get_group_members".to_string(),
            description: "List the direct members of a group (users, groups, devices and service principals).".to_string(),
            input_schema: crate::tool_schema!(
                required: ["group_id"],
                "group_id": {
                    "type": "string",
                    "description": "Group object ID"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of members to return (default: 100)",
                    "default": 100,
                    "minimum": 1
                }
            ),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let group_id = get_string_arg(&args, "group_id")?;
        let limit = get_limit_arg(&args, "limit", 100)?;

        ctx.info(format!("Listing members of group {}...", group_id)).await;
        let members = self.service.get_group_members(&group_id, limit).await?;
        finish(ctx, &members).await
    }
}

/// Create group tool.
pub struct CreateGroupTool {
    service: Arc<GroupService>,
}

impl CreateGroupTool {
    pub fn new(service: Arc<GroupService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for CreateGroupTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "create_group".to_string(),
            description: "Create a security, Microsoft 365 or dynamic membership group. If a group with the same display name exists it is returned with status 'already_exists'.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "group_data": {
                        "type": "object",
                        "description": "Group properties",
                        "properties": {
                            "displayName": { "type": "string" },
                            "mailNickname": { "type": "string" },
                            "description": { "type": "string" },
                            "groupTypes": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "Include 'Unified' for a Microsoft 365 group and 'DynamicMembership' for a dynamic group"
                            },
                            "mailEnabled": { "type": "boolean" },
                            "securityEnabled": { "type": "boolean" },
                            "visibility": { "type": "string", "enum": ["Private", "Public", "HiddenMembership"] },
                            "membershipRule": { "type": "string" },
                            "membershipRuleProcessingState": { "type": "string", "enum": ["On", "Paused"] },
                            "owners": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "User IDs to add as owners"
                            },
                            "members": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "Directory object IDs to add as members (ignored for dynamic groups)"
                            }
                        },
                        "required": ["displayName", "mailNickname"]
                    }
                },
                "required": ["group_data"]
            }),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let group_data = get_object_arg(&args, "group_data")?;

        ctx.info("Creating group...").await;
        let created = self.service.create_group(&group_data).await?;
        if let Some(status) = created.status {
            ctx.warning(format!(
                "Group '{}' {}",
                created.group.display_name.as_deref().unwrap_or_default(),
                status.replace('_', " ")
            ))
            .await;
        }
        finish(ctx, &created).await
    }
}

/// Update group tool.
pub struct UpdateGroupTool {
    service: Arc<GroupService>,
}

impl UpdateGroupTool {
    pub fn new(service: Arc<GroupService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for UpdateGroupTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "update_group".to_string(),
            description: "Update a group's display name, mail nickname, description, visibility or membership rule. Returns the refreshed group.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "group_id": {
                        "type": "string",
                        "description": "Group object ID"
                    },
                    "group_data": {
                        "type": "object",
                        "description": "Properties to change",
                        "properties": {
                            "displayName": { "type": "string" },
                            "mailNickname": { "type": "string" },
                            "description": { "type": "string" },
                            "visibility": { "type": "string" },
                            "membershipRule": { "type": "string" },
                            "membershipRuleProcessingState": { "type": "string" }
                        }
                    }
                },
                "required": ["group_id", "group_data"]
            }),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let group_id = get_string_arg(&args, "group_id")?;
        let group_data = get_object_arg(&args, "group_data")?;

        ctx.info(format!("Updating group {}...", group_id)).await;
        let group = self.service.update_group(&group_id, &group_data).await?;
        finish(ctx, &group).await
    }
}

/// Delete group tool.
pub struct DeleteGroupTool {
    service: Arc<GroupService>,
}

impl DeleteGroupTool {
    pub fn new(service: Arc<GroupService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for DeleteGroupTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "delete_group".to_string(),
            description: "Delete a group.".to_string(),
            input_schema: group_id_schema(),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let group_id = get_string_arg(&args, "group_id")?;

        self.service.delete_group(&group_id).await?;
        deleted(ctx, "Group", &group_id).await
    }
}

/// Add group member tool.
pub struct AddGroupMemberTool {
    service: Arc<GroupService>,
}

impl AddGroupMemberTool {
    pub fn new(service: Arc<GroupService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for AddGroupMemberTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "add_group_member".to_string(),
            description: "Add a member to a group. Does nothing if the object is already a member; dynamic groups are refused.".to_string(),
            input_schema: membership_schema("member_id", "Directory object ID of the new member"),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let group_id = get_string_arg(&args, "group_id")?;
        let member_id = get_string_arg(&args, "member_id")?;

        ctx.info(format!("Adding {} to group {}...", member_id, group_id)).await;
        let change = self.service.add_group_member(&group_id, &member_id).await?;
        finish(ctx, &change).await
    }
}

/// Remove group member tool.
pub struct RemoveGroupMemberTool {
    service: Arc<GroupService>,
}

impl RemoveGroupMemberTool {
    pub fn new(service: Arc<GroupService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for RemoveGroupMemberTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "remove_group_member".to_string(),
            description: "Remove a member from a group. Does nothing if the object is not a member; dynamic groups are refused.".to_string(),
            input_schema: membership_schema("member_id", "Directory object ID of the member"),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let group_id = get_string_arg(&args, "group_id")?;
        let member_id = get_string_arg(&args, "member_id")?;

        ctx.info(format!("Removing {} from group {}...", member_id, group_id)).await;
        let change = self.service.remove_group_member(&group_id, &member_id).await?;
        finish(ctx, &change).await
    }
}

/// Add group owner tool.
pub struct AddGroupOwnerTool {
    service: Arc<GroupService>,
}

impl AddGroupOwnerTool {
    pub fn new(service: Arc<GroupService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for AddGroupOwnerTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "add_group_owner".to_string(),
            description: "Add an owner to a group.".to_string(),
            input_schema: membership_schema("owner_id", "User ID of the new owner"),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let group_id = get_string_arg(&args, "group_id")?;
        let owner_id = get_string_arg(&args, "owner_id")?;

        ctx.info(format!("Adding owner {} to group {}...", owner_id, group_id)).await;
        let change = self.service.add_group_owner(&group_id, &owner_id).await?;
        finish(ctx, &change).await
    }
}

/// Remove group owner tool.
pub struct RemoveGroupOwnerTool {
    service: Arc<GroupService>,
}

impl RemoveGroupOwnerTool {
    pub fn new(service: Arc<GroupService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for RemoveGroupOwnerTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "remove_group_owner".to_string(),
            description: "Remove an owner from a group.".to_string(),
            input_schema: membership_schema("owner_id", "User ID of the owner"),
        }
    }

    async fn execute(&self, args: HashMap<String, Value>, ctx: &ToolContext) -> Result<ToolResult> {
        let group_id = get_string_arg(&args, "group_id")?;
        let owner_id = get_string_arg(&args, "owner_id")?;

        ctx.info(format!("Removing owner {} from group {}...", owner_id, group_id)).await;
        let change = self.service.remove_group_owner(&group_id, &owner_id).await?;
        finish(ctx, &change).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests::offline_client;

    #[tokio::test]
    async fn test_create_group_requires_object() {
        let tool = CreateGroupTool::new(Arc::new(GroupService::new(offline_client())));
        let mut args = HashMap::new();
        args.insert("group_data".to_string(), json!("Engineering"));

        let err = tool
            .execute(args, &ToolContext::detached("create_group"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("group_data"));
    }

    #[tokio::test]
    async fn test_create_group_validates_before_request() {
        let tool = CreateGroupTool::new(Arc::new(GroupService::new(offline_client())));
        let mut args = HashMap::new();
        args.insert("group_data".to_string(), json!({"mailNickname": "eng"}));

        let err = tool
            .execute(args, &ToolContext::detached("create_group"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("displayName is required"));
    }

    #[test]
    fn test_membership_schema() {
        let schema = membership_schema("owner_id", "owner");
        assert_eq!(schema["required"], json!(["group_id", "owner_id"]));
        assert_eq!(schema["properties"]["owner_id"]["type"], "string");
    }
}
