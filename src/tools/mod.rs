//! MCP tool implementations, one struct per tool, grouped by directory area:
//!
//! - `users` - user lookup, roles and memberships (5 tools)
//! - `groups` - group lookup and management (11 tools)
//! - `logs` - sign-in and directory audit logs (2 tools)
//! - `mfa` - authentication method status (2 tools)
//! - `devices` - Intune managed devices (2 tools)
//! - `conditional_access` - conditional access policies (2 tools)
//! - `password` - password methods and resets (3 tools)
//! - `permissions` - permission suggestions and catalogue (4 tools)
//! - `applications` - app registrations (5 tools)
//! - `service_principals` - enterprise applications (5 tools)

pub mod applications;
pub mod conditional_access;
pub mod devices;
pub mod groups;
pub mod logs;
pub mod mfa;
pub mod password;
pub mod permissions;
pub mod service_principals;
pub mod users;

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::Result;
use crate::graph::GraphClient;
use crate::mcp::context::ToolContext;
use crate::mcp::handler::{json_result, McpHandler};
use crate::mcp::protocol::ToolResult;
use crate::service::*;

/// Report completion and return the value as the tool's JSON text.
pub(crate) async fn finish<T: Serialize + ?Sized>(ctx: &ToolContext, value: &T) -> Result<ToolResult> {
    ctx.report_progress(100, Some(100), None).await;
    json_result(value)
}

/// Result of a successful delete.
pub(crate) async fn deleted(ctx: &ToolContext, kind: &str, id: &str) -> Result<ToolResult> {
    ctx.info(format!("Deleted {} {}", kind, id)).await;
    finish(
        ctx,
        &json!({
            "status": "deleted",
            "id": id,
            "message": format!("{} {} was deleted", kind, id),
        }),
    )
    .await
}

/// Register all tools with the handler.
pub fn register_all_tools(handler: &mut McpHandler, client: Arc<GraphClient>) {
    let users = Arc::new(UserService::new(client.clone()));
    let groups = Arc::new(GroupService::new(client.clone()));
    let logs = Arc::new(LogService::new(client.clone()));
    let mfa = Arc::new(MfaService::new(client.clone()));
    let devices = Arc::new(DeviceService::new(client.clone()));
    let policies = Arc::new(ConditionalAccessService::new(client.clone()));
    let passwords = Arc::new(PasswordService::new(client.clone()));
    let permissions = Arc::new(PermissionService::new(client.clone()));
    let applications = Arc::new(ApplicationService::new(client.clone()));
    let service_principals = Arc::new(ServicePrincipalService::new(client));

    // Users (5)
    handler.register(users::SearchUsersTool::new(users.clone()));
    handler.register(users::GetUserByIdTool::new(users.clone()));
    handler.register(users::GetPrivilegedUsersTool::new(users.clone()));
    handler.register(users::GetUserRolesTool::new(users.clone()));
    handler.register(users::GetUserGroupsTool::new(users));

    // Groups (11)
    handler.register(groups::GetAllGroupsTool::new(groups.clone()));
    handler.register(groups::GetGroupByIdTool::new(groups.clone()));
    handler.register(groups::SearchGroupsByNameTool::new(groups.clone()));
    handler.register(groups::GetGroupMembersTool::new(groups.clone()));
    handler.register(groups::CreateGroupTool::new(groups.clone()));
    handler.register(groups::UpdateGroupTool::new(groups.clone()));
    handler.register(groups::DeleteGroupTool::new(groups.clone()));
    handler.register(groups::AddGroupMemberTool::new(groups.clone()));
    handler.register(groups::RemoveGroupMemberTool::new(groups.clone()));
    handler.register(groups::AddGroupOwnerTool::new(groups.clone()));
    handler.register(groups::RemoveGroupOwnerTool::new(groups));

    // Logs (2)
    handler.register(logs::GetUserSignInsTool::new(logs.clone()));
    handler.register(logs::GetUserAuditLogsTool::new(logs));

    // MFA (2)
    handler.register(mfa::GetUserMfaStatusTool::new(mfa.clone()));
    handler.register(mfa::GetGroupMfaStatusTool::new(mfa));

    // Devices (2)
    handler.register(devices::GetAllManagedDevicesTool::new(devices.clone()));
    handler.register(devices::GetManagedDevicesByUserTool::new(devices));

    // Conditional access (2)
    handler.register(conditional_access::GetConditionalAccessPoliciesTool::new(policies.clone()));
    handler.register(conditional_access::GetConditionalAccessPolicyByIdTool::new(policies));

    // Passwords (3)
    handler.register(password::ResetUserPasswordDirectTool::new(passwords.clone()));
    handler.register(password::ListUserPasswordMethodsTool::new(passwords.clone()));
    handler.register(password::GetUserPasswordMethodTool::new(passwords));

    // Permissions (4)
    handler.register(permissions::SuggestPermissionsForTaskTool);
    handler.register(permissions::ListPermissionCategoriesTool);
    handler.register(permissions::GetAllGraphPermissionsTool::new(permissions.clone()));
    handler.register(permissions::SearchPermissionsTool::new(permissions));

    // Applications (5)
    handler.register(applications::ListApplicationsTool::new(applications.clone()));
    handler.register(applications::GetApplicationByIdTool::new(applications.clone()));
    handler.register(applications::CreateApplicationTool::new(applications.clone()));
    handler.register(applications::UpdateApplicationTool::new(applications.clone()));
    handler.register(applications::DeleteApplicationTool::new(applications));

    // Service principals (5)
    handler.register(service_principals::ListServicePrincipalsTool::new(service_principals.clone()));
    handler.register(service_principals::GetServicePrincipalByIdTool::new(service_principals.clone()));
    handler.register(service_principals::CreateServicePrincipalTool::new(service_principals.clone()));
    handler.register(service_principals::UpdateServicePrincipalTool::new(service_principals.clone()));
    handler.register(service_principals::DeleteServicePrincipalTool::new(service_principals));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ClientCredential, GraphSettings};
    use crate::metrics::Metrics;
    use secrecy::SecretString;
    use std::time::Duration;

    pub(crate) fn offline_client() -> Arc<GraphClient> {
        let settings = GraphSettings {
            tenant_id: "tenant".to_string(),
            client_id: "client".to_string(),
            credential: ClientCredential::Secret(SecretString::from("secret".to_string())),
            scopes: vec!["https://graph.microsoft.com/.default".to_string()],
            graph_endpoint: "http://127.0.0.1:9".to_string(),
            authority: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(1),
        };
        Arc::new(GraphClient::new(settings, Metrics::new()).unwrap())
    }

    #[test]
    fn test_register_all_tools() {
        let mut handler = McpHandler::new(Metrics::new());
        register_all_tools(&mut handler, offline_client());

        assert_eq!(handler.tool_count(), 41);
        for name in [
            "search_users",
            "get_privileged_users",
            "create_group",
            "remove_group_owner",
            "get_user_sign_ins",
            "get_user_audit_logs",
            "get_group_mfa_status",
            "get_all_managed_devices",
            "get_conditional_access_policy_by_id",
            "reset_user_password_direct",
            "suggest_permissions_for_task",
            "list_permission_categories_and_tasks",
            "search_permissions",
            "update_application",
            "delete_service_principal",
        ] {
            assert!(handler.has_tool(name), "missing tool {}", name);
        }
    }

    #[test]
    fn test_schemas_are_objects() {
        let mut handler = McpHandler::new(Metrics::new());
        register_all_tools(&mut handler, offline_client());

        for tool in handler.list_tools() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.input_schema["properties"].is_object(), "{}", tool.name);
            assert!(!tool.description.is_empty(), "{}", tool.name);
        }
    }
}
