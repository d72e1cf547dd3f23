//! Permission catalogue for common tasks and Graph permission models.

use serde::{Deserialize, Serialize};

/// Application ID of the Microsoft Graph service principal, identical in every tenant.
pub const MS_GRAPH_APP_ID: &str = "00000003-0000-0000-c000-000000000000";

/// Least-privilege guidance attached to every suggestion.
pub const SUGGESTION_NOTE: &str = "These are suggested permissions based on common usage patterns. Always follow the principle of least privilege.";

#[derive(Debug, Clone, Copy)]
pub struct TaskPermissions {
    pub name: &'static str,
    pub description: &'static str,
    pub delegated: &'static [&'static str],
    pub application: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct PermissionCategory {
    pub name: &'static str,
    pub tasks: &'static [TaskPermissions],
}

impl PermissionCategory {
    pub fn task(&self, name: &str) -> Option<&'static TaskPermissions> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|t| t.name).collect()
    }
}

const fn task(
    name: &'static str,
    description: &'static str,
    delegated: &'static [&'static str],
    application: &'static [&'static str],
) -> TaskPermissions {
    TaskPermissions {
        name,
        description,
        delegated,
        application,
    }
}

pub static PERMISSION_CATEGORIES: &[PermissionCategory] = &[
    PermissionCategory {
        name: "users",
        tasks: &[
            task(
                "read_user_profile",
                "Read user profile information",
                &["User.Read", "User.ReadBasic.All"],
                &["User.Read.All"],
            ),
            task(
                "update_user_profile",
                "Update user profile information",
                &["User.ReadWrite", "User.ReadWrite.All"],
                &["User.ReadWrite.All"],
            ),
            task(
                "read_all_users",
                "Read all users' profiles in the organization",
                &["User.ReadBasic.All", "User.Read.All"],
                &["User.Read.All"],
            ),
            task(
                "reset_user_password",
                "Reset a user's password",
                &["User.ReadWrite.All"],
                &["User.ReadWrite.All", "Directory.ReadWrite.All"],
            ),
        ],
    },
    PermissionCategory {
        name: "groups",
        tasks: &[
            task(
                "read_user_groups",
                "Read groups a user is a member of",
                &["GroupMember.Read.All"],
                &["GroupMember.Read.All", "Directory.Read.All"],
            ),
            task(
                "read_all_groups",
                "Read all groups in the organization",
                &["Group.Read.All"],
                &["Group.Read.All"],
            ),
            task(
                "manage_groups",
                "Create, update, and delete groups, and add/remove members",
                &["Group.ReadWrite.All"],
                &["Group.ReadWrite.All"],
            ),
        ],
    },
    PermissionCategory {
        name: "mail",
        tasks: &[
            task("read_user_mail", "Read user's mail", &["Mail.Read"], &["Mail.Read"]),
            task("send_mail", "Send mail as the user", &["Mail.Send"], &["Mail.Send"]),
        ],
    },
    PermissionCategory {
        name: "calendar",
        tasks: &[
            task(
                "read_user_calendar",
                "Read user's calendar",
                &["Calendars.Read"],
                &["Calendars.Read"],
            ),
            task(
                "edit_user_calendar",
                "Read and write to user's calendar",
                &["Calendars.ReadWrite"],
                &["Calendars.ReadWrite"],
            ),
        ],
    },
    PermissionCategory {
        name: "files",
        tasks: &[
            task(
                "read_user_files",
                "Read user's files",
                &["Files.Read", "Files.Read.All"],
                &["Files.Read.All"],
            ),
            task(
                "edit_user_files",
                "Read and write to user's files",
                &["Files.ReadWrite", "Files.ReadWrite.All"],
                &["Files.ReadWrite.All"],
            ),
        ],
    },
    PermissionCategory {
        name: "devices",
        tasks: &[
            task(
                "read_devices",
                "Read device information",
                &["Device.Read"],
                &["Device.Read.All"],
            ),
            task(
                "manage_devices",
                "Manage device configuration",
                &["Device.ReadWrite.All"],
                &["Device.ReadWrite.All"],
            ),
        ],
    },
    PermissionCategory {
        name: "audit_logs",
        tasks: &[
            task(
                "read_audit_logs",
                "Read audit logs",
                &["AuditLog.Read.All"],
                &["AuditLog.Read.All"],
            ),
            task(
                "read_sign_in_logs",
                "Read sign-in activity logs",
                &["AuditLog.Read.All"],
                &["AuditLog.Read.All"],
            ),
        ],
    },
    PermissionCategory {
        name: "directory",
        tasks: &[
            task(
                "read_directory",
                "Read directory data (users, groups, apps, etc.)",
                &["Directory.Read.All"],
                &["Directory.Read.All"],
            ),
            task(
                "write_directory",
                "Read and write directory data (users, groups, apps, etc.)",
                &["Directory.ReadWrite.All"],
                &["Directory.ReadWrite.All"],
            ),
        ],
    },
];

pub fn category(name: &str) -> Option<&'static PermissionCategory> {
    PERMISSION_CATEGORIES.iter().find(|c| c.name == name)
}

pub fn category_names() -> Vec<&'static str> {
    PERMISSION_CATEGORIES.iter().map(|c| c.name).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionSuggestion {
    pub status: &'static str,
    pub task_category: String,
    pub task_name: String,
    pub description: &'static str,
    pub delegated_permissions: &'static [&'static str],
    pub application_permissions: &'static [&'static str],
    pub notes: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTasks {
    pub tasks: Vec<TaskSummary>,
}

/// Delegated scope published by the Graph service principal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatedPermission {
    pub id: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(rename = "type", default = "delegated")]
    pub permission_type: String,
    #[serde(default)]
    pub admin_consent_display_name: String,
    #[serde(default)]
    pub admin_consent_description: String,
    pub user_consent_display_name: Option<String>,
    pub user_consent_description: Option<String>,
    pub is_enabled: Option<bool>,
}

/// Application role published by the Graph service principal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPermission {
    pub id: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(rename = "type", default = "application")]
    pub permission_type: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub is_enabled: Option<bool>,
}

fn delegated() -> String {
    "delegated".to_string()
}

fn application() -> String {
    "application".to_string()
}

impl DelegatedPermission {
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        [
            &self.value,
            &self.admin_consent_display_name,
            &self.admin_consent_description,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

impl ApplicationPermission {
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        [&self.value, &self.display_name, &self.description]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// The Graph service principal with only its published permissions selected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSource {
    pub id: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub app_roles: Vec<ApplicationPermission>,
    #[serde(
        rename = "oauth2PermissionScopes",
        default,
        deserialize_with = "super::nullable"
    )]
    pub oauth2_permission_scopes: Vec<DelegatedPermission>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphPermissions {
    pub status: &'static str,
    pub delegated_permissions: Vec<DelegatedPermission>,
    pub application_permissions: Vec<ApplicationPermission>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionSearch {
    pub status: &'static str,
    pub search_term: String,
    pub matching_delegated_permissions: Vec<DelegatedPermission>,
    pub matching_application_permissions: Vec<ApplicationPermission>,
    pub total_matches: usize,
}
