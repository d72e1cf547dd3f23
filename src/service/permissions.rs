//! Permission suggestions and the Microsoft Graph permission catalogue.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::graph::{quote, GraphClient, ODataQuery};
use crate::types::permission::{
    category, category_names, CategoryTasks, GraphPermissions, PermissionSearch, PermissionSource,
    PermissionSuggestion, TaskSummary, MS_GRAPH_APP_ID, PERMISSION_CATEGORIES, SUGGESTION_NOTE,
};

/// Which permission kinds `search_permissions` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionType {
    Delegated,
    Application,
}

impl std::str::FromStr for PermissionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "delegated" => Ok(Self::Delegated),
            "application" => Ok(Self::Application),
            other => Err(Error::validation(format!(
                "Unknown permission_type: {}. Expected 'delegated' or 'application'",
                other
            ))),
        }
    }
}

/// Look up the suggested permissions for a catalogued task.
pub fn suggest_permissions_for_task(task_category: &str, task_name: &str) -> Result<PermissionSuggestion> {
    let cat = category(task_category).ok_or_else(|| {
        Error::validation(format!(
            "Unknown task category: {}. Available categories: {}",
            task_category,
            category_names().join(", ")
        ))
    })?;
    let task = cat.task(task_name).ok_or_else(|| {
        Error::validation(format!(
            "Unknown task name: {}. Available tasks: {}",
            task_name,
            cat.task_names().join(", ")
        ))
    })?;

    Ok(PermissionSuggestion {
        status: "success",
        task_category: task_category.to_string(),
        task_name: task_name.to_string(),
        description: task.description,
        delegated_permissions: task.delegated,
        application_permissions: task.application,
        notes: SUGGESTION_NOTE,
    })
}

/// Every catalogued category with its tasks.
pub fn list_permission_categories_and_tasks() -> BTreeMap<&'static str, CategoryTasks> {
    PERMISSION_CATEGORIES
        .iter()
        .map(|cat| {
            let tasks = cat
                .tasks
                .iter()
                .map(|t| TaskSummary {
                    name: t.name,
                    description: t.description,
                })
                .collect();
            (cat.name, CategoryTasks { tasks })
        })
        .collect()
}

pub struct PermissionService {
    client: Arc<GraphClient>,
}

impl PermissionService {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }

    /// Delegated scopes and application roles published by Microsoft Graph.
    #[instrument(skip(self))]
    pub async fn get_all_graph_permissions(&self) -> Result<GraphPermissions> {
        let odata = ODataQuery::new()
            .filter(format!("appId eq {}", quote(MS_GRAPH_APP_ID)))
            .select(&["id", "appId", "displayName", "appRoles", "oauth2PermissionScopes"]);
        let mut found: Vec<PermissionSource> = self
            .client
            .list("servicePrincipals", &odata, Some(1))
            .await?;
        let source = found
            .pop()
            .ok_or_else(|| Error::not_found("Microsoft Graph service principal not found"))?;

        debug!(
            "Graph publishes {} delegated and {} application permissions",
            source.oauth2_permission_scopes.len(),
            source.app_roles.len()
        );
        Ok(GraphPermissions {
            status: "success",
            delegated_permissions: source.oauth2_permission_scopes,
            application_permissions: source.app_roles,
        })
    }

    /// Case-insensitive substring search over value, display name and description.
    #[instrument(skip(self))]
    pub async fn search_permissions(
        &self,
        search_term: &str,
        permission_type: Option<PermissionType>,
    ) -> Result<PermissionSearch> {
        let needle = search_term.trim().to_lowercase();
        if needle.is_empty() {
            return Err(Error::validation("search_term must not be empty"));
        }

        let all = self.get_all_graph_permissions().await?;
        let want = |kind: PermissionType| permission_type.map_or(true, |t| t == kind);

        let delegated: Vec<_> = if want(PermissionType::Delegated) {
            all.delegated_permissions
                .into_iter()
                .filter(|p| p.matches(&needle))
                .collect()
        } else {
            Vec::new()
        };
        let application: Vec<_> = if want(PermissionType::Application) {
            all.application_permissions
                .into_iter()
                .filter(|p| p.matches(&needle))
                .collect()
        } else {
            Vec::new()
        };

        Ok(PermissionSearch {
            status: "success",
            search_term: needle,
            total_matches: delegated.len() + application.len(),
            matching_delegated_permissions: delegated,
            matching_application_permissions: application,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_known_task() {
        let suggestion = suggest_permissions_for_task("groups", "manage_groups").unwrap();
        assert_eq!(suggestion.delegated_permissions, &["Group.ReadWrite.All"]);
        assert_eq!(suggestion.notes, SUGGESTION_NOTE);

        let out = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(out["status"], "success");
        assert_eq!(out["application_permissions"][0], "Group.ReadWrite.All");
    }

    #[test]
    fn test_suggest_unknown_category_lists_choices() {
        let err = suggest_permissions_for_task("printers", "print").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Unknown task category: printers"));
        assert!(message.contains("users, groups, mail"));
    }

    #[test]
    fn test_suggest_unknown_task_lists_choices() {
        let err = suggest_permissions_for_task("mail", "delete_mail").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("read_user_mail, send_mail"));
    }

    #[test]
    fn test_list_categories() {
        let listing = list_permission_categories_and_tasks();
        assert_eq!(listing.len(), PERMISSION_CATEGORIES.len());
        assert_eq!(listing["audit_logs"].tasks[1].name, "read_sign_in_logs");
    }

    #[test]
    fn test_permission_type_parse() {
        assert_eq!("Delegated".parse::<PermissionType>().unwrap(), PermissionType::Delegated);
        assert_eq!("application".parse::<PermissionType>().unwrap(), PermissionType::Application);
        assert!("both".parse::<PermissionType>().is_err());
    }
}
