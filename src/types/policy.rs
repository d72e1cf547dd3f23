//! Conditional access policies and their flattened summary.
//!
//! Graph returns policies as deeply nested objects. Callers get a single
//! level of string fields instead: lists joined with `"; "`, nested objects
//! rendered as compact JSON, and group IDs resolved to `Name (id)` labels.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

use super::nullable;

/// Assignment values that are keywords rather than group IDs.
pub const SPECIAL_ASSIGNMENTS: &[&str] = &[
    "All",
    "None",
    "GuestsOrExternalUsers",
    "GuestOrExternalUserTypes",
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalAccessPolicy {
    pub id: String,
    pub display_name: Option<String>,
    pub state: Option<String>,
    pub created_date_time: Option<String>,
    pub modified_date_time: Option<String>,
    pub conditions: Option<PolicyConditions>,
    pub grant_controls: Option<GrantControls>,
    pub session_controls: Option<SessionControls>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConditions {
    pub users: Option<UserConditions>,
    pub applications: Option<ApplicationConditions>,
    #[serde(default, deserialize_with = "nullable")]
    pub user_risk_levels: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub sign_in_risk_levels: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub service_principal_risk_levels: Vec<String>,
    pub insider_risk_levels: Option<Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub client_app_types: Vec<String>,
    pub platforms: Option<Value>,
    pub locations: Option<Value>,
    pub devices: Option<Value>,
    pub client_applications: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConditions {
    #[serde(default, deserialize_with = "nullable")]
    pub include_users: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub exclude_users: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub include_groups: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub exclude_groups: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub include_roles: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub exclude_roles: Vec<String>,
    pub include_guests_or_external_users: Option<Value>,
    pub exclude_guests_or_external_users: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationConditions {
    #[serde(default, deserialize_with = "nullable")]
    pub include_applications: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub exclude_applications: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub include_user_actions: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub include_authentication_context_class_references: Vec<String>,
    pub application_filter: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantControls {
    pub operator: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub built_in_controls: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub custom_authentication_factors: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub terms_of_use: Vec<String>,
    pub authentication_strength: Option<AuthenticationStrength>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationStrength {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub policy_type: Option<String>,
    pub requirements_satisfied: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub allowed_combinations: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionControls {
    pub disable_resilience_defaults: Option<Value>,
    pub application_enforced_restrictions: Option<Value>,
    pub cloud_app_security: Option<Value>,
    pub persistent_browser: Option<Value>,
    pub sign_in_frequency: Option<SignInFrequency>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInFrequency {
    pub value: Option<Value>,
    #[serde(rename = "type")]
    pub frequency_type: Option<String>,
    pub authentication_type: Option<String>,
    pub frequency_interval: Option<String>,
    #[serde(default)]
    pub is_enabled: bool,
}

impl ConditionalAccessPolicy {
    /// Distinct group IDs referenced by the policy, excluding keywords.
    pub fn group_ids(&self) -> BTreeSet<String> {
        self.conditions
            .as_ref()
            .and_then(|c| c.users.as_ref())
            .map(|users| {
                users
                    .include_groups
                    .iter()
                    .chain(users.exclude_groups.iter())
                    .filter(|id| !id.is_empty() && !is_special(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Flatten the policy. `group_names` maps group IDs to display names;
    /// IDs missing from it are labelled as unknown.
    pub fn summarize(&self, group_names: &HashMap<String, String>) -> PolicySummary {
        PolicySummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            state: self.state.clone(),
            created_date_time: self.created_date_time.clone(),
            modified_date_time: self.modified_date_time.clone(),
            conditions: self
                .conditions
                .as_ref()
                .map(|c| ConditionsSummary::new(c, group_names))
                .unwrap_or_default(),
            grant: self
                .grant_controls
                .as_ref()
                .map(GrantSummary::new)
                .unwrap_or_default(),
            session: self
                .session_controls
                .as_ref()
                .map(SessionSummary::new)
                .unwrap_or_default(),
        }
    }
}

fn is_special(id: &str) -> bool {
    SPECIAL_ASSIGNMENTS.contains(&id)
}

fn join(items: &[String]) -> String {
    items.join("; ")
}

fn describe(value: &Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn group_label(id: &str, group_names: &HashMap<String, String>) -> String {
    if is_special(id) {
        return id.to_string();
    }
    match group_names.get(id) {
        Some(name) => format!("{} ({})", name, id),
        None => format!("Unknown Group ({})", id),
    }
}

fn group_labels(ids: &[String], group_names: &HashMap<String, String>) -> String {
    let labels: Vec<String> = ids
        .iter()
        .filter(|id| !id.is_empty())
        .map(|id| group_label(id, group_names))
        .collect();
    join(&labels)
}

/// Single-level view of a conditional access policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySummary {
    pub id: String,
    pub display_name: Option<String>,
    pub state: Option<String>,
    pub created_date_time: Option<String>,
    pub modified_date_time: Option<String>,
    #[serde(flatten)]
    pub conditions: ConditionsSummary,
    #[serde(flatten)]
    pub grant: GrantSummary,
    #[serde(flatten)]
    pub session: SessionSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionsSummary {
    pub users_include: String,
    pub users_exclude: String,
    pub groups_include: String,
    pub groups_include_names: String,
    pub groups_exclude: String,
    pub groups_exclude_names: String,
    pub roles_include: String,
    pub roles_exclude: String,
    pub include_guests_or_external_users: String,
    pub exclude_guests_or_external_users: String,
    pub apps_include: String,
    pub apps_exclude: String,
    pub user_actions: String,
    pub authentication_context_references: String,
    pub application_filter: String,
    pub user_risk_levels: String,
    pub sign_in_risk_levels: String,
    pub service_principal_risk_levels: String,
    pub insider_risk_levels: String,
    pub client_app_types: String,
    pub platforms: String,
    pub locations: String,
    pub devices: String,
    pub client_applications: String,
}

impl ConditionsSummary {
    fn new(conditions: &PolicyConditions, group_names: &HashMap<String, String>) -> Self {
        let users = conditions.users.clone().unwrap_or_default();
        let apps = conditions.applications.clone().unwrap_or_default();

        Self {
            users_include: join(&users.include_users),
            users_exclude: join(&users.exclude_users),
            groups_include: join(&users.include_groups),
            groups_include_names: group_labels(&users.include_groups, group_names),
            groups_exclude: join(&users.exclude_groups),
            groups_exclude_names: group_labels(&users.exclude_groups, group_names),
            roles_include: join(&users.include_roles),
            roles_exclude: join(&users.exclude_roles),
            include_guests_or_external_users: describe(&users.include_guests_or_external_users),
            exclude_guests_or_external_users: describe(&users.exclude_guests_or_external_users),
            apps_include: join(&apps.include_applications),
            apps_exclude: join(&apps.exclude_applications),
            user_actions: join(&apps.include_user_actions),
            authentication_context_references: join(
                &apps.include_authentication_context_class_references,
            ),
            application_filter: describe(&apps.application_filter),
            user_risk_levels: join(&conditions.user_risk_levels),
            sign_in_risk_levels: join(&conditions.sign_in_risk_levels),
            service_principal_risk_levels: join(&conditions.service_principal_risk_levels),
            insider_risk_levels: describe(&conditions.insider_risk_levels),
            client_app_types: join(&conditions.client_app_types),
            platforms: describe(&conditions.platforms),
            locations: describe(&conditions.locations),
            devices: describe(&conditions.devices),
            client_applications: describe(&conditions.client_applications),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantSummary {
    pub grant_operator: String,
    pub grant_built_in_controls: String,
    pub grant_custom_authentication_factors: String,
    pub grant_terms_of_use: String,
    pub grant_auth_strength_id: String,
    pub grant_auth_strength_display_name: String,
    pub grant_auth_strength_description: String,
    pub grant_auth_strength_policy_type: String,
    pub grant_auth_strength_requirements: String,
    pub grant_auth_strength_combinations: String,
}

impl GrantSummary {
    fn new(grant: &GrantControls) -> Self {
        let strength = grant.authentication_strength.clone().unwrap_or_default();
        Self {
            grant_operator: grant.operator.clone().unwrap_or_default(),
            grant_built_in_controls: join(&grant.built_in_controls),
            grant_custom_authentication_factors: join(&grant.custom_authentication_factors),
            grant_terms_of_use: join(&grant.terms_of_use),
            grant_auth_strength_id: strength.id.unwrap_or_default(),
            grant_auth_strength_display_name: strength.display_name.unwrap_or_default(),
            grant_auth_strength_description: strength.description.unwrap_or_default(),
            grant_auth_strength_policy_type: strength.policy_type.unwrap_or_default(),
            grant_auth_strength_requirements: strength.requirements_satisfied.unwrap_or_default(),
            grant_auth_strength_combinations: join(&strength.allowed_combinations),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub disable_resilience_defaults: String,
    pub application_enforced_restrictions: String,
    pub cloud_app_security: String,
    pub persistent_browser: String,
    pub sign_in_frequency_value: String,
    pub sign_in_frequency_type: String,
    pub sign_in_frequency_auth_type: String,
    pub sign_in_frequency_interval: String,
    pub sign_in_frequency_is_enabled: String,
}

impl SessionSummary {
    fn new(session: &SessionControls) -> Self {
        let mut summary = Self {
            disable_resilience_defaults: describe(&session.disable_resilience_defaults),
            application_enforced_restrictions: describe(&session.application_enforced_restrictions),
            cloud_app_security: describe(&session.cloud_app_security),
            persistent_browser: describe(&session.persistent_browser),
            ..Self::default()
        };
        if let Some(freq) = &session.sign_in_frequency {
            summary.sign_in_frequency_value = describe(&freq.value);
            summary.sign_in_frequency_type = freq.frequency_type.clone().unwrap_or_default();
            summary.sign_in_frequency_auth_type =
                freq.authentication_type.clone().unwrap_or_default();
            summary.sign_in_frequency_interval =
                freq.frequency_interval.clone().unwrap_or_default();
            summary.sign_in_frequency_is_enabled =
                if freq.is_enabled { "Yes" } else { "No" }.to_string();
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_policy() -> ConditionalAccessPolicy {
        serde_json::from_value(json!({
            "id": "p1",
            "displayName": "Require MFA for admins",
            "state": "enabled",
            "conditions": {
                "users": {
                    "includeUsers": ["All"],
                    "excludeUsers": [],
                    "includeGroups": ["g1", "All"],
                    "excludeGroups": ["g2"],
                    "includeRoles": null,
                    "includeGuestsOrExternalUsers": null
                },
                "applications": {"includeApplications": ["All"]},
                "clientAppTypes": ["browser", "mobileAppsAndDesktopClients"],
                "signInRiskLevels": [],
                "platforms": null,
                "locations": {"includeLocations": ["All"]}
            },
            "grantControls": {
                "operator": "OR",
                "builtInControls": ["mfa"],
                "authenticationStrength": null
            },
            "sessionControls": {
                "signInFrequency": {"value": 4, "type": "hours", "isEnabled": true}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_group_ids_skip_keywords() {
        let ids: Vec<String> = sample_policy().group_ids().into_iter().collect();
        assert_eq!(ids, vec!["g1".to_string(), "g2".to_string()]);
    }

    #[test]
    fn test_summarize_flattens() {
        let mut names = HashMap::new();
        names.insert("g1".to_string(), "Admins".to_string());

        let summary = sample_policy().summarize(&names);
        assert_eq!(summary.conditions.groups_include_names, "Admins (g1); All");
        assert_eq!(summary.conditions.groups_exclude_names, "Unknown Group (g2)");
        assert_eq!(summary.conditions.client_app_types, "browser; mobileAppsAndDesktopClients");
        assert_eq!(summary.conditions.platforms, "");
        assert_eq!(summary.conditions.locations, r#"{"includeLocations":["All"]}"#);
        assert_eq!(summary.grant.grant_built_in_controls, "mfa");
        assert_eq!(summary.session.sign_in_frequency_value, "4");
        assert_eq!(summary.session.sign_in_frequency_is_enabled, "Yes");

        let out = serde_json::to_value(&summary).unwrap();
        assert_eq!(out["displayName"], "Require MFA for admins");
        assert_eq!(out["grantOperator"], "OR");
        assert_eq!(out["usersInclude"], "All");
    }

    #[test]
    fn test_summarize_empty_policy() {
        let policy: ConditionalAccessPolicy = serde_json::from_value(json!({"id": "p2"})).unwrap();
        let summary = policy.summarize(&HashMap::new());
        assert_eq!(summary.grant, GrantSummary::default());
        assert_eq!(summary.session.sign_in_frequency_is_enabled, "");
        assert!(policy.group_ids().is_empty());
    }
}
