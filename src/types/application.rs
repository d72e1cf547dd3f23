//! Application registrations and service principals.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub const APPLICATION_FIELDS: &[&str] = &[
    "id",
    "appId",
    "displayName",
    "createdDateTime",
    "signInAudience",
    "publisherDomain",
    "tags",
];

pub const SERVICE_PRINCIPAL_FIELDS: &[&str] = &[
    "id",
    "appId",
    "displayName",
    "createdDateTime",
    "accountEnabled",
    "appOwnerOrganizationId",
    "tags",
];

/// An application registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub app_id: Option<String>,
    pub display_name: Option<String>,
    pub created_date_time: Option<String>,
    pub sign_in_audience: Option<String>,
    pub publisher_domain: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub tags: Vec<String>,
}

/// A service principal (enterprise application).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrincipal {
    pub id: String,
    pub app_id: Option<String>,
    pub display_name: Option<String>,
    pub created_date_time: Option<String>,
    pub account_enabled: Option<bool>,
    pub app_owner_organization_id: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRoleAssignment {
    pub id: String,
    pub created_date_time: Option<String>,
    pub app_role_id: Option<String>,
    pub principal_display_name: Option<String>,
    pub principal_id: Option<String>,
    pub principal_type: Option<String>,
    pub resource_display_name: Option<String>,
    pub resource_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2PermissionGrant {
    pub id: String,
    pub client_id: Option<String>,
    pub consent_type: Option<String>,
    pub principal_id: Option<String>,
    pub resource_id: Option<String>,
    pub scope: Option<String>,
}

/// Role assignments and delegated grants held by a service principal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grants {
    pub app_role_assignments: Vec<AppRoleAssignment>,
    #[serde(rename = "oauth2PermissionGrants")]
    pub oauth2_permission_grants: Vec<OAuth2PermissionGrant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationDetails {
    #[serde(flatten)]
    pub application: Application,
    #[serde(flatten)]
    pub grants: Grants,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServicePrincipalDetails {
    #[serde(flatten)]
    pub service_principal: ServicePrincipal,
    #[serde(flatten)]
    pub grants: Grants,
}

/// Writable application properties. Unknown keys in the caller's object are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign_in_audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_uris: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_resource_access: Option<Value>,
}

impl ApplicationChanges {
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::validation("app_data must be an object"));
        }
        serde_json::from_value(value)
            .map_err(|e| Error::validation(format!("Invalid app_data: {}", e)))
    }

    pub fn validate_new(&self) -> Result<()> {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(()),
            _ => Err(Error::validation(
                "displayName is required for creating an application",
            )),
        }
    }
}

/// Writable service principal properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrincipalChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_role_assignment_required: Option<bool>,
}

impl ServicePrincipalChanges {
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::validation("sp_data must be an object"));
        }
        serde_json::from_value(value)
            .map_err(|e| Error::validation(format!("Invalid sp_data: {}", e)))
    }

    pub fn validate_new(&self) -> Result<()> {
        match self.app_id.as_deref().map(str::trim) {
            Some(app_id) if !app_id.is_empty() => Ok(()),
            _ => Err(Error::validation(
                "appId is required for creating a service principal",
            )),
        }
    }

    /// `appId` is immutable once the service principal exists.
    pub fn without_app_id(mut self) -> Self {
        self.app_id = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_application_changes_ignore_unknown_keys() {
        let changes = ApplicationChanges::from_value(json!({
            "displayName": "Portal",
            "signInAudience": "AzureADMyOrg",
            "passwordCredentials": []
        }))
        .unwrap();

        assert!(changes.validate_new().is_ok());
        let body = serde_json::to_value(&changes).unwrap();
        assert_eq!(body, json!({"displayName": "Portal", "signInAudience": "AzureADMyOrg"}));
    }

    #[test]
    fn test_application_requires_display_name() {
        let changes = ApplicationChanges::from_value(json!({"tags": ["x"]})).unwrap();
        let err = changes.validate_new().unwrap_err();
        assert!(err.to_string().contains("displayName"));

        assert!(ApplicationChanges::from_value(json!("Portal")).is_err());
    }

    #[test]
    fn test_service_principal_changes() {
        let changes = ServicePrincipalChanges::from_value(json!({
            "appId": "11111111-2222-3333-4444-555555555555",
            "accountEnabled": false
        }))
        .unwrap();
        assert!(changes.validate_new().is_ok());

        let body = serde_json::to_value(changes.without_app_id()).unwrap();
        assert_eq!(body, json!({"accountEnabled": false}));

        let missing = ServicePrincipalChanges::from_value(json!({})).unwrap();
        assert!(missing.validate_new().is_err());
    }

    #[test]
    fn test_details_flatten_grants() {
        let details = ServicePrincipalDetails {
            service_principal: ServicePrincipal {
                id: "sp1".into(),
                tags: vec![],
                ..ServicePrincipal::default()
            },
            grants: Grants::default(),
        };
        let out = serde_json::to_value(&details).unwrap();
        assert_eq!(out["id"], "sp1");
        assert_eq!(out["appRoleAssignments"], json!([]));
        assert_eq!(out["oauth2PermissionGrants"], json!([]));
    }

    #[test]
    fn test_null_tags_deserialize_empty() {
        let app: Application = serde_json::from_value(json!({"id": "a1", "tags": null})).unwrap();
        assert!(app.tags.is_empty());
    }
}
