//! Sign-in and directory audit records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sign-in event as returned by `auditLogs/signIns`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSignIn {
    pub id: String,
    pub created_date_time: Option<String>,
    pub user_id: Option<String>,
    pub user_display_name: Option<String>,
    pub user_principal_name: Option<String>,
    pub app_display_name: Option<String>,
    pub app_id: Option<String>,
    pub ip_address: Option<String>,
    pub client_app_used: Option<String>,
    pub correlation_id: Option<String>,
    pub is_interactive: Option<bool>,
    pub resource_display_name: Option<String>,
    pub status: Option<SignInStatus>,
    pub risk_detail: Option<String>,
    pub risk_level_aggregated: Option<String>,
    pub risk_level_during_sign_in: Option<String>,
    pub risk_state: Option<String>,
    #[serde(rename = "riskEventTypes_v2", default, deserialize_with = "super::nullable")]
    pub risk_event_types_v2: Vec<String>,
    pub device_detail: Option<DeviceDetail>,
    pub location: Option<GraphLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInStatus {
    pub error_code: Option<i64>,
    pub failure_reason: Option<String>,
    pub additional_details: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetail {
    pub device_id: Option<String>,
    pub display_name: Option<String>,
    pub operating_system: Option<String>,
    pub browser: Option<String>,
    pub is_compliant: Option<bool>,
    pub is_managed: Option<bool>,
    pub trust_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLocation {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country_or_region: Option<String>,
    pub geo_coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskInformation {
    pub risk_detail: Option<String>,
    pub risk_level_aggregated: Option<String>,
    pub risk_level_during_sign_in: Option<String>,
    pub risk_state: Option<String>,
    pub risk_event_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInLocation {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country_or_region: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// Sign-in event reshaped for callers: risk fields grouped, location flattened.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignIn {
    pub id: String,
    pub created_date_time: Option<String>,
    pub user_id: Option<String>,
    pub user_display_name: Option<String>,
    pub user_principal_name: Option<String>,
    pub app_display_name: Option<String>,
    pub app_id: Option<String>,
    pub ip_address: Option<String>,
    pub client_app_used: Option<String>,
    pub correlation_id: Option<String>,
    pub is_interactive: Option<bool>,
    pub resource_display_name: Option<String>,
    pub status: SignInStatus,
    pub risk_information: RiskInformation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_detail: Option<DeviceDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SignInLocation>,
}

impl From<GraphSignIn> for SignIn {
    fn from(raw: GraphSignIn) -> Self {
        Self {
            id: raw.id,
            created_date_time: raw.created_date_time,
            user_id: raw.user_id,
            user_display_name: raw.user_display_name,
            user_principal_name: raw.user_principal_name,
            app_display_name: raw.app_display_name,
            app_id: raw.app_id,
            ip_address: raw.ip_address,
            client_app_used: raw.client_app_used,
            correlation_id: raw.correlation_id,
            is_interactive: raw.is_interactive,
            resource_display_name: raw.resource_display_name,
            status: raw.status.unwrap_or_default(),
            risk_information: RiskInformation {
                risk_detail: raw.risk_detail,
                risk_level_aggregated: raw.risk_level_aggregated,
                risk_level_during_sign_in: raw.risk_level_during_sign_in,
                risk_state: raw.risk_state,
                risk_event_types: raw.risk_event_types_v2,
            },
            device_detail: raw.device_detail,
            location: raw.location.map(|loc| SignInLocation {
                city: loc.city,
                state: loc.state,
                country_or_region: loc.country_or_region,
                coordinates: loc.geo_coordinates,
            }),
        }
    }
}

/// A directory audit event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryAudit {
    pub id: String,
    pub activity_date_time: Option<String>,
    pub activity_display_name: Option<String>,
    pub category: Option<String>,
    pub operation_type: Option<String>,
    pub result: Option<String>,
    pub result_reason: Option<String>,
    pub initiated_by: Option<InitiatedBy>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub target_resources: Vec<TargetResource>,
    pub logged_by_service: Option<String>,
    pub correlation_id: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub additional_details: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitiatedBy {
    pub user: Option<AuditUser>,
    pub app: Option<AuditApp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditUser {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub user_principal_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditApp {
    pub app_id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResource {
    pub id: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub user_principal_name: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub modified_properties: Vec<ModifiedProperty>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedProperty {
    pub display_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: Option<String>,
    pub value: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sign_in_reshape() {
        let raw: GraphSignIn = serde_json::from_value(json!({
            "id": "s1",
            "createdDateTime": "2024-05-01T10:00:00Z",
            "userId": "u1",
            "status": {"errorCode": 50126, "failureReason": "Invalid password"},
            "riskLevelAggregated": "low",
            "riskEventTypes_v2": ["unfamiliarFeatures"],
            "location": {
                "city": "Oslo",
                "countryOrRegion": "NO",
                "geoCoordinates": {"latitude": 59.9, "longitude": 10.7}
            }
        }))
        .unwrap();

        let out = serde_json::to_value(SignIn::from(raw)).unwrap();
        assert_eq!(out["status"]["errorCode"], 50126);
        assert_eq!(out["riskInformation"]["riskEventTypes"][0], "unfamiliarFeatures");
        assert_eq!(out["riskInformation"]["riskLevelAggregated"], "low");
        assert_eq!(out["location"]["coordinates"]["latitude"], 59.9);
        assert!(out.get("deviceDetail").is_none());
    }

    #[test]
    fn test_sign_in_without_status() {
        let raw: GraphSignIn = serde_json::from_value(json!({"id": "s2", "riskEventTypes_v2": null})).unwrap();
        let sign_in = SignIn::from(raw);
        assert_eq!(sign_in.status, SignInStatus::default());
        assert!(sign_in.risk_information.risk_event_types.is_empty());
    }

    #[test]
    fn test_directory_audit_shape() {
        let audit: DirectoryAudit = serde_json::from_value(json!({
            "id": "a1",
            "activityDisplayName": "Update user",
            "initiatedBy": {"user": {"id": "u1", "userPrincipalName": "alice@contoso.com"}, "app": null},
            "targetResources": [{
                "id": "u2",
                "type": "User",
                "modifiedProperties": [{"displayName": "JobTitle", "oldValue": "\"A\"", "newValue": "\"B\""}]
            }],
            "additionalDetails": [{"key": "UserAgent", "value": "Mozilla"}]
        }))
        .unwrap();

        let out = serde_json::to_value(&audit).unwrap();
        assert_eq!(out["initiatedBy"]["user"]["userPrincipalName"], "alice@contoso.com");
        assert_eq!(out["targetResources"][0]["type"], "User");
        assert_eq!(out["targetResources"][0]["modifiedProperties"][0]["newValue"], "\"B\"");
        assert_eq!(out["additionalDetails"][0]["key"], "UserAgent");
    }
}
