//! Group models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::user::DirectoryObject;
use crate::error::{Error, Result};

/// Fields requested for group lookups.
pub const GROUP_FIELDS: &[&str] = &[
    "id",
    "displayName",
    "mail",
    "mailNickname",
    "description",
    "groupTypes",
    "securityEnabled",
    "mailEnabled",
    "visibility",
    "createdDateTime",
    "membershipRule",
    "membershipRuleProcessingState",
];

pub const DYNAMIC_MEMBERSHIP: &str = "DynamicMembership";

/// A directory group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub mail_nickname: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub group_types: Vec<String>,
    pub security_enabled: Option<bool>,
    pub mail_enabled: Option<bool>,
    pub visibility: Option<String>,
    pub created_date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_rule_processing_state: Option<String>,
}

impl Group {
    /// Membership of a dynamic group is computed from its rule and cannot be edited.
    pub fn is_dynamic(&self) -> bool {
        self.group_types.iter().any(|t| t == DYNAMIC_MEMBERSHIP)
    }
}

/// Result of `create_group`, marking whether the group already existed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedGroup {
    #[serde(flatten)]
    pub group: Group,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}

/// A member of a group, with its directory object type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub id: String,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub user_principal_name: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub job_title: Option<String>,
    pub office_location: Option<String>,
    pub business_phones: Vec<String>,
    pub mobile_phone: Option<String>,
    #[serde(rename = "type")]
    pub member_type: Option<String>,
}

/// Validated body for group creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub display_name: String,
    pub mail_nickname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_types: Vec<String>,
    pub mail_enabled: bool,
    pub security_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_rule_processing_state: Option<String>,
    #[serde(skip)]
    pub owners: Vec<String>,
    #[serde(skip)]
    pub members: Vec<String>,
}

const UNIFIED: &str = "Unified";

fn required_string(data: &serde_json::Map<String, Value>, key: &str) -> Result<String> {
    match data.get(key).and_then(Value::as_str).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(Error::validation(format!(
            "{} is required for creating a group",
            key
        ))),
    }
}

fn optional_string(data: &serde_json::Map<String, Value>, key: &str) -> Result<Option<String>> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::validation(format!("{} must be a string", key))),
    }
}

fn optional_bool(data: &serde_json::Map<String, Value>, key: &str) -> Result<Option<bool>> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(Error::validation(format!("{} must be a boolean", key))),
    }
}

fn id_list(data: &serde_json::Map<String, Value>, key: &str) -> Result<Vec<String>> {
    let invalid = || Error::validation(format!("{} must be a list of user IDs", key));
    match data.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

impl NewGroup {
    /// Validate a caller-supplied group definition. No field is sent to
    /// Graph before every check here has passed.
    pub fn from_value(value: &Value) -> Result<Self> {
        let data = value
            .as_object()
            .ok_or_else(|| Error::validation("group_data must be an object"))?;

        let display_name = required_string(data, "displayName")?;
        let mail_nickname = required_string(data, "mailNickname")?;

        let group_types = match data.get("groupTypes") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| Error::validation("groupTypes must be a list of strings"))
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => return Err(Error::validation("groupTypes must be a list of strings")),
        };

        let mut group = Self {
            display_name,
            mail_nickname,
            description: optional_string(data, "description")?,
            mail_enabled: false,
            security_enabled: true,
            visibility: optional_string(data, "visibility")?,
            membership_rule: optional_string(data, "membershipRule")?,
            membership_rule_processing_state: optional_string(
                data,
                "membershipRuleProcessingState",
            )?,
            owners: id_list(data, "owners")?,
            members: id_list(data, "members")?,
            group_types,
        };

        let unified = group.group_types.iter().any(|t| t == UNIFIED);
        group.mail_enabled = optional_bool(data, "mailEnabled")?.unwrap_or(unified);
        group.security_enabled = optional_bool(data, "securityEnabled")?.unwrap_or(!unified);

        if group.is_dynamic() {
            if group.membership_rule.as_deref().map_or(true, |r| r.trim().is_empty()) {
                return Err(Error::validation(
                    "membershipRule is required for dynamic membership groups",
                ));
            }
            group
                .membership_rule_processing_state
                .get_or_insert_with(|| "On".to_string());
        }

        Ok(group)
    }

    pub fn is_dynamic(&self) -> bool {
        self.group_types.iter().any(|t| t == DYNAMIC_MEMBERSHIP)
    }
}

impl From<DirectoryObject> for GroupMember {
    fn from(obj: DirectoryObject) -> Self {
        Self {
            id: obj.id,
            display_name: obj.display_name,
            mail: obj.mail,
            user_principal_name: obj.user_principal_name,
            given_name: obj.given_name,
            surname: obj.surname,
            job_title: obj.job_title,
            office_location: obj.office_location,
            business_phones: obj.business_phones,
            mobile_phone: obj.mobile_phone,
            member_type: obj.odata_type,
        }
    }
}

/// Outcome of a membership or ownership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipOutcome {
    Added,
    AlreadyPresent,
    Removed,
    NotPresent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipChange {
    pub status: MembershipOutcome,
    pub group_id: String,
    pub directory_object_id: String,
}

/// Patch body for group updates; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_rule: Option<String>,
}

impl GroupUpdate {
    pub fn from_value(value: &Value) -> Result<Self> {
        let data = value
            .as_object()
            .ok_or_else(|| Error::validation("group_data must be an object"))?;
        Ok(Self {
            display_name: optional_string(data, "displayName")?,
            mail_nickname: optional_string(data, "mailNickname")?,
            description: optional_string(data, "description")?,
            visibility: optional_string(data, "visibility")?,
            membership_rule: optional_string(data, "membershipRule")?,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_is_dynamic() {
        let group: Group = serde_json::from_value(json!({
            "id": "g1",
            "groupTypes": ["DynamicMembership", "Unified"],
            "membershipRule": "user.department -eq \"Sales\""
        }))
        .unwrap();
        assert!(group.is_dynamic());

        let group: Group = serde_json::from_value(json!({"id": "g2"})).unwrap();
        assert!(!group.is_dynamic());
    }

    #[test]
    fn test_new_group_body_skips_local_fields() {
        let group = NewGroup {
            display_name: "Eng".into(),
            mail_nickname: "eng".into(),
            description: None,
            group_types: vec![],
            mail_enabled: false,
            security_enabled: true,
            visibility: None,
            membership_rule: None,
            membership_rule_processing_state: None,
            owners: vec!["o1".into()],
            members: vec!["m1".into()],
        };

        let body = serde_json::to_value(&group).unwrap();
        assert_eq!(body["displayName"], "Eng");
        assert_eq!(body["securityEnabled"], true);
        assert!(body.get("owners").is_none());
        assert!(body.get("groupTypes").is_none());
    }

    #[test]
    fn test_created_group_status() {
        let created = CreatedGroup {
            group: Group {
                id: "g1".into(),
                ..Group::default()
            },
            status: Some("already_exists"),
        };
        let out = serde_json::to_value(&created).unwrap();
        assert_eq!(out["status"], "already_exists");
        assert_eq!(out["id"], "g1");
    }

    #[test]
    fn test_new_group_validation_messages() {
        let err = NewGroup::from_value(&json!({"mailNickname": "eng"})).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: displayName is required for creating a group");

        let err = NewGroup::from_value(&json!({"displayName": "Eng"})).unwrap_err();
        assert!(err.to_string().contains("mailNickname is required"));

        let err = NewGroup::from_value(&json!({
            "displayName": "Sales",
            "mailNickname": "sales",
            "groupTypes": ["DynamicMembership"]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("membershipRule is required"));

        let err = NewGroup::from_value(&json!({
            "displayName": "Eng",
            "mailNickname": "eng",
            "owners": "o1"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("owners must be a list of user IDs"));

        let err = NewGroup::from_value(&json!({
            "displayName": "Eng",
            "mailNickname": "eng",
            "members": [1, 2]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("members must be a list of user IDs"));
    }

    #[test]
    fn test_new_group_defaults() {
        let group = NewGroup::from_value(&json!({
            "displayName": "Sales",
            "mailNickname": "sales",
            "groupTypes": ["Unified", "DynamicMembership"],
            "membershipRule": "user.department -eq \"Sales\""
        }))
        .unwrap();

        assert!(group.mail_enabled);
        assert!(!group.security_enabled);
        assert_eq!(group.membership_rule_processing_state.as_deref(), Some("On"));

        let group = NewGroup::from_value(&json!({
            "displayName": "Eng",
            "mailNickname": "eng",
            "securityEnabled": false,
            "owners": ["o1"]
        }))
        .unwrap();
        assert!(!group.mail_enabled);
        assert!(!group.security_enabled);
        assert_eq!(group.owners, vec!["o1".to_string()]);
        assert_eq!(group.membership_rule_processing_state, None);
    }

    #[test]
    fn test_member_from_directory_object() {
        let obj: DirectoryObject = serde_json::from_value(json!({
            "@odata.type": "#microsoft.graph.user",
            "id": "u1",
            "displayName": "Alice"
        }))
        .unwrap();
        let out = serde_json::to_value(GroupMember::from(obj)).unwrap();
        assert_eq!(out["type"], "#microsoft.graph.user");
        assert_eq!(out["displayName"], "Alice");
    }

    #[test]
    fn test_group_update_empty() {
        assert!(GroupUpdate::default().is_empty());
        let update = GroupUpdate {
            description: Some("new".into()),
            ..GroupUpdate::default()
        };
        assert!(!update.is_empty());
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"description": "new"}));
    }
}
