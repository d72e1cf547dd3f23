//! User and directory role models.

use serde::{Deserialize, Serialize};

use super::group::Group;

/// Fields requested for user lookups.
pub const USER_FIELDS: &[&str] = &[
    "id",
    "displayName",
    "mail",
    "userPrincipalName",
    "givenName",
    "surname",
    "jobTitle",
    "officeLocation",
    "businessPhones",
    "mobilePhone",
];

/// A directory user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub user_principal_name: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub job_title: Option<String>,
    pub office_location: Option<String>,
    #[serde(default)]
    pub business_phones: Vec<String>,
    pub mobile_phone: Option<String>,
}

/// A user holding one or more activated directory roles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegedUser {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<String>,
}

/// An activated directory role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryRole {
    pub id: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub role_template_id: Option<String>,
}

/// Any directory object returned from a membership collection.
///
/// Carries the union of user and group fields so a single page can be
/// deserialized before filtering by `@odata.type`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryObject {
    pub id: String,
    #[serde(rename = "@odata.type")]
    pub odata_type: Option<String>,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub user_principal_name: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub job_title: Option<String>,
    pub office_location: Option<String>,
    #[serde(default)]
    pub business_phones: Vec<String>,
    pub mobile_phone: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub group_types: Vec<String>,
    pub role_template_id: Option<String>,
}

pub const USER_TYPE: &str = "#microsoft.graph.user";
pub const GROUP_TYPE: &str = "#microsoft.graph.group";
pub const DIRECTORY_ROLE_TYPE: &str = "#microsoft.graph.directoryRole";

impl DirectoryObject {
    pub fn is_type(&self, odata_type: &str) -> bool {
        self.odata_type.as_deref() == Some(odata_type)
    }

    pub fn into_user(self) -> User {
        User {
            id: self.id,
            display_name: self.display_name,
            mail: self.mail,
            user_principal_name: self.user_principal_name,
            given_name: self.given_name,
            surname: self.surname,
            job_title: self.job_title,
            office_location: self.office_location,
            business_phones: self.business_phones,
            mobile_phone: self.mobile_phone,
        }
    }

    pub fn into_group(self) -> Group {
        Group {
            id: self.id,
            display_name: self.display_name,
            mail: self.mail,
            description: self.description,
            group_types: self.group_types,
            ..Group::default()
        }
    }

    pub fn into_role(self) -> DirectoryRole {
        DirectoryRole {
            id: self.id,
            display_name: self.display_name,
            description: self.description,
            role_template_id: self.role_template_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_round_trips_camel_case() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "displayName": "Alice",
            "userPrincipalName": "alice@contoso.com",
            "businessPhones": ["+1 555"]
        }))
        .unwrap();

        assert_eq!(user.display_name.as_deref(), Some("Alice"));
        let out = serde_json::to_value(&user).unwrap();
        assert_eq!(out["userPrincipalName"], "alice@contoso.com");
        assert_eq!(out["mail"], serde_json::Value::Null);
    }

    #[test]
    fn test_privileged_user_flattens() {
        let user = PrivilegedUser {
            user: User {
                id: "u1".into(),
                display_name: Some("Alice".into()),
                ..User::default()
            },
            roles: vec!["Global Administrator".into()],
        };
        let out = serde_json::to_value(&user).unwrap();
        assert_eq!(out["id"], "u1");
        assert_eq!(out["roles"][0], "Global Administrator");
    }

    #[test]
    fn test_directory_object_type_filter() {
        let obj: DirectoryObject = serde_json::from_value(json!({
            "@odata.type": "#microsoft.graph.directoryRole",
            "id": "r1",
            "displayName": "User Administrator",
            "roleTemplateId": "fe930be7"
        }))
        .unwrap();

        assert!(obj.is_type(DIRECTORY_ROLE_TYPE));
        assert!(!obj.is_type(USER_TYPE));
        let role = obj.into_role();
        assert_eq!(role.role_template_id.as_deref(), Some("fe930be7"));
    }
}
