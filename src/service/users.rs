//! User lookups and directory role membership.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::graph::{segment, GraphClient, ODataQuery};
use crate::types::{
    DirectoryObject, DirectoryRole, Group, PrivilegedUser, User, DIRECTORY_ROLE_TYPE, GROUP_TYPE,
    USER_FIELDS, USER_TYPE,
};

/// Properties matched by `search_users`.
const SEARCH_PROPERTIES: &[&str] = &[
    "displayName",
    "mail",
    "userPrincipalName",
    "givenName",
    "surname",
    "otherMails",
];

/// Build the `$search` expression for a free-text user query.
fn search_expression(query: &str) -> String {
    let term = query.replace('\\', "\\\\").replace('"', "\\\"");
    SEARCH_PROPERTIES
        .iter()
        .map(|prop| format!("\"{}:{}\"", prop, term))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// User directory operations.
pub struct UserService {
    client: Arc<GraphClient>,
}

impl UserService {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }

    /// Search users by name, mail or UPN.
    #[instrument(skip(self))]
    pub async fn search_users(&self, query: &str, limit: usize) -> Result<Vec<User>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::validation("query must not be empty"));
        }

        let odata = ODataQuery::new()
            .search(search_expression(query))
            .select(USER_FIELDS)
            .count()
            .eventual_consistency();
        let users: Vec<User> = self.client.list("users", &odata, Some(limit)).await?;
        debug!("User search returned {} result(s)", users.len());
        Ok(users)
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_id(&self, user_id: &str) -> Result<User> {
        let odata = ODataQuery::new().select(USER_FIELDS);
        self.client
            .get(&format!("users/{}", segment(user_id)), &odata)
            .await
    }

    /// Users holding any activated directory role, each listed once with all role names.
    #[instrument(skip(self))]
    pub async fn get_privileged_users(&self) -> Result<Vec<PrivilegedUser>> {
        let roles: Vec<DirectoryRole> = self
            .client
            .list(
                "directoryRoles",
                &ODataQuery::new().select(&["id", "displayName", "roleTemplateId"]),
                None,
            )
            .await?;

        let mut users: Vec<PrivilegedUser> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for role in roles {
            let role_name = role.display_name.clone().unwrap_or_else(|| role.id.clone());
            let members: Vec<DirectoryObject> = self
                .client
                .list(
                    &format!("directoryRoles/{}/members", segment(&role.id)),
                    &ODataQuery::new(),
                    None,
                )
                .await?;

            for member in members.into_iter().filter(|m| m.is_type(USER_TYPE)) {
                match index.get(&member.id) {
                    Some(&i) => users[i].roles.push(role_name.clone()),
                    None => {
                        index.insert(member.id.clone(), users.len());
                        users.push(PrivilegedUser {
                            user: member.into_user(),
                            roles: vec![role_name.clone()],
                        });
                    }
                }
            }
        }

        info!("Found {} privileged user(s)", users.len());
        Ok(users)
    }

    /// Directory roles the user is a direct member of.
    #[instrument(skip(self))]
    pub async fn get_user_roles(&self, user_id: &str) -> Result<Vec<DirectoryRole>> {
        let objects: Vec<DirectoryObject> = self
            .client
            .list(
                &format!("users/{}/memberOf", segment(user_id)),
                &ODataQuery::new(),
                None,
            )
            .await?;

        Ok(objects
            .into_iter()
            .filter(|o| o.is_type(DIRECTORY_ROLE_TYPE))
            .map(DirectoryObject::into_role)
            .collect())
    }

    /// Groups the user belongs to, directly or through nesting.
    #[instrument(skip(self))]
    pub async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>> {
        let objects: Vec<DirectoryObject> = self
            .client
            .list(
                &format!("users/{}/transitiveMemberOf", segment(user_id)),
                &ODataQuery::new(),
                None,
            )
            .await?;

        Ok(objects
            .into_iter()
            .filter(|o| o.is_type(GROUP_TYPE))
            .map(DirectoryObject::into_group)
            .collect())
    }
}
