//! Group lookup, lifecycle, membership and ownership.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::graph::{quote, segment, GraphClient, ODataQuery};
use crate::types::{
    CreatedGroup, DirectoryObject, Group, GroupMember, GroupUpdate, MembershipChange,
    MembershipOutcome, NewGroup, GROUP_FIELDS, USER_FIELDS,
};

const ALREADY_EXISTS: &str = "already_exists";

/// Group directory operations.
pub struct GroupService {
    client: Arc<GraphClient>,
}

impl GroupService {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }

    fn group_path(group_id: &str) -> String {
        format!("groups/{}", segment(group_id))
    }

    #[instrument(skip(self))]
    pub async fn get_all_groups(&self, limit: usize) -> Result<Vec<Group>> {
        let odata = ODataQuery::new().select(GROUP_FIELDS);
        self.client.list("groups", &odata, Some(limit)).await
    }

    #[instrument(skip(self))]
    pub async fn get_group_by_id(&self, group_id: &str) -> Result<Group> {
        let odata = ODataQuery::new().select(GROUP_FIELDS);
        self.client.get(&Self::group_path(group_id), &odata).await
    }

    /// Groups whose display name starts with `name`.
    #[instrument(skip(self))]
    pub async fn search_groups_by_name(&self, name: &str, limit: usize) -> Result<Vec<Group>> {
        if name.trim().is_empty() {
            return Err(Error::validation("name must not be empty"));
        }
        let odata = ODataQuery::new()
            .filter(format!("startswith(displayName,{})", quote(name)))
            .select(GROUP_FIELDS);
        self.client.list("groups", &odata, Some(limit)).await
    }

    #[instrument(skip(self))]
    pub async fn get_group_members(&self, group_id: &str, limit: usize) -> Result<Vec<GroupMember>> {
        let mut fields = USER_FIELDS.to_vec();
        fields.push("description");
        let odata = ODataQuery::new().select(&fields);
        let members: Vec<DirectoryObject> = self
            .client
            .list(
                &format!("{}/members", Self::group_path(group_id)),
                &odata,
                Some(limit),
            )
            .await?;
        Ok(members.into_iter().map(GroupMember::from).collect())
    }

    async fn find_by_display_name(&self, display_name: &str) -> Result<Option<Group>> {
        let odata = ODataQuery::new()
            .filter(format!("displayName eq {}", quote(display_name)))
            .select(GROUP_FIELDS);
        let mut found: Vec<Group> = self.client.list("groups", &odata, Some(1)).await?;
        Ok(found.pop())
    }

    /// Create a group, or return the existing one with the same display name.
    ///
    /// Owners and members are added after creation. A failed addition is
    /// logged and does not undo the creation.
    #[instrument(skip(self, group_data))]
    pub async fn create_group(&self, group_data: &Value) -> Result<CreatedGroup> {
        let new_group = NewGroup::from_value(group_data)?;

        if let Some(existing) = self.find_by_display_name(&new_group.display_name).await? {
            info!(
                "Group '{}' already exists ({})",
                new_group.display_name, existing.id
            );
            return Ok(CreatedGroup {
                group: existing,
                status: Some(ALREADY_EXISTS),
            });
        }

        let group: Group = self.client.post("groups", &new_group).await?;
        info!("Created group '{}' ({})", new_group.display_name, group.id);

        for owner_id in &new_group.owners {
            if let Err(e) = self.post_ref(&group.id, "owners", owner_id).await {
                warn!("Failed to add owner {} to group {}: {}", owner_id, group.id, e);
            }
        }
        if new_group.is_dynamic() {
            if !new_group.members.is_empty() {
                warn!(
                    "Ignoring {} member(s) for dynamic group {}",
                    new_group.members.len(),
                    group.id
                );
            }
        } else {
            for member_id in &new_group.members {
                if let Err(e) = self.post_ref(&group.id, "members", member_id).await {
                    warn!("Failed to add member {} to group {}: {}", member_id, group.id, e);
                }
            }
        }

        Ok(CreatedGroup {
            group,
            status: None,
        })
    }

    #[instrument(skip(self, group_data))]
    pub async fn update_group(&self, group_id: &str, group_data: &Value) -> Result<Group> {
        let update = GroupUpdate::from_value(group_data)?;
        if update.is_empty() {
            return Err(Error::validation(
                "group_data contains no updatable fields (displayName, mailNickname, description, visibility, membershipRule)",
            ));
        }
        self.client.patch(&Self::group_path(group_id), &update).await?;
        self.get_group_by_id(group_id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_group(&self, group_id: &str) -> Result<()> {
        self.client.delete(&Self::group_path(group_id)).await?;
        info!("Deleted group {}", group_id);
        Ok(())
    }

    async fn post_ref(&self, group_id: &str, relation: &str, object_id: &str) -> Result<()> {
        let body = self.client.directory_object_ref(object_id);
        self.client
            .post_no_content(
                &format!("{}/{}/$ref", Self::group_path(group_id), relation),
                &body,
            )
            .await
    }

    async fn ensure_static_membership(&self, group_id: &str) -> Result<()> {
        let group: Group = self
            .client
            .get(
                &Self::group_path(group_id),
                &ODataQuery::new().select(&["id", "groupTypes"]),
            )
            .await?;
        if group.is_dynamic() {
            return Err(Error::validation(
                "Cannot change members of a dynamic membership group. Members are determined by the membership rule.",
            ));
        }
        Ok(())
    }

    async fn has_member(&self, group_id: &str, member_id: &str) -> Result<bool> {
        let path = format!(
            "{}/members/{}",
            Self::group_path(group_id),
            segment(member_id)
        );
        match self
            .client
            .get::<Value>(&path, &ODataQuery::new().select(&["id"]))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn change(status: MembershipOutcome, group_id: &str, object_id: &str) -> MembershipChange {
        MembershipChange {
            status,
            group_id: group_id.to_string(),
            directory_object_id: object_id.to_string(),
        }
    }

    #[instrument(skip(self))]
    pub async fn add_group_member(&self, group_id: &str, member_id: &str) -> Result<MembershipChange> {
        self.ensure_static_membership(group_id).await?;
        if self.has_member(group_id, member_id).await? {
            debug!("{} is already a member of {}", member_id, group_id);
            return Ok(Self::change(MembershipOutcome::AlreadyPresent, group_id, member_id));
        }
        self.post_ref(group_id, "members", member_id).await?;
        Ok(Self::change(MembershipOutcome::Added, group_id, member_id))
    }

    #[instrument(skip(self))]
    pub async fn remove_group_member(&self, group_id: &str, member_id: &str) -> Result<MembershipChange> {
        self.ensure_static_membership(group_id).await?;
        if !self.has_member(group_id, member_id).await? {
            debug!("{} is not a member of {}", member_id, group_id);
            return Ok(Self::change(MembershipOutcome::NotPresent, group_id, member_id));
        }
        self.client
            .delete(&format!(
                "{}/members/{}/$ref",
                Self::group_path(group_id),
                segment(member_id)
            ))
            .await?;
        Ok(Self::change(MembershipOutcome::Removed, group_id, member_id))
    }

    #[instrument(skip(self))]
    pub async fn add_group_owner(&self, group_id: &str, owner_id: &str) -> Result<MembershipChange> {
        self.post_ref(group_id, "owners", owner_id).await?;
        Ok(Self::change(MembershipOutcome::Added, group_id, owner_id))
    }

    #[instrument(skip(self))]
    pub async fn remove_group_owner(&self, group_id: &str, owner_id: &str) -> Result<MembershipChange> {
        self.client
            .delete(&format!(
                "{}/owners/{}/$ref",
                Self::group_path(group_id),
                segment(owner_id)
            ))
            .await?;
        Ok(Self::change(MembershipOutcome::Removed, group_id, owner_id))
    }
}
