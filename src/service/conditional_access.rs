//! Conditional access policies.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::error::Result;
use crate::graph::{segment, GraphClient, ODataQuery};
use crate::types::{ConditionalAccessPolicy, Group, PolicySummary};

const POLICIES: &str = "identity/conditionalAccess/policies";

pub struct ConditionalAccessService {
    client: Arc<GraphClient>,
}

impl ConditionalAccessService {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }

    /// Display names for the given group IDs. Groups that cannot be read are omitted.
    async fn resolve_group_names(&self, ids: BTreeSet<String>) -> HashMap<String, String> {
        let mut names = HashMap::new();
        for id in ids {
            let result: Result<Group> = self
                .client
                .get(
                    &format!("groups/{}", segment(&id)),
                    &ODataQuery::new().select(&["id", "displayName"]),
                )
                .await;
            match result {
                Ok(group) => {
                    names.insert(id, group.display_name.unwrap_or_else(|| group.id.clone()));
                }
                Err(e) => warn!("Could not resolve group {}: {}", id, e),
            }
        }
        names
    }

    #[instrument(skip(self))]
    pub async fn get_conditional_access_policies(&self) -> Result<Vec<PolicySummary>> {
        let policies: Vec<ConditionalAccessPolicy> =
            self.client.list(POLICIES, &ODataQuery::new(), None).await?;

        let group_ids: BTreeSet<String> = policies.iter().flat_map(|p| p.group_ids()).collect();
        let names = self.resolve_group_names(group_ids).await;

        Ok(policies.iter().map(|p| p.summarize(&names)).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_conditional_access_policy_by_id(&self, policy_id: &str) -> Result<PolicySummary> {
        let policy: ConditionalAccessPolicy = self
            .client
            .get(
                &format!("{}/{}", POLICIES, segment(policy_id)),
                &ODataQuery::new(),
            )
            .await?;
        let names = self.resolve_group_names(policy.group_ids()).await;
        Ok(policy.summarize(&names))
    }
}
