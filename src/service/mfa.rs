//! MFA registration status derived from authentication methods.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, instrument, warn};

use crate::error::Result;
use crate::graph::{segment, GraphClient, ODataQuery};
use crate::types::{AuthenticationMethod, DirectoryObject, MfaStatus, MfaSubject, USER_TYPE};

/// Concurrent per-member lookups in `get_group_mfa_status`.
const MEMBER_CONCURRENCY: usize = 8;

pub struct MfaService {
    client: Arc<GraphClient>,
}

impl MfaService {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn get_user_mfa_status(&self, user_id: &str) -> Result<MfaStatus> {
        let user_path = format!("users/{}", segment(user_id));
        let subject: MfaSubject = self
            .client
            .get(
                &user_path,
                &ODataQuery::new().select(&[
                    "id",
                    "userPrincipalName",
                    "displayName",
                    "mail",
                    "companyName",
                ]),
            )
            .await?;

        let methods: Vec<AuthenticationMethod> = self
            .client
            .list(
                &format!("{}/authentication/methods", user_path),
                &ODataQuery::new(),
                None,
            )
            .await?;

        Ok(MfaStatus::new(subject, &methods))
    }

    /// MFA status of every user in the group. Members that cannot be read are skipped.
    #[instrument(skip(self))]
    pub async fn get_group_mfa_status(&self, group_id: &str) -> Result<Vec<MfaStatus>> {
        let members: Vec<DirectoryObject> = self
            .client
            .list(
                &format!("groups/{}/members", segment(group_id)),
                &ODataQuery::new().select(&["id"]),
                None,
            )
            .await?;

        let user_ids: Vec<String> = members
            .into_iter()
            .filter(|m| m.is_type(USER_TYPE))
            .map(|m| m.id)
            .collect();
        if user_ids.is_empty() {
            warn!("No user members found in group {}", group_id);
            return Ok(Vec::new());
        }

        let results: Vec<(String, Result<MfaStatus>)> = stream::iter(user_ids)
            .map(|id| async move {
                let status = self.get_user_mfa_status(&id).await;
                (id, status)
            })
            .buffered(MEMBER_CONCURRENCY)
            .collect()
            .await;

        let mut statuses = Vec::with_capacity(results.len());
        for (id, result) in results {
            match result {
                Ok(status) => statuses.push(status),
                Err(e) => error!("Skipping member {} of group {}: {}", id, group_id, e),
            }
        }
        Ok(statuses)
    }
}
