//! Service principal management.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{Error, Result};
use crate::graph::{quote, segment, GraphClient, ODataQuery};
use crate::types::{
    AppRoleAssignment, Grants, OAuth2PermissionGrant, ServicePrincipal, ServicePrincipalChanges,
    ServicePrincipalDetails, SERVICE_PRINCIPAL_FIELDS,
};

/// Read one grant collection of a service principal, logging and returning
/// nothing when it cannot be read.
async fn grant_collection<T: DeserializeOwned>(
    client: &GraphClient,
    sp_id: &str,
    relation: &str,
) -> Vec<T> {
    let path = format!("servicePrincipals/{}/{}", segment(sp_id), relation);
    match client.list(&path, &ODataQuery::new(), None).await {
        Ok(items) => items,
        Err(e) => {
            warn!("Could not read {} for service principal {}: {}", relation, sp_id, e);
            Vec::new()
        }
    }
}

/// App role assignments and delegated grants held by a service principal.
pub(crate) async fn fetch_grants(client: &GraphClient, sp_id: &str) -> Grants {
    let app_role_assignments: Vec<AppRoleAssignment> =
        grant_collection(client, sp_id, "appRoleAssignments").await;
    let oauth2_permission_grants: Vec<OAuth2PermissionGrant> =
        grant_collection(client, sp_id, "oauth2PermissionGrants").await;
    Grants {
        app_role_assignments,
        oauth2_permission_grants,
    }
}

/// Service principal for an application (client) ID, if the tenant has one.
pub(crate) async fn find_by_app_id(client: &GraphClient, app_id: &str) -> Result<Option<ServicePrincipal>> {
    let odata = ODataQuery::new()
        .filter(format!("appId eq {}", quote(app_id)))
        .select(SERVICE_PRINCIPAL_FIELDS);
    let mut found: Vec<ServicePrincipal> = client.list("servicePrincipals", &odata, Some(1)).await?;
    Ok(found.pop())
}

pub struct ServicePrincipalService {
    client: Arc<GraphClient>,
}

impl ServicePrincipalService {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }

    fn path(sp_id: &str) -> String {
        format!("servicePrincipals/{}", segment(sp_id))
    }

    #[instrument(skip(self))]
    pub async fn list_service_principals(&self, limit: usize) -> Result<Vec<ServicePrincipal>> {
        let odata = ODataQuery::new().select(SERVICE_PRINCIPAL_FIELDS);
        self.client.list("servicePrincipals", &odata, Some(limit)).await
    }

    #[instrument(skip(self))]
    pub async fn get_service_principal_by_id(&self, sp_id: &str) -> Result<ServicePrincipalDetails> {
        let service_principal: ServicePrincipal = self
            .client
            .get(
                &Self::path(sp_id),
                &ODataQuery::new().select(SERVICE_PRINCIPAL_FIELDS),
            )
            .await?;
        let grants = fetch_grants(&self.client, &service_principal.id).await;
        Ok(ServicePrincipalDetails {
            service_principal,
            grants,
        })
    }

    #[instrument(skip(self, sp_data))]
    pub async fn create_service_principal(&self, sp_data: Value) -> Result<ServicePrincipal> {
        let changes = ServicePrincipalChanges::from_value(sp_data)?;
        changes.validate_new()?;
        let created: ServicePrincipal = self.client.post("servicePrincipals", &changes).await?;
        info!("Created service principal {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self, sp_data))]
    pub async fn update_service_principal(
        &self,
        sp_id: &str,
        sp_data: Value,
    ) -> Result<ServicePrincipalDetails> {
        let changes = ServicePrincipalChanges::from_value(sp_data)?.without_app_id();
        if changes == ServicePrincipalChanges::default() {
            return Err(Error::validation("sp_data contains no updatable fields"));
        }
        self.client.patch(&Self::path(sp_id), &changes).await?;
        self.get_service_principal_by_id(sp_id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_service_principal(&self, sp_id: &str) -> Result<()> {
        self.client.delete(&Self::path(sp_id)).await?;
        info!("Deleted service principal {}", sp_id);
        Ok(())
    }
}
