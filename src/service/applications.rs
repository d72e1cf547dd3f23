//! Application registration management.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::service_principals::{fetch_grants, find_by_app_id};
use crate::error::{Error, Result};
use crate::graph::{segment, GraphClient, ODataQuery};
use crate::types::{Application, ApplicationChanges, ApplicationDetails, Grants, APPLICATION_FIELDS};

pub struct ApplicationService {
    client: Arc<GraphClient>,
}

impl ApplicationService {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }

    fn path(app_id: &str) -> String {
        format!("applications/{}", segment(app_id))
    }

    #[instrument(skip(self))]
    pub async fn list_applications(&self, limit: usize) -> Result<Vec<Application>> {
        let odata = ODataQuery::new().select(APPLICATION_FIELDS);
        self.client.list("applications", &odata, Some(limit)).await
    }

    /// Application by object ID, with the grants of its service principal.
    #[instrument(skip(self))]
    pub async fn get_application_by_id(&self, app_id: &str) -> Result<ApplicationDetails> {
        let application: Application = self
            .client
            .get(&Self::path(app_id), &ODataQuery::new().select(APPLICATION_FIELDS))
            .await?;

        let grants = match application.app_id.as_deref() {
            Some(client_id) => match find_by_app_id(&self.client, client_id).await? {
                Some(sp) => fetch_grants(&self.client, &sp.id).await,
                None => {
                    debug!("Application {} has no service principal", app_id);
                    Grants::default()
                }
            },
            None => Grants::default(),
        };

        Ok(ApplicationDetails {
            application,
            grants,
        })
    }

    #[instrument(skip(self, app_data))]
    pub async fn create_application(&self, app_data: Value) -> Result<Application> {
        let changes = ApplicationChanges::from_value(app_data)?;
        changes.validate_new()?;
        let created: Application = self.client.post("applications", &changes).await?;
        info!("Created application {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self, app_data))]
    pub async fn update_application(&self, app_id: &str, app_data: Value) -> Result<ApplicationDetails> {
        let changes = ApplicationChanges::from_value(app_data)?;
        if changes == ApplicationChanges::default() {
            return Err(Error::validation("app_data contains no updatable fields"));
        }
        self.client.patch(&Self::path(app_id), &changes).await?;
        self.get_application_by_id(app_id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_application(&self, app_id: &str) -> Result<()> {
        self.client.delete(&Self::path(app_id)).await?;
        info!("Deleted application {}", app_id);
        Ok(())
    }
}
