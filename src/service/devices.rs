//! Intune managed devices.

use std::sync::Arc;
use tracing::instrument;

use crate::error::Result;
use crate::graph::{quote, GraphClient, ODataQuery};
use crate::types::{ManagedDevice, DEVICE_FIELDS};

const MANAGED_DEVICES: &str = "deviceManagement/managedDevices";

pub struct DeviceService {
    client: Arc<GraphClient>,
}

impl DeviceService {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self { client }
    }

    async fn list(&self, filter: Option<String>) -> Result<Vec<ManagedDevice>> {
        let mut odata = ODataQuery::new().select(DEVICE_FIELDS).eventual_consistency();
        if let Some(filter) = filter {
            odata = odata.filter(filter);
        }
        self.client.list(MANAGED_DEVICES, &odata, None).await
    }

    /// All managed devices, optionally limited to one operating system.
    #[instrument(skip(self))]
    pub async fn get_all_managed_devices(&self, filter_os: Option<&str>) -> Result<Vec<ManagedDevice>> {
        let filter = filter_os
            .map(str::trim)
            .filter(|os| !os.is_empty())
            .map(|os| format!("operatingSystem eq {}", quote(os)));
        self.list(filter).await
    }

    #[instrument(skip(self))]
    pub async fn get_managed_devices_by_user(&self, user_id: &str) -> Result<Vec<ManagedDevice>> {
        self.list(Some(format!("userId eq {}", quote(user_id)))).await
    }
}
