//! Intune managed devices.

use serde::{Deserialize, Serialize};

pub const DEVICE_FIELDS: &[&str] = &[
    "id",
    "deviceName",
    "userId",
    "userPrincipalName",
    "operatingSystem",
    "osVersion",
    "managementAgent",
    "complianceState",
    "jailBroken",
    "enrollmentType",
    "lastSyncDateTime",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDevice {
    pub id: String,
    pub device_name: Option<String>,
    pub user_id: Option<String>,
    pub user_principal_name: Option<String>,
    pub operating_system: Option<String>,
    pub os_version: Option<String>,
    pub management_agent: Option<String>,
    pub compliance_state: Option<String>,
    /// Intune reports this as a string (`"True"`, `"False"`, `"Unknown"`).
    pub jail_broken: Option<String>,
    pub enrollment_type: Option<String>,
    pub last_sync_date_time: Option<String>,
}
