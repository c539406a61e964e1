use serde::Deserialize;

use super::{Link, Status, null_to_default};

/// A `ComputerSystem` resource.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct System {
    #[serde(default, rename = "@odata.id", deserialize_with = "null_to_default")]
    pub odata_id: String,

    pub id: String,
    /// The DNS host name, without any domain information.
    #[serde(default, deserialize_with = "null_to_default")]
    pub host_name: String,
    /// The serial number for this system.
    #[serde(default, deserialize_with = "null_to_default")]
    pub serial_number: String,

    /// The current power state of the system.
    ///
    /// - Off         -- The resource is powered off. The components within the resource might continue to have AUX power
    /// - On          -- The resource is powered on
    /// - Paused      -- The resource is paused
    /// - PoweringOff -- A temporary state between on and off. The components within the resource can take time to process the power off action.
    /// - PoweringOn  -- A temporary state between off and on. The components within the resource can take time to process the power on action.
    #[serde(default, deserialize_with = "null_to_default")]
    pub power_state: String,

    /// The status and health of a resource and its children.
    #[serde(default)]
    pub status: Option<Status>,
}

impl System {
    /// Path of the Storage collection that belongs to this system.
    pub fn storage_path(&self) -> String {
        let base = if self.odata_id.is_empty() {
            format!("/redfish/v1/Systems/{}", self.id)
        } else {
            self.odata_id.trim_end_matches('/').to_string()
        };

        format!("{base}/Storage")
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Storage {
    pub id: String,

    /// Links to the drives attached to this storage subsystem
    #[serde(default)]
    pub drives: Vec<Link>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Drive {
    pub id: String,

    #[serde(default)]
    pub status: Option<Status>,
}
