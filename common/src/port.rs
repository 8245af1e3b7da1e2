// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! View of a tenant-controller port binding
//!
//! The binding profile reaches us as free-form JSON attached to the port by
//! the bare-metal provisioning service, so every field below is optional at
//! the type level; the port reconciler's eligibility gate decides what is
//! usable.

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Binding type for ports attached to bare-metal servers.  Ports bound any
/// other way are not reflected onto the fabric.
pub const VNIC_TYPE_BAREMETAL: &str = "baremetal";

/// A port as declared in the tenant controller, narrowed to the fields the
/// fabric reconciliation cares about
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PortBinding {
    pub network_id: Uuid,
    pub mac_address: String,
    pub vnic_type: String,
    #[serde(default)]
    pub local_link_information: Vec<LocalLinkInformation>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocalLinkInformation {
    pub switch_info: Option<SwitchInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SwitchInfo {
    pub server_hardware_id: Option<String>,
    pub bootable: Option<bool>,
}

impl PortBinding {
    /// Build a view from the raw binding-profile JSON carried on the port.
    ///
    /// Returns `None` when the profile has no parseable
    /// `local_link_information` list; the caller treats such a port as
    /// ineligible, not as an error.
    pub fn from_binding_profile(
        network_id: Uuid,
        mac_address: String,
        vnic_type: String,
        profile: &serde_json::Value,
    ) -> Option<PortBinding> {
        let local_link_information = serde_json::from_value(
            profile.get("local_link_information")?.clone(),
        )
        .ok()?;
        Some(PortBinding {
            network_id,
            mac_address,
            vnic_type,
            local_link_information,
        })
    }
}

#[cfg(test)]
mod test {
    use super::PortBinding;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn binding_profile_parses_switch_info() {
        let profile = json!({
            "local_link_information": [{
                "switch_info": {
                    "server_hardware_id": "sh-1",
                    "bootable": true,
                }
            }]
        });
        let port = PortBinding::from_binding_profile(
            Uuid::new_v4(),
            "AA:BB:CC:DD:EE:01".to_string(),
            "baremetal".to_string(),
            &profile,
        )
        .unwrap();
        let switch_info = port.local_link_information[0]
            .switch_info
            .as_ref()
            .unwrap();
        assert_eq!(switch_info.server_hardware_id.as_deref(), Some("sh-1"));
        assert_eq!(switch_info.bootable, Some(true));
    }

    #[test]
    fn binding_profile_without_link_info_is_rejected() {
        let profile = json!({ "other": "stuff" });
        assert!(
            PortBinding::from_binding_profile(
                Uuid::new_v4(),
                "AA:BB:CC:DD:EE:01".to_string(),
                "baremetal".to_string(),
                &profile,
            )
            .is_none()
        );
    }
}
