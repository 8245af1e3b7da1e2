// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fabric resource types
//!
//! Field names mirror the fabric's JSON wire format (camelCase), narrowed to
//! the fields the reconciliation core reads or writes.

use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// Tagging type of an ethernet network or uplink set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum EthernetNetworkType {
    Tagged,
    Untagged,
}

impl EthernetNetworkType {
    /// The fabric is not consistent about case in this field, so compare
    /// case-insensitively.
    pub fn parse(s: &str) -> Option<EthernetNetworkType> {
        if s.eq_ignore_ascii_case("tagged") {
            Some(EthernetNetworkType::Tagged)
        } else if s.eq_ignore_ascii_case("untagged") {
            Some(EthernetNetworkType::Untagged)
        } else {
            None
        }
    }
}

impl fmt::Display for EthernetNetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EthernetNetworkType::Tagged => "Tagged",
            EthernetNetworkType::Untagged => "Untagged",
        })
    }
}

/// Options for creating an ethernet network
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EthernetNetworkCreate {
    pub name: String,
    pub ethernet_network_type: EthernetNetworkType,
    pub vlan_id: Option<i32>,
    pub purpose: String,
    pub smart_link: bool,
    pub private_network: bool,
}

impl EthernetNetworkCreate {
    /// The standard options this system uses: general-purpose network, no
    /// smart link, not private.
    pub fn new(
        name: String,
        ethernet_network_type: EthernetNetworkType,
        vlan_id: Option<i32>,
    ) -> EthernetNetworkCreate {
        EthernetNetworkCreate {
            name,
            ethernet_network_type,
            vlan_id,
            purpose: "General".to_string(),
            smart_link: false,
            private_network: false,
        }
    }
}

/// An ethernet network as returned by the fabric
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EthernetNetwork {
    pub uri: String,
    pub name: String,
    pub ethernet_network_type: EthernetNetworkType,
    pub vlan_id: Option<i32>,
}

/// An uplink set, narrowed to the one field this system reads
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UplinkSet {
    pub ethernet_network_type: EthernetNetworkType,
}

/// A server-hardware record
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerHardware {
    pub server_profile_uri: Option<String>,
    pub port_map: Option<PortMap>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMap {
    pub device_slots: Vec<DeviceSlot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSlot {
    pub location: String,
    pub slot_number: i32,
    pub physical_ports: Vec<PhysicalPort>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalPort {
    pub port_number: i32,
    pub virtual_ports: Vec<VirtualPort>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualPort {
    pub mac: Option<String>,
    pub port_function: String,
}

/// A server profile
///
/// Profiles carry far more state than this on the wire; a production client
/// is responsible for passing the rest through untouched on update.  The
/// connection list is the only part this system mutates.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProfile {
    pub uri: String,
    pub name: Option<String>,
    pub connections: Vec<ProfileConnection>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConnection {
    pub port_id: String,
    pub network_uri: String,
    /// Populated by the fabric once the connection is realized; absent on
    /// connections we have just appended.
    pub mac: Option<String>,
    pub boot: Option<ConnectionBoot>,
    pub function_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionBoot {
    pub priority: BootPriority,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum BootPriority {
    Primary,
    Secondary,
    NotBootable,
}

/// Function type carried on every connection this system appends.
pub const FUNCTION_TYPE_ETHERNET: &str = "Ethernet";

/// Extract a fabric resource id from its URI (the last path segment).
pub fn id_from_uri(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// The URI under which the fabric exposes an ethernet network.
pub fn ethernet_network_uri(network_id: &str) -> String {
    format!("/rest/ethernet-networks/{}", network_id)
}
