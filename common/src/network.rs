// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Views of tenant-controller network resources

use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A network declared in the tenant-facing network controller
///
/// Owned by the tenant controller; this system only ever reads it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogicalNetwork {
    pub id: Uuid,
    pub name: String,
}

/// Encapsulation type of a segment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Flat,
    Vlan,
    Vxlan,
}

impl NetworkType {
    /// Whether segments of this type resolve through the tagged uplink-set
    /// table (as opposed to the untagged one)
    pub fn is_tagged(&self) -> bool {
        match self {
            NetworkType::Vlan | NetworkType::Vxlan => true,
            NetworkType::Flat => false,
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NetworkType::Flat => "flat",
            NetworkType::Vlan => "vlan",
            NetworkType::Vxlan => "vxlan",
        })
    }
}

/// The tenant controller records the type as free-form text; anything other
/// than the three types we reflect is reported back to the caller.
#[derive(Clone, Debug, thiserror::Error)]
#[error("unsupported network type {0:?}")]
pub struct UnsupportedNetworkType(pub String);

impl FromStr for NetworkType {
    type Err = UnsupportedNetworkType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(NetworkType::Flat),
            "vlan" => Ok(NetworkType::Vlan),
            "vxlan" => Ok(NetworkType::Vxlan),
            other => Err(UnsupportedNetworkType(other.to_string())),
        }
    }
}

/// Physical-network binding of a logical network
///
/// Immutable once created by the tenant controller.  A segment without a
/// physical network is of no interest to fabric reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Segment {
    pub physical_network: Option<String>,
    pub network_type: NetworkType,
    pub segmentation_id: Option<i32>,
}

#[cfg(test)]
mod test {
    use super::NetworkType;

    #[test]
    fn network_type_round_trips_through_str() {
        for (s, t) in [
            ("flat", NetworkType::Flat),
            ("vlan", NetworkType::Vlan),
            ("vxlan", NetworkType::Vxlan),
        ] {
            assert_eq!(s.parse::<NetworkType>().unwrap(), t);
            assert_eq!(t.to_string(), s);
        }
        assert!("gre".parse::<NetworkType>().is_err());
    }

    #[test]
    fn tagged_types() {
        assert!(NetworkType::Vlan.is_tagged());
        assert!(NetworkType::Vxlan.is_tagged());
        assert!(!NetworkType::Flat.is_tagged());
    }
}
