// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Database representations of the mapping-store rows

use crate::schema::fabric_network_mapping;
use crate::schema::fabric_network_uplinkset;
use crate::schema::network;
use crate::schema::network_segment;
use chrono::DateTime;
use chrono::Utc;
use diesel::prelude::*;
use fabric_sync_common::network::UnsupportedNetworkType;
use fabric_sync_common::LogicalNetwork;
use fabric_sync_common::Segment;
use uuid::Uuid;

/// A logical network as stored by the tenant controller
#[derive(Queryable, Selectable, Clone, Debug)]
#[diesel(table_name = network)]
pub struct Network {
    pub id: Uuid,
    pub name: String,
}

impl From<Network> for LogicalNetwork {
    fn from(n: Network) -> LogicalNetwork {
        LogicalNetwork { id: n.id, name: n.name }
    }
}

/// A network segment as stored by the tenant controller
///
/// The encapsulation type is free-form text in the store and is parsed on
/// conversion; segments with a type this system does not reflect surface as
/// [`crate::Error::InvalidRow`].
#[derive(Queryable, Selectable, Clone, Debug)]
#[diesel(table_name = network_segment)]
pub struct NetworkSegment {
    pub id: Uuid,
    pub network_id: Uuid,
    pub physical_network: Option<String>,
    pub network_type: String,
    pub segmentation_id: Option<i32>,
}

impl TryFrom<NetworkSegment> for Segment {
    type Error = UnsupportedNetworkType;

    fn try_from(s: NetworkSegment) -> Result<Segment, Self::Error> {
        Ok(Segment {
            physical_network: s.physical_network,
            network_type: s.network_type.parse()?,
            segmentation_id: s.segmentation_id,
        })
    }
}

/// Mapping from a logical network to the fabric network reflecting it
#[derive(Queryable, Insertable, Selectable, Clone, Debug, PartialEq)]
#[diesel(table_name = fabric_network_mapping)]
pub struct NetworkMapping {
    pub logical_network_id: Uuid,
    pub fabric_network_id: String,
    /// Whether this system created the fabric network and may therefore
    /// delete it and manage its uplink-set attachments.  Flat mappings to
    /// pre-existing networks are not manageable.
    pub manageable: bool,
    pub time_created: DateTime<Utc>,
}

impl NetworkMapping {
    pub fn new(
        logical_network_id: Uuid,
        fabric_network_id: &str,
        manageable: bool,
    ) -> NetworkMapping {
        NetworkMapping {
            logical_network_id,
            fabric_network_id: fabric_network_id.to_string(),
            manageable,
            time_created: Utc::now(),
        }
    }
}

/// One uplink-set attachment of a fabric network, per this system's last
/// successful operation
#[derive(Queryable, Insertable, Selectable, Clone, Debug, PartialEq)]
#[diesel(table_name = fabric_network_uplinkset)]
pub struct NetworkUplinkset {
    pub fabric_network_id: String,
    pub uplinkset_id: String,
    pub time_created: DateTime<Utc>,
}

impl NetworkUplinkset {
    pub fn new(fabric_network_id: &str, uplinkset_id: &str) -> NetworkUplinkset {
        NetworkUplinkset {
            fabric_network_id: fabric_network_id.to_string(),
            uplinkset_id: uplinkset_id.to_string(),
            time_created: Utc::now(),
        }
    }
}
