// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed per-item results of reconciliation
//!
//! Batch passes return these instead of logging and moving on, so callers
//! (and tests) can see exactly what happened to each resource.

use fabric_client::types::BootPriority;
use fabric_sync_common::NetworkType;
use serde::Serialize;
use uuid::Uuid;

/// Why a logical network was left untouched
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkSkipReason {
    /// A mapping already exists; creation is a no-op.
    AlreadyMapped,
    /// The segment's physical network is in no mapping table.
    Unmanaged,
    /// Uplink-set mapping applies but no uplink set of the required tagging
    /// type resolved for this physical network.
    NoUplinksets {
        physical_network: String,
        network_type: NetworkType,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkCreateOutcome {
    /// A fabric network was created and attached; the mapping is manageable.
    Created { fabric_network_id: String, uplinksets: Vec<String> },
    /// The logical network was bound to a pre-existing fabric network; no
    /// fabric mutation happened.
    FlatMapped { fabric_network_id: String },
    Skipped(NetworkSkipReason),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkDeleteOutcome {
    /// Mapping rows were removed.  `fabric_deleted` is false for flat
    /// mappings (never deleted) and when the fabric delete failed (the
    /// fabric then retains an orphaned network).
    Deleted { fabric_network_id: String, fabric_deleted: bool },
    NotMapped,
}

/// What one drift-correction step did to a fabric network's attachments
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UplinksetDrift {
    pub attached: Vec<String>,
    pub detached: Vec<String>,
    /// Uplink sets whose attach/detach failed; left for a later pass.
    pub failed: Vec<String>,
}

impl UplinksetDrift {
    pub fn is_noop(&self) -> bool {
        self.attached.is_empty()
            && self.detached.is_empty()
            && self.failed.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftOutcome {
    Corrected(UplinksetDrift),
    /// The network has never been reconciled; the creation pass handles it.
    NotMapped,
    /// Flat mappings carry no attachments and are never drift-corrected.
    NotManageable,
}

/// Why a port was not reflected onto the fabric
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortSkipReason {
    NotBaremetal { vnic_type: String },
    NetworkNotMapped,
    MissingLinkInfo,
    MultipleLinkInfo,
    IncompleteSwitchInfo,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortCreateOutcome {
    ConnectionAdded { port_id: String, boot_priority: BootPriority },
    Skipped(PortSkipReason),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDeleteOutcome {
    ConnectionRemoved { port_id: String },
    /// No connection on the profile matches the port's MAC; nothing to do.
    NoMatchingConnection,
    Skipped(PortSkipReason),
}

/// Success or failure of one item within a batch pass
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemResult<T> {
    Ok(T),
    Failed { message: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DriftEntry {
    pub network_id: Uuid,
    pub result: ItemResult<DriftOutcome>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreateEntry {
    pub network_id: Uuid,
    pub result: ItemResult<NetworkCreateOutcome>,
}

/// Everything one periodic pass did, per network
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub drift: Vec<DriftEntry>,
    pub creates: Vec<CreateEntry>,
}

impl SyncReport {
    pub fn failures(&self) -> usize {
        let drift = self
            .drift
            .iter()
            .filter(|e| matches!(e.result, ItemResult::Failed { .. }))
            .count();
        let creates = self
            .creates
            .iter()
            .filter(|e| matches!(e.result, ItemResult::Failed { .. }))
            .count();
        drift + creates
    }

    /// JSON status document for the embedding service's task monitoring.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
