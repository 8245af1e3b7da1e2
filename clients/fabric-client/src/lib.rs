// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Façade over the hardware-orchestration ("fabric") API
//!
//! The reconciliation core talks to the fabric exclusively through the
//! [`FabricClient`] trait.  A production implementation wraps the remote HTTP
//! API (transport, authentication and retries live there, not here); the
//! [`fake`] module provides an in-memory implementation used by tests across
//! the workspace.
//!
//! The remote API reports failures as messages without structured error
//! codes, so every operation returns the single typed [`FabricError`].

use async_trait::async_trait;

pub mod fake;
pub mod types;

use types::EthernetNetwork;
use types::EthernetNetworkCreate;
use types::ServerHardware;
use types::ServerProfile;
use types::UplinkSet;

/// Error returned by any fabric operation
#[derive(Clone, Debug, thiserror::Error)]
#[error("fabric request failed: {message}")]
pub struct FabricError {
    message: String,
}

impl FabricError {
    pub fn new(message: impl Into<String>) -> FabricError {
        FabricError { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Blocking-RPC view of the fabric API
///
/// Every call is one round trip to the fabric; it either returns or fails
/// with a [`FabricError`].  Retry policy belongs to the caller.
#[async_trait]
pub trait FabricClient: Send + Sync {
    /// Create an ethernet network.  The returned resource's `uri` is the only
    /// field callers rely on.
    async fn ethernet_network_create(
        &self,
        params: &EthernetNetworkCreate,
    ) -> Result<EthernetNetwork, FabricError>;

    /// Delete an ethernet network by id.
    async fn ethernet_network_delete(
        &self,
        network_id: &str,
    ) -> Result<(), FabricError>;

    /// Fetch an uplink set by id.
    async fn uplink_set_get(
        &self,
        uplinkset_id: &str,
    ) -> Result<UplinkSet, FabricError>;

    /// Attach an ethernet network to an uplink set.
    async fn uplink_set_add_network(
        &self,
        uplinkset_id: &str,
        network_id: &str,
    ) -> Result<(), FabricError>;

    /// Detach an ethernet network from an uplink set.
    async fn uplink_set_remove_network(
        &self,
        uplinkset_id: &str,
        network_id: &str,
    ) -> Result<(), FabricError>;

    /// Fetch a server-hardware record by id.
    async fn server_hardware_get(
        &self,
        server_hardware_id: &str,
    ) -> Result<ServerHardware, FabricError>;

    /// Fetch a server profile by URI.
    async fn server_profile_get(
        &self,
        profile_uri: &str,
    ) -> Result<ServerProfile, FabricError>;

    /// Push an updated server profile back to the fabric.
    async fn server_profile_update(
        &self,
        profile: &ServerProfile,
    ) -> Result<(), FabricError>;
}
