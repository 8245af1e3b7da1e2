// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::model::NetworkMapping;
use crate::Error;
use async_trait::async_trait;
use fabric_sync_common::LogicalNetwork;
use fabric_sync_common::Segment;
use uuid::Uuid;

/// Typed operations over the relational mapping store
///
/// [`crate::DataStore`] is the production implementation; tests substitute an
/// in-memory one.  Reconcilers depend on this trait, never on Diesel types.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Every (logical network, segment) pair whose segment carries a physical
    /// network name.
    async fn networks_with_segments(
        &self,
    ) -> Result<Vec<(LogicalNetwork, Segment)>, Error>;

    /// Every logical network declared in the tenant controller.
    async fn networks(&self) -> Result<Vec<LogicalNetwork>, Error>;

    /// The segment of one logical network, if it has one.
    async fn network_segment(
        &self,
        network_id: Uuid,
    ) -> Result<Option<Segment>, Error>;

    /// The persisted fabric mapping of one logical network, if it has been
    /// reconciled before.
    async fn network_mapping(
        &self,
        network_id: Uuid,
    ) -> Result<Option<NetworkMapping>, Error>;

    /// Ids of the uplink sets a fabric network is recorded as attached to,
    /// in attachment order.
    async fn network_uplinksets(
        &self,
        fabric_network_id: &str,
    ) -> Result<Vec<String>, Error>;

    /// Persist a new mapping together with its uplink-set bindings.  The
    /// mapping row and all binding rows become visible atomically.
    async fn map_network(
        &self,
        network_id: Uuid,
        fabric_network_id: &str,
        uplinkset_ids: &[String],
        manageable: bool,
    ) -> Result<(), Error>;

    /// Remove the mapping row for a logical network.  Idempotent.
    async fn unmap_network(&self, network_id: Uuid) -> Result<(), Error>;

    /// Remove every uplink-set binding of a fabric network.  Idempotent.
    async fn delete_uplinkset_bindings(
        &self,
        fabric_network_id: &str,
    ) -> Result<(), Error>;

    /// Record one uplink-set attachment.  Idempotent.
    async fn add_uplinkset_binding(
        &self,
        fabric_network_id: &str,
        uplinkset_id: &str,
    ) -> Result<(), Error>;

    /// Remove one uplink-set attachment record.  Idempotent.
    async fn remove_uplinkset_binding(
        &self,
        fabric_network_id: &str,
        uplinkset_id: &str,
    ) -> Result<(), Error>;
}
