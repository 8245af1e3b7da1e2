// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciliation of tenant network topology onto the hardware fabric
//!
//! Logical networks declared in the tenant controller are reflected onto the
//! fabric as ethernet networks attached to operator-configured uplink sets;
//! bare-metal ports are reflected as connections on the owning server's
//! profile.  Both sources of truth move independently, so everything here is
//! written to be re-runnable: the [`PeriodicSync`](sync::PeriodicSync) pass
//! corrects drift between the mapping store and the declared topology, and
//! the per-resource reconcilers are no-ops when there is nothing to do.
//!
//! What this crate does not do: detect a fabric network that exists without
//! a mapping row (possible if the process dies between fabric creation and
//! persistence) or vice versa.  Such orphans require operator intervention;
//! every mutation is ordered so that the window for them is a single
//! operation wide.
//!
//! There is no internal mutual exclusion.  The operational contract is at
//! most one concurrent periodic pass system-wide; the embedding service's
//! scheduler is responsible for that.

use async_trait::async_trait;
use fabric_client::FabricClient;
use fabric_client::FabricError;
use fabric_sync_common::FlatNetMappings;
use fabric_sync_common::UplinksetMappings;
use fabric_sync_db::MappingStore;
use slog::Logger;
use std::sync::Arc;

pub mod index;
pub mod network;
pub mod outcome;
pub mod policy;
pub mod port;
pub mod sync;

#[cfg(test)]
mod fakes;

pub use index::UplinksetTypeIndex;
pub use network::NetworkReconciler;
pub use outcome::SyncReport;
pub use port::PortReconciler;
pub use sync::PeriodicSync;

/// Error from reconciling one logical network
///
/// Failures are scoped to the network being processed; batch passes collect
/// them per item rather than aborting.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] fabric_sync_db::Error),

    #[error(transparent)]
    Fabric(#[from] FabricError),
}

/// Contract shared by the network and port reconcilers: reflect creation and
/// deletion of one tenant resource onto the fabric.
#[async_trait]
pub trait Reconciler {
    type Resource;
    type CreateOutcome;
    type DeleteOutcome;
    type Error;

    async fn create(
        &self,
        resource: &Self::Resource,
    ) -> Result<Self::CreateOutcome, Self::Error>;

    async fn delete(
        &self,
        resource: &Self::Resource,
    ) -> Result<Self::DeleteOutcome, Self::Error>;
}

/// Entry point tying the pieces together
///
/// Owns the uplink-set type index (built once, here) and hands out the
/// per-resource reconcilers plus the periodic pass.  Rebuild the whole thing
/// to pick up changes to the fabric's uplink-set tagging.
pub struct FabricSync {
    networks: NetworkReconciler,
    ports: PortReconciler,
    periodic: PeriodicSync,
}

impl FabricSync {
    pub async fn new(
        store: Arc<dyn MappingStore>,
        client: Arc<dyn FabricClient>,
        uplinkset_mappings: UplinksetMappings,
        flat_mappings: FlatNetMappings,
        log: &Logger,
    ) -> FabricSync {
        let index = Arc::new(
            UplinksetTypeIndex::build(&*client, &uplinkset_mappings, log)
                .await,
        );
        let networks = NetworkReconciler::new(
            Arc::clone(&store),
            Arc::clone(&client),
            index,
            Arc::new(flat_mappings),
            log,
        );
        let ports = PortReconciler::new(
            Arc::clone(&store),
            Arc::clone(&client),
            log,
        );
        let periodic = PeriodicSync::new(
            store,
            networks.clone(),
            uplinkset_mappings,
            log,
        );
        FabricSync { networks, ports, periodic }
    }

    pub fn networks(&self) -> &NetworkReconciler {
        &self.networks
    }

    pub fn ports(&self) -> &PortReconciler {
        &self.ports
    }

    /// Run one full sync pass; see [`PeriodicSync::activate`].
    pub async fn activate(&self) -> SyncReport {
        self.periodic.activate().await
    }
}
