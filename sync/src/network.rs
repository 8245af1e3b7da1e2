// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciles logical networks onto fabric ethernet networks

use crate::index::UplinksetTypeIndex;
use crate::outcome::DriftOutcome;
use crate::outcome::NetworkCreateOutcome;
use crate::outcome::NetworkDeleteOutcome;
use crate::outcome::NetworkSkipReason;
use crate::outcome::UplinksetDrift;
use crate::policy;
use crate::policy::MappingType;
use crate::Reconciler;
use crate::SyncError;
use async_trait::async_trait;
use fabric_client::types::id_from_uri;
use fabric_client::types::EthernetNetworkCreate;
use fabric_client::types::EthernetNetworkType;
use fabric_client::FabricClient;
use fabric_sync_common::FlatNetMappings;
use fabric_sync_common::LogicalNetwork;
use fabric_sync_common::Segment;
use fabric_sync_db::MappingStore;
use slog::error;
use slog::info;
use slog::o;
use slog::warn;
use slog::Logger;
use std::sync::Arc;
use uuid::Uuid;

/// Deterministic fabric-side name for the network reflecting a logical
/// network.
pub fn fabric_network_name(network_id: Uuid) -> String {
    format!("tenant-net-{}", network_id)
}

/// Creates and deletes fabric networks and keeps their uplink-set
/// attachments in line with the operator's tables
#[derive(Clone)]
pub struct NetworkReconciler {
    store: Arc<dyn MappingStore>,
    client: Arc<dyn FabricClient>,
    index: Arc<UplinksetTypeIndex>,
    flat_mappings: Arc<FlatNetMappings>,
    log: Logger,
}

impl NetworkReconciler {
    pub fn new(
        store: Arc<dyn MappingStore>,
        client: Arc<dyn FabricClient>,
        index: Arc<UplinksetTypeIndex>,
        flat_mappings: Arc<FlatNetMappings>,
        log: &Logger,
    ) -> NetworkReconciler {
        NetworkReconciler {
            store,
            client,
            index,
            flat_mappings,
            log: log.new(o!("component" => "NetworkReconciler")),
        }
    }

    /// Reflect a newly declared logical network onto the fabric.
    ///
    /// No-op when a mapping already exists or the segment is unmanaged.  The
    /// mapping row is persisted only once the fabric network id is known, so
    /// a crash before fabric creation leaves nothing behind; a crash after
    /// it leaves an orphaned fabric network for the operator to clean up.
    pub async fn create(
        &self,
        network: &LogicalNetwork,
        segment: &Segment,
    ) -> Result<NetworkCreateOutcome, SyncError> {
        if self.store.network_mapping(network.id).await?.is_some() {
            return Ok(NetworkCreateOutcome::Skipped(
                NetworkSkipReason::AlreadyMapped,
            ));
        }

        match policy::decide(segment, &self.index, &self.flat_mappings) {
            MappingType::Unmanaged => Ok(NetworkCreateOutcome::Skipped(
                NetworkSkipReason::Unmanaged,
            )),
            MappingType::Flat { fabric_network_id } => {
                self.store
                    .map_network(network.id, fabric_network_id, &[], false)
                    .await?;
                info!(
                    self.log,
                    "bound logical network to pre-existing fabric network";
                    "network_id" => %network.id,
                    "fabric_network_id" => fabric_network_id,
                );
                Ok(NetworkCreateOutcome::FlatMapped {
                    fabric_network_id: fabric_network_id.to_string(),
                })
            }
            MappingType::Uplinksets { uplinkset_ids } => {
                self.create_uplinkset_mapped(
                    network,
                    segment,
                    uplinkset_ids.to_vec(),
                )
                .await
            }
        }
    }

    async fn create_uplinkset_mapped(
        &self,
        network: &LogicalNetwork,
        segment: &Segment,
        uplinkset_ids: Vec<String>,
    ) -> Result<NetworkCreateOutcome, SyncError> {
        let physical_network =
            segment.physical_network.clone().unwrap_or_default();
        if uplinkset_ids.is_empty() {
            warn!(
                self.log,
                "physical network has no uplink set for this network type";
                "physical_network" => physical_network.as_str(),
                "network_type" => %segment.network_type,
            );
            return Ok(NetworkCreateOutcome::Skipped(
                NetworkSkipReason::NoUplinksets {
                    physical_network,
                    network_type: segment.network_type,
                },
            ));
        }

        let network_type = if segment.segmentation_id.is_some() {
            EthernetNetworkType::Tagged
        } else {
            EthernetNetworkType::Untagged
        };
        let params = EthernetNetworkCreate::new(
            fabric_network_name(network.id),
            network_type,
            segment.segmentation_id,
        );
        let created = self.client.ethernet_network_create(&params).await?;
        let fabric_network_id = id_from_uri(&created.uri).to_string();

        for uplinkset_id in &uplinkset_ids {
            if let Err(e) = self
                .client
                .uplink_set_add_network(uplinkset_id, &fabric_network_id)
                .await
            {
                error!(
                    self.log,
                    "failed to add network to uplink set";
                    "fabric_network_id" => fabric_network_id.as_str(),
                    "uplinkset_id" => uplinkset_id.as_str(),
                    "error" => %e,
                );
            }
        }

        // Bindings record intended attachments: the full resolved list is
        // persisted even if an attach above failed.
        self.store
            .map_network(network.id, &fabric_network_id, &uplinkset_ids, true)
            .await?;
        info!(
            self.log,
            "created fabric network";
            "network_id" => %network.id,
            "fabric_network_id" => fabric_network_id.as_str(),
            "uplinksets" => ?uplinkset_ids,
        );
        Ok(NetworkCreateOutcome::Created { fabric_network_id, uplinksets: uplinkset_ids })
    }

    /// Remove a logical network's reflection from the fabric.
    ///
    /// The fabric delete is best-effort: local bookkeeping is removed even
    /// when it fails, mirroring the orphan risk on the create side.
    pub async fn delete(
        &self,
        network: &LogicalNetwork,
    ) -> Result<NetworkDeleteOutcome, SyncError> {
        let Some(mapping) = self.store.network_mapping(network.id).await?
        else {
            return Ok(NetworkDeleteOutcome::NotMapped);
        };

        let mut fabric_deleted = false;
        if mapping.manageable {
            match self
                .client
                .ethernet_network_delete(&mapping.fabric_network_id)
                .await
            {
                Ok(()) => fabric_deleted = true,
                Err(e) => error!(
                    self.log,
                    "failed to delete fabric network; removing mapping anyway";
                    "fabric_network_id" => mapping.fabric_network_id.as_str(),
                    "error" => %e,
                ),
            }
        }

        self.store.unmap_network(network.id).await?;
        self.store
            .delete_uplinkset_bindings(&mapping.fabric_network_id)
            .await?;
        info!(
            self.log,
            "removed network mapping";
            "network_id" => %network.id,
            "fabric_network_id" => mapping.fabric_network_id.as_str(),
            "fabric_deleted" => fabric_deleted,
        );
        Ok(NetworkDeleteOutcome::Deleted {
            fabric_network_id: mapping.fabric_network_id,
            fabric_deleted,
        })
    }

    /// Bring a fabric network's uplink-set attachments in line with
    /// `desired`.
    ///
    /// Each attach/detach is isolated: a failure is recorded and the rest of
    /// the ids are still processed.  Bindings are updated only after the
    /// corresponding fabric call succeeds, so a failed id is retried on the
    /// next pass.
    pub async fn reconcile_uplinksets(
        &self,
        network: &LogicalNetwork,
        desired: &[String],
    ) -> Result<DriftOutcome, SyncError> {
        let Some(mapping) = self.store.network_mapping(network.id).await?
        else {
            return Ok(DriftOutcome::NotMapped);
        };
        if !mapping.manageable {
            return Ok(DriftOutcome::NotManageable);
        }
        let fabric_network_id = mapping.fabric_network_id.as_str();

        let current =
            self.store.network_uplinksets(fabric_network_id).await?;
        let mut drift = UplinksetDrift::default();

        for uplinkset_id in &current {
            if desired.contains(uplinkset_id) {
                continue;
            }
            match self
                .client
                .uplink_set_remove_network(uplinkset_id, fabric_network_id)
                .await
            {
                Ok(()) => {
                    self.store
                        .remove_uplinkset_binding(
                            fabric_network_id,
                            uplinkset_id,
                        )
                        .await?;
                    info!(
                        self.log,
                        "detached fabric network from uplink set";
                        "fabric_network_id" => fabric_network_id,
                        "uplinkset_id" => uplinkset_id.as_str(),
                    );
                    drift.detached.push(uplinkset_id.clone());
                }
                Err(e) => {
                    error!(
                        self.log,
                        "failed to remove network from uplink set";
                        "fabric_network_id" => fabric_network_id,
                        "uplinkset_id" => uplinkset_id.as_str(),
                        "error" => %e,
                    );
                    drift.failed.push(uplinkset_id.clone());
                }
            }
        }

        for uplinkset_id in desired {
            if current.contains(uplinkset_id) {
                continue;
            }
            match self
                .client
                .uplink_set_add_network(uplinkset_id, fabric_network_id)
                .await
            {
                Ok(()) => {
                    self.store
                        .add_uplinkset_binding(fabric_network_id, uplinkset_id)
                        .await?;
                    info!(
                        self.log,
                        "attached fabric network to uplink set";
                        "fabric_network_id" => fabric_network_id,
                        "uplinkset_id" => uplinkset_id.as_str(),
                    );
                    drift.attached.push(uplinkset_id.clone());
                }
                Err(e) => {
                    error!(
                        self.log,
                        "failed to add network to uplink set";
                        "fabric_network_id" => fabric_network_id,
                        "uplinkset_id" => uplinkset_id.as_str(),
                        "error" => %e,
                    );
                    drift.failed.push(uplinkset_id.clone());
                }
            }
        }

        Ok(DriftOutcome::Corrected(drift))
    }
}

#[async_trait]
impl Reconciler for NetworkReconciler {
    type Resource = (LogicalNetwork, Segment);
    type CreateOutcome = NetworkCreateOutcome;
    type DeleteOutcome = NetworkDeleteOutcome;
    type Error = SyncError;

    async fn create(
        &self,
        resource: &Self::Resource,
    ) -> Result<NetworkCreateOutcome, SyncError> {
        let (network, segment) = resource;
        NetworkReconciler::create(self, network, segment).await
    }

    async fn delete(
        &self,
        resource: &Self::Resource,
    ) -> Result<NetworkDeleteOutcome, SyncError> {
        let (network, _segment) = resource;
        NetworkReconciler::delete(self, network).await
    }
}
