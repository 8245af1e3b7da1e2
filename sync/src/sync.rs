// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic reconciliation of declared topology against the mapping store
//!
//! Two passes run on every activation: uplink-set drift correction for
//! networks that have been reconciled before, then creation of fabric
//! networks for declared networks that have not.  Either pass alone is
//! idempotent; with no intervening drift, an activation performs no fabric
//! mutations at all.

use crate::network::NetworkReconciler;
use crate::outcome::CreateEntry;
use crate::outcome::DriftEntry;
use crate::outcome::ItemResult;
use crate::outcome::NetworkCreateOutcome;
use crate::outcome::SyncReport;
use crate::SyncError;
use fabric_sync_common::LogicalNetwork;
use fabric_sync_common::UplinksetMappings;
use fabric_sync_db::MappingStore;
use slog::error;
use slog::info;
use slog::o;
use slog::Logger;
use std::sync::Arc;

/// One-shot, re-runnable sync of all declared networks
///
/// Expected to be activated serially by the embedding service's scheduler;
/// there is no internal mutual exclusion against overlapping activations.
pub struct PeriodicSync {
    store: Arc<dyn MappingStore>,
    reconciler: NetworkReconciler,
    uplinkset_mappings: UplinksetMappings,
    log: Logger,
}

impl PeriodicSync {
    pub fn new(
        store: Arc<dyn MappingStore>,
        reconciler: NetworkReconciler,
        uplinkset_mappings: UplinksetMappings,
        log: &Logger,
    ) -> PeriodicSync {
        PeriodicSync {
            store,
            reconciler,
            uplinkset_mappings,
            log: log.new(o!("component" => "PeriodicSync")),
        }
    }

    /// Run both passes and report what happened to each network.  One
    /// network's failure never aborts the pass.
    pub async fn activate(&self) -> SyncReport {
        let mut report = SyncReport::default();
        self.sync_uplinkset_drift(&mut report).await;
        self.sync_unmapped_networks(&mut report).await;
        info!(
            self.log,
            "fabric sync pass complete";
            "drift_entries" => report.drift.len(),
            "create_entries" => report.creates.len(),
            "failures" => report.failures(),
        );
        report
    }

    /// Pass 1: correct uplink-set attachment drift for every declared
    /// network whose physical network the operator mapped to uplink sets.
    async fn sync_uplinkset_drift(&self, report: &mut SyncReport) {
        let pairs = match self.store.networks_with_segments().await {
            Ok(pairs) => pairs,
            Err(e) => {
                error!(
                    self.log,
                    "failed to list networks with segments";
                    "error" => %e,
                );
                return;
            }
        };

        for (network, segment) in pairs {
            let Some(physical_network) =
                segment.physical_network.as_deref()
            else {
                continue;
            };
            if !self.uplinkset_mappings.contains(physical_network) {
                continue;
            }
            let desired = self.uplinkset_mappings.uplinksets(physical_network);

            let result = match self
                .reconciler
                .reconcile_uplinksets(&network, desired)
                .await
            {
                Ok(outcome) => ItemResult::Ok(outcome),
                Err(e) => {
                    error!(
                        self.log,
                        "uplink-set drift correction failed";
                        "network_id" => %network.id,
                        "error" => %e,
                    );
                    ItemResult::Failed { message: e.to_string() }
                }
            };
            report
                .drift
                .push(DriftEntry { network_id: network.id, result });
        }
    }

    /// Pass 2: create fabric networks for declared networks that have never
    /// been reconciled.
    async fn sync_unmapped_networks(&self, report: &mut SyncReport) {
        let networks = match self.store.networks().await {
            Ok(networks) => networks,
            Err(e) => {
                error!(
                    self.log,
                    "failed to list networks";
                    "error" => %e,
                );
                return;
            }
        };

        for network in networks {
            match self.sync_one_network(&network).await {
                Ok(None) => {}
                Ok(Some(outcome)) => report.creates.push(CreateEntry {
                    network_id: network.id,
                    result: ItemResult::Ok(outcome),
                }),
                Err(e) => {
                    error!(
                        self.log,
                        "failed to create fabric network";
                        "network_id" => %network.id,
                        "error" => %e,
                    );
                    report.creates.push(CreateEntry {
                        network_id: network.id,
                        result: ItemResult::Failed {
                            message: e.to_string(),
                        },
                    });
                }
            }
        }
    }

    /// `None` when the network is out of this pass's scope: already mapped,
    /// no segment, or no physical network.
    async fn sync_one_network(
        &self,
        network: &LogicalNetwork,
    ) -> Result<Option<NetworkCreateOutcome>, SyncError> {
        if self.store.network_mapping(network.id).await?.is_some() {
            return Ok(None);
        }
        let Some(segment) =
            self.store.network_segment(network.id).await?
        else {
            return Ok(None);
        };
        if segment.physical_network.is_none() {
            return Ok(None);
        }
        Ok(Some(self.reconciler.create(network, &segment).await?))
    }
}
