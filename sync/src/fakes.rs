// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Test-only implementation of the mapping store
//!
//! Keeps the mapping tables in memory so reconciler tests can assert on
//! exactly what was persisted.  The fabric-side counterpart lives in
//! `fabric_client::fake`.

use async_trait::async_trait;
use fabric_sync_common::LogicalNetwork;
use fabric_sync_common::Segment;
use fabric_sync_db::model::NetworkMapping;
use fabric_sync_db::Error;
use fabric_sync_db::MappingStore;
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    networks: Vec<(LogicalNetwork, Segment)>,
    mappings: BTreeMap<Uuid, NetworkMapping>,
    /// (fabric_network_id, uplinkset_id) rows, in insertion order
    bindings: Vec<(String, String)>,
}

#[derive(Default)]
pub struct FakeMappingStore {
    inner: Mutex<Inner>,
}

impl FakeMappingStore {
    pub fn new() -> FakeMappingStore {
        FakeMappingStore::default()
    }

    /// Declare a logical network with its segment, as the tenant controller
    /// would.
    pub fn add_network(&self, network: LogicalNetwork, segment: Segment) {
        self.inner.lock().unwrap().networks.push((network, segment));
    }

    /// Seed a mapping with bindings, as if a previous reconciliation had
    /// persisted it.
    pub fn insert_mapping(
        &self,
        network_id: Uuid,
        fabric_network_id: &str,
        uplinkset_ids: &[&str],
        manageable: bool,
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner.mappings.insert(
            network_id,
            NetworkMapping::new(network_id, fabric_network_id, manageable),
        );
        for uplinkset_id in uplinkset_ids {
            inner.bindings.push((
                fabric_network_id.to_string(),
                uplinkset_id.to_string(),
            ));
        }
    }

    pub fn mapping(&self, network_id: Uuid) -> Option<NetworkMapping> {
        self.inner.lock().unwrap().mappings.get(&network_id).cloned()
    }

    pub fn bindings_for(&self, fabric_network_id: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .bindings
            .iter()
            .filter(|(fabric, _)| fabric == fabric_network_id)
            .map(|(_, uplinkset)| uplinkset.clone())
            .collect()
    }
}

#[async_trait]
impl MappingStore for FakeMappingStore {
    async fn networks_with_segments(
        &self,
    ) -> Result<Vec<(LogicalNetwork, Segment)>, Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .networks
            .iter()
            .filter(|(_, segment)| segment.physical_network.is_some())
            .cloned()
            .collect())
    }

    async fn networks(&self) -> Result<Vec<LogicalNetwork>, Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .networks
            .iter()
            .map(|(network, _)| network.clone())
            .collect())
    }

    async fn network_segment(
        &self,
        network_id: Uuid,
    ) -> Result<Option<Segment>, Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .networks
            .iter()
            .find(|(network, _)| network.id == network_id)
            .map(|(_, segment)| segment.clone()))
    }

    async fn network_mapping(
        &self,
        network_id: Uuid,
    ) -> Result<Option<NetworkMapping>, Error> {
        Ok(self.mapping(network_id))
    }

    async fn network_uplinksets(
        &self,
        fabric_network_id: &str,
    ) -> Result<Vec<String>, Error> {
        Ok(self.bindings_for(fabric_network_id))
    }

    async fn map_network(
        &self,
        network_id: Uuid,
        fabric_network_id: &str,
        uplinkset_ids: &[String],
        manageable: bool,
    ) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        inner.mappings.entry(network_id).or_insert_with(|| {
            NetworkMapping::new(network_id, fabric_network_id, manageable)
        });
        for uplinkset_id in uplinkset_ids {
            let row =
                (fabric_network_id.to_string(), uplinkset_id.clone());
            if !inner.bindings.contains(&row) {
                inner.bindings.push(row);
            }
        }
        Ok(())
    }

    async fn unmap_network(&self, network_id: Uuid) -> Result<(), Error> {
        self.inner.lock().unwrap().mappings.remove(&network_id);
        Ok(())
    }

    async fn delete_uplinkset_bindings(
        &self,
        fabric_network_id: &str,
    ) -> Result<(), Error> {
        self.inner
            .lock()
            .unwrap()
            .bindings
            .retain(|(fabric, _)| fabric != fabric_network_id);
        Ok(())
    }

    async fn add_uplinkset_binding(
        &self,
        fabric_network_id: &str,
        uplinkset_id: &str,
    ) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        let row =
            (fabric_network_id.to_string(), uplinkset_id.to_string());
        if !inner.bindings.contains(&row) {
            inner.bindings.push(row);
        }
        Ok(())
    }

    async fn remove_uplinkset_binding(
        &self,
        fabric_network_id: &str,
        uplinkset_id: &str,
    ) -> Result<(), Error> {
        self.inner.lock().unwrap().bindings.retain(|(fabric, uplinkset)| {
            !(fabric == fabric_network_id && uplinkset == uplinkset_id)
        });
        Ok(())
    }
}
