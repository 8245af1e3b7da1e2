// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Test-only implementation of the fabric client
//!
//! In lieu of any networked requests, [`FakeFabric`] keeps fabric state in
//! memory, records every call for later inspection, and lets tests inject
//! failures per resource.

use crate::FabricClient;
use crate::FabricError;
use crate::types::EthernetNetwork;
use crate::types::EthernetNetworkCreate;
use crate::types::EthernetNetworkType;
use crate::types::ServerHardware;
use crate::types::ServerProfile;
use crate::types::UplinkSet;
use crate::types::ethernet_network_uri;
use crate::types::id_from_uri;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;

/// How many times each fabric operation has been invoked
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub ethernet_network_creates: usize,
    pub ethernet_network_deletes: usize,
    pub uplink_set_gets: usize,
    pub uplink_set_attaches: usize,
    pub uplink_set_detaches: usize,
    pub server_hardware_gets: usize,
    pub server_profile_gets: usize,
    pub server_profile_updates: usize,
}

#[derive(Clone, Debug)]
struct FakeUplinkSet {
    ethernet_network_type: EthernetNetworkType,
    networks: BTreeSet<String>,
}

#[derive(Default)]
struct Inner {
    networks: BTreeMap<String, EthernetNetwork>,
    uplink_sets: BTreeMap<String, FakeUplinkSet>,
    server_hardware: BTreeMap<String, ServerHardware>,
    server_profiles: BTreeMap<String, ServerProfile>,
    counts: CallCounts,
    fail_uplink_set_gets: BTreeSet<String>,
    fail_uplink_set_attaches: BTreeSet<String>,
    fail_uplink_set_detaches: BTreeSet<String>,
    fail_network_creates: bool,
    fail_network_deletes: bool,
    next_network_id: u32,
}

/// In-memory fabric used by tests
#[derive(Default)]
pub struct FakeFabric {
    inner: Mutex<Inner>,
}

impl FakeFabric {
    pub fn new() -> FakeFabric {
        FakeFabric::default()
    }

    pub fn add_uplink_set(
        &self,
        uplinkset_id: &str,
        ethernet_network_type: EthernetNetworkType,
    ) {
        self.inner.lock().unwrap().uplink_sets.insert(
            uplinkset_id.to_string(),
            FakeUplinkSet {
                ethernet_network_type,
                networks: BTreeSet::new(),
            },
        );
    }

    /// Seed an ethernet network as if it pre-existed on the fabric (e.g. a
    /// flat-mapped network created outside this system).
    pub fn add_ethernet_network(&self, network: EthernetNetwork) {
        let id = id_from_uri(&network.uri).to_string();
        self.inner.lock().unwrap().networks.insert(id, network);
    }

    pub fn add_server_hardware(
        &self,
        server_hardware_id: &str,
        hardware: ServerHardware,
    ) {
        self.inner
            .lock()
            .unwrap()
            .server_hardware
            .insert(server_hardware_id.to_string(), hardware);
    }

    pub fn add_server_profile(&self, profile: ServerProfile) {
        self.inner
            .lock()
            .unwrap()
            .server_profiles
            .insert(profile.uri.clone(), profile);
    }

    pub fn fail_uplink_set_get(&self, uplinkset_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_uplink_set_gets
            .insert(uplinkset_id.to_string());
    }

    pub fn fail_uplink_set_attach(&self, uplinkset_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_uplink_set_attaches
            .insert(uplinkset_id.to_string());
    }

    pub fn fail_uplink_set_detach(&self, uplinkset_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_uplink_set_detaches
            .insert(uplinkset_id.to_string());
    }

    pub fn fail_network_creates(&self, fail: bool) {
        self.inner.lock().unwrap().fail_network_creates = fail;
    }

    pub fn fail_network_deletes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_network_deletes = fail;
    }

    pub fn counts(&self) -> CallCounts {
        self.inner.lock().unwrap().counts
    }

    pub fn ethernet_network(&self, network_id: &str) -> Option<EthernetNetwork> {
        self.inner.lock().unwrap().networks.get(network_id).cloned()
    }

    pub fn ethernet_networks(&self) -> Vec<EthernetNetwork> {
        self.inner.lock().unwrap().networks.values().cloned().collect()
    }

    /// Ids of the networks currently attached to an uplink set
    pub fn uplink_set_networks(&self, uplinkset_id: &str) -> BTreeSet<String> {
        self.inner
            .lock()
            .unwrap()
            .uplink_sets
            .get(uplinkset_id)
            .map(|u| u.networks.clone())
            .unwrap_or_default()
    }

    pub fn server_profile(&self, profile_uri: &str) -> Option<ServerProfile> {
        self.inner.lock().unwrap().server_profiles.get(profile_uri).cloned()
    }
}

#[async_trait]
impl FabricClient for FakeFabric {
    async fn ethernet_network_create(
        &self,
        params: &EthernetNetworkCreate,
    ) -> Result<EthernetNetwork, FabricError> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.ethernet_network_creates += 1;
        if inner.fail_network_creates {
            return Err(FabricError::new("injected network create failure"));
        }
        inner.next_network_id += 1;
        let id = format!("fab-net-{}", inner.next_network_id);
        let network = EthernetNetwork {
            uri: ethernet_network_uri(&id),
            name: params.name.clone(),
            ethernet_network_type: params.ethernet_network_type,
            vlan_id: params.vlan_id,
        };
        inner.networks.insert(id, network.clone());
        Ok(network)
    }

    async fn ethernet_network_delete(
        &self,
        network_id: &str,
    ) -> Result<(), FabricError> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.ethernet_network_deletes += 1;
        if inner.fail_network_deletes {
            return Err(FabricError::new("injected network delete failure"));
        }
        if inner.networks.remove(network_id).is_none() {
            return Err(FabricError::new(format!(
                "no such ethernet network: {}",
                network_id
            )));
        }
        Ok(())
    }

    async fn uplink_set_get(
        &self,
        uplinkset_id: &str,
    ) -> Result<UplinkSet, FabricError> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.uplink_set_gets += 1;
        if inner.fail_uplink_set_gets.contains(uplinkset_id) {
            return Err(FabricError::new("injected uplink set lookup failure"));
        }
        let uplink_set =
            inner.uplink_sets.get(uplinkset_id).ok_or_else(|| {
                FabricError::new(format!(
                    "no such uplink set: {}",
                    uplinkset_id
                ))
            })?;
        Ok(UplinkSet {
            ethernet_network_type: uplink_set.ethernet_network_type,
        })
    }

    async fn uplink_set_add_network(
        &self,
        uplinkset_id: &str,
        network_id: &str,
    ) -> Result<(), FabricError> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.uplink_set_attaches += 1;
        if inner.fail_uplink_set_attaches.contains(uplinkset_id) {
            return Err(FabricError::new("injected attach failure"));
        }
        let uplink_set =
            inner.uplink_sets.get_mut(uplinkset_id).ok_or_else(|| {
                FabricError::new(format!(
                    "no such uplink set: {}",
                    uplinkset_id
                ))
            })?;
        uplink_set.networks.insert(network_id.to_string());
        Ok(())
    }

    async fn uplink_set_remove_network(
        &self,
        uplinkset_id: &str,
        network_id: &str,
    ) -> Result<(), FabricError> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.uplink_set_detaches += 1;
        if inner.fail_uplink_set_detaches.contains(uplinkset_id) {
            return Err(FabricError::new("injected detach failure"));
        }
        let uplink_set =
            inner.uplink_sets.get_mut(uplinkset_id).ok_or_else(|| {
                FabricError::new(format!(
                    "no such uplink set: {}",
                    uplinkset_id
                ))
            })?;
        uplink_set.networks.remove(network_id);
        Ok(())
    }

    async fn server_hardware_get(
        &self,
        server_hardware_id: &str,
    ) -> Result<ServerHardware, FabricError> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.server_hardware_gets += 1;
        inner.server_hardware.get(server_hardware_id).cloned().ok_or_else(
            || {
                FabricError::new(format!(
                    "no such server hardware: {}",
                    server_hardware_id
                ))
            },
        )
    }

    async fn server_profile_get(
        &self,
        profile_uri: &str,
    ) -> Result<ServerProfile, FabricError> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.server_profile_gets += 1;
        inner.server_profiles.get(profile_uri).cloned().ok_or_else(|| {
            FabricError::new(format!(
                "no such server profile: {}",
                profile_uri
            ))
        })
    }

    async fn server_profile_update(
        &self,
        profile: &ServerProfile,
    ) -> Result<(), FabricError> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.server_profile_updates += 1;
        if !inner.server_profiles.contains_key(&profile.uri) {
            return Err(FabricError::new(format!(
                "no such server profile: {}",
                profile.uri
            )));
        }
        inner.server_profiles.insert(profile.uri.clone(), profile.clone());
        Ok(())
    }
}
