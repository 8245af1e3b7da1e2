// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uplink sets bucketed by the tagging type the fabric reports for them

use fabric_client::types::EthernetNetworkType;
use fabric_client::FabricClient;
use fabric_sync_common::NetworkType;
use fabric_sync_common::UplinksetMappings;
use slog::error;
use slog::Logger;
use std::collections::BTreeMap;

/// The operator's uplink-set table refined by what the fabric actually says
/// each uplink set carries
///
/// Immutable after construction; stale until the owning [`crate::FabricSync`]
/// is rebuilt.
#[derive(Clone, Debug, Default)]
pub struct UplinksetTypeIndex {
    tagged: BTreeMap<String, Vec<String>>,
    untagged: BTreeMap<String, Vec<String>>,
}

impl UplinksetTypeIndex {
    pub fn new(
        tagged: BTreeMap<String, Vec<String>>,
        untagged: BTreeMap<String, Vec<String>>,
    ) -> UplinksetTypeIndex {
        UplinksetTypeIndex { tagged, untagged }
    }

    /// Ask the fabric for each configured uplink set's tagging type and
    /// bucket accordingly.
    ///
    /// An uplink set whose lookup fails is included under both buckets: we
    /// could not confirm its type, and dropping it would silently stop
    /// managing a physical network the operator configured.
    pub async fn build(
        client: &dyn FabricClient,
        mappings: &UplinksetMappings,
        log: &Logger,
    ) -> UplinksetTypeIndex {
        let mut index = UplinksetTypeIndex::default();
        for (physical_network, uplinkset_ids) in mappings.iter() {
            for uplinkset_id in uplinkset_ids {
                match client.uplink_set_get(uplinkset_id).await {
                    Ok(uplink_set) => {
                        let bucket = match uplink_set.ethernet_network_type {
                            EthernetNetworkType::Tagged => &mut index.tagged,
                            EthernetNetworkType::Untagged => {
                                &mut index.untagged
                            }
                        };
                        bucket
                            .entry(physical_network.clone())
                            .or_default()
                            .push(uplinkset_id.clone());
                    }
                    Err(e) => {
                        error!(
                            log,
                            "failed to look up uplink set; \
                             including it without type confirmation";
                            "uplinkset_id" => uplinkset_id.as_str(),
                            "physical_network" => physical_network.as_str(),
                            "error" => %e,
                        );
                        for bucket in
                            [&mut index.tagged, &mut index.untagged]
                        {
                            bucket
                                .entry(physical_network.clone())
                                .or_default()
                                .push(uplinkset_id.clone());
                        }
                    }
                }
            }
        }
        index
    }

    /// Whether any uplink set (of either type) is indexed for this physical
    /// network
    pub fn contains(&self, physical_network: &str) -> bool {
        self.tagged.contains_key(physical_network)
            || self.untagged.contains_key(physical_network)
    }

    /// The uplink sets that should carry segments of the given type on this
    /// physical network.  Empty when none resolved, which callers treat as a
    /// configuration gap.
    pub fn for_network_type(
        &self,
        network_type: NetworkType,
        physical_network: &str,
    ) -> &[String] {
        let bucket = if network_type.is_tagged() {
            &self.tagged
        } else {
            &self.untagged
        };
        bucket
            .get(physical_network)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }
}
