// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reflects bare-metal ports as connections on fabric server profiles
//!
//! Invoked per port event, not periodically.  The server profile is the
//! authoritative record of a port's connection; nothing is persisted
//! locally.

use crate::outcome::PortCreateOutcome;
use crate::outcome::PortDeleteOutcome;
use crate::outcome::PortSkipReason;
use crate::Reconciler;
use async_trait::async_trait;
use fabric_client::types::ethernet_network_uri;
use fabric_client::types::BootPriority;
use fabric_client::types::ConnectionBoot;
use fabric_client::types::ProfileConnection;
use fabric_client::types::ServerHardware;
use fabric_client::types::ServerProfile;
use fabric_client::types::FUNCTION_TYPE_ETHERNET;
use fabric_client::FabricClient;
use fabric_client::FabricError;
use fabric_sync_common::port::SwitchInfo;
use fabric_sync_common::port::VNIC_TYPE_BAREMETAL;
use fabric_sync_common::PortBinding;
use fabric_sync_db::MappingStore;
use slog::info;
use slog::o;
use slog::Logger;
use std::sync::Arc;

/// Error from reflecting one port onto the fabric
///
/// Unlike network reconciliation these are fatal for the operation: a port
/// whose server state cannot be resolved must not be half-reflected.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error(transparent)]
    Store(#[from] fabric_sync_db::Error),

    #[error(transparent)]
    Fabric(#[from] FabricError),

    #[error("server hardware {server_hardware_id} has no server profile")]
    NoServerProfile { server_hardware_id: String },

    #[error(
        "no port on server hardware {server_hardware_id} matches \
         MAC address {mac_address}"
    )]
    NoMatchingPort { server_hardware_id: String, mac_address: String },
}

/// A port that passed the eligibility gate
struct EligiblePort {
    fabric_network_id: String,
    server_hardware_id: String,
    bootable: bool,
}

#[derive(Clone)]
pub struct PortReconciler {
    store: Arc<dyn MappingStore>,
    client: Arc<dyn FabricClient>,
    log: Logger,
}

impl PortReconciler {
    pub fn new(
        store: Arc<dyn MappingStore>,
        client: Arc<dyn FabricClient>,
        log: &Logger,
    ) -> PortReconciler {
        PortReconciler {
            store,
            client,
            log: log.new(o!("component" => "PortReconciler")),
        }
    }

    /// Only bare-metal ports on mapped networks with exactly one complete
    /// local-link entry are reflected; everything else is a silent skip.
    async fn eligibility(
        &self,
        port: &PortBinding,
    ) -> Result<Result<EligiblePort, PortSkipReason>, PortError> {
        if port.vnic_type != VNIC_TYPE_BAREMETAL {
            return Ok(Err(PortSkipReason::NotBaremetal {
                vnic_type: port.vnic_type.clone(),
            }));
        }
        let Some(mapping) =
            self.store.network_mapping(port.network_id).await?
        else {
            return Ok(Err(PortSkipReason::NetworkNotMapped));
        };
        match port.local_link_information.as_slice() {
            [] => Ok(Err(PortSkipReason::MissingLinkInfo)),
            [link_info] => match &link_info.switch_info {
                Some(SwitchInfo {
                    server_hardware_id: Some(server_hardware_id),
                    bootable: Some(bootable),
                }) => Ok(Ok(EligiblePort {
                    fabric_network_id: mapping.fabric_network_id,
                    server_hardware_id: server_hardware_id.clone(),
                    bootable: *bootable,
                })),
                _ => Ok(Err(PortSkipReason::IncompleteSwitchInfo)),
            },
            _ => Ok(Err(PortSkipReason::MultipleLinkInfo)),
        }
    }

    async fn server_profile(
        &self,
        server_hardware_id: &str,
    ) -> Result<(ServerHardware, ServerProfile), PortError> {
        let hardware =
            self.client.server_hardware_get(server_hardware_id).await?;
        let Some(profile_uri) = hardware.server_profile_uri.as_deref() else {
            return Err(PortError::NoServerProfile {
                server_hardware_id: server_hardware_id.to_string(),
            });
        };
        let profile = self.client.server_profile_get(profile_uri).await?;
        Ok((hardware, profile))
    }

    /// Append a connection for this port's MAC to the owning server's
    /// profile.
    pub async fn create(
        &self,
        port: &PortBinding,
    ) -> Result<PortCreateOutcome, PortError> {
        let eligible = match self.eligibility(port).await? {
            Ok(eligible) => eligible,
            Err(reason) => {
                info!(
                    self.log,
                    "port not eligible for fabric reflection";
                    "mac_address" => port.mac_address.as_str(),
                    "reason" => ?reason,
                );
                return Ok(PortCreateOutcome::Skipped(reason));
            }
        };

        let (hardware, mut profile) =
            self.server_profile(&eligible.server_hardware_id).await?;
        let boot_priority =
            boot_priority(&profile.connections, eligible.bootable);
        let port_id = port_id_from_mac(&hardware, &port.mac_address)
            .ok_or_else(|| PortError::NoMatchingPort {
                server_hardware_id: eligible.server_hardware_id.clone(),
                mac_address: port.mac_address.clone(),
            })?;

        profile.connections.push(ProfileConnection {
            port_id: port_id.clone(),
            network_uri: ethernet_network_uri(&eligible.fabric_network_id),
            mac: None,
            boot: Some(ConnectionBoot { priority: boot_priority }),
            function_type: FUNCTION_TYPE_ETHERNET.to_string(),
        });
        self.client.server_profile_update(&profile).await?;
        info!(
            self.log,
            "added server profile connection";
            "server_hardware_id" => eligible.server_hardware_id.as_str(),
            "port_id" => port_id.as_str(),
            "boot_priority" => ?boot_priority,
        );
        Ok(PortCreateOutcome::ConnectionAdded { port_id, boot_priority })
    }

    /// Remove the connection matching this port's MAC, if any.
    pub async fn delete(
        &self,
        port: &PortBinding,
    ) -> Result<PortDeleteOutcome, PortError> {
        let eligible = match self.eligibility(port).await? {
            Ok(eligible) => eligible,
            Err(reason) => {
                info!(
                    self.log,
                    "port not eligible for fabric reflection";
                    "mac_address" => port.mac_address.as_str(),
                    "reason" => ?reason,
                );
                return Ok(PortDeleteOutcome::Skipped(reason));
            }
        };

        let (_, mut profile) =
            self.server_profile(&eligible.server_hardware_id).await?;
        let position = profile.connections.iter().position(|connection| {
            connection
                .mac
                .as_deref()
                .is_some_and(|mac| mac.eq_ignore_ascii_case(&port.mac_address))
        });
        let Some(position) = position else {
            return Ok(PortDeleteOutcome::NoMatchingConnection);
        };

        let connection = profile.connections.remove(position);
        self.client.server_profile_update(&profile).await?;
        info!(
            self.log,
            "removed server profile connection";
            "server_hardware_id" => eligible.server_hardware_id.as_str(),
            "port_id" => connection.port_id.as_str(),
        );
        Ok(PortDeleteOutcome::ConnectionRemoved {
            port_id: connection.port_id,
        })
    }
}

#[async_trait]
impl Reconciler for PortReconciler {
    type Resource = PortBinding;
    type CreateOutcome = PortCreateOutcome;
    type DeleteOutcome = PortDeleteOutcome;
    type Error = PortError;

    async fn create(
        &self,
        port: &PortBinding,
    ) -> Result<PortCreateOutcome, PortError> {
        PortReconciler::create(self, port).await
    }

    async fn delete(
        &self,
        port: &PortBinding,
    ) -> Result<PortDeleteOutcome, PortError> {
        PortReconciler::delete(self, port).await
    }
}

/// First free slot among Primary then Secondary for a bootable port;
/// NotBootable otherwise.
fn boot_priority(
    connections: &[ProfileConnection],
    bootable: bool,
) -> BootPriority {
    fn available(
        connections: &[ProfileConnection],
        priority: BootPriority,
    ) -> bool {
        !connections.iter().any(|connection| {
            connection.boot.as_ref().map(|boot| boot.priority)
                == Some(priority)
        })
    }

    if bootable {
        if available(connections, BootPriority::Primary) {
            return BootPriority::Primary;
        }
        if available(connections, BootPriority::Secondary) {
            return BootPriority::Secondary;
        }
    }
    BootPriority::NotBootable
}

/// Locate the physical port carrying a MAC in the server's port map and
/// render the fabric's port identifier for it.  Depth-first, first match
/// wins; MACs compare case-insensitively.
fn port_id_from_mac(
    hardware: &ServerHardware,
    mac_address: &str,
) -> Option<String> {
    let port_map = hardware.port_map.as_ref()?;
    for device_slot in &port_map.device_slots {
        for physical_port in &device_slot.physical_ports {
            for virtual_port in &physical_port.virtual_ports {
                let Some(mac) = virtual_port.mac.as_deref() else {
                    continue;
                };
                if mac.eq_ignore_ascii_case(mac_address) {
                    return Some(format!(
                        "{} {}:{}-{}",
                        device_slot.location,
                        device_slot.slot_number,
                        physical_port.port_number,
                        virtual_port.port_function,
                    ));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fakes::FakeMappingStore;
    use fabric_client::fake::FakeFabric;
    use fabric_client::types::DeviceSlot;
    use fabric_client::types::PhysicalPort;
    use fabric_client::types::PortMap;
    use fabric_client::types::VirtualPort;
    use fabric_sync_common::port::LocalLinkInformation;
    use uuid::Uuid;

    fn logger() -> Logger {
        Logger::root(slog::Discard, o!())
    }

    const MAC: &str = "AA:BB:CC:DD:EE:01";
    const PROFILE_URI: &str = "/rest/server-profiles/sp-1";

    fn port_map() -> PortMap {
        PortMap {
            device_slots: vec![DeviceSlot {
                location: "Flb".to_string(),
                slot_number: 1,
                physical_ports: vec![PhysicalPort {
                    port_number: 1,
                    virtual_ports: vec![VirtualPort {
                        mac: Some(MAC.to_string()),
                        port_function: "a".to_string(),
                    }],
                }],
            }],
        }
    }

    fn connection(mac: &str, priority: BootPriority) -> ProfileConnection {
        ProfileConnection {
            port_id: "Flb 1:1-a".to_string(),
            network_uri: "/rest/ethernet-networks/other".to_string(),
            mac: Some(mac.to_string()),
            boot: Some(ConnectionBoot { priority }),
            function_type: FUNCTION_TYPE_ETHERNET.to_string(),
        }
    }

    fn port(network_id: Uuid, vnic_type: &str) -> PortBinding {
        PortBinding {
            network_id,
            mac_address: MAC.to_string(),
            vnic_type: vnic_type.to_string(),
            local_link_information: vec![LocalLinkInformation {
                switch_info: Some(SwitchInfo {
                    server_hardware_id: Some("sh-1".to_string()),
                    bootable: Some(true),
                }),
            }],
        }
    }

    struct Harness {
        fabric: Arc<FakeFabric>,
        reconciler: PortReconciler,
        network_id: Uuid,
    }

    /// One mapped network and one server ("sh-1") whose profile starts with
    /// the given connections.
    fn harness(existing_connections: Vec<ProfileConnection>) -> Harness {
        let store = Arc::new(FakeMappingStore::new());
        let fabric = Arc::new(FakeFabric::new());
        let network_id = Uuid::new_v4();
        store.insert_mapping(network_id, "fab-1", &[], true);
        fabric.add_server_hardware(
            "sh-1",
            ServerHardware {
                server_profile_uri: Some(PROFILE_URI.to_string()),
                port_map: Some(port_map()),
            },
        );
        fabric.add_server_profile(ServerProfile {
            uri: PROFILE_URI.to_string(),
            name: Some("sp-1".to_string()),
            connections: existing_connections,
        });
        let reconciler = PortReconciler::new(
            store as Arc<dyn MappingStore>,
            fabric.clone() as Arc<dyn FabricClient>,
            &logger(),
        );
        Harness { fabric, reconciler, network_id }
    }

    #[tokio::test]
    async fn eligible_port_gets_profile_connection() {
        let h = harness(vec![]);

        let outcome = h
            .reconciler
            .create(&port(h.network_id, "baremetal"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PortCreateOutcome::ConnectionAdded {
                port_id: "Flb 1:1-a".to_string(),
                boot_priority: BootPriority::Primary,
            }
        );
        let profile = h.fabric.server_profile(PROFILE_URI).unwrap();
        assert_eq!(profile.connections.len(), 1);
        let added = &profile.connections[0];
        assert_eq!(added.network_uri, "/rest/ethernet-networks/fab-1");
        assert_eq!(added.function_type, "Ethernet");
        assert_eq!(added.mac, None);
    }

    #[tokio::test]
    async fn non_baremetal_port_performs_no_fabric_calls() {
        let h = harness(vec![]);

        let outcome = h
            .reconciler
            .create(&port(h.network_id, "normal"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PortCreateOutcome::Skipped(PortSkipReason::NotBaremetal {
                vnic_type: "normal".to_string()
            })
        );
        let counts = h.fabric.counts();
        assert_eq!(counts.server_hardware_gets, 0);
        assert_eq!(counts.server_profile_gets, 0);
        assert_eq!(counts.server_profile_updates, 0);
    }

    #[tokio::test]
    async fn port_on_unmapped_network_is_skipped() {
        let h = harness(vec![]);

        let outcome = h
            .reconciler
            .create(&port(Uuid::new_v4(), "baremetal"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PortCreateOutcome::Skipped(PortSkipReason::NetworkNotMapped)
        );
        assert_eq!(h.fabric.counts().server_profile_updates, 0);
    }

    #[tokio::test]
    async fn port_with_multiple_link_entries_is_skipped() {
        let h = harness(vec![]);
        let mut bad_port = port(h.network_id, "baremetal");
        bad_port
            .local_link_information
            .push(bad_port.local_link_information[0].clone());

        let outcome = h.reconciler.create(&bad_port).await.unwrap();

        assert_eq!(
            outcome,
            PortCreateOutcome::Skipped(PortSkipReason::MultipleLinkInfo)
        );
    }

    #[tokio::test]
    async fn port_with_incomplete_switch_info_is_skipped() {
        let h = harness(vec![]);
        let mut bad_port = port(h.network_id, "baremetal");
        bad_port.local_link_information[0].switch_info =
            Some(SwitchInfo {
                server_hardware_id: Some("sh-1".to_string()),
                bootable: None,
            });

        let outcome = h.reconciler.create(&bad_port).await.unwrap();

        assert_eq!(
            outcome,
            PortCreateOutcome::Skipped(PortSkipReason::IncompleteSwitchInfo)
        );
    }

    #[tokio::test]
    async fn second_bootable_port_gets_secondary_priority() {
        let h = harness(vec![connection(
            "AA:BB:CC:DD:EE:99",
            BootPriority::Primary,
        )]);

        let outcome = h
            .reconciler
            .create(&port(h.network_id, "baremetal"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PortCreateOutcome::ConnectionAdded {
                port_id: "Flb 1:1-a".to_string(),
                boot_priority: BootPriority::Secondary,
            }
        );
    }

    #[tokio::test]
    async fn non_bootable_port_is_never_boot_priority() {
        let h = harness(vec![]);
        let mut p = port(h.network_id, "baremetal");
        p.local_link_information[0].switch_info =
            Some(SwitchInfo {
                server_hardware_id: Some("sh-1".to_string()),
                bootable: Some(false),
            });

        let outcome = h.reconciler.create(&p).await.unwrap();

        assert_eq!(
            outcome,
            PortCreateOutcome::ConnectionAdded {
                port_id: "Flb 1:1-a".to_string(),
                boot_priority: BootPriority::NotBootable,
            }
        );
    }

    #[tokio::test]
    async fn mac_comparison_is_case_insensitive() {
        let h = harness(vec![]);
        let mut p = port(h.network_id, "baremetal");
        p.mac_address = MAC.to_lowercase();

        let outcome = h.reconciler.create(&p).await.unwrap();

        assert!(matches!(
            outcome,
            PortCreateOutcome::ConnectionAdded { .. }
        ));
    }

    #[tokio::test]
    async fn unknown_mac_is_fatal() {
        let h = harness(vec![]);
        let mut p = port(h.network_id, "baremetal");
        p.mac_address = "00:00:00:00:00:00".to_string();

        let err = h.reconciler.create(&p).await.unwrap_err();

        assert!(matches!(err, PortError::NoMatchingPort { .. }));
        assert_eq!(h.fabric.counts().server_profile_updates, 0);
    }

    #[tokio::test]
    async fn server_without_profile_is_fatal() {
        let h = harness(vec![]);
        h.fabric.add_server_hardware(
            "sh-1",
            ServerHardware {
                server_profile_uri: None,
                port_map: Some(port_map()),
            },
        );

        let err = h
            .reconciler
            .create(&port(h.network_id, "baremetal"))
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::NoServerProfile { .. }));
    }

    #[tokio::test]
    async fn delete_removes_matching_connection() {
        let h = harness(vec![connection(MAC, BootPriority::Primary)]);

        let outcome = h
            .reconciler
            .delete(&port(h.network_id, "baremetal"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PortDeleteOutcome::ConnectionRemoved {
                port_id: "Flb 1:1-a".to_string()
            }
        );
        assert!(h
            .fabric
            .server_profile(PROFILE_URI)
            .unwrap()
            .connections
            .is_empty());
    }

    #[tokio::test]
    async fn delete_without_matching_connection_is_noop() {
        let h = harness(vec![connection(
            "AA:BB:CC:DD:EE:99",
            BootPriority::Primary,
        )]);

        let outcome = h
            .reconciler
            .delete(&port(h.network_id, "baremetal"))
            .await
            .unwrap();

        assert_eq!(outcome, PortDeleteOutcome::NoMatchingConnection);
        let counts = h.fabric.counts();
        // One profile fetch, zero mutations.
        assert_eq!(counts.server_profile_gets, 1);
        assert_eq!(counts.server_profile_updates, 0);
    }

    #[test]
    fn boot_priority_fills_primary_then_secondary() {
        let none: Vec<ProfileConnection> = vec![];
        assert_eq!(boot_priority(&none, true), BootPriority::Primary);

        let primary_taken =
            vec![connection("AA:BB:CC:DD:EE:99", BootPriority::Primary)];
        assert_eq!(
            boot_priority(&primary_taken, true),
            BootPriority::Secondary
        );

        let both_taken = vec![
            connection("AA:BB:CC:DD:EE:98", BootPriority::Primary),
            connection("AA:BB:CC:DD:EE:99", BootPriority::Secondary),
        ];
        assert_eq!(
            boot_priority(&both_taken, true),
            BootPriority::NotBootable
        );

        assert_eq!(boot_priority(&none, false), BootPriority::NotBootable);
        assert_eq!(
            boot_priority(&primary_taken, false),
            BootPriority::NotBootable
        );
    }
}
