// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pure decision logic: how (and whether) a segment maps onto the fabric

use crate::index::UplinksetTypeIndex;
use fabric_sync_common::FlatNetMappings;
use fabric_sync_common::NetworkType;
use fabric_sync_common::Segment;

/// How a logical network's segment resolves against the operator's tables
#[derive(Clone, Debug, PartialEq)]
pub enum MappingType<'a> {
    /// The physical network is in no mapping table; the logical network is
    /// left alone.
    Unmanaged,
    /// The segment maps onto a pre-existing fabric network that this system
    /// must never mutate.
    Flat { fabric_network_id: &'a str },
    /// The segment maps onto a fabric network this system creates and
    /// attaches to the resolved uplink sets.  The list can be empty when the
    /// physical network is indexed only under the other tagging type; callers
    /// treat that as a configuration gap (log and skip).
    Uplinksets { uplinkset_ids: &'a [String] },
}

/// Resolve a segment against the uplink-set index and the flat table.
///
/// Vlan segments are checked against the uplink-set index first: a physical
/// network may legally appear in both tables, and a vlan segment carries a
/// concrete tag that must not fall through to the flat mapping.
pub fn decide<'a>(
    segment: &Segment,
    index: &'a UplinksetTypeIndex,
    flat_mappings: &'a FlatNetMappings,
) -> MappingType<'a> {
    let Some(physical_network) = segment.physical_network.as_deref() else {
        return MappingType::Unmanaged;
    };
    let in_index = index.contains(physical_network);

    if segment.network_type == NetworkType::Vlan && in_index {
        return MappingType::Uplinksets {
            uplinkset_ids: index
                .for_network_type(segment.network_type, physical_network),
        };
    }
    if let Some(fabric_network_id) =
        flat_mappings.fabric_network(physical_network)
    {
        return MappingType::Flat { fabric_network_id };
    }
    if in_index {
        return MappingType::Uplinksets {
            uplinkset_ids: index
                .for_network_type(segment.network_type, physical_network),
        };
    }
    MappingType::Unmanaged
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BTreeMap;

    fn segment(network_type: NetworkType, physnet: Option<&str>) -> Segment {
        Segment {
            physical_network: physnet.map(|s| s.to_string()),
            network_type,
            segmentation_id: match network_type {
                NetworkType::Flat => None,
                _ => Some(100),
            },
        }
    }

    fn index_with(physnet: &str) -> UplinksetTypeIndex {
        UplinksetTypeIndex::new(
            BTreeMap::from([(
                physnet.to_string(),
                vec!["us-1".to_string()],
            )]),
            BTreeMap::new(),
        )
    }

    fn flat_with(physnet: &str) -> FlatNetMappings {
        FlatNetMappings::new(BTreeMap::from([(
            physnet.to_string(),
            "existing-net".to_string(),
        )]))
    }

    #[test]
    fn vlan_prefers_uplinksets_over_flat() {
        // "physnetA" is in both tables; the vlan segment must resolve
        // through uplink sets.
        let index = index_with("physnetA");
        let flat = flat_with("physnetA");
        let decision = decide(
            &segment(NetworkType::Vlan, Some("physnetA")),
            &index,
            &flat,
        );
        assert_eq!(
            decision,
            MappingType::Uplinksets {
                uplinkset_ids: &["us-1".to_string()]
            }
        );
    }

    #[test]
    fn flat_segment_in_flat_table_only_is_flat_mapped() {
        let index = UplinksetTypeIndex::default();
        let flat = flat_with("physnetB");
        let decision = decide(
            &segment(NetworkType::Flat, Some("physnetB")),
            &index,
            &flat,
        );
        assert_eq!(
            decision,
            MappingType::Flat { fabric_network_id: "existing-net" }
        );
    }

    #[test]
    fn flat_table_wins_over_uplinksets_for_non_vlan() {
        // A non-vlan segment whose physnet is in both tables resolves flat.
        let index = index_with("physnetC");
        let flat = flat_with("physnetC");
        let decision = decide(
            &segment(NetworkType::Vxlan, Some("physnetC")),
            &index,
            &flat,
        );
        assert_eq!(
            decision,
            MappingType::Flat { fabric_network_id: "existing-net" }
        );
    }

    #[test]
    fn non_vlan_segment_falls_back_to_uplinksets() {
        let index = index_with("physnetD");
        let flat = FlatNetMappings::default();
        let decision = decide(
            &segment(NetworkType::Vxlan, Some("physnetD")),
            &index,
            &flat,
        );
        assert_eq!(
            decision,
            MappingType::Uplinksets {
                uplinkset_ids: &["us-1".to_string()]
            }
        );
    }

    #[test]
    fn unknown_physnet_is_unmanaged() {
        let index = index_with("physnetE");
        let flat = flat_with("physnetE");
        let decision = decide(
            &segment(NetworkType::Vlan, Some("elsewhere")),
            &index,
            &flat,
        );
        assert_eq!(decision, MappingType::Unmanaged);
    }

    #[test]
    fn segment_without_physnet_is_unmanaged() {
        let index = index_with("physnetF");
        let flat = flat_with("physnetF");
        let decision = decide(
            &segment(NetworkType::Vlan, None),
            &index,
            &flat,
        );
        assert_eq!(decision, MappingType::Unmanaged);
    }

    #[test]
    fn selection_is_empty_when_only_other_tag_type_is_indexed() {
        // The index knows "physnetG" only under tagged uplink sets; a flat
        // segment resolves to uplink-set mapping with nothing selected.
        let index = index_with("physnetG");
        let flat = FlatNetMappings::default();
        let decision = decide(
            &segment(NetworkType::Flat, Some("physnetG")),
            &index,
            &flat,
        );
        assert_eq!(
            decision,
            MappingType::Uplinksets { uplinkset_ids: &[] }
        );
    }
}
