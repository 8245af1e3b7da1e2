// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Describes the Diesel database schema.
//!
//! `network` and `network_segment` belong to the tenant controller and are
//! only ever read; the `fabric_*` tables are owned by this system.

diesel::table! {
    network (id) {
        id -> Uuid,
        name -> Text,
    }
}

diesel::table! {
    network_segment (id) {
        id -> Uuid,
        network_id -> Uuid,
        physical_network -> Nullable<Text>,
        network_type -> Text,
        segmentation_id -> Nullable<Int4>,
    }
}

diesel::table! {
    fabric_network_mapping (logical_network_id) {
        logical_network_id -> Uuid,
        fabric_network_id -> Text,
        manageable -> Bool,
        time_created -> Timestamptz,
    }
}

diesel::table! {
    fabric_network_uplinkset (fabric_network_id, uplinkset_id) {
        fabric_network_id -> Text,
        uplinkset_id -> Text,
        time_created -> Timestamptz,
    }
}

diesel::joinable!(network_segment -> network (network_id));
diesel::allow_tables_to_appear_in_same_query!(network, network_segment);
