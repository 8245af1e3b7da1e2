// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Types shared across the fabric-sync workspace
//!
//! This crate holds the view types for tenant-controller resources (logical
//! networks, segments, port bindings) and the operator-supplied mapping
//! configuration.  Everything here is read-only from the perspective of the
//! reconciliation core: the tenant controller owns the resources, the
//! operator owns the configuration.

pub mod config;
pub mod network;
pub mod port;

pub use config::FlatNetMappings;
pub use config::UplinksetMappings;
pub use network::LogicalNetwork;
pub use network::NetworkType;
pub use network::Segment;
pub use port::PortBinding;
