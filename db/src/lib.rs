// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relational mapping store
//!
//! Records, per logical network, which fabric network it maps to, which
//! uplink sets that fabric network is attached to, and whether the mapping is
//! manageable (created by this system) or flat (pre-existing on the fabric).
//!
//! The tenant controller's own tables (`network`, `network_segment`) are
//! read-only here.  The two mapping tables are exclusively owned and mutated
//! by the network reconciler; see the [`MappingStore`] trait for the
//! operations it relies on.

pub mod datastore;
pub mod error;
pub mod model;
pub mod schema;
mod store;

pub use datastore::DataStore;
pub use datastore::DbConnection;
pub use error::Error;
pub use store::MappingStore;
