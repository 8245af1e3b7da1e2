// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operator-supplied mapping configuration
//!
//! These tables arrive already parsed (configuration loading happens in the
//! embedding service) and are immutable for the lifetime of the process.
//! They are threaded into the reconcilers by parameter, never read from
//! ambient state.

use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// Physical network name -> uplink-set ids that should carry its networks
///
/// This is the raw operator table.  It says nothing about whether each uplink
/// set carries tagged or untagged traffic; the uplink-set type index refines
/// it by asking the fabric.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UplinksetMappings(BTreeMap<String, Vec<String>>);

impl UplinksetMappings {
    pub fn new(mappings: BTreeMap<String, Vec<String>>) -> Self {
        Self(mappings)
    }

    pub fn contains(&self, physical_network: &str) -> bool {
        self.0.contains_key(physical_network)
    }

    /// The configured uplink-set ids for a physical network, irrespective of
    /// tagging type
    pub fn uplinksets(&self, physical_network: &str) -> &[String] {
        self.0.get(physical_network).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&String, &Vec<String>)> + '_ {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for UplinksetMappings {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(
        iter: T,
    ) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Physical network name -> id of a pre-existing fabric network
///
/// Networks resolved through this table were not created by this system and
/// must never be deleted or re-attached by it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FlatNetMappings(BTreeMap<String, String>);

impl FlatNetMappings {
    pub fn new(mappings: BTreeMap<String, String>) -> Self {
        Self(mappings)
    }

    pub fn contains(&self, physical_network: &str) -> bool {
        self.0.contains_key(physical_network)
    }

    /// The pre-existing fabric network mapped to a physical network, if any
    pub fn fabric_network(&self, physical_network: &str) -> Option<&str> {
        self.0.get(physical_network).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for FlatNetMappings {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
