// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use fabric_sync_common::network::UnsupportedNetworkType;

/// Error produced by mapping-store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("failed to obtain database connection: {0}")]
    Connection(String),

    /// A row read back from the store could not be converted into its domain
    /// type (e.g. a segment with an encapsulation type this system does not
    /// reflect).
    #[error("invalid row in mapping store: {0}")]
    InvalidRow(String),
}

impl From<UnsupportedNetworkType> for Error {
    fn from(e: UnsupportedNetworkType) -> Error {
        Error::InvalidRow(e.to_string())
    }
}
