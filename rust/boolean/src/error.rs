// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fatal error channel of the boolean engine.
//!
//! Recoverable anomalies never show up here: they are recorded as alerts in
//! a [`Report`](crate::report::Report) and surface through the tri-state
//! [`Status`](crate::report::Status). An [`Error`] means the caller broke
//! the contract of the entry point (for example passed a key that is not in
//! the arena).

use paver_topology::ShapeKey;

/// Result type alias for boolean operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An argument key does not exist in the arena.
    #[error("argument shape not found in arena: {0:?}")]
    UnknownShape(ShapeKey),

    /// Options could not be parsed.
    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),

    /// The topology layer rejected an operation outside of the pipeline.
    #[error(transparent)]
    Topology(#[from] paver_topology::Error),
}
