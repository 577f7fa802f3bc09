// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for topology operations.

use crate::keys::{EdgeKey, FaceKey, ShapeKey, ShellKey, SolidKey, VertexKey, WireKey};

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during topology operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced shape was not found in the arena.
    #[error("shape not found: {0:?}")]
    NotFound(ShapeKey),

    /// Vertex key not found in the arena.
    #[error("vertex not found: {0:?}")]
    VertexNotFound(VertexKey),

    /// Edge key not found in the arena.
    #[error("edge not found: {0:?}")]
    EdgeNotFound(EdgeKey),

    /// Wire key not found in the arena.
    #[error("wire not found: {0:?}")]
    WireNotFound(WireKey),

    /// Face key not found in the arena.
    #[error("face not found: {0:?}")]
    FaceNotFound(FaceKey),

    /// Shell key not found in the arena.
    #[error("shell not found: {0:?}")]
    ShellNotFound(ShellKey),

    /// Solid key not found in the arena.
    #[error("solid not found: {0:?}")]
    SolidNotFound(SolidKey),

    /// The end points of an edge coincide.
    #[error("edge end points coincide")]
    DegenerateEdge,

    /// Edge usages in a wire are not connected end-to-end.
    #[error("wire edges are not connected: edge {0} endpoint does not match edge {1} startpoint")]
    DisconnectedWire(usize, usize),

    /// A wire must have at least one edge.
    #[error("wire must have at least one edge")]
    EmptyWire,

    /// A face boundary must enclose a non-zero area.
    #[error("face boundary is degenerate")]
    DegenerateFace,

    /// A face boundary wire must be closed.
    #[error("face boundary wire is not closed")]
    OpenWire,

    /// A shell must have at least one face.
    #[error("shell must have at least one face")]
    EmptyShell,

    /// The shell is not closed (has boundary edges).
    #[error("shell is not closed: {0} boundary edges remain")]
    OpenShell(usize),

    /// A compsolid must have at least one solid.
    #[error("compsolid must have at least one solid")]
    EmptyCompSolid,
}
