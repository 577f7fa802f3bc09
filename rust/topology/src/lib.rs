// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Paver Topology
//!
//! Boundary-representation (B-rep) data model consumed by the boolean
//! engine.
//!
//! Shapes (vertices, edges, wires, faces, shells, solids, compsolids and
//! compounds) live in slot maps owned by a [`ShapeArena`] and are addressed
//! by stable, generational keys. A parent refers to a child through a small
//! [`Oriented`] usage record, so one child can be shared by many parents
//! with a different sense in each of them. Ancestor queries ("which faces
//! use this edge") are answered by an inverse index built on demand instead
//! of back-pointers stored on the shapes.
//!
//! Geometry is polyhedral: every edge carries a straight [`Line`] with a
//! parameter range, every face a [`Plane`] with boundary wires.

pub mod arena;
pub mod bnd;
pub mod builders;
pub mod construction;
pub mod error;
pub mod geom;
pub mod geometry;
pub mod keys;
pub mod precision;
pub mod query;
pub mod spatial;
pub mod traversal;

pub use arena::{
    CompSolidData, CompoundData, EdgeData, FaceData, ShapeArena, ShellData, SolidData,
    VertexData, WireData,
};
pub use bnd::Aabb;
pub use error::{Error, Result};
pub use geom::{Line, Plane};
pub use keys::{
    CompSolidKey, CompoundKey, EdgeKey, FaceKey, Orientation, Oriented, ShapeKey, ShapeType,
    ShellKey, SolidKey, VertexKey, WireKey,
};
pub use spatial::SpatialIndex;
pub use traversal::AncestorIndex;
