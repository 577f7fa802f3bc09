// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shape key types for arena-based storage.
//!
//! Each shape gets a unique, type-safe key for O(1) lookup in the arena.
//! Keys are created by `slotmap::SlotMap` and remain valid even after other
//! shapes are removed (generational indices). Identity of a shape is the
//! identity of its key: two parents referencing the same key share the
//! child.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Key for a vertex (point with a tolerance sphere).
    pub struct VertexKey;

    /// Key for an edge (trimmed straight curve between two vertices).
    pub struct EdgeKey;

    /// Key for a wire (ordered chain of connected edge usages).
    pub struct WireKey;

    /// Key for a face (planar region bounded by wires).
    pub struct FaceKey;

    /// Key for a shell (connected set of face usages).
    pub struct ShellKey;

    /// Key for a solid (volume bounded by an outer shell and cavities).
    pub struct SolidKey;

    /// Key for a compsolid (solids sharing faces).
    pub struct CompSolidKey;

    /// Key for a compound (free collection of shapes).
    pub struct CompoundKey;
}

/// A key that can reference any shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeKey {
    Vertex(VertexKey),
    Edge(EdgeKey),
    Wire(WireKey),
    Face(FaceKey),
    Shell(ShellKey),
    Solid(SolidKey),
    CompSolid(CompSolidKey),
    Compound(CompoundKey),
}

impl ShapeKey {
    /// Returns the shape type of this key.
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeKey::Vertex(_) => ShapeType::Vertex,
            ShapeKey::Edge(_) => ShapeType::Edge,
            ShapeKey::Wire(_) => ShapeType::Wire,
            ShapeKey::Face(_) => ShapeType::Face,
            ShapeKey::Shell(_) => ShapeType::Shell,
            ShapeKey::Solid(_) => ShapeType::Solid,
            ShapeKey::CompSolid(_) => ShapeType::CompSolid,
            ShapeKey::Compound(_) => ShapeType::Compound,
        }
    }

    pub fn as_vertex(&self) -> Option<VertexKey> {
        match *self {
            ShapeKey::Vertex(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<EdgeKey> {
        match *self {
            ShapeKey::Edge(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_face(&self) -> Option<FaceKey> {
        match *self {
            ShapeKey::Face(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_shell(&self) -> Option<ShellKey> {
        match *self {
            ShapeKey::Shell(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_solid(&self) -> Option<SolidKey> {
        match *self {
            ShapeKey::Solid(k) => Some(k),
            _ => None,
        }
    }
}

/// Discriminant for shape types, ordered by dimension of the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeType {
    Vertex = 0,
    Edge = 1,
    Wire = 2,
    Face = 3,
    Shell = 4,
    Solid = 5,
    CompSolid = 6,
    Compound = 7,
}

impl ShapeType {
    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeType::Vertex => "Vertex",
            ShapeType::Edge => "Edge",
            ShapeType::Wire => "Wire",
            ShapeType::Face => "Face",
            ShapeType::Shell => "Shell",
            ShapeType::Solid => "Solid",
            ShapeType::CompSolid => "CompSolid",
            ShapeType::Compound => "Compound",
        }
    }
}

impl std::fmt::Display for ShapeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sense in which a parent uses a child shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Forward,
    Reversed,
}

impl Orientation {
    /// Returns the opposite orientation.
    pub fn reversed(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reversed,
            Orientation::Reversed => Orientation::Forward,
        }
    }

    /// Composes a usage orientation with the orientation of its parent.
    pub fn compose(self, parent: Orientation) -> Self {
        if parent == Orientation::Forward {
            self
        } else {
            self.reversed()
        }
    }

    /// `1.0` for forward, `-1.0` for reversed.
    pub fn sign(self) -> f64 {
        match self {
            Orientation::Forward => 1.0,
            Orientation::Reversed => -1.0,
        }
    }
}

/// A usage of a child shape inside a parent: the child key plus the sense
/// in which the parent traverses it. Never a copy of the child payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Oriented<K> {
    pub key: K,
    pub orientation: Orientation,
}

impl<K: Copy> Oriented<K> {
    pub fn forward(key: K) -> Self {
        Self {
            key,
            orientation: Orientation::Forward,
        }
    }

    pub fn reversed_of(key: K) -> Self {
        Self {
            key,
            orientation: Orientation::Reversed,
        }
    }

    pub fn new(key: K, orientation: Orientation) -> Self {
        Self { key, orientation }
    }

    /// Returns the same child used in the opposite sense.
    pub fn reversed(self) -> Self {
        Self {
            key: self.key,
            orientation: self.orientation.reversed(),
        }
    }
}

// Conversion impls from specific keys to ShapeKey
impl From<VertexKey> for ShapeKey {
    fn from(k: VertexKey) -> Self {
        ShapeKey::Vertex(k)
    }
}

impl From<EdgeKey> for ShapeKey {
    fn from(k: EdgeKey) -> Self {
        ShapeKey::Edge(k)
    }
}

impl From<WireKey> for ShapeKey {
    fn from(k: WireKey) -> Self {
        ShapeKey::Wire(k)
    }
}

impl From<FaceKey> for ShapeKey {
    fn from(k: FaceKey) -> Self {
        ShapeKey::Face(k)
    }
}

impl From<ShellKey> for ShapeKey {
    fn from(k: ShellKey) -> Self {
        ShapeKey::Shell(k)
    }
}

impl From<SolidKey> for ShapeKey {
    fn from(k: SolidKey) -> Self {
        ShapeKey::Solid(k)
    }
}

impl From<CompSolidKey> for ShapeKey {
    fn from(k: CompSolidKey) -> Self {
        ShapeKey::CompSolid(k)
    }
}

impl From<CompoundKey> for ShapeKey {
    fn from(k: CompoundKey) -> Self {
        ShapeKey::Compound(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_type_names() {
        assert_eq!(ShapeType::Vertex.as_str(), "Vertex");
        assert_eq!(ShapeType::Edge.as_str(), "Edge");
        assert_eq!(ShapeType::Wire.as_str(), "Wire");
        assert_eq!(ShapeType::Face.as_str(), "Face");
        assert_eq!(ShapeType::Shell.as_str(), "Shell");
        assert_eq!(ShapeType::Solid.as_str(), "Solid");
        assert_eq!(ShapeType::CompSolid.as_str(), "CompSolid");
        assert_eq!(ShapeType::Compound.as_str(), "Compound");
    }

    #[test]
    fn shape_type_ordering() {
        assert!(ShapeType::Vertex < ShapeType::Edge);
        assert!(ShapeType::Edge < ShapeType::Wire);
        assert!(ShapeType::Wire < ShapeType::Face);
        assert!(ShapeType::Face < ShapeType::Shell);
        assert!(ShapeType::Shell < ShapeType::Solid);
        assert!(ShapeType::Solid < ShapeType::CompSolid);
        assert!(ShapeType::CompSolid < ShapeType::Compound);
    }

    #[test]
    fn orientation_composition() {
        let f = Orientation::Forward;
        let r = Orientation::Reversed;
        assert_eq!(f.compose(f), f);
        assert_eq!(f.compose(r), r);
        assert_eq!(r.compose(r), f);
        assert_eq!(r.reversed(), f);
        assert_eq!(r.sign(), -1.0);
    }

    #[test]
    fn oriented_usage_reversal() {
        let usage = Oriented::forward(7u32);
        assert_eq!(usage.reversed().orientation, Orientation::Reversed);
        assert_eq!(usage.reversed().reversed(), usage);
    }
}
