// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for B-rep shapes.
//!
//! The [`ShapeArena`] is the central owner of all shape data. Every shape
//! (vertex, edge, wire, face, shell, solid, compsolid, compound) lives inside
//! slot maps with stable, generational keys. Shapes are immutable once
//! inserted: operations that change geometry or tolerance create new shapes
//! and leave the originals untouched, so the same arena can hold the
//! arguments of a boolean operation and its result side by side.
//!
//! ## Orientation conventions
//!
//! - An edge runs from `start` (at `range.0` on its line) to `end` (at
//!   `range.1`).
//! - A wire lists edge usages; a reversed usage is traversed end to start.
//! - The outer wire of a face runs counter-clockwise about the normal of the
//!   face plane, inner wires (holes) run clockwise.
//! - A forward face usage in a shell points its plane normal out of the
//!   enclosed material.

use nalgebra::Point3;
use slotmap::SlotMap;

use crate::geom::{Line, Plane};
use crate::keys::*;

/// Data stored for a vertex: a point with a tolerance sphere.
#[derive(Debug, Clone)]
pub struct VertexData {
    pub point: Point3<f64>,
    pub tolerance: f64,
}

/// Data stored for an edge: a trimmed line between two vertices.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub start: VertexKey,
    pub end: VertexKey,
    pub curve: Line,
    /// Parameter range on `curve`, `range.0 < range.1`.
    pub range: (f64, f64),
    pub tolerance: f64,
}

impl EdgeData {
    /// Start and end vertex in traversal order for the given usage.
    pub fn oriented_ends(&self, orientation: Orientation) -> (VertexKey, VertexKey) {
        match orientation {
            Orientation::Forward => (self.start, self.end),
            Orientation::Reversed => (self.end, self.start),
        }
    }

    /// Point at the middle of the parameter range.
    pub fn mid_point(&self) -> Point3<f64> {
        self.curve.point(0.5 * (self.range.0 + self.range.1))
    }
}

/// Data stored for a wire: an ordered chain of connected edge usages.
#[derive(Debug, Clone)]
pub struct WireData {
    pub edges: Vec<Oriented<EdgeKey>>,
}

/// Data stored for a face: a planar region bounded by one outer wire and
/// zero or more inner wires (holes).
#[derive(Debug, Clone)]
pub struct FaceData {
    pub surface: Plane,
    pub outer_wire: WireKey,
    pub inner_wires: Vec<WireKey>,
    pub tolerance: f64,
}

impl FaceData {
    /// Outer wire followed by the holes.
    pub fn wires(&self) -> impl Iterator<Item = WireKey> + '_ {
        std::iter::once(self.outer_wire).chain(self.inner_wires.iter().copied())
    }
}

/// Data stored for a shell: a connected surface made of face usages.
#[derive(Debug, Clone)]
pub struct ShellData {
    pub faces: Vec<Oriented<FaceKey>>,
}

/// Data stored for a solid: a volume bounded by an outer shell, with
/// optional cavity shells.
#[derive(Debug, Clone)]
pub struct SolidData {
    pub outer_shell: ShellKey,
    pub inner_shells: Vec<ShellKey>,
}

impl SolidData {
    pub fn shells(&self) -> impl Iterator<Item = ShellKey> + '_ {
        std::iter::once(self.outer_shell).chain(self.inner_shells.iter().copied())
    }
}

/// Data stored for a compsolid: solids that share faces.
#[derive(Debug, Clone)]
pub struct CompSolidData {
    pub solids: Vec<SolidKey>,
}

/// Data stored for a compound: an unordered collection of any shapes.
#[derive(Debug, Clone, Default)]
pub struct CompoundData {
    pub children: Vec<ShapeKey>,
}

/// The central arena that owns all shapes.
///
/// # Example
///
/// ```
/// use nalgebra::Point3;
/// use paver_topology::ShapeArena;
///
/// let mut arena = ShapeArena::new();
/// let v0 = arena.add_vertex(Point3::new(0.0, 0.0, 0.0));
/// let v1 = arena.add_vertex(Point3::new(1.0, 0.0, 0.0));
/// let e = arena.add_edge(v0, v1).unwrap();
///
/// assert_eq!(arena.vertex_count(), 2);
/// assert_eq!(arena.edge(e).unwrap().start, v0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShapeArena {
    pub(crate) vertices: SlotMap<VertexKey, VertexData>,
    pub(crate) edges: SlotMap<EdgeKey, EdgeData>,
    pub(crate) wires: SlotMap<WireKey, WireData>,
    pub(crate) faces: SlotMap<FaceKey, FaceData>,
    pub(crate) shells: SlotMap<ShellKey, ShellData>,
    pub(crate) solids: SlotMap<SolidKey, SolidData>,
    pub(crate) comp_solids: SlotMap<CompSolidKey, CompSolidData>,
    pub(crate) compounds: SlotMap<CompoundKey, CompoundData>,
}

impl ShapeArena {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Vertex operations ---

    /// Returns the vertex data for the given key, or `None` if not found.
    pub fn vertex(&self, key: VertexKey) -> Option<&VertexData> {
        self.vertices.get(key)
    }

    /// Returns the position of a vertex.
    pub fn vertex_point(&self, key: VertexKey) -> Option<Point3<f64>> {
        self.vertices.get(key).map(|v| v.point)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertex_keys(&self) -> impl Iterator<Item = VertexKey> + '_ {
        self.vertices.keys()
    }

    // --- Edge operations ---

    /// Returns the edge data for the given key, or `None` if not found.
    pub fn edge(&self, key: EdgeKey) -> Option<&EdgeData> {
        self.edges.get(key)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_keys(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edges.keys()
    }

    // --- Wire operations ---

    pub fn wire(&self, key: WireKey) -> Option<&WireData> {
        self.wires.get(key)
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    // --- Face operations ---

    pub fn face(&self, key: FaceKey) -> Option<&FaceData> {
        self.faces.get(key)
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn face_keys(&self) -> impl Iterator<Item = FaceKey> + '_ {
        self.faces.keys()
    }

    // --- Shell operations ---

    pub fn shell(&self, key: ShellKey) -> Option<&ShellData> {
        self.shells.get(key)
    }

    pub fn shell_count(&self) -> usize {
        self.shells.len()
    }

    // --- Solid operations ---

    pub fn solid(&self, key: SolidKey) -> Option<&SolidData> {
        self.solids.get(key)
    }

    pub fn solid_count(&self) -> usize {
        self.solids.len()
    }

    // --- Container operations ---

    pub fn comp_solid(&self, key: CompSolidKey) -> Option<&CompSolidData> {
        self.comp_solids.get(key)
    }

    pub fn compound(&self, key: CompoundKey) -> Option<&CompoundData> {
        self.compounds.get(key)
    }

    pub fn compound_count(&self) -> usize {
        self.compounds.len()
    }

    // --- Generic operations ---

    /// Returns true if the shape exists in the arena.
    pub fn contains(&self, key: ShapeKey) -> bool {
        match key {
            ShapeKey::Vertex(k) => self.vertices.contains_key(k),
            ShapeKey::Edge(k) => self.edges.contains_key(k),
            ShapeKey::Wire(k) => self.wires.contains_key(k),
            ShapeKey::Face(k) => self.faces.contains_key(k),
            ShapeKey::Shell(k) => self.shells.contains_key(k),
            ShapeKey::Solid(k) => self.solids.contains_key(k),
            ShapeKey::CompSolid(k) => self.comp_solids.contains_key(k),
            ShapeKey::Compound(k) => self.compounds.contains_key(k),
        }
    }

    /// Tolerance of a vertex, edge or face. Other shapes report the
    /// largest tolerance of their vertices.
    pub fn tolerance(&self, key: ShapeKey) -> f64 {
        match key {
            ShapeKey::Vertex(k) => self.vertices.get(k).map_or(0.0, |v| v.tolerance),
            ShapeKey::Edge(k) => self.edges.get(k).map_or(0.0, |e| e.tolerance),
            ShapeKey::Face(k) => self.faces.get(k).map_or(0.0, |f| f.tolerance),
            _ => self
                .explode(key, ShapeType::Vertex)
                .into_iter()
                .filter_map(|s| s.as_vertex())
                .filter_map(|v| self.vertices.get(v))
                .map(|v| v.tolerance)
                .fold(0.0, f64::max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precision;

    #[test]
    fn new_arena_is_empty() {
        let arena = ShapeArena::new();
        assert_eq!(arena.vertex_count(), 0);
        assert_eq!(arena.edge_count(), 0);
        assert_eq!(arena.face_count(), 0);
        assert_eq!(arena.solid_count(), 0);
    }

    #[test]
    fn edge_oriented_ends() {
        let mut arena = ShapeArena::new();
        let a = arena.add_vertex(Point3::origin());
        let b = arena.add_vertex(Point3::new(0.0, 2.0, 0.0));
        let e = arena.add_edge(a, b).unwrap();
        let data = arena.edge(e).unwrap();
        assert_eq!(data.oriented_ends(Orientation::Forward), (a, b));
        assert_eq!(data.oriented_ends(Orientation::Reversed), (b, a));
        assert!((data.mid_point().y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tolerance_of_containers_is_vertex_max() {
        let mut arena = ShapeArena::new();
        let (solid, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        assert_eq!(arena.tolerance(solid.into()), precision::CONFUSION);
        assert!(arena.contains(solid.into()));
    }
}
