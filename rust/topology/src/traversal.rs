// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Traversal methods for navigating the shape hierarchy.
//!
//! Downward traversal follows the child lists stored on every shape.
//! Upward traversal (edge → faces that use it) goes through an
//! [`AncestorIndex`] built on demand for a given root shape.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::arena::ShapeArena;
use crate::keys::*;

// =============================================================================
// Downward traversal: extract sub-shapes
// =============================================================================

impl ShapeArena {
    /// Direct children of a shape, in storage order.
    pub fn children(&self, key: ShapeKey) -> Vec<ShapeKey> {
        match key {
            ShapeKey::Vertex(_) => Vec::new(),
            ShapeKey::Edge(k) => self
                .edges
                .get(k)
                .map(|e| {
                    if e.start == e.end {
                        vec![e.start.into()]
                    } else {
                        vec![e.start.into(), e.end.into()]
                    }
                })
                .unwrap_or_default(),
            ShapeKey::Wire(k) => self
                .wires
                .get(k)
                .map(|w| w.edges.iter().map(|u| u.key.into()).collect())
                .unwrap_or_default(),
            ShapeKey::Face(k) => self
                .faces
                .get(k)
                .map(|f| f.wires().map(ShapeKey::from).collect())
                .unwrap_or_default(),
            ShapeKey::Shell(k) => self
                .shells
                .get(k)
                .map(|s| s.faces.iter().map(|u| u.key.into()).collect())
                .unwrap_or_default(),
            ShapeKey::Solid(k) => self
                .solids
                .get(k)
                .map(|s| s.shells().map(ShapeKey::from).collect())
                .unwrap_or_default(),
            ShapeKey::CompSolid(k) => self
                .comp_solids
                .get(k)
                .map(|c| c.solids.iter().map(|&s| s.into()).collect())
                .unwrap_or_default(),
            ShapeKey::Compound(k) => self
                .compounds
                .get(k)
                .map(|c| c.children.clone())
                .unwrap_or_default(),
        }
    }

    /// All distinct sub-shapes of the given type reachable from `root`
    /// (including `root` itself if it has that type), in depth-first order
    /// of first discovery.
    pub fn explode(&self, root: ShapeKey, ty: ShapeType) -> Vec<ShapeKey> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        let mut visited = FxHashSet::default();
        self.explode_into(root, ty, &mut out, &mut seen, &mut visited);
        out
    }

    fn explode_into(
        &self,
        key: ShapeKey,
        ty: ShapeType,
        out: &mut Vec<ShapeKey>,
        seen: &mut FxHashSet<ShapeKey>,
        visited: &mut FxHashSet<ShapeKey>,
    ) {
        if key.shape_type() == ty {
            if seen.insert(key) {
                out.push(key);
            }
            return;
        }
        // Compounds may hold lower-dimensional shapes next to higher ones,
        // so only stop descending when nothing below can match.
        if key.shape_type() < ty || !visited.insert(key) {
            return;
        }
        for child in self.children(key) {
            self.explode_into(child, ty, out, seen, visited);
        }
    }

    /// Distinct edges of a face (outer wire first).
    pub fn face_edges(&self, key: FaceKey) -> Vec<EdgeKey> {
        self.explode(key.into(), ShapeType::Edge)
            .into_iter()
            .filter_map(|s| s.as_edge())
            .collect()
    }

    /// Distinct vertices of a face.
    pub fn face_vertices(&self, key: FaceKey) -> Vec<VertexKey> {
        self.explode(key.into(), ShapeType::Vertex)
            .into_iter()
            .filter_map(|s| s.as_vertex())
            .collect()
    }

    /// Every edge usage on the boundary of a face, wire by wire.
    pub fn face_edge_usages(&self, key: FaceKey) -> Vec<Oriented<EdgeKey>> {
        let Some(face) = self.faces.get(key) else {
            return Vec::new();
        };
        face.wires()
            .filter_map(|w| self.wires.get(w))
            .flat_map(|w| w.edges.iter().copied())
            .collect()
    }

    /// Start vertex of every usage of a wire, in traversal order.
    pub fn wire_vertices_ordered(&self, key: WireKey) -> Vec<VertexKey> {
        let Some(wire) = self.wires.get(key) else {
            return Vec::new();
        };
        wire.edges
            .iter()
            .filter_map(|u| self.edges.get(u.key).map(|e| e.oriented_ends(u.orientation).0))
            .collect()
    }

    /// Face usages of a shape with orientations composed down through
    /// shells, solids and compounds. A face listed twice (by two shells)
    /// appears twice.
    pub fn oriented_faces(&self, key: ShapeKey) -> Vec<Oriented<FaceKey>> {
        let mut out = Vec::new();
        self.collect_oriented_faces(key, Orientation::Forward, &mut out);
        out
    }

    fn collect_oriented_faces(
        &self,
        key: ShapeKey,
        parent: Orientation,
        out: &mut Vec<Oriented<FaceKey>>,
    ) {
        match key {
            ShapeKey::Face(f) => out.push(Oriented::new(f, parent)),
            ShapeKey::Shell(s) => {
                if let Some(shell) = self.shells.get(s) {
                    for u in &shell.faces {
                        out.push(Oriented::new(u.key, u.orientation.compose(parent)));
                    }
                }
            }
            ShapeKey::Vertex(_) | ShapeKey::Edge(_) | ShapeKey::Wire(_) => {}
            _ => {
                for child in self.children(key) {
                    self.collect_oriented_faces(child, parent, out);
                }
            }
        }
    }

    // --- Closure checks ---

    /// Checks if a wire is closed (last usage ends where the first starts).
    pub fn wire_is_closed(&self, key: WireKey) -> bool {
        let Some(wire) = self.wires.get(key) else {
            return false;
        };
        let (Some(first), Some(last)) = (wire.edges.first(), wire.edges.last()) else {
            return false;
        };
        match (self.edges.get(first.key), self.edges.get(last.key)) {
            (Some(f), Some(l)) => {
                f.oriented_ends(first.orientation).0 == l.oriented_ends(last.orientation).1
            }
            _ => false,
        }
    }

    /// Checks if a shell is closed: every edge is used by exactly two face
    /// usages, once in each direction.
    pub fn shell_is_closed(&self, key: ShellKey) -> bool {
        self.shell_free_edge_count(key) == Some(0)
    }

    /// Number of edges whose usages in the shell do not cancel out, or
    /// `None` if the shell does not exist.
    pub fn shell_free_edge_count(&self, key: ShellKey) -> Option<usize> {
        let shell = self.shells.get(key)?;
        let mut balance: FxHashMap<EdgeKey, (u32, u32)> = FxHashMap::default();
        for fu in &shell.faces {
            for eu in self.face_edge_usages(fu.key) {
                let entry = balance.entry(eu.key).or_default();
                if eu.orientation.compose(fu.orientation) == Orientation::Forward {
                    entry.0 += 1;
                } else {
                    entry.1 += 1;
                }
            }
        }
        Some(balance.values().filter(|&&(f, r)| f != 1 || r != 1).count())
    }
}

// =============================================================================
// Upward traversal: ancestor index
// =============================================================================

/// Inverse adjacency for one sub-shape type within a root shape: for every
/// sub-shape of `child_type`, the distinct ancestors of `ancestor_type`
/// that contain it.
#[derive(Debug, Clone, Default)]
pub struct AncestorIndex {
    map: FxHashMap<ShapeKey, Vec<ShapeKey>>,
}

impl AncestorIndex {
    /// Builds the index by exploding every ancestor of `root`.
    pub fn build(
        arena: &ShapeArena,
        root: ShapeKey,
        child_type: ShapeType,
        ancestor_type: ShapeType,
    ) -> Self {
        let mut map: FxHashMap<ShapeKey, Vec<ShapeKey>> = FxHashMap::default();
        for ancestor in arena.explode(root, ancestor_type) {
            for child in arena.explode(ancestor, child_type) {
                let list = map.entry(child).or_default();
                if !list.contains(&ancestor) {
                    list.push(ancestor);
                }
            }
        }
        Self { map }
    }

    /// Ancestors of `child`, in discovery order.
    pub fn ancestors(&self, child: ShapeKey) -> &[ShapeKey] {
        self.map.get(&child).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explode_box_counts() {
        let mut arena = ShapeArena::new();
        let (solid, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let s: ShapeKey = solid.into();
        assert_eq!(arena.explode(s, ShapeType::Vertex).len(), 8);
        assert_eq!(arena.explode(s, ShapeType::Edge).len(), 12);
        assert_eq!(arena.explode(s, ShapeType::Face).len(), 6);
        assert_eq!(arena.explode(s, ShapeType::Shell).len(), 1);
        assert_eq!(arena.explode(s, ShapeType::Solid), vec![s]);
    }

    #[test]
    fn explode_is_deterministic() {
        let mut arena = ShapeArena::new();
        let (solid, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let a = arena.explode(solid.into(), ShapeType::Edge);
        let b = arena.explode(solid.into(), ShapeType::Edge);
        assert_eq!(a, b);
    }

    #[test]
    fn box_shell_is_closed() {
        let mut arena = ShapeArena::new();
        let (_, shell, faces) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        assert!(arena.shell_is_closed(shell));

        let open = arena.add_shell_from_faces(&faces[..5]).unwrap();
        assert!(!arena.shell_is_closed(open));
        assert_eq!(arena.shell_free_edge_count(open), Some(4));
    }

    #[test]
    fn each_box_edge_has_two_faces() {
        let mut arena = ShapeArena::new();
        let (solid, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let index = AncestorIndex::build(&arena, solid.into(), ShapeType::Edge, ShapeType::Face);
        assert_eq!(index.len(), 12);
        for e in arena.explode(solid.into(), ShapeType::Edge) {
            assert_eq!(index.ancestors(e).len(), 2);
        }
    }

    #[test]
    fn compound_face_usages_keep_orientation() {
        let mut arena = ShapeArena::new();
        let (_, shell, faces) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let c = arena.add_compound(vec![shell.into(), faces[0].into()]).unwrap();
        let usages = arena.oriented_faces(c.into());
        assert_eq!(usages.len(), 7);
        assert!(usages.iter().all(|u| u.orientation == Orientation::Forward));

        let flipped = arena.add_shell(&[Oriented::reversed_of(faces[1])]).unwrap();
        let usages = arena.oriented_faces(flipped.into());
        assert_eq!(usages, vec![Oriented::reversed_of(faces[1])]);
    }

    #[test]
    fn compound_explode_finds_loose_edges() {
        let mut arena = ShapeArena::new();
        let a = arena.add_vertex(nalgebra::Point3::origin());
        let b = arena.add_vertex(nalgebra::Point3::new(1.0, 0.0, 0.0));
        let e = arena.add_edge(a, b).unwrap();
        let (solid, _, _) = arena.make_box([2.0; 3], [3.0; 3]).unwrap();
        let c = arena.add_compound(vec![e.into(), solid.into()]).unwrap();
        assert_eq!(arena.explode(c.into(), ShapeType::Edge).len(), 13);
    }
}
