// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identity queries and deep copies.

use rustc_hash::FxHashMap;

use crate::arena::*;
use crate::error::{Error, Result};
use crate::keys::*;

impl ShapeArena {
    /// Returns the shape type of a key.
    pub fn shape_type(&self, key: ShapeKey) -> ShapeType {
        key.shape_type()
    }

    /// Two keys denote the same shape when they are the same key.
    /// Geometric coincidence does not make shapes the same.
    pub fn is_same(&self, a: ShapeKey, b: ShapeKey) -> bool {
        a == b
    }

    /// Creates a deep copy of a shape in the same arena.
    ///
    /// Every sub-shape is duplicated with a new key. Sharing inside the
    /// copied graph is preserved: a vertex used by three edges of the
    /// original is one vertex used by three edges of the copy.
    pub fn deep_copy(&mut self, root: ShapeKey) -> Result<ShapeKey> {
        let mut map: FxHashMap<ShapeKey, ShapeKey> = FxHashMap::default();
        self.copy_rec(root, &mut map)
    }

    fn copy_rec(&mut self, key: ShapeKey, map: &mut FxHashMap<ShapeKey, ShapeKey>) -> Result<ShapeKey> {
        if let Some(&done) = map.get(&key) {
            return Ok(done);
        }
        let copied: ShapeKey = match key {
            ShapeKey::Vertex(k) => {
                let v = self.vertices.get(k).ok_or(Error::VertexNotFound(k))?.clone();
                self.vertices.insert(v).into()
            }
            ShapeKey::Edge(k) => {
                let e = self.edges.get(k).ok_or(Error::EdgeNotFound(k))?.clone();
                let start = self.copy_vertex(e.start, map)?;
                let end = self.copy_vertex(e.end, map)?;
                self.edges.insert(EdgeData { start, end, ..e }).into()
            }
            ShapeKey::Wire(k) => {
                let w = self.wires.get(k).ok_or(Error::WireNotFound(k))?.clone();
                let mut edges = Vec::with_capacity(w.edges.len());
                for u in &w.edges {
                    let ShapeKey::Edge(e) = self.copy_rec(u.key.into(), map)? else {
                        return Err(Error::EdgeNotFound(u.key));
                    };
                    edges.push(Oriented::new(e, u.orientation));
                }
                self.wires.insert(WireData { edges }).into()
            }
            ShapeKey::Face(k) => {
                let f = self.faces.get(k).ok_or(Error::FaceNotFound(k))?.clone();
                let outer_wire = self.copy_wire(f.outer_wire, map)?;
                let mut inner_wires = Vec::with_capacity(f.inner_wires.len());
                for &w in &f.inner_wires {
                    inner_wires.push(self.copy_wire(w, map)?);
                }
                self.faces
                    .insert(FaceData {
                        surface: f.surface,
                        outer_wire,
                        inner_wires,
                        tolerance: f.tolerance,
                    })
                    .into()
            }
            ShapeKey::Shell(k) => {
                let s = self.shells.get(k).ok_or(Error::ShellNotFound(k))?.clone();
                let mut faces = Vec::with_capacity(s.faces.len());
                for u in &s.faces {
                    let ShapeKey::Face(f) = self.copy_rec(u.key.into(), map)? else {
                        return Err(Error::FaceNotFound(u.key));
                    };
                    faces.push(Oriented::new(f, u.orientation));
                }
                self.shells.insert(ShellData { faces }).into()
            }
            ShapeKey::Solid(k) => {
                let s = self.solids.get(k).ok_or(Error::SolidNotFound(k))?.clone();
                let outer_shell = self.copy_shell(s.outer_shell, map)?;
                let mut inner_shells = Vec::with_capacity(s.inner_shells.len());
                for &sh in &s.inner_shells {
                    inner_shells.push(self.copy_shell(sh, map)?);
                }
                self.solids
                    .insert(SolidData {
                        outer_shell,
                        inner_shells,
                    })
                    .into()
            }
            ShapeKey::CompSolid(k) => {
                let c = self.comp_solids.get(k).ok_or(Error::NotFound(key))?.clone();
                let mut solids = Vec::with_capacity(c.solids.len());
                for &s in &c.solids {
                    let ShapeKey::Solid(s) = self.copy_rec(s.into(), map)? else {
                        return Err(Error::SolidNotFound(s));
                    };
                    solids.push(s);
                }
                self.comp_solids.insert(CompSolidData { solids }).into()
            }
            ShapeKey::Compound(k) => {
                let c = self.compounds.get(k).ok_or(Error::NotFound(key))?.clone();
                let mut children = Vec::with_capacity(c.children.len());
                for &child in &c.children {
                    children.push(self.copy_rec(child, map)?);
                }
                self.compounds.insert(CompoundData { children }).into()
            }
        };
        map.insert(key, copied);
        Ok(copied)
    }

    fn copy_vertex(&mut self, v: VertexKey, map: &mut FxHashMap<ShapeKey, ShapeKey>) -> Result<VertexKey> {
        self.copy_rec(v.into(), map)?
            .as_vertex()
            .ok_or(Error::VertexNotFound(v))
    }

    fn copy_wire(&mut self, w: WireKey, map: &mut FxHashMap<ShapeKey, ShapeKey>) -> Result<WireKey> {
        match self.copy_rec(w.into(), map)? {
            ShapeKey::Wire(k) => Ok(k),
            _ => Err(Error::WireNotFound(w)),
        }
    }

    fn copy_shell(&mut self, s: ShellKey, map: &mut FxHashMap<ShapeKey, ShapeKey>) -> Result<ShellKey> {
        self.copy_rec(s.into(), map)?
            .as_shell()
            .ok_or(Error::ShellNotFound(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn deep_copy_preserves_sharing() {
        let mut arena = ShapeArena::new();
        let (solid, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let copy = arena.deep_copy(solid.into()).unwrap();

        assert_ne!(copy, ShapeKey::from(solid));
        assert_eq!(arena.vertex_count(), 16);
        assert_eq!(arena.edge_count(), 24);
        assert_eq!(arena.explode(copy, ShapeType::Vertex).len(), 8);
        assert_relative_eq!(arena.volume(copy), 1.0, epsilon = 1e-12);
        let shell = arena.explode(copy, ShapeType::Shell)[0].as_shell().unwrap();
        assert!(arena.shell_is_closed(shell));
    }

    #[test]
    fn copy_shares_nothing_with_original() {
        let mut arena = ShapeArena::new();
        let (solid, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let copy = arena.deep_copy(solid.into()).unwrap();
        let a = arena.explode(solid.into(), ShapeType::Edge);
        let b = arena.explode(copy, ShapeType::Edge);
        assert!(a.iter().all(|e| !b.contains(e)));
        assert!(!arena.is_same(a[0], b[0]));
    }
}
