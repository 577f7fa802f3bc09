// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Construction methods for shapes.
//!
//! Every shape is created through the arena, which ensures referential
//! integrity: all referenced sub-shapes must exist and wires must be
//! connected end to end.

use nalgebra::Point3;

use crate::arena::*;
use crate::error::{Error, Result};
use crate::geom::{Line, Plane};
use crate::keys::*;
use crate::precision;

impl ShapeArena {
    /// Adds a vertex with the default tolerance.
    pub fn add_vertex(&mut self, point: Point3<f64>) -> VertexKey {
        self.add_vertex_with_tolerance(point, precision::CONFUSION)
    }

    /// Adds a vertex with an explicit tolerance. The tolerance never drops
    /// below [`precision::CONFUSION`].
    pub fn add_vertex_with_tolerance(&mut self, point: Point3<f64>, tolerance: f64) -> VertexKey {
        self.vertices.insert(VertexData {
            point,
            tolerance: tolerance.max(precision::CONFUSION),
        })
    }

    /// Creates a straight edge between two existing vertices.
    ///
    /// Returns an error if either vertex does not exist or the two points
    /// coincide.
    pub fn add_edge(&mut self, start: VertexKey, end: VertexKey) -> Result<EdgeKey> {
        let a = self.vertex_point(start).ok_or(Error::VertexNotFound(start))?;
        let b = self.vertex_point(end).ok_or(Error::VertexNotFound(end))?;
        let curve = Line::through(&a, &b).ok_or(Error::DegenerateEdge)?;
        let length = (b - a).norm();
        Ok(self.edges.insert(EdgeData {
            start,
            end,
            curve,
            range: (0.0, length),
            tolerance: precision::CONFUSION,
        }))
    }

    /// Creates an edge lying on an existing carrier line, trimmed to
    /// `range`. Used when splitting edges so all pieces share the
    /// parameterisation of the original.
    pub fn add_edge_on(
        &mut self,
        start: VertexKey,
        end: VertexKey,
        curve: Line,
        range: (f64, f64),
        tolerance: f64,
    ) -> Result<EdgeKey> {
        if !self.vertices.contains_key(start) {
            return Err(Error::VertexNotFound(start));
        }
        if !self.vertices.contains_key(end) {
            return Err(Error::VertexNotFound(end));
        }
        if start == end || range.1 - range.0 < precision::PARAMETRIC {
            return Err(Error::DegenerateEdge);
        }
        Ok(self.edges.insert(EdgeData {
            start,
            end,
            curve,
            range,
            tolerance: tolerance.max(precision::CONFUSION),
        }))
    }

    /// Creates a wire from an ordered list of edge usages.
    ///
    /// Each usage must end where the next one starts. Returns an error if
    /// the list is empty or the chain is broken.
    pub fn add_wire(&mut self, usages: &[Oriented<EdgeKey>]) -> Result<WireKey> {
        if usages.is_empty() {
            return Err(Error::EmptyWire);
        }
        let mut prev_end: Option<VertexKey> = None;
        for (i, usage) in usages.iter().enumerate() {
            let edge = self.edges.get(usage.key).ok_or(Error::EdgeNotFound(usage.key))?;
            let (s, e) = edge.oriented_ends(usage.orientation);
            if let Some(p) = prev_end {
                if p != s {
                    return Err(Error::DisconnectedWire(i - 1, i));
                }
            }
            prev_end = Some(e);
        }
        Ok(self.wires.insert(WireData {
            edges: usages.to_vec(),
        }))
    }

    /// Creates a wire from plain edges, inferring each usage orientation
    /// from connectivity with its neighbour.
    pub fn add_wire_from_edges(&mut self, edge_keys: &[EdgeKey]) -> Result<WireKey> {
        if edge_keys.is_empty() {
            return Err(Error::EmptyWire);
        }
        for &ek in edge_keys {
            if !self.edges.contains_key(ek) {
                return Err(Error::EdgeNotFound(ek));
            }
        }

        let mut usages = Vec::with_capacity(edge_keys.len());
        if edge_keys.len() == 1 {
            usages.push(Oriented::forward(edge_keys[0]));
        } else {
            // Determine first edge orientation by looking at the second edge
            let first = &self.edges[edge_keys[0]];
            let second = &self.edges[edge_keys[1]];
            if first.end == second.start || first.end == second.end {
                usages.push(Oriented::forward(edge_keys[0]));
            } else if first.start == second.start || first.start == second.end {
                usages.push(Oriented::reversed_of(edge_keys[0]));
            } else {
                return Err(Error::DisconnectedWire(0, 1));
            }

            for i in 1..edge_keys.len() {
                let prev: &Oriented<EdgeKey> = &usages[i - 1];
                let (_, prev_end) = self.edges[prev.key].oriented_ends(prev.orientation);
                let curr = &self.edges[edge_keys[i]];
                if prev_end == curr.start {
                    usages.push(Oriented::forward(edge_keys[i]));
                } else if prev_end == curr.end {
                    usages.push(Oriented::reversed_of(edge_keys[i]));
                } else {
                    return Err(Error::DisconnectedWire(i - 1, i));
                }
            }
        }

        self.add_wire(&usages)
    }

    /// Creates a wire that traverses `wire` backwards.
    pub fn add_reversed_wire(&mut self, wire: WireKey) -> Result<WireKey> {
        let data = self.wires.get(wire).ok_or(Error::WireNotFound(wire))?;
        let usages: Vec<_> = data.edges.iter().rev().map(|u| u.reversed()).collect();
        Ok(self.wires.insert(WireData { edges: usages }))
    }

    /// Creates a face from a closed outer wire. The face plane is fitted to
    /// the wire so that the wire runs counter-clockwise about its normal.
    pub fn add_face(&mut self, outer_wire: WireKey) -> Result<FaceKey> {
        self.add_face_with_holes(outer_wire, &[])
    }

    /// Creates a face with an outer boundary and inner boundary wires
    /// (holes). Holes that run the wrong way are replaced by a reversed
    /// copy.
    pub fn add_face_with_holes(
        &mut self,
        outer_wire: WireKey,
        inner_wires: &[WireKey],
    ) -> Result<FaceKey> {
        let outer_pts = self.closed_wire_points(outer_wire)?;
        let surface = Plane::from_polygon(&outer_pts).ok_or(Error::DegenerateFace)?;

        let mut holes = Vec::with_capacity(inner_wires.len());
        for &w in inner_wires {
            let pts = self.closed_wire_points(w)?;
            let uv: Vec<_> = pts.iter().map(|p| surface.to_uv(p)).collect();
            if crate::geometry::signed_area_2d(&uv) > 0.0 {
                holes.push(self.add_reversed_wire(w)?);
            } else {
                holes.push(w);
            }
        }

        Ok(self.faces.insert(FaceData {
            surface,
            outer_wire,
            inner_wires: holes,
            tolerance: precision::CONFUSION,
        }))
    }

    /// Creates a face on a known plane without fitting or reorienting the
    /// wires. The caller guarantees the orientation conventions.
    pub fn add_face_on(
        &mut self,
        surface: Plane,
        outer_wire: WireKey,
        inner_wires: Vec<WireKey>,
        tolerance: f64,
    ) -> Result<FaceKey> {
        for w in std::iter::once(outer_wire).chain(inner_wires.iter().copied()) {
            if !self.wires.contains_key(w) {
                return Err(Error::WireNotFound(w));
            }
        }
        Ok(self.faces.insert(FaceData {
            surface,
            outer_wire,
            inner_wires,
            tolerance: tolerance.max(precision::CONFUSION),
        }))
    }

    /// Creates a shell from face usages.
    pub fn add_shell(&mut self, usages: &[Oriented<FaceKey>]) -> Result<ShellKey> {
        if usages.is_empty() {
            return Err(Error::EmptyShell);
        }
        for u in usages {
            if !self.faces.contains_key(u.key) {
                return Err(Error::FaceNotFound(u.key));
            }
        }
        Ok(self.shells.insert(ShellData {
            faces: usages.to_vec(),
        }))
    }

    /// Creates a shell using every face in its forward sense.
    pub fn add_shell_from_faces(&mut self, faces: &[FaceKey]) -> Result<ShellKey> {
        let usages: Vec<_> = faces.iter().map(|&f| Oriented::forward(f)).collect();
        self.add_shell(&usages)
    }

    /// Creates a solid bounded by a single shell.
    pub fn add_solid(&mut self, outer_shell: ShellKey) -> Result<SolidKey> {
        self.add_solid_with_cavities(outer_shell, &[])
    }

    /// Creates a solid with an outer shell and cavity shells. Cavity shells
    /// face into the cavity, so their signed volume is negative.
    pub fn add_solid_with_cavities(
        &mut self,
        outer_shell: ShellKey,
        inner_shells: &[ShellKey],
    ) -> Result<SolidKey> {
        for s in std::iter::once(outer_shell).chain(inner_shells.iter().copied()) {
            if !self.shells.contains_key(s) {
                return Err(Error::ShellNotFound(s));
            }
        }
        Ok(self.solids.insert(SolidData {
            outer_shell,
            inner_shells: inner_shells.to_vec(),
        }))
    }

    /// Creates a compsolid from solids sharing faces.
    pub fn add_comp_solid(&mut self, solids: &[SolidKey]) -> Result<CompSolidKey> {
        if solids.is_empty() {
            return Err(Error::EmptyCompSolid);
        }
        for &s in solids {
            if !self.solids.contains_key(s) {
                return Err(Error::SolidNotFound(s));
            }
        }
        Ok(self.comp_solids.insert(CompSolidData {
            solids: solids.to_vec(),
        }))
    }

    /// Creates a compound. An empty compound is valid.
    pub fn add_compound(&mut self, children: Vec<ShapeKey>) -> Result<CompoundKey> {
        for &c in &children {
            if !self.contains(c) {
                return Err(Error::NotFound(c));
            }
        }
        Ok(self.compounds.insert(CompoundData { children }))
    }

    /// Points of a closed wire in traversal order, without repeating the
    /// first point.
    fn closed_wire_points(&self, wire: WireKey) -> Result<Vec<Point3<f64>>> {
        if !self.wires.contains_key(wire) {
            return Err(Error::WireNotFound(wire));
        }
        if !self.wire_is_closed(wire) {
            return Err(Error::OpenWire);
        }
        let pts: Vec<_> = self
            .wire_vertices_ordered(wire)
            .into_iter()
            .filter_map(|v| self.vertex_point(v))
            .collect();
        if pts.len() < 3 {
            return Err(Error::DegenerateFace);
        }
        Ok(pts)
    }
}

/// Creates a rectangular face in the XY plane at height `z`.
pub fn make_rectangle(
    arena: &mut ShapeArena,
    min: [f64; 2],
    max: [f64; 2],
    z: f64,
) -> Result<FaceKey> {
    let v0 = arena.add_vertex(Point3::new(min[0], min[1], z));
    let v1 = arena.add_vertex(Point3::new(max[0], min[1], z));
    let v2 = arena.add_vertex(Point3::new(max[0], max[1], z));
    let v3 = arena.add_vertex(Point3::new(min[0], max[1], z));
    let e0 = arena.add_edge(v0, v1)?;
    let e1 = arena.add_edge(v1, v2)?;
    let e2 = arena.add_edge(v2, v3)?;
    let e3 = arena.add_edge(v3, v0)?;
    let wire = arena.add_wire_from_edges(&[e0, e1, e2, e3])?;
    arena.add_face(wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    #[test]
    fn add_edge_valid() {
        let mut arena = ShapeArena::new();
        let a = arena.add_vertex(p(0.0, 0.0, 0.0));
        let b = arena.add_vertex(p(3.0, 4.0, 0.0));
        let e = arena.add_edge(a, b).unwrap();
        let data = arena.edge(e).unwrap();
        assert_eq!(data.range, (0.0, 5.0));
        assert_relative_eq!(data.curve.point(data.range.1), p(3.0, 4.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn add_edge_degenerate_fails() {
        let mut arena = ShapeArena::new();
        let a = arena.add_vertex(p(0.0, 0.0, 0.0));
        let b = arena.add_vertex(p(0.0, 0.0, 0.0));
        assert!(matches!(arena.add_edge(a, b), Err(Error::DegenerateEdge)));
    }

    #[test]
    fn add_edge_invalid_vertex() {
        let mut arena = ShapeArena::new();
        let a = arena.add_vertex(p(0.0, 0.0, 0.0));
        let mut other = ShapeArena::new();
        let _ = other.add_vertex(p(1.0, 0.0, 0.0));
        let ghost = other.add_vertex(p(2.0, 0.0, 0.0));
        assert!(arena.add_edge(a, ghost).is_err());
    }

    #[test]
    fn add_wire_reversed_edge() {
        let mut arena = ShapeArena::new();
        let a = arena.add_vertex(p(0.0, 0.0, 0.0));
        let b = arena.add_vertex(p(1.0, 0.0, 0.0));
        let c = arena.add_vertex(p(1.0, 1.0, 0.0));
        let e0 = arena.add_edge(a, b).unwrap();
        // Stored c → b, traversed b → c
        let e1 = arena.add_edge(c, b).unwrap();
        let w = arena.add_wire_from_edges(&[e0, e1]).unwrap();
        let wire = arena.wire(w).unwrap();
        assert_eq!(wire.edges[0].orientation, Orientation::Forward);
        assert_eq!(wire.edges[1].orientation, Orientation::Reversed);
    }

    #[test]
    fn add_wire_disconnected_fails() {
        let mut arena = ShapeArena::new();
        let a = arena.add_vertex(p(0.0, 0.0, 0.0));
        let b = arena.add_vertex(p(1.0, 0.0, 0.0));
        let c = arena.add_vertex(p(5.0, 5.0, 0.0));
        let d = arena.add_vertex(p(6.0, 5.0, 0.0));
        let e0 = arena.add_edge(a, b).unwrap();
        let e1 = arena.add_edge(c, d).unwrap();
        assert!(matches!(
            arena.add_wire(&[Oriented::forward(e0), Oriented::forward(e1)]),
            Err(Error::DisconnectedWire(0, 1))
        ));
        assert!(matches!(arena.add_wire(&[]), Err(Error::EmptyWire)));
    }

    #[test]
    fn face_plane_follows_outer_wire() {
        let mut arena = ShapeArena::new();
        let f = make_rectangle(&mut arena, [0.0, 0.0], [2.0, 1.0], 3.0).unwrap();
        let face = arena.face(f).unwrap();
        assert_relative_eq!(face.surface.normal.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(face.surface.signed_distance(&p(0.0, 0.0, 3.0)), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn hole_is_reoriented_clockwise() {
        let mut arena = ShapeArena::new();
        let outer = {
            let f = make_rectangle(&mut arena, [0.0, 0.0], [4.0, 4.0], 0.0).unwrap();
            arena.face(f).unwrap().outer_wire
        };
        // Counter-clockwise inner loop, must be flipped
        let inner = {
            let f = make_rectangle(&mut arena, [1.0, 1.0], [2.0, 2.0], 0.0).unwrap();
            arena.face(f).unwrap().outer_wire
        };
        let face = arena.add_face_with_holes(outer, &[inner]).unwrap();
        let hole = arena.face(face).unwrap().inner_wires[0];
        assert_ne!(hole, inner);
        assert_relative_eq!(arena.face_area(face), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn open_wire_cannot_bound_face() {
        let mut arena = ShapeArena::new();
        let a = arena.add_vertex(p(0.0, 0.0, 0.0));
        let b = arena.add_vertex(p(1.0, 0.0, 0.0));
        let c = arena.add_vertex(p(1.0, 1.0, 0.0));
        let e0 = arena.add_edge(a, b).unwrap();
        let e1 = arena.add_edge(b, c).unwrap();
        let w = arena.add_wire_from_edges(&[e0, e1]).unwrap();
        assert!(matches!(arena.add_face(w), Err(Error::OpenWire)));
    }

    #[test]
    fn empty_compound_is_valid() {
        let mut arena = ShapeArena::new();
        let c = arena.add_compound(Vec::new()).unwrap();
        assert!(arena.compound(c).unwrap().children.is_empty());
    }
}
