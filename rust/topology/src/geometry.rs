// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric queries on shapes.
//!
//! Computes lengths, areas, volumes, bounding boxes and face triangulations
//! with standard computational geometry (no external kernel required).

use nalgebra::{Point2, Point3, Vector3};

use crate::arena::ShapeArena;
use crate::bnd::Aabb;
use crate::keys::*;

/// Signed area of a closed 2D polygon (shoelace). Positive when the
/// polygon runs counter-clockwise.
pub fn signed_area_2d(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        twice += a.x * b.y - b.x * a.y;
    }
    0.5 * twice
}

impl ShapeArena {
    /// Length of an edge (span of its parameter range).
    pub fn edge_length(&self, key: EdgeKey) -> f64 {
        self.edges
            .get(key)
            .map_or(0.0, |e| e.range.1 - e.range.0)
    }

    /// Unit normal of the face plane.
    pub fn face_normal(&self, key: FaceKey) -> Option<Vector3<f64>> {
        self.faces.get(key).map(|f| f.surface.normal)
    }

    /// Normal of a face usage: the plane normal, flipped for a reversed
    /// usage.
    pub fn oriented_normal(&self, usage: Oriented<FaceKey>) -> Option<Vector3<f64>> {
        self.face_normal(usage.key).map(|n| n * usage.orientation.sign())
    }

    /// Points of a wire in traversal order.
    pub fn wire_points(&self, key: WireKey) -> Vec<Point3<f64>> {
        self.wire_vertices_ordered(key)
            .into_iter()
            .filter_map(|v| self.vertex_point(v))
            .collect()
    }

    /// A wire projected into the `(u, v)` frame of a face plane.
    pub fn wire_uv(&self, face: FaceKey, wire: WireKey) -> Vec<Point2<f64>> {
        let Some(f) = self.faces.get(face) else {
            return Vec::new();
        };
        self.wire_points(wire)
            .iter()
            .map(|p| f.surface.to_uv(p))
            .collect()
    }

    /// Area of a face with holes subtracted.
    pub fn face_area(&self, key: FaceKey) -> f64 {
        let Some(face) = self.faces.get(key) else {
            return 0.0;
        };
        face.wires()
            .map(|w| signed_area_2d(&self.wire_uv(key, w)))
            .sum::<f64>()
            .abs()
    }

    /// Signed volume enclosed by a shell (divergence theorem). Positive
    /// when the face usages point outward.
    pub fn shell_signed_volume(&self, key: ShellKey) -> f64 {
        let Some(shell) = self.shells.get(key) else {
            return 0.0;
        };
        let mut six_volume = 0.0;
        for usage in &shell.faces {
            let Some(face) = self.faces.get(usage.key) else {
                continue;
            };
            let mut face_sum = 0.0;
            for w in face.wires() {
                let pts = self.wire_points(w);
                if pts.len() < 3 {
                    continue;
                }
                let p0 = pts[0].coords;
                for i in 1..pts.len() - 1 {
                    let p1 = pts[i].coords;
                    let p2 = pts[i + 1].coords;
                    face_sum += p0.dot(&p1.cross(&p2));
                }
            }
            six_volume += face_sum * usage.orientation.sign();
        }
        six_volume / 6.0
    }

    /// Volume of a solid: outer shell minus its cavities.
    pub fn solid_volume(&self, key: SolidKey) -> f64 {
        let Some(solid) = self.solids.get(key) else {
            return 0.0;
        };
        solid.shells().map(|s| self.shell_signed_volume(s)).sum()
    }

    /// Total volume of every solid in a shape.
    pub fn volume(&self, key: ShapeKey) -> f64 {
        self.explode(key, ShapeType::Solid)
            .into_iter()
            .filter_map(|s| s.as_solid())
            .map(|s| self.solid_volume(s))
            .sum()
    }

    /// Total area of every distinct face in a shape.
    pub fn surface_area(&self, key: ShapeKey) -> f64 {
        self.explode(key, ShapeType::Face)
            .into_iter()
            .filter_map(|f| f.as_face())
            .map(|f| self.face_area(f))
            .sum()
    }

    /// Total length of every distinct edge in a shape.
    pub fn total_length(&self, key: ShapeKey) -> f64 {
        self.explode(key, ShapeType::Edge)
            .into_iter()
            .filter_map(|e| e.as_edge())
            .map(|e| self.edge_length(e))
            .sum()
    }

    /// Bounding box of a shape, gapped by the largest sub-shape tolerance.
    pub fn bounding_box(&self, key: ShapeKey) -> Aabb {
        let mut bbox = Aabb::void();
        let mut gap: f64 = 0.0;
        for v in self.explode(key, ShapeType::Vertex) {
            if let Some(data) = v.as_vertex().and_then(|v| self.vertices.get(v)) {
                bbox.add_point(&data.point);
                gap = gap.max(data.tolerance);
            }
        }
        for e in self.explode(key, ShapeType::Edge) {
            if let Some(data) = e.as_edge().and_then(|e| self.edges.get(e)) {
                gap = gap.max(data.tolerance);
            }
        }
        for f in self.explode(key, ShapeType::Face) {
            if let Some(data) = f.as_face().and_then(|f| self.faces.get(f)) {
                gap = gap.max(data.tolerance);
            }
        }
        bbox.enlarge(gap);
        bbox
    }

    /// Triangulates a face by ear clipping in its plane frame.
    ///
    /// Returns triangles as 3D point triples, or `None` on degenerate input.
    pub fn triangulate_face(&self, key: FaceKey) -> Option<Vec<[Point3<f64>; 3]>> {
        let face = self.faces.get(key)?;

        let mut coords_2d: Vec<f64> = Vec::new();
        let mut points: Vec<Point3<f64>> = Vec::new();
        let mut hole_indices: Vec<usize> = Vec::new();

        for (i, w) in face.wires().enumerate() {
            let pts = self.wire_points(w);
            if i == 0 && pts.len() < 3 {
                return None;
            }
            if i > 0 {
                hole_indices.push(points.len());
            }
            for p in pts {
                let uv = face.surface.to_uv(&p);
                coords_2d.push(uv.x);
                coords_2d.push(uv.y);
                points.push(p);
            }
        }

        let indices = earcutr::earcut(&coords_2d, &hole_indices, 2).ok()?;

        let triangles: Vec<_> = indices
            .chunks_exact(3)
            .map(|c| [points[c[0]], points[c[1]], points[c[2]]])
            .collect();
        if triangles.is_empty() {
            None
        } else {
            Some(triangles)
        }
    }

    /// A point strictly inside a face: the centroid of its largest
    /// triangle.
    pub fn face_interior_point(&self, key: FaceKey) -> Option<Point3<f64>> {
        let triangles = self.triangulate_face(key)?;
        let area = |t: &[Point3<f64>; 3]| (t[1] - t[0]).cross(&(t[2] - t[0])).norm();
        let best = triangles
            .iter()
            .max_by(|a, b| area(a).total_cmp(&area(b)))?;
        Some(Point3::from((best[0].coords + best[1].coords + best[2].coords) / 3.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unit_box_measures() {
        let mut arena = ShapeArena::new();
        let (solid, shell, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let s: ShapeKey = solid.into();
        assert_relative_eq!(arena.volume(s), 1.0, epsilon = 1e-12);
        assert_relative_eq!(arena.shell_signed_volume(shell), 1.0, epsilon = 1e-12);
        assert_relative_eq!(arena.surface_area(s), 6.0, epsilon = 1e-12);
        assert_relative_eq!(arena.total_length(s), 12.0, epsilon = 1e-12);
    }

    #[test]
    fn translated_box_volume_is_invariant() {
        let mut arena = ShapeArena::new();
        let (solid, _, _) = arena.make_box([10.0, -4.0, 2.0], [12.0, -3.0, 5.0]).unwrap();
        assert_relative_eq!(arena.volume(solid.into()), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn reversed_shell_has_negative_volume() {
        let mut arena = ShapeArena::new();
        let (_, _, faces) = arena.make_box([0.0; 3], [2.0; 3]).unwrap();
        let usages: Vec<_> = faces.iter().map(|&f| Oriented::reversed_of(f)).collect();
        let inverted = arena.add_shell(&usages).unwrap();
        assert_relative_eq!(arena.shell_signed_volume(inverted), -8.0, epsilon = 1e-12);
    }

    #[test]
    fn box_face_normals_point_outward() {
        let mut arena = ShapeArena::new();
        let (_, _, faces) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let center = Point3::new(0.5, 0.5, 0.5);
        for f in faces {
            let n = arena.face_normal(f).unwrap();
            let p = arena.face_interior_point(f).unwrap();
            assert!((p - center).dot(&n) > 0.0);
        }
    }

    #[test]
    fn bounding_box_includes_tolerance() {
        let mut arena = ShapeArena::new();
        let (solid, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let bbox = arena.bounding_box(solid.into());
        assert!(bbox.gap() >= crate::precision::CONFUSION);
        assert!(bbox.contains(&Point3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn shoelace_sign() {
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        assert_relative_eq!(signed_area_2d(&square), 4.0);
        let mut rev = square;
        rev.reverse();
        assert_relative_eq!(signed_area_2d(&rev), -4.0);
    }
}
