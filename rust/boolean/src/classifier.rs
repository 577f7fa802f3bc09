// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point classification against closed shells.
//!
//! Rays are cast along a fixed, well-spread set of directions. A ray that
//! grazes a face plane or passes within tolerance of a face boundary is
//! discarded and the next direction tried. When every direction is
//! discarded the classifier falls back to the generalized winding number
//! computed from the solid angles of the face triangles.

use std::f64::consts::PI;

use nalgebra::{Point3, Vector3};
use paver_topology::{Aabb, ShapeArena, ShellKey, SolidKey};

use crate::context::FacePolygon;
use crate::intersect::PointState;

/// Why a classifier cannot answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("shell {0:?} is not closed")]
    OpenShell(ShellKey),
    #[error("shell surface intersects itself")]
    SelfInterfering,
    #[error("solid has no faces")]
    Empty,
}

#[derive(Debug, Clone)]
struct ClassifierFace {
    polygon: FacePolygon,
    /// Outward normal of the face usage.
    normal: Vector3<f64>,
    /// Triangles wound counter-clockwise about `normal`.
    triangles: Vec<[Point3<f64>; 3]>,
}

/// Inside/outside oracle for the volume bounded by a set of closed shells.
#[derive(Debug, Clone)]
pub struct SolidClassifier {
    faces: Vec<ClassifierFace>,
    bbox: Aabb,
    retries: usize,
}

impl SolidClassifier {
    /// Classifier of a solid (outer shell and cavities).
    pub fn new(arena: &ShapeArena, solid: SolidKey, retries: usize) -> Result<Self, ClassifyError> {
        let shells: Vec<ShellKey> = arena
            .solid(solid)
            .map(|s| s.shells().collect())
            .unwrap_or_default();
        Self::from_shells(arena, &shells, retries)
    }

    /// Classifier of the volume bounded by `shells`. Every shell must be
    /// closed.
    pub fn from_shells(arena: &ShapeArena, shells: &[ShellKey], retries: usize) -> Result<Self, ClassifyError> {
        let mut faces = Vec::new();
        let mut bbox = Aabb::void();
        for &shell in shells {
            if !arena.shell_is_closed(shell) {
                return Err(ClassifyError::OpenShell(shell));
            }
            for usage in arena.oriented_faces(shell.into()) {
                let Some(polygon) = FacePolygon::from_face(arena, usage.key) else {
                    continue;
                };
                let normal = polygon.plane.normal * usage.orientation.sign();
                let triangles = arena
                    .triangulate_face(usage.key)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|[a, b, c]| {
                        if (b - a).cross(&(c - a)).dot(&normal) < 0.0 {
                            [a, c, b]
                        } else {
                            [a, b, c]
                        }
                    })
                    .collect();
                bbox.add_box(&arena.bounding_box(usage.key.into()));
                faces.push(ClassifierFace {
                    polygon,
                    normal,
                    triangles,
                });
            }
        }
        if faces.is_empty() {
            return Err(ClassifyError::Empty);
        }
        Ok(Self {
            faces,
            bbox,
            retries: retries.max(1),
        })
    }

    /// Classifies `p` with tolerance `tol`.
    pub fn classify(&self, p: &Point3<f64>, tol: f64) -> Result<PointState, ClassifyError> {
        let mut reach = self.bbox;
        reach.enlarge(reach.gap() + tol);
        if !reach.contains(p) {
            return Ok(PointState::Out);
        }

        for face in &self.faces {
            if face.polygon.plane.signed_distance(p).abs() <= tol
                && face.polygon.classify(p, tol) != PointState::Out
            {
                return Ok(PointState::On);
            }
        }

        for i in 0..self.retries {
            if let Some(state) = self.classify_along(p, &ray_direction(i, self.retries), tol) {
                return Ok(state);
            }
        }

        tracing::debug!("All ray directions ambiguous, using winding number");
        let winding = self.winding_number(p);
        let rounded = winding.round();
        if (winding - rounded).abs() > 1e-3 {
            return Err(ClassifyError::SelfInterfering);
        }
        Ok(if rounded != 0.0 {
            PointState::In
        } else {
            PointState::Out
        })
    }

    /// Casts one ray. `None` when the ray is ambiguous (grazes a face plane
    /// or crosses a face boundary within tolerance).
    pub fn classify_along(&self, p: &Point3<f64>, dir: &Vector3<f64>, tol: f64) -> Option<PointState> {
        let dir = dir.try_normalize(f64::EPSILON)?;
        let mut winding = 0i32;
        for face in &self.faces {
            let plane = &face.polygon.plane;
            let dn = dir.dot(&plane.normal);
            let sd = plane.signed_distance(p);
            if dn.abs() < 1e-9 {
                if sd.abs() <= tol {
                    return None;
                }
                continue;
            }
            let t = -sd / dn;
            if t < -tol {
                continue;
            }
            let hit = p + dir * t;
            let state = face.polygon.classify(&hit, tol);
            if t.abs() <= tol {
                if state != PointState::Out {
                    return Some(PointState::On);
                }
                continue;
            }
            match state {
                PointState::In => {
                    winding += if dir.dot(&face.normal) > 0.0 { 1 } else { -1 };
                }
                PointState::On => return None,
                PointState::Out => {}
            }
        }
        Some(if winding != 0 {
            PointState::In
        } else {
            PointState::Out
        })
    }

    /// Generalized winding number of the surface around `p`.
    fn winding_number(&self, p: &Point3<f64>) -> f64 {
        let mut total = 0.0;
        for face in &self.faces {
            for [a, b, c] in &face.triangles {
                total += solid_angle(&(a - p), &(b - p), &(c - p));
            }
        }
        total / (4.0 * PI)
    }
}

/// Signed solid angle of a triangle seen from the origin (Van Oosterom and
/// Strackee).
fn solid_angle(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
    let (la, lb, lc) = (a.norm(), b.norm(), c.norm());
    let numerator = a.dot(&b.cross(c));
    let denominator = la * lb * lc + a.dot(b) * lc + a.dot(c) * lb + b.dot(c) * la;
    2.0 * numerator.atan2(denominator)
}

/// The `i`-th of `n` directions spread over the sphere (Fibonacci lattice),
/// rotated off the coordinate axes.
fn ray_direction(i: usize, n: usize) -> Vector3<f64> {
    let golden = PI * (3.0 - 5.0_f64.sqrt());
    let n = n.max(1) as f64;
    let y = 1.0 - 2.0 * (i as f64 + 0.5) / n;
    let r = (1.0 - y * y).max(0.0).sqrt();
    let phi = i as f64 * golden + 0.5;
    Vector3::new(r * phi.cos() + 0.0123, y, r * phi.sin() + 0.0071).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_cube() -> (ShapeArena, SolidKey) {
        let mut arena = ShapeArena::new();
        let (solid, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        (arena, solid)
    }

    #[test]
    fn inside_outside_on() {
        let (arena, solid) = unit_cube();
        let c = SolidClassifier::new(&arena, solid, 8).unwrap();
        let tol = 1e-7;
        assert_eq!(c.classify(&Point3::new(0.3, 0.6, 0.2), tol), Ok(PointState::In));
        assert_eq!(c.classify(&Point3::new(1.3, 0.6, 0.2), tol), Ok(PointState::Out));
        assert_eq!(c.classify(&Point3::new(0.5, 0.5, 1.0), tol), Ok(PointState::On));
        assert_eq!(c.classify(&Point3::new(1.0, 1.0, 0.5), tol), Ok(PointState::On));
        // Outside, but within the box of the solid along two axes.
        assert_eq!(c.classify(&Point3::new(0.5, 0.5, 1.5), tol), Ok(PointState::Out));
    }

    #[test]
    fn ray_direction_does_not_matter() {
        let (arena, solid) = unit_cube();
        let c = SolidClassifier::new(&arena, solid, 8).unwrap();
        let inside = Point3::new(0.25, 0.4, 0.7);
        let outside = Point3::new(-0.5, 0.45, 0.65);
        let dirs = [
            Vector3::new(1.0, 0.1, 0.2),
            Vector3::new(-1.0, 0.3, 0.1),
            Vector3::new(0.2, 1.0, -0.3),
            Vector3::new(0.1, -1.0, 0.4),
            Vector3::new(0.3, 0.2, 1.0),
            Vector3::new(-0.2, 0.1, -1.0),
            Vector3::new(0.6, 0.7, 0.4),
            Vector3::new(-0.5, -0.6, -0.7),
        ];
        for dir in &dirs {
            assert_eq!(c.classify_along(&inside, dir, 1e-7), Some(PointState::In));
            assert_eq!(c.classify_along(&outside, dir, 1e-7), Some(PointState::Out));
        }
    }

    #[test]
    fn ray_through_an_edge_is_ambiguous() {
        let (arena, solid) = unit_cube();
        let c = SolidClassifier::new(&arena, solid, 8).unwrap();
        let p = Point3::new(0.5, 0.5, 0.5);
        // Aimed at the middle of the edge x = 1, z = 1.
        let dir = Point3::new(1.0, 0.5, 1.0) - p;
        assert_eq!(c.classify_along(&p, &dir, 1e-7), None);
    }

    #[test]
    fn cavity_is_outside() {
        let mut arena = ShapeArena::new();
        let (_, outer, _) = arena.make_box([0.0; 3], [3.0; 3]).unwrap();
        let (_, _, inner_faces) = arena.make_box([1.0; 3], [2.0; 3]).unwrap();
        let usages: Vec<_> = inner_faces
            .iter()
            .map(|&f| paver_topology::Oriented::reversed_of(f))
            .collect();
        let cavity = arena.add_shell(&usages).unwrap();
        let c = SolidClassifier::from_shells(&arena, &[outer, cavity], 8).unwrap();
        assert_eq!(c.classify(&Point3::new(1.5, 1.5, 1.5), 1e-7), Ok(PointState::Out));
        assert_eq!(c.classify(&Point3::new(0.5, 1.5, 1.5), 1e-7), Ok(PointState::In));
        assert_relative_eq!(c.winding_number(&Point3::new(0.5, 1.5, 1.5)), 1.0, epsilon = 1e-9);
        assert_relative_eq!(c.winding_number(&Point3::new(1.5, 1.5, 1.5)), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn open_shell_is_rejected() {
        let mut arena = ShapeArena::new();
        let (_, _, faces) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let open = arena.add_shell_from_faces(&faces[..5]).unwrap();
        assert_eq!(
            SolidClassifier::from_shells(&arena, &[open], 8).err(),
            Some(ClassifyError::OpenShell(open))
        );
    }

    #[test]
    fn winding_number_of_cube() {
        let (arena, solid) = unit_cube();
        let c = SolidClassifier::new(&arena, solid, 8).unwrap();
        assert_relative_eq!(c.winding_number(&Point3::new(0.5, 0.2, 0.9)), 1.0, epsilon = 1e-9);
        assert_relative_eq!(c.winding_number(&Point3::new(2.0, 0.2, 0.9)), 0.0, epsilon = 1e-9);
    }
}
