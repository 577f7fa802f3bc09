// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Analytic carriers: straight lines for edges and planes for faces.

use nalgebra::{Point2, Point3, Vector3};

use crate::precision;

/// An infinite straight line parameterised by arc length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub origin: Point3<f64>,
    /// Unit direction.
    pub direction: Vector3<f64>,
}

impl Line {
    /// Line through `a` and `b`, with `a` at parameter 0 and `b` at
    /// parameter `|b - a|`. `None` when the points coincide.
    pub fn through(a: &Point3<f64>, b: &Point3<f64>) -> Option<Self> {
        let d = b - a;
        let len = d.norm();
        if len < precision::CONFUSION {
            return None;
        }
        Some(Self {
            origin: *a,
            direction: d / len,
        })
    }

    /// Point at parameter `t`.
    pub fn point(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Parameter of the orthogonal projection of `p`.
    pub fn parameter(&self, p: &Point3<f64>) -> f64 {
        (p - self.origin).dot(&self.direction)
    }

    /// Distance from `p` to the line.
    pub fn distance(&self, p: &Point3<f64>) -> f64 {
        let t = self.parameter(p);
        (p - self.point(t)).norm()
    }
}

/// An infinite plane with an orthonormal in-plane frame.
///
/// `u_axis × v_axis == normal`, so a loop that is counter-clockwise in
/// `(u, v)` coordinates is counter-clockwise about the normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub origin: Point3<f64>,
    pub normal: Vector3<f64>,
    pub u_axis: Vector3<f64>,
    pub v_axis: Vector3<f64>,
}

impl Plane {
    /// Plane through `origin` with the given normal. `None` for a zero normal.
    pub fn new(origin: Point3<f64>, normal: Vector3<f64>) -> Option<Self> {
        let len = normal.norm();
        if len < precision::PARALLEL {
            return None;
        }
        let n = normal / len;
        // Pick the world axis least aligned with the normal as a seed.
        let seed = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
            Vector3::x()
        } else if n.y.abs() <= n.z.abs() {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let u = (seed - n * seed.dot(&n)).normalize();
        let v = n.cross(&u);
        Some(Self {
            origin,
            normal: n,
            u_axis: u,
            v_axis: v,
        })
    }

    /// Best-fit plane of a closed polygon (Newell's method). The normal
    /// follows the right-hand rule over the vertex order.
    pub fn from_polygon(points: &[Point3<f64>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let mut normal = Vector3::zeros();
        let mut centroid = Vector3::zeros();
        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            normal.x += (p.y - q.y) * (p.z + q.z);
            normal.y += (p.z - q.z) * (p.x + q.x);
            normal.z += (p.x - q.x) * (p.y + q.y);
            centroid += p.coords;
        }
        centroid /= points.len() as f64;
        Self::new(Point3::from(centroid), normal)
    }

    /// Same plane with the opposite normal.
    pub fn reversed(&self) -> Self {
        Self {
            origin: self.origin,
            normal: -self.normal,
            u_axis: self.v_axis,
            v_axis: self.u_axis,
        }
    }

    /// Signed distance of `p` along the normal.
    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        (p - self.origin).dot(&self.normal)
    }

    /// Projects `p` into the plane's `(u, v)` frame.
    pub fn to_uv(&self, p: &Point3<f64>) -> Point2<f64> {
        let d = p - self.origin;
        Point2::new(d.dot(&self.u_axis), d.dot(&self.v_axis))
    }

    /// Lifts a `(u, v)` point back to 3D.
    pub fn from_uv(&self, uv: &Point2<f64>) -> Point3<f64> {
        self.origin + self.u_axis * uv.x + self.v_axis * uv.y
    }

    /// Orthogonal projection of `p` onto the plane.
    pub fn project(&self, p: &Point3<f64>) -> Point3<f64> {
        p - self.normal * self.signed_distance(p)
    }

    /// Projects a direction into the `(u, v)` frame.
    pub fn dir_to_uv(&self, d: &Vector3<f64>) -> nalgebra::Vector2<f64> {
        nalgebra::Vector2::new(d.dot(&self.u_axis), d.dot(&self.v_axis))
    }

    /// Whether two planes coincide within `tol` (either orientation).
    pub fn is_coplanar(&self, other: &Plane, tol: f64) -> bool {
        let cross = self.normal.cross(&other.normal).norm();
        cross < precision::PARALLEL.max(tol * 1e-3)
            && self.signed_distance(&other.origin).abs() <= tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn line_parameter_is_arc_length() {
        let a = Point3::new(1.0, 1.0, 0.0);
        let b = Point3::new(1.0, 4.0, 0.0);
        let line = Line::through(&a, &b).unwrap();
        assert_relative_eq!(line.parameter(&b), 3.0, epsilon = 1e-12);
        assert_relative_eq!(line.point(1.5).y, 2.5, epsilon = 1e-12);
        assert_relative_eq!(line.distance(&Point3::new(3.0, 2.0, 0.0)), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_line_is_rejected() {
        let a = Point3::new(0.0, 0.0, 0.0);
        assert!(Line::through(&a, &a).is_none());
    }

    #[test]
    fn newell_normal_follows_winding() {
        let ccw = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let plane = Plane::from_polygon(&ccw).unwrap();
        assert_relative_eq!(plane.normal.z, 1.0, epsilon = 1e-12);

        let mut cw = ccw;
        cw.reverse();
        let plane = Plane::from_polygon(&cw).unwrap();
        assert_relative_eq!(plane.normal.z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn uv_frame_is_right_handed() {
        let plane = Plane::new(Point3::origin(), Vector3::new(0.0, 0.0, 2.0)).unwrap();
        let n = plane.u_axis.cross(&plane.v_axis);
        assert_relative_eq!(n, plane.normal, epsilon = 1e-12);
        let rev = plane.reversed();
        assert_relative_eq!(rev.u_axis.cross(&rev.v_axis), rev.normal, epsilon = 1e-12);
    }

    #[test]
    fn uv_roundtrip_stays_in_plane() {
        let plane = Plane::new(Point3::new(1.0, 2.0, 3.0), Vector3::new(1.0, 1.0, 0.0)).unwrap();
        let p = Point3::new(4.0, -1.0, 7.0);
        let q = plane.from_uv(&plane.to_uv(&p));
        assert_relative_eq!(q, plane.project(&p), epsilon = 1e-12);
        assert_relative_eq!(plane.signed_distance(&q), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn coplanar_ignores_orientation() {
        let a = Plane::new(Point3::origin(), Vector3::z()).unwrap();
        let b = Plane::new(Point3::new(5.0, 5.0, 0.0), -Vector3::z()).unwrap();
        let c = Plane::new(Point3::new(0.0, 0.0, 0.1), Vector3::z()).unwrap();
        assert!(a.is_coplanar(&b, 1e-7));
        assert!(!a.is_coplanar(&c, 1e-7));
    }
}
