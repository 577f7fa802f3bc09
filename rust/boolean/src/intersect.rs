// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Intersection numerics for straight curves and planar surfaces.
//!
//! Every routine reports parameters and distances and leaves the tolerance
//! decision to the caller. `None` means the numerics produced no usable
//! answer (non-finite intermediate values); callers record a
//! `NumericNonConvergence` alert and treat the pair as non-interfering.

use nalgebra::{Point2, Point3, Vector2};
use paver_topology::precision;
use paver_topology::{Line, Plane};

/// Position of a point relative to a bounded region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointState {
    In,
    Out,
    On,
}

// --- Projections ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveProjection {
    pub parameter: f64,
    pub point: Point3<f64>,
    pub distance: f64,
}

pub fn project_point_on_curve(p: &Point3<f64>, curve: &Line) -> CurveProjection {
    let parameter = curve.parameter(p);
    let point = curve.point(parameter);
    CurveProjection {
        parameter,
        point,
        distance: (p - point).norm(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceProjection {
    pub uv: Point2<f64>,
    pub point: Point3<f64>,
    /// Unsigned distance to the plane.
    pub distance: f64,
}

pub fn project_point_on_surface(p: &Point3<f64>, surface: &Plane) -> SurfaceProjection {
    SurfaceProjection {
        uv: surface.to_uv(p),
        point: surface.project(p),
        distance: surface.signed_distance(p).abs(),
    }
}

// --- Curve / curve ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveCurve {
    Disjoint,
    /// Closest approach of two non-parallel segments.
    Point {
        point: Point3<f64>,
        t1: f64,
        t2: f64,
        distance: f64,
    },
    /// Collinear segments sharing a sub-range of positive length.
    Overlap {
        range1: (f64, f64),
        range2: (f64, f64),
    },
}

/// Intersects two bounded straight curves.
///
/// A `Point` result is only returned when both parameters lie within their
/// ranges widened by `tol` and the closest approach is within `tol`.
pub fn intersect_curve_curve(
    c1: &Line,
    r1: (f64, f64),
    c2: &Line,
    r2: (f64, f64),
    tol: f64,
) -> Option<CurveCurve> {
    let b = c1.direction.dot(&c2.direction);
    let denom = 1.0 - b * b;
    if !denom.is_finite() {
        return None;
    }

    if denom < precision::PARALLEL {
        let a0 = c2.point(r2.0);
        let a1 = c2.point(r2.1);
        if c1.distance(&a0) > tol || c1.distance(&a1) > tol {
            return Some(CurveCurve::Disjoint);
        }
        let (s0, s1) = sorted(c1.parameter(&a0), c1.parameter(&a1));
        let lo = s0.max(r1.0);
        let hi = s1.min(r1.1);
        if hi - lo <= tol {
            return Some(CurveCurve::Disjoint);
        }
        let range2 = sorted(c2.parameter(&c1.point(lo)), c2.parameter(&c1.point(hi)));
        return Some(CurveCurve::Overlap {
            range1: (lo, hi),
            range2,
        });
    }

    let w = c1.origin - c2.origin;
    let d = c1.direction.dot(&w);
    let e = c2.direction.dot(&w);
    let t1 = (b * e - d) / denom;
    let t2 = (e - b * d) / denom;
    if !t1.is_finite() || !t2.is_finite() {
        return None;
    }
    if t1 < r1.0 - tol || t1 > r1.1 + tol || t2 < r2.0 - tol || t2 > r2.1 + tol {
        return Some(CurveCurve::Disjoint);
    }
    let p1 = c1.point(t1);
    let p2 = c2.point(t2);
    let distance = (p1 - p2).norm();
    if distance > tol {
        return Some(CurveCurve::Disjoint);
    }
    Some(CurveCurve::Point {
        point: nalgebra::center(&p1, &p2),
        t1,
        t2,
        distance,
    })
}

// --- Curve / surface ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveSurface {
    Disjoint,
    /// The curve crosses the plane.
    Point {
        point: Point3<f64>,
        parameter: f64,
        uv: Point2<f64>,
    },
    /// Both ends of the curve lie in the plane within tolerance.
    InPlane,
}

pub fn intersect_curve_surface(
    curve: &Line,
    range: (f64, f64),
    surface: &Plane,
    tol: f64,
) -> Option<CurveSurface> {
    let denom = surface.normal.dot(&curve.direction);
    let d0 = surface.signed_distance(&curve.point(range.0));
    let d1 = surface.signed_distance(&curve.point(range.1));
    if !denom.is_finite() || !d0.is_finite() || !d1.is_finite() {
        return None;
    }
    if d0.abs() <= tol && d1.abs() <= tol {
        return Some(CurveSurface::InPlane);
    }
    if denom.abs() < precision::PARALLEL {
        return Some(CurveSurface::Disjoint);
    }
    let parameter = range.0 - d0 / denom;
    if !parameter.is_finite() {
        return None;
    }
    if parameter < range.0 - tol || parameter > range.1 + tol {
        return Some(CurveSurface::Disjoint);
    }
    let point = curve.point(parameter);
    Some(CurveSurface::Point {
        point,
        parameter,
        uv: surface.to_uv(&point),
    })
}

// --- Surface / surface ---

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceSurface {
    /// Parallel planes further apart than the tolerance.
    Parallel,
    Coplanar,
    /// The intersection line, directed along `n1 × n2`.
    Line(Line),
}

pub fn intersect_surface_surface(s1: &Plane, s2: &Plane, tol: f64) -> Option<SurfaceSurface> {
    let cross = s1.normal.cross(&s2.normal);
    let sin = cross.norm();
    if !sin.is_finite() {
        return None;
    }
    if sin < precision::PARALLEL {
        let d = s2.signed_distance(&s1.origin);
        if !d.is_finite() {
            return None;
        }
        return Some(if d.abs() <= tol {
            SurfaceSurface::Coplanar
        } else {
            SurfaceSurface::Parallel
        });
    }

    let h1 = s1.normal.dot(&s1.origin.coords);
    let h2 = s2.normal.dot(&s2.origin.coords);
    let c = s1.normal.dot(&s2.normal);
    let det = 1.0 - c * c;
    let a = (h1 - h2 * c) / det;
    let b = (h2 - h1 * c) / det;
    let origin = Point3::from(s1.normal * a + s2.normal * b);
    let direction = cross / sin;
    if !origin.coords.iter().all(|x| x.is_finite()) {
        return None;
    }
    Some(SurfaceSurface::Line(Line { origin, direction }))
}

// --- Point in polygon ---

/// Distance from `p` to the segment `a`-`b` in the plane.
pub fn distance_to_segment_2d(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab: Vector2<f64> = b - a;
    let len2 = ab.norm_squared();
    if len2 <= f64::EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Classifies a `(u, v)` point against closed loops (outer boundary and
/// holes). A point within `tol` of any loop segment is `On`, otherwise the
/// crossing parity over all loops decides.
pub fn classify_point_in_polygon(p: &Point2<f64>, loops: &[Vec<Point2<f64>>], tol: f64) -> PointState {
    for ring in loops {
        let n = ring.len();
        for i in 0..n {
            if distance_to_segment_2d(p, &ring[i], &ring[(i + 1) % n]) <= tol {
                return PointState::On;
            }
        }
    }

    let mut inside = false;
    for ring in loops {
        let n = ring.len();
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let (a, b) = (ring[i], ring[j]);
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
    }
    if inside {
        PointState::In
    } else {
        PointState::Out
    }
}

fn sorted(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
