// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding boxes with a tolerance gap.

use nalgebra::Point3;

/// An axis-aligned box. The gap enlarges the box on every side when it is
/// queried, so boxes of shapes with a tolerance overlap whenever their
/// tolerance spheres might touch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    min: Point3<f64>,
    max: Point3<f64>,
    gap: f64,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::void()
    }
}

impl Aabb {
    /// The empty box. Overlaps nothing.
    pub fn void() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            gap: 0.0,
        }
    }

    /// Tight box around a set of points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut b = Self::void();
        for p in points {
            b.add_point(p);
        }
        b
    }

    pub fn is_void(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn add_point(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Grows this box to cover `other`, keeping the larger gap.
    pub fn add_box(&mut self, other: &Aabb) {
        if other.is_void() {
            return;
        }
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
        self.gap = self.gap.max(other.gap);
    }

    pub fn gap(&self) -> f64 {
        self.gap
    }

    /// Raises the gap to at least `tol`.
    pub fn enlarge(&mut self, tol: f64) {
        self.gap = self.gap.max(tol.abs());
    }

    /// Minimum corner including the gap.
    pub fn min(&self) -> Point3<f64> {
        self.min.map(|c| c - self.gap)
    }

    /// Maximum corner including the gap.
    pub fn max(&self) -> Point3<f64> {
        self.max.map(|c| c + self.gap)
    }

    pub fn center(&self) -> Option<Point3<f64>> {
        if self.is_void() {
            None
        } else {
            Some(nalgebra::center(&self.min, &self.max))
        }
    }

    /// Length of the diagonal including the gap.
    pub fn diagonal(&self) -> f64 {
        if self.is_void() {
            0.0
        } else {
            (self.max() - self.min()).norm()
        }
    }

    /// Whether the gapped boxes share at least one point.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        if self.is_void() || other.is_void() {
            return false;
        }
        let (a0, a1) = (self.min(), self.max());
        let (b0, b1) = (other.min(), other.max());
        a0.x <= b1.x && b0.x <= a1.x && a0.y <= b1.y && b0.y <= a1.y && a0.z <= b1.z && b0.z <= a1.z
    }

    /// Whether the gapped box contains `p`.
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        if self.is_void() {
            return false;
        }
        let (lo, hi) = (self.min(), self.max());
        (lo.x..=hi.x).contains(&p.x) && (lo.y..=hi.y).contains(&p.y) && (lo.z..=hi.z).contains(&p.z)
    }
}
