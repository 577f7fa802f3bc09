// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-run cache of geometric queries.
//!
//! Face polygons (the boundary wires of a face projected into its plane
//! frame) and solid classifiers are built once and then shared read-only
//! by the parallel stages.

use nalgebra::{Point2, Point3};
use paver_topology::{FaceKey, Plane, ShapeArena, SolidKey};
use rustc_hash::FxHashMap;

use crate::classifier::{ClassifyError, SolidClassifier};
use crate::intersect::{classify_point_in_polygon, PointState};
use crate::parallel::map_slots;

/// A face flattened into `(u, v)` loops.
#[derive(Debug, Clone)]
pub struct FacePolygon {
    pub plane: Plane,
    /// Outer loop first, then the holes.
    pub loops: Vec<Vec<Point2<f64>>>,
    pub tolerance: f64,
}

impl FacePolygon {
    pub fn from_face(arena: &ShapeArena, face: FaceKey) -> Option<Self> {
        let data = arena.face(face)?;
        let loops: Vec<Vec<Point2<f64>>> = data
            .wires()
            .map(|w| arena.wire_uv(face, w))
            .filter(|ring| ring.len() >= 3)
            .collect();
        if loops.is_empty() {
            return None;
        }
        Some(Self {
            plane: data.surface,
            loops,
            tolerance: data.tolerance,
        })
    }

    /// Classifies the projection of `p` in the face domain.
    pub fn classify(&self, p: &Point3<f64>, tol: f64) -> PointState {
        self.classify_uv(&self.plane.to_uv(p), tol)
    }

    pub fn classify_uv(&self, uv: &Point2<f64>, tol: f64) -> PointState {
        classify_point_in_polygon(uv, &self.loops, tol)
    }
}

#[derive(Debug, Default)]
pub struct Context {
    faces: FxHashMap<FaceKey, FacePolygon>,
    solids: FxHashMap<SolidKey, Result<SolidClassifier, ClassifyError>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the polygons of every face not cached yet.
    pub fn prepare_faces(&mut self, arena: &ShapeArena, faces: &[FaceKey], parallel: bool) {
        let missing: Vec<FaceKey> = faces
            .iter()
            .copied()
            .filter(|f| !self.faces.contains_key(f))
            .collect();
        let built = map_slots(&missing, parallel, |&f| FacePolygon::from_face(arena, f));
        for (face, polygon) in missing.into_iter().zip(built) {
            if let Some(polygon) = polygon {
                self.faces.insert(face, polygon);
            }
        }
    }

    pub fn face(&self, face: FaceKey) -> Option<&FacePolygon> {
        self.faces.get(&face)
    }

    /// Point-in-face test, using the cached polygon when there is one.
    pub fn classify_point_in_face(
        &self,
        arena: &ShapeArena,
        p: &Point3<f64>,
        face: FaceKey,
        tol: f64,
    ) -> PointState {
        match self.faces.get(&face) {
            Some(polygon) => polygon.classify(p, tol),
            None => FacePolygon::from_face(arena, face).map_or(PointState::Out, |poly| poly.classify(p, tol)),
        }
    }

    /// Builds the classifier of a solid unless it is cached.
    pub fn prepare_solid(&mut self, arena: &ShapeArena, solid: SolidKey, retries: usize) {
        self.solids
            .entry(solid)
            .or_insert_with(|| SolidClassifier::new(arena, solid, retries));
    }

    /// Cached classifier of a solid, or why it could not be built.
    pub fn solid(&self, solid: SolidKey) -> Option<&Result<SolidClassifier, ClassifyError>> {
        self.solids.get(&solid)
    }
}
