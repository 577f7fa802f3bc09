// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial hash for tolerance-based vertex lookup.
//!
//! Uses a grid of cubic cells for O(1) average-case nearest-vertex queries.
//! This backs face sewing in [`ShapeArena::make_polyhedron`], where points
//! within a tolerance become the same vertex.

use nalgebra::Point3;
use rustc_hash::FxHashMap;

use crate::arena::ShapeArena;
use crate::keys::VertexKey;

/// A spatial hash grid for fast tolerance-based vertex lookup.
///
/// Lookups check the 27 neighboring cells (3x3x3 neighborhood), so the
/// query tolerance must not exceed `cell_size`.
#[derive(Debug)]
pub struct SpatialIndex {
    cell_size: f64,
    grid: FxHashMap<(i64, i64, i64), Vec<VertexKey>>,
}

impl SpatialIndex {
    /// Creates a new spatial index with the given cell size.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            grid: FxHashMap::default(),
        }
    }

    /// Builds a spatial index from all vertices in an arena.
    pub fn from_arena(arena: &ShapeArena, cell_size: f64) -> Self {
        let mut index = Self::new(cell_size);
        for (key, data) in arena.vertices.iter() {
            index.insert(key, &data.point);
        }
        index
    }

    /// Inserts a vertex key at the given position.
    pub fn insert(&mut self, key: VertexKey, p: &Point3<f64>) {
        let cell = self.cell_coords(p);
        self.grid.entry(cell).or_default().push(key);
    }

    /// Finds the nearest indexed vertex within `tolerance` of `p`.
    pub fn find_near(
        &self,
        arena: &ShapeArena,
        p: &Point3<f64>,
        tolerance: f64,
    ) -> Option<VertexKey> {
        let mut best: Option<(VertexKey, f64)> = None;
        for (vk, d) in self.candidates(arena, p, tolerance) {
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((vk, d));
            }
        }
        best.map(|(k, _)| k)
    }

    /// Finds all indexed vertices within `tolerance` of `p`.
    pub fn find_all_near(
        &self,
        arena: &ShapeArena,
        p: &Point3<f64>,
        tolerance: f64,
    ) -> Vec<VertexKey> {
        self.candidates(arena, p, tolerance)
            .map(|(k, _)| k)
            .collect()
    }

    fn candidates<'a>(
        &'a self,
        arena: &'a ShapeArena,
        p: &'a Point3<f64>,
        tolerance: f64,
    ) -> impl Iterator<Item = (VertexKey, f64)> + 'a {
        let (cx, cy, cz) = self.cell_coords(p);
        let tol_sq = tolerance * tolerance;
        // Search 3x3x3 neighborhood. Cells clamp at the i64 range, so
        // neighbours of far points can repeat.
        let mut cells: Vec<(i64, i64, i64)> = (-1..=1)
            .flat_map(|dx: i64| (-1..=1).flat_map(move |dy: i64| (-1..=1).map(move |dz: i64| (dx, dy, dz))))
            .map(|(dx, dy, dz)| (cx.saturating_add(dx), cy.saturating_add(dy), cz.saturating_add(dz)))
            .collect();
        cells.sort_unstable();
        cells.dedup();
        cells
            .into_iter()
            .filter_map(move |cell| self.grid.get(&cell))
            .flatten()
            .filter_map(move |&vk| {
                let v = arena.vertex(vk)?;
                let dist_sq = (v.point - p).norm_squared();
                (dist_sq <= tol_sq).then_some((vk, dist_sq))
            })
    }

    /// Float to integer casts saturate, so huge or infinite coordinates land
    /// in the outermost cells.
    fn cell_coords(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }
}

impl ShapeArena {
    /// Returns an existing vertex within `tolerance` of `p`, or creates a
    /// new one. This is the "merge-or-create" step of face sewing.
    pub fn find_or_add_vertex(
        &mut self,
        index: &mut SpatialIndex,
        p: Point3<f64>,
        tolerance: f64,
    ) -> VertexKey {
        if let Some(existing) = index.find_near(self, &p, tolerance) {
            return existing;
        }
        let key = self.add_vertex(p);
        index.insert(key, &p);
        key
    }
}
