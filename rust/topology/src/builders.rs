// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level builders that construct closed solids from polygon lists
//! with tolerance-based vertex and edge sharing (face sewing).

use nalgebra::Point3;
use rustc_hash::FxHashMap;

use crate::arena::ShapeArena;
use crate::error::{Error, Result};
use crate::keys::*;
use crate::precision;
use crate::spatial::SpatialIndex;

impl ShapeArena {
    /// Creates a shell from polygon coordinate lists, sewing vertices that
    /// lie within `tolerance` of each other and sharing the edges between
    /// them.
    ///
    /// Every polygon must run counter-clockwise when seen from the side its
    /// face usage should point to.
    pub fn sew_faces(
        &mut self,
        face_coords: &[Vec<[f64; 3]>],
        tolerance: f64,
    ) -> Result<(ShellKey, Vec<FaceKey>)> {
        if face_coords.is_empty() {
            return Err(Error::EmptyShell);
        }

        let cell_size = tolerance.max(precision::CONFUSION);
        let mut index = SpatialIndex::new(cell_size);
        // Track edge sharing: (min_vertex, max_vertex) → EdgeKey
        let mut edge_map: FxHashMap<(VertexKey, VertexKey), EdgeKey> = FxHashMap::default();
        let mut faces = Vec::with_capacity(face_coords.len());

        for coords in face_coords {
            if coords.len() < 3 {
                return Err(Error::DegenerateFace);
            }

            let vertices: Vec<VertexKey> = coords
                .iter()
                .map(|c| self.find_or_add_vertex(&mut index, Point3::new(c[0], c[1], c[2]), tolerance))
                .collect();

            let mut usages = Vec::with_capacity(vertices.len());
            for i in 0..vertices.len() {
                let start = vertices[i];
                let end = vertices[(i + 1) % vertices.len()];
                if start == end {
                    continue;
                }

                // Canonical edge key (ordered by key for deduplication)
                let canonical = if start < end { (start, end) } else { (end, start) };

                let edge = match edge_map.get(&canonical) {
                    Some(&existing) => existing,
                    None => {
                        let new_edge = self.add_edge(start, end)?;
                        edge_map.insert(canonical, new_edge);
                        new_edge
                    }
                };

                let forward = self.edges[edge].start == start;
                usages.push(if forward {
                    Oriented::forward(edge)
                } else {
                    Oriented::reversed_of(edge)
                });
            }

            if usages.len() < 3 {
                return Err(Error::DegenerateFace);
            }

            let wire = self.add_wire(&usages)?;
            faces.push(self.add_face(wire)?);
        }

        let shell = self.add_shell_from_faces(&faces)?;
        Ok((shell, faces))
    }

    /// Constructs a closed solid from outward-facing polygons.
    ///
    /// Returns [`Error::OpenShell`] if the sewn faces leave free edges.
    pub fn make_polyhedron(
        &mut self,
        face_coords: &[Vec<[f64; 3]>],
        tolerance: f64,
    ) -> Result<SolidKey> {
        let (shell, _) = self.sew_faces(face_coords, tolerance)?;
        match self.shell_free_edge_count(shell) {
            Some(0) => self.add_solid(shell),
            Some(n) => Err(Error::OpenShell(n)),
            None => Err(Error::ShellNotFound(shell)),
        }
    }

    /// Creates an axis-aligned box solid from min/max corners.
    pub fn make_box(
        &mut self,
        min: [f64; 3],
        max: [f64; 3],
    ) -> Result<(SolidKey, ShellKey, [FaceKey; 6])> {
        if (0..3).any(|i| max[i] - min[i] < precision::CONFUSION) {
            return Err(Error::DegenerateFace);
        }

        let faces = box_faces(min, max);
        let (shell, face_keys) = self.sew_faces(&faces, precision::CONFUSION)?;
        let solid = self.add_solid(shell)?;

        Ok((
            solid,
            shell,
            [
                face_keys[0],
                face_keys[1],
                face_keys[2],
                face_keys[3],
                face_keys[4],
                face_keys[5],
            ],
        ))
    }
}

/// Outward-facing polygons of an axis-aligned box.
pub fn box_faces(min: [f64; 3], max: [f64; 3]) -> Vec<Vec<[f64; 3]>> {
    let [x0, y0, z0] = min;
    let [x1, y1, z1] = max;
    vec![
        // bottom (z=z0), outward normal = -Z
        vec![[x0, y0, z0], [x0, y1, z0], [x1, y1, z0], [x1, y0, z0]],
        // top (z=z1), outward normal = +Z
        vec![[x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1]],
        // front (y=y0), outward normal = -Y
        vec![[x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1]],
        // back (y=y1), outward normal = +Y
        vec![[x0, y1, z0], [x0, y1, z1], [x1, y1, z1], [x1, y1, z0]],
        // left (x=x0), outward normal = -X
        vec![[x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0]],
        // right (x=x1), outward normal = +X
        vec![[x1, y0, z0], [x1, y1, z0], [x1, y1, z1], [x1, y0, z1]],
    ]
}
