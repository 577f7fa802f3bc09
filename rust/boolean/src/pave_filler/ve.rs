// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vertex/edge stage: vertices lying on the interior of an edge become
//! paves of that edge.

use paver_topology::{EdgeKey, ShapeType, VertexKey};
use smallvec::smallvec;

use super::PaveFiller;
use crate::ds::{InterferenceGeometry, InterferenceKind, Pave};
use crate::intersect::project_point_on_curve;
use crate::iterator::candidate_pairs;
use crate::parallel::map_slots;
use crate::progress::{Abort, Stage};

#[derive(Debug, Clone, Copy)]
struct OnEdge {
    vertex: VertexKey,
    edge: EdgeKey,
    parameter: f64,
    distance: f64,
}

impl PaveFiller<'_> {
    pub(crate) fn perform_ve(&mut self) -> Result<(), Abort> {
        self.step(Stage::VertexEdge)?;
        let pairs = candidate_pairs(&self.ds, ShapeType::Vertex, ShapeType::Edge);
        let fuzzy = self.ds.fuzzy();

        let hits = {
            let arena = &*self.arena;
            let ds = &self.ds;
            let progress = self.progress;
            map_slots(&pairs, self.options.run_parallel, |&(vid, eid)| {
                if progress.user_break() {
                    return None;
                }
                let vertex = ds.info(vid).key.as_vertex()?;
                let edge = ds.info(eid).key.as_edge()?;
                let data = arena.edge(edge)?;
                let current = ds.resolve(vertex);
                if ds.resolve(data.start) == current || ds.resolve(data.end) == current {
                    return None;
                }
                let (p, tv) = ds.vertex_geometry(arena, vertex)?;
                let projection = project_point_on_curve(&p, &data.curve);
                if projection.distance > tv + data.tolerance + fuzzy {
                    return None;
                }
                if projection.parameter <= data.range.0 || projection.parameter >= data.range.1 {
                    return None;
                }
                // Within reach of an end vertex: that is a vertex/vertex
                // contact, not a split.
                for end in [data.start, data.end] {
                    let (pe, te) = ds.vertex_geometry(arena, end)?;
                    if (p - pe).norm() <= tv + te + fuzzy {
                        return None;
                    }
                }
                Some(OnEdge {
                    vertex,
                    edge,
                    parameter: projection.parameter,
                    distance: projection.distance,
                })
            })
        };
        self.check_break()?;

        let mut count = 0usize;
        for (&(vid, eid), hit) in pairs.iter().zip(hits) {
            let Some(hit) = hit else {
                continue;
            };
            let tolerance = self.ds.vertex_geometry(self.arena, hit.vertex).map_or(0.0, |(_, t)| t);
            let vertex = if hit.distance > tolerance {
                self.ds.grow_vertex(self.arena, hit.vertex, hit.distance)
            } else {
                self.ds.resolve(hit.vertex)
            };
            self.ds.add_pave(
                hit.edge,
                Pave {
                    vertex,
                    parameter: hit.parameter,
                },
            );
            self.ds.add_interference(
                vid,
                eid,
                InterferenceKind::VertexEdge,
                InterferenceGeometry::Point {
                    vertex,
                    params: smallvec![hit.parameter],
                },
            );
            count += 1;
        }
        tracing::debug!(pairs = pairs.len(), paves = count, "Vertex/edge pairs");
        Ok(())
    }
}
