// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pave blocks.
//!
//! Every operand edge is cut at its sorted paves, every section curve at
//! its own. Blocks of different edges that run between the same pair of
//! vertices are grouped into common blocks; blocks of edges lying in a
//! face plane are attached to the face when they run inside it.

use paver_topology::precision;
use paver_topology::{EdgeKey, ShapeKey, ShapeType, VertexKey};
use rustc_hash::FxHashMap;

use super::PaveFiller;
use crate::ds::{BlockOrigin, CommonBlock, Pave, PaveBlock};
use crate::intersect::PointState;
use crate::progress::{Abort, Stage};
use crate::report::AlertKind;

/// A pave and whether it is one of the edge end points.
#[derive(Debug, Clone, Copy)]
struct Stop {
    pave: Pave,
    is_end: bool,
}

impl PaveFiller<'_> {
    pub(crate) fn make_blocks(&mut self) -> Result<(), Abort> {
        self.step(Stage::MakeBlocks)?;
        let edges: Vec<EdgeKey> = self.shape_keys(ShapeType::Edge).filter_map(|k| k.as_edge()).collect();

        // Close paves of distinct vertices on one edge become one vertex.
        for &edge in &edges {
            let stops = self.sorted_stops(edge);
            for pair in stops.windows(2) {
                let (a, b) = (pair[0].pave, pair[1].pave);
                let (va, vb) = (self.ds.resolve(a.vertex), self.ds.resolve(b.vertex));
                if va == vb {
                    continue;
                }
                let ta = self.vertex_tolerance(va);
                let tb = self.vertex_tolerance(vb);
                if b.parameter - a.parameter <= ta + tb {
                    let (from, to) = if ta >= tb { (vb, va) } else { (va, vb) };
                    self.ds.set_same_domain(from, to);
                }
            }
        }
        self.check_break()?;

        for &edge in &edges {
            let stops = self.merged_stops(edge);
            let mut blocks = Vec::with_capacity(stops.len().saturating_sub(1));
            for pair in stops.windows(2) {
                let (start, end) = (pair[0].pave, pair[1].pave);
                if start.vertex == end.vertex || end.parameter - start.parameter < precision::PARAMETRIC {
                    self.report.add_warning(AlertKind::TinyEdge, vec![edge.into()]);
                    continue;
                }
                blocks.push(self.push_block(BlockOrigin::Edge(edge), start, end));
            }
            self.ds.edge_blocks.insert(edge, blocks);
        }

        for index in 0..self.ds.sections.len() {
            let paves: Vec<Pave> = self.ds.sections[index]
                .paves
                .iter()
                .map(|p| Pave {
                    vertex: self.ds.resolve(p.vertex),
                    parameter: p.parameter,
                })
                .collect();
            let mut blocks = Vec::new();
            for pair in paves.windows(2) {
                let (start, end) = (pair[0], pair[1]);
                if start.vertex == end.vertex || end.parameter - start.parameter < precision::PARAMETRIC {
                    let (f1, f2) = self.ds.sections[index].faces;
                    self.report
                        .add_warning(AlertKind::TinyEdge, vec![ShapeKey::from(f1), ShapeKey::from(f2)]);
                    continue;
                }
                blocks.push(self.push_block(BlockOrigin::Section(index), start, end));
            }
            self.ds.sections[index].blocks = blocks;
        }

        self.make_common_blocks();
        self.make_blocks_in();
        tracing::debug!(
            blocks = self.ds.pave_blocks.len(),
            common = self.ds.common_blocks.len(),
            sections = self.ds.sections.len(),
            "Pave blocks built"
        );
        Ok(())
    }

    fn push_block(&mut self, origin: BlockOrigin, start: Pave, end: Pave) -> usize {
        let index = self.ds.pave_blocks.len();
        self.ds.pave_blocks.push(PaveBlock {
            origin,
            start,
            end,
            common: None,
        });
        index
    }

    fn vertex_tolerance(&self, v: VertexKey) -> f64 {
        self.arena.vertex(v).map_or(0.0, |d| d.tolerance)
    }

    /// End paves and extra paves of an edge, sorted by parameter.
    fn sorted_stops(&self, edge: EdgeKey) -> Vec<Stop> {
        let Some(data) = self.arena.edge(edge) else {
            return Vec::new();
        };
        let mut stops = vec![
            Stop {
                pave: Pave {
                    vertex: data.start,
                    parameter: data.range.0,
                },
                is_end: true,
            },
            Stop {
                pave: Pave {
                    vertex: data.end,
                    parameter: data.range.1,
                },
                is_end: true,
            },
        ];
        stops.extend(self.ds.extra_paves(edge).iter().map(|&pave| Stop { pave, is_end: false }));
        stops.sort_by(|a, b| a.pave.parameter.total_cmp(&b.pave.parameter));
        stops
    }

    /// Sorted stops with resolved vertices, one per vertex run. End
    /// parameters are kept exact.
    fn merged_stops(&self, edge: EdgeKey) -> Vec<Stop> {
        let mut merged: Vec<Stop> = Vec::new();
        for stop in self.sorted_stops(edge) {
            let stop = Stop {
                pave: Pave {
                    vertex: self.ds.resolve(stop.pave.vertex),
                    parameter: stop.pave.parameter,
                },
                is_end: stop.is_end,
            };
            match merged.last_mut() {
                Some(last) if last.pave.vertex == stop.pave.vertex => {
                    if stop.is_end {
                        *last = stop;
                    }
                }
                _ => merged.push(stop),
            }
        }
        merged
    }

    /// Groups blocks running between the same two vertices.
    fn make_common_blocks(&mut self) {
        let mut slot_of: FxHashMap<(VertexKey, VertexKey), usize> = FxHashMap::default();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (index, block) in self.ds.pave_blocks.iter().enumerate() {
            let (a, b) = (block.start.vertex, block.end.vertex);
            let key = if a <= b { (a, b) } else { (b, a) };
            let slot = *slot_of.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(index);
        }
        for blocks in groups.into_iter().filter(|g| g.len() > 1) {
            let common = self.ds.common_blocks.len();
            for &b in &blocks {
                self.ds.pave_blocks[b].common = Some(common);
            }
            self.ds.common_blocks.push(CommonBlock { blocks });
        }
    }

    /// Attaches to each face the blocks of its in-plane edges that run
    /// strictly inside it.
    fn make_blocks_in(&mut self) {
        let faces: Vec<_> = self.shape_keys(ShapeType::Face).filter_map(|k| k.as_face()).collect();
        for face in faces {
            let Some(edges_in) = self.ds.face_info(face).map(|i| i.edges_in.clone()) else {
                continue;
            };
            let tol = self.arena.face(face).map_or(0.0, |f| f.tolerance) + self.ds.fuzzy();
            let mut inside = Vec::new();
            for edge in edges_in {
                let Some(curve) = self.arena.edge(edge).map(|e| e.curve) else {
                    continue;
                };
                for &b in self.ds.edge_blocks(edge) {
                    let block = &self.ds.pave_blocks[b];
                    let mid = curve.point(0.5 * (block.start.parameter + block.end.parameter));
                    if self.context.classify_point_in_face(self.arena, &mid, face, tol) == PointState::In {
                        inside.push(b);
                    }
                }
            }
            self.ds.face_info_mut(face).blocks_in = inside;
        }
    }
}
