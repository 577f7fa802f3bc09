// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge/edge stage: crossing edges get a shared new vertex, collinear
//! edges are recorded as overlapping.

use nalgebra::Point3;
use paver_topology::{EdgeKey, ShapeType};
use smallvec::smallvec;

use super::PaveFiller;
use crate::ds::{InterferenceGeometry, InterferenceKind, Pave};
use crate::intersect::{intersect_curve_curve, CurveCurve};
use crate::iterator::candidate_pairs;
use crate::parallel::map_slots;
use crate::progress::{Abort, Stage};
use crate::report::AlertKind;

#[derive(Debug, Clone, Copy)]
enum EdgeContact {
    Overlap {
        range1: (f64, f64),
        range2: (f64, f64),
    },
    Crossing {
        point: Point3<f64>,
        t1: f64,
        t2: f64,
        distance: f64,
    },
    Failed,
}

impl PaveFiller<'_> {
    pub(crate) fn perform_ee(&mut self) -> Result<(), Abort> {
        self.step(Stage::EdgeEdge)?;
        let pairs = candidate_pairs(&self.ds, ShapeType::Edge, ShapeType::Edge);
        let fuzzy = self.ds.fuzzy();

        let contacts = {
            let arena = &*self.arena;
            let ds = &self.ds;
            let progress = self.progress;
            map_slots(&pairs, self.options.run_parallel, |&(i1, i2)| {
                if progress.user_break() {
                    return None;
                }
                let e1 = arena.edge(ds.info(i1).key.as_edge()?)?;
                let e2 = arena.edge(ds.info(i2).key.as_edge()?)?;
                let ends1 = [ds.resolve(e1.start), ds.resolve(e1.end)];
                let ends2 = [ds.resolve(e2.start), ds.resolve(e2.end)];
                if (ends1[0] == ends2[0] && ends1[1] == ends2[1])
                    || (ends1[0] == ends2[1] && ends1[1] == ends2[0])
                {
                    return Some(EdgeContact::Overlap {
                        range1: e1.range,
                        range2: e2.range,
                    });
                }

                let tol = e1.tolerance + e2.tolerance + fuzzy;
                match intersect_curve_curve(&e1.curve, e1.range, &e2.curve, e2.range, tol) {
                    None => Some(EdgeContact::Failed),
                    Some(CurveCurve::Disjoint) => None,
                    Some(CurveCurve::Overlap { range1, range2 }) => Some(EdgeContact::Overlap { range1, range2 }),
                    Some(CurveCurve::Point {
                        point,
                        t1,
                        t2,
                        distance,
                    }) => {
                        // Crossings at an existing vertex are handled by the
                        // vertex stages.
                        for v in ends1.iter().chain(&ends2) {
                            let (pv, tv) = ds.vertex_geometry(arena, *v)?;
                            if (point - pv).norm() <= tv + tol {
                                return None;
                            }
                        }
                        Some(EdgeContact::Crossing {
                            point,
                            t1,
                            t2,
                            distance,
                        })
                    }
                }
            })
        };
        self.check_break()?;

        let mut created = Vec::new();
        let mut overlaps = 0usize;
        for (&(i1, i2), contact) in pairs.iter().zip(contacts) {
            let (Some(e1), Some(e2)) = (self.key_of(i1).as_edge(), self.key_of(i2).as_edge()) else {
                continue;
            };
            match contact {
                None => {}
                Some(EdgeContact::Failed) => {
                    self.report
                        .add_warning(AlertKind::NumericNonConvergence, vec![e1.into(), e2.into()]);
                }
                Some(EdgeContact::Overlap { range1, range2 }) => {
                    self.ds.add_interference(
                        i1,
                        i2,
                        InterferenceKind::EdgeEdge,
                        InterferenceGeometry::Overlap { range1, range2 },
                    );
                    overlaps += 1;
                }
                Some(EdgeContact::Crossing {
                    point,
                    t1,
                    t2,
                    distance,
                }) => {
                    let tolerance = 0.5 * distance + self.edge_tolerance(e1).max(self.edge_tolerance(e2));
                    let vertex = self.arena.add_vertex_with_tolerance(point, tolerance);
                    self.ds.append_vertex(self.arena, vertex);
                    self.ds.add_pave(e1, Pave { vertex, parameter: t1 });
                    self.ds.add_pave(e2, Pave { vertex, parameter: t2 });
                    self.ds.add_interference(
                        i1,
                        i2,
                        InterferenceKind::EdgeEdge,
                        InterferenceGeometry::Point {
                            vertex,
                            params: smallvec![t1, t2],
                        },
                    );
                    created.push(vertex);
                }
            }
        }
        tracing::debug!(
            pairs = pairs.len(),
            crossings = created.len(),
            overlaps,
            "Edge/edge pairs"
        );
        self.merge_new_vertices(&created);
        Ok(())
    }

    pub(crate) fn edge_tolerance(&self, edge: EdgeKey) -> f64 {
        self.arena.edge(edge).map_or(0.0, |e| e.tolerance)
    }
}
