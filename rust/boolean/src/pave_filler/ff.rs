// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face/face stage: section curves and coplanar pairs.
//!
//! Two planar faces meet along their plane intersection line. The line is
//! cut at every vertex already known to lie on it (face vertices, paves of
//! the face edges, vertices found inside the faces) and each piece is kept
//! when its midpoint lies in both faces. Consecutive kept pieces form one
//! section curve.

use paver_topology::precision;
use paver_topology::{FaceKey, Line, ShapeArena, ShapeType, VertexKey};
use rustc_hash::FxHashSet;

use super::PaveFiller;
use crate::context::Context;
use crate::ds::{Ds, InterferenceGeometry, InterferenceKind, Pave, SectionCurve};
use crate::intersect::{intersect_surface_surface, PointState, SurfaceSurface};
use crate::iterator::candidate_pairs;
use crate::parallel::map_slots;
use crate::progress::{Abort, Stage};
use crate::report::AlertKind;

#[derive(Debug, Clone)]
enum FaceFaceResult {
    Coplanar,
    Sections {
        line: Line,
        tolerance: f64,
        runs: Vec<Vec<Pave>>,
    },
    Failed,
}

impl PaveFiller<'_> {
    pub(crate) fn perform_ff(&mut self) -> Result<(), Abort> {
        self.step(Stage::FaceFace)?;
        let pairs = candidate_pairs(&self.ds, ShapeType::Face, ShapeType::Face);
        let fuzzy = self.ds.fuzzy();

        let results = {
            let arena = &*self.arena;
            let ds = &self.ds;
            let context = &self.context;
            let progress = self.progress;
            map_slots(&pairs, self.options.run_parallel, |&(i1, i2)| {
                if progress.user_break() {
                    return None;
                }
                let f1 = ds.info(i1).key.as_face()?;
                let f2 = ds.info(i2).key.as_face()?;
                intersect_faces(arena, ds, context, f1, f2, fuzzy)
            })
        };
        self.check_break()?;

        let mut curves = 0usize;
        let mut coplanar = 0usize;
        for (&(i1, i2), result) in pairs.iter().zip(results) {
            let (Some(f1), Some(f2)) = (self.key_of(i1).as_face(), self.key_of(i2).as_face()) else {
                continue;
            };
            match result {
                None => {}
                Some(FaceFaceResult::Failed) => {
                    self.report
                        .add_warning(AlertKind::NumericNonConvergence, vec![f1.into(), f2.into()]);
                }
                Some(FaceFaceResult::Coplanar) => {
                    self.ds.add_coplanar_faces(f1, f2);
                    self.ds
                        .add_interference(i1, i2, InterferenceKind::FaceFace, InterferenceGeometry::Coplanar);
                    coplanar += 1;
                }
                Some(FaceFaceResult::Sections { line, tolerance, runs }) => {
                    if runs.is_empty() {
                        continue;
                    }
                    let mut indices = Vec::with_capacity(runs.len());
                    for paves in runs {
                        let index = self.ds.sections.len();
                        self.ds.sections.push(SectionCurve {
                            faces: (f1, f2),
                            line,
                            tolerance,
                            paves,
                            blocks: Vec::new(),
                        });
                        self.ds.face_info_mut(f1).sections.push(index);
                        self.ds.face_info_mut(f2).sections.push(index);
                        indices.push(index);
                    }
                    curves += indices.len();
                    self.ds.add_interference(
                        i1,
                        i2,
                        InterferenceKind::FaceFace,
                        InterferenceGeometry::Curves(indices),
                    );
                }
            }
        }
        tracing::debug!(pairs = pairs.len(), curves, coplanar, "Face/face pairs");
        Ok(())
    }
}

fn intersect_faces(
    arena: &ShapeArena,
    ds: &Ds,
    context: &Context,
    f1: FaceKey,
    f2: FaceKey,
    fuzzy: f64,
) -> Option<FaceFaceResult> {
    let d1 = arena.face(f1)?;
    let d2 = arena.face(f2)?;
    let tol = d1.tolerance + d2.tolerance + fuzzy;
    let line = match intersect_surface_surface(&d1.surface, &d2.surface, tol) {
        None => return Some(FaceFaceResult::Failed),
        Some(SurfaceSurface::Parallel) => return None,
        Some(SurfaceSurface::Coplanar) => return Some(FaceFaceResult::Coplanar),
        Some(SurfaceSurface::Line(line)) => line,
    };

    // Vertices on the line, sorted by parameter.
    let mut seen = FxHashSet::default();
    let mut on_line: Vec<(Pave, f64)> = Vec::new();
    for v in section_candidates(arena, ds, f1)
        .into_iter()
        .chain(section_candidates(arena, ds, f2))
    {
        if !seen.insert(v) {
            continue;
        }
        let Some((p, tv)) = ds.vertex_geometry(arena, v) else {
            continue;
        };
        if line.distance(&p) <= tv + tol {
            on_line.push((
                Pave {
                    vertex: v,
                    parameter: line.parameter(&p),
                },
                tv,
            ));
        }
    }
    on_line.sort_by(|a, b| a.0.parameter.total_cmp(&b.0.parameter));

    // Vertices within each other's reach are one vertex on the line.
    let mut stops: Vec<(Pave, f64)> = Vec::with_capacity(on_line.len());
    for (pave, tv) in on_line {
        match stops.last_mut() {
            Some((last, last_tol))
                if pave.parameter - last.parameter <= tv + *last_tol + fuzzy
                    || pave.parameter - last.parameter < precision::PARAMETRIC =>
            {
                if tv > *last_tol {
                    *last = pave;
                    *last_tol = tv;
                }
            }
            _ => stops.push((pave, tv)),
        }
    }

    let classify = |face: FaceKey, t: f64| context.classify_point_in_face(arena, &line.point(t), face, tol);
    let mut runs: Vec<Vec<Pave>> = Vec::new();
    let mut current: Vec<Pave> = Vec::new();
    for pair in stops.windows(2) {
        let (a, b) = (pair[0].0, pair[1].0);
        let mid = 0.5 * (a.parameter + b.parameter);
        let s1 = classify(f1, mid);
        let s2 = classify(f2, mid);
        let kept = s1 != PointState::Out
            && s2 != PointState::Out
            && !(s1 == PointState::On && s2 == PointState::On);
        if kept {
            if current.is_empty() {
                current.push(a);
            }
            current.push(b);
        } else if current.len() >= 2 {
            runs.push(std::mem::take(&mut current));
        } else {
            current.clear();
        }
    }
    if current.len() >= 2 {
        runs.push(current);
    }

    Some(FaceFaceResult::Sections {
        line,
        tolerance: d1.tolerance.max(d2.tolerance),
        runs,
    })
}

/// Vertices known to lie on a face: its own vertices, paves of its edges,
/// the vertices found inside it and those of in-plane edges of other
/// parts. All resolved.
fn section_candidates(arena: &ShapeArena, ds: &Ds, face: FaceKey) -> Vec<VertexKey> {
    let mut out: Vec<VertexKey> = arena
        .face_vertices(face)
        .into_iter()
        .map(|v| ds.resolve(v))
        .collect();
    for edge in arena.face_edges(face) {
        out.extend(ds.extra_paves(edge).iter().map(|p| ds.resolve(p.vertex)));
    }
    if let Some(info) = ds.face_info(face) {
        out.extend(info.vertices_in.iter().map(|&v| ds.resolve(v)));
        for &edge in &info.edges_in {
            if let Some(e) = arena.edge(edge) {
                out.extend([e.start, e.end].map(|v| ds.resolve(v)));
            }
            out.extend(ds.extra_paves(edge).iter().map(|p| ds.resolve(p.vertex)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BooleanOptions;
    use crate::progress::NoProgress;
    use approx::assert_relative_eq;

    #[test]
    fn crossing_plates_have_one_section() {
        let mut arena = ShapeArena::new();
        // A unit plate at z = 0 and a plate at x = 0.5 crossing it
        // completely in y, from below to above.
        let (_, a) = arena
            .sew_faces(&[vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]], 1e-9)
            .unwrap();
        let (_, b) = arena
            .sew_faces(&[vec![[0.5, -1.0, -1.0], [0.5, 2.0, -1.0], [0.5, 2.0, 1.0], [0.5, -1.0, 1.0]]], 1e-9)
            .unwrap();
        let options = BooleanOptions::default();
        let mut filler =
            PaveFiller::new(&mut arena, &[a[0].into()], &[b[0].into()], &options, &NoProgress).unwrap();
        filler.run().unwrap();

        let sections = filler.ds().sections();
        assert_eq!(sections.len(), 1);
        let section = &sections[0];
        assert_eq!(section.paves.len(), 2);
        let ends: Vec<_> = section
            .paves
            .iter()
            .map(|p| filler.arena().vertex(p.vertex).unwrap().point)
            .collect();
        assert_relative_eq!((ends[1] - ends[0]).norm(), 1.0, epsilon = 1e-12);
        for p in ends {
            assert_relative_eq!(p.x, 0.5, epsilon = 1e-12);
            assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn touching_faces_have_no_section() {
        let mut arena = ShapeArena::new();
        let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (b, _, _) = arena.make_box([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]).unwrap();
        let options = BooleanOptions::default();
        let mut filler =
            PaveFiller::new(&mut arena, &[a.into()], &[b.into()], &options, &NoProgress).unwrap();
        filler.run().unwrap();
        // Every candidate line runs along shared boundary edges.
        assert!(filler.ds().sections().is_empty());
        assert_eq!(filler.ds().coplanar_faces().len(), 5);
    }
}
