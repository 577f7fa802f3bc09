// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge/face stage: an edge piercing the interior of a face gets a new
//! vertex there; an edge lying in the face plane is recorded on the face.

use nalgebra::Point3;
use paver_topology::ShapeType;
use smallvec::smallvec;

use super::PaveFiller;
use crate::ds::{InterferenceGeometry, InterferenceKind, Pave};
use crate::intersect::{intersect_curve_surface, CurveSurface, PointState};
use crate::iterator::candidate_pairs;
use crate::parallel::map_slots;
use crate::progress::{Abort, Stage};
use crate::report::AlertKind;

#[derive(Debug, Clone, Copy)]
enum FaceContact {
    InPlane,
    Pierce { point: Point3<f64>, parameter: f64 },
    Failed,
}

impl PaveFiller<'_> {
    pub(crate) fn perform_ef(&mut self) -> Result<(), Abort> {
        self.step(Stage::EdgeFace)?;
        let pairs = candidate_pairs(&self.ds, ShapeType::Edge, ShapeType::Face);
        let fuzzy = self.ds.fuzzy();

        let contacts = {
            let arena = &*self.arena;
            let ds = &self.ds;
            let context = &self.context;
            let progress = self.progress;
            map_slots(&pairs, self.options.run_parallel, |&(eid, fid)| {
                if progress.user_break() {
                    return None;
                }
                let edge = ds.info(eid).key.as_edge()?;
                let face = ds.info(fid).key.as_face()?;
                if arena.face_edges(face).contains(&edge) {
                    return None;
                }
                let e = arena.edge(edge)?;
                let f = arena.face(face)?;
                let tol = e.tolerance + f.tolerance + fuzzy;
                match intersect_curve_surface(&e.curve, e.range, &f.surface, tol) {
                    None => Some(FaceContact::Failed),
                    Some(CurveSurface::Disjoint) => None,
                    Some(CurveSurface::InPlane) => Some(FaceContact::InPlane),
                    Some(CurveSurface::Point { point, parameter, .. }) => {
                        if parameter <= e.range.0 || parameter >= e.range.1 {
                            return None;
                        }
                        for end in [e.start, e.end] {
                            let (pv, tv) = ds.vertex_geometry(arena, end)?;
                            if (point - pv).norm() <= tv + tol {
                                return None;
                            }
                        }
                        // Crossings on the face boundary are edge/edge or
                        // vertex contacts.
                        (context.classify_point_in_face(arena, &point, face, tol) == PointState::In)
                            .then_some(FaceContact::Pierce { point, parameter })
                    }
                }
            })
        };
        self.check_break()?;

        let mut created = Vec::new();
        let mut in_plane = 0usize;
        for (&(eid, fid), contact) in pairs.iter().zip(contacts) {
            let (Some(edge), Some(face)) = (self.key_of(eid).as_edge(), self.key_of(fid).as_face()) else {
                continue;
            };
            match contact {
                None => {}
                Some(FaceContact::Failed) => {
                    self.report
                        .add_warning(AlertKind::NumericNonConvergence, vec![edge.into(), face.into()]);
                }
                Some(FaceContact::InPlane) => {
                    let info = self.ds.face_info_mut(face);
                    if !info.edges_in.contains(&edge) {
                        info.edges_in.push(edge);
                    }
                    self.ds
                        .add_interference(eid, fid, InterferenceKind::EdgeFace, InterferenceGeometry::Coplanar);
                    in_plane += 1;
                }
                Some(FaceContact::Pierce { point, parameter }) => {
                    let face_tolerance = self.arena.face(face).map_or(0.0, |f| f.tolerance);
                    let tolerance = self.edge_tolerance(edge).max(face_tolerance);
                    let vertex = self.arena.add_vertex_with_tolerance(point, tolerance);
                    self.ds.append_vertex(self.arena, vertex);
                    self.ds.add_pave(edge, Pave { vertex, parameter });
                    self.ds.face_info_mut(face).vertices_in.push(vertex);
                    self.ds.add_interference(
                        eid,
                        fid,
                        InterferenceKind::EdgeFace,
                        InterferenceGeometry::Point {
                            vertex,
                            params: smallvec![parameter],
                        },
                    );
                    created.push(vertex);
                }
            }
        }
        tracing::debug!(
            pairs = pairs.len(),
            pierced = created.len(),
            in_plane,
            "Edge/face pairs"
        );
        self.merge_new_vertices(&created);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BooleanOptions;
    use crate::progress::NoProgress;
    use approx::assert_relative_eq;
    use paver_topology::ShapeArena;

    #[test]
    fn edge_piercing_a_face_gets_a_vertex_inside_it() {
        let mut arena = ShapeArena::new();
        let (a, _, faces) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (b, _, _) = arena.make_box([0.5; 3], [1.5; 3]).unwrap();
        let options = BooleanOptions::default();
        let mut filler =
            PaveFiller::new(&mut arena, &[a.into()], &[b.into()], &options, &NoProgress).unwrap();
        filler.perform_vv().unwrap();
        filler.perform_ve().unwrap();
        filler.perform_ee().unwrap();
        filler.perform_vf().unwrap();
        filler.perform_ef().unwrap();

        // The top face of the first cube is pierced by one vertical edge of
        // the second one.
        let top = faces[1];
        let inside = &filler.ds().face_info(top).unwrap().vertices_in;
        assert_eq!(inside.len(), 1);
        let point = filler.arena().vertex(inside[0]).unwrap().point;
        assert_relative_eq!(point, Point3::new(0.5, 0.5, 1.0), epsilon = 1e-12);
        // The bottom face lies outside the second cube altogether.
        assert!(filler.ds().face_info(faces[0]).is_none());
    }

    #[test]
    fn edge_in_a_face_plane_is_recorded() {
        let mut arena = ShapeArena::new();
        let (a, _, faces) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (b, _, _) = arena.make_box([0.25, 0.25, 1.0], [0.75, 0.75, 2.0]).unwrap();
        let options = BooleanOptions::default();
        let mut filler =
            PaveFiller::new(&mut arena, &[a.into()], &[b.into()], &options, &NoProgress).unwrap();
        filler.perform_vv().unwrap();
        filler.perform_ve().unwrap();
        filler.perform_ee().unwrap();
        filler.perform_vf().unwrap();
        filler.perform_ef().unwrap();

        let info = filler.ds().face_info(faces[1]).unwrap();
        assert_eq!(info.edges_in.len(), 4);
        assert_eq!(info.vertices_in.len(), 4);
    }
}
