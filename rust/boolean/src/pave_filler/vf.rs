// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vertex/face stage: vertices strictly inside a face are recorded on the
//! face for the section and face-splitting stages.

use paver_topology::ShapeType;
use smallvec::smallvec;

use super::PaveFiller;
use crate::ds::{InterferenceGeometry, InterferenceKind};
use crate::intersect::{project_point_on_surface, PointState};
use crate::iterator::candidate_pairs;
use crate::parallel::map_slots;
use crate::progress::{Abort, Stage};

impl PaveFiller<'_> {
    pub(crate) fn perform_vf(&mut self) -> Result<(), Abort> {
        self.step(Stage::VertexFace)?;
        let pairs = candidate_pairs(&self.ds, ShapeType::Vertex, ShapeType::Face);
        let fuzzy = self.ds.fuzzy();

        let distances = {
            let arena = &*self.arena;
            let ds = &self.ds;
            let context = &self.context;
            let progress = self.progress;
            map_slots(&pairs, self.options.run_parallel, |&(vid, fid)| {
                if progress.user_break() {
                    return None;
                }
                let vertex = ds.info(vid).key.as_vertex()?;
                let face = ds.info(fid).key.as_face()?;
                let current = ds.resolve(vertex);
                if arena.face_vertices(face).iter().any(|&v| ds.resolve(v) == current) {
                    return None;
                }
                let (p, tv) = ds.vertex_geometry(arena, vertex)?;
                let data = arena.face(face)?;
                let projection = project_point_on_surface(&p, &data.surface);
                if projection.distance > tv + data.tolerance + fuzzy {
                    return None;
                }
                (context.classify_point_in_face(arena, &p, face, tv + fuzzy) == PointState::In)
                    .then_some(projection.distance)
            })
        };
        self.check_break()?;

        let mut count = 0usize;
        for (&(vid, fid), distance) in pairs.iter().zip(distances) {
            let (Some(distance), Some(v), Some(face)) =
                (distance, self.key_of(vid).as_vertex(), self.key_of(fid).as_face())
            else {
                continue;
            };
            let tolerance = self.ds.vertex_geometry(self.arena, v).map_or(0.0, |(_, t)| t);
            let vertex = if distance > tolerance {
                self.ds.grow_vertex(self.arena, v, distance)
            } else {
                self.ds.resolve(v)
            };
            let info = self.ds.face_info_mut(face);
            if !info.vertices_in.contains(&vertex) {
                info.vertices_in.push(vertex);
            }
            self.ds.add_interference(
                vid,
                fid,
                InterferenceKind::VertexFace,
                InterferenceGeometry::Point {
                    vertex,
                    params: smallvec![],
                },
            );
            count += 1;
        }
        tracing::debug!(pairs = pairs.len(), inside = count, "Vertex/face pairs");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BooleanOptions;
    use crate::progress::NoProgress;
    use paver_topology::ShapeArena;

    #[test]
    fn corner_resting_on_a_face_is_inside_it() {
        let mut arena = ShapeArena::new();
        let (a, _, faces) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        // A tetrahedron standing on its apex in the middle of the top face.
        let apex = [0.5, 0.5, 1.0];
        let tip = arena
            .make_polyhedron(
                &[
                    vec![apex, [1.0, 0.0, 2.0], [0.0, 0.0, 2.0]],
                    vec![apex, [0.5, 1.0, 2.0], [1.0, 0.0, 2.0]],
                    vec![apex, [0.0, 0.0, 2.0], [0.5, 1.0, 2.0]],
                    vec![[0.0, 0.0, 2.0], [1.0, 0.0, 2.0], [0.5, 1.0, 2.0]],
                ],
                1e-9,
            )
            .unwrap();
        let options = BooleanOptions::default();
        let mut filler =
            PaveFiller::new(&mut arena, &[a.into()], &[tip.into()], &options, &NoProgress).unwrap();
        filler.perform_vv().unwrap();
        filler.perform_ve().unwrap();
        filler.perform_ee().unwrap();
        filler.perform_vf().unwrap();

        let top = faces[1];
        let inside = &filler.ds().face_info(top).unwrap().vertices_in;
        assert_eq!(inside.len(), 1);
        let point = filler.arena().vertex(inside[0]).unwrap().point;
        assert_eq!([point.x, point.y, point.z], apex);
        for (_, &other) in faces.iter().enumerate().filter(|(i, _)| *i != 1) {
            assert!(filler.ds().face_info(other).is_none());
        }
    }
}
