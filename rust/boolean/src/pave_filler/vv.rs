// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vertex/vertex stage: coincident vertices are merged into one.

use nalgebra::Point3;
use paver_topology::{Aabb, ShapeType, VertexKey};
use smallvec::smallvec;

use super::PaveFiller;
use crate::box_tree::BoxTree;
use crate::ds::{InterferenceGeometry, InterferenceKind, ShapeId};
use crate::iterator::candidate_pairs;
use crate::parallel::map_slots;
use crate::progress::{Abort, Stage};
use crate::union_find::UnionFind;

/// Slack on the containment test between tolerance spheres.
const SPHERE_EPS: f64 = 1e-12;

impl PaveFiller<'_> {
    pub(crate) fn perform_vv(&mut self) -> Result<(), Abort> {
        self.step(Stage::VertexVertex)?;
        let pairs = candidate_pairs(&self.ds, ShapeType::Vertex, ShapeType::Vertex);
        let fuzzy = self.ds.fuzzy();

        let hits = {
            let arena = &*self.arena;
            let ds = &self.ds;
            let progress = self.progress;
            map_slots(&pairs, self.options.run_parallel, |&(a, b)| {
                if progress.user_break() {
                    return false;
                }
                let (Some(va), Some(vb)) = (
                    ds.info(a).key.as_vertex().and_then(|v| arena.vertex(v)),
                    ds.info(b).key.as_vertex().and_then(|v| arena.vertex(v)),
                ) else {
                    return false;
                };
                (va.point - vb.point).norm() <= va.tolerance + vb.tolerance + fuzzy
            })
        };
        self.check_break()?;

        let coincident: Vec<(ShapeId, ShapeId)> = pairs
            .into_iter()
            .zip(hits)
            .filter_map(|(pair, hit)| hit.then_some(pair))
            .collect();
        tracing::debug!(coincident = coincident.len(), "Vertex/vertex pairs");
        if coincident.is_empty() {
            return Ok(());
        }

        let mut members: Vec<ShapeId> = coincident.iter().flat_map(|&(a, b)| [a, b]).collect();
        members.sort_unstable();
        members.dedup();
        let slot = |id: ShapeId| members.binary_search(&id).unwrap_or(0);
        let mut sets = UnionFind::new(members.len());
        for &(a, b) in &coincident {
            sets.union(slot(a), slot(b));
        }

        let mut result_of = vec![None; members.len()];
        for group in sets.groups() {
            let keys: Vec<VertexKey> = group
                .iter()
                .filter_map(|&i| self.key_of(members[i]).as_vertex())
                .collect();
            let merged = self.merge_vertices(&keys);
            for &i in &group {
                result_of[i] = merged;
            }
        }

        for (a, b) in coincident {
            if let Some(vertex) = result_of[slot(a)] {
                self.ds.add_interference(
                    a,
                    b,
                    InterferenceKind::VertexVertex,
                    InterferenceGeometry::Point {
                        vertex,
                        params: smallvec![],
                    },
                );
            }
        }
        Ok(())
    }

    /// Replaces a group of coincident vertices by one vertex whose
    /// tolerance sphere contains all of theirs.
    ///
    /// A member that already contains the others is kept (the one with the
    /// largest tolerance). Otherwise a new vertex is created at the mean
    /// point.
    pub(crate) fn merge_vertices(&mut self, keys: &[VertexKey]) -> Option<VertexKey> {
        let spheres: Vec<(VertexKey, Point3<f64>, f64)> = keys
            .iter()
            .filter_map(|&k| {
                let (p, t) = self.ds.vertex_geometry(self.arena, k)?;
                Some((self.ds.resolve(k), p, t))
            })
            .collect();
        let first = *spheres.first()?;
        if spheres.iter().all(|s| s.0 == first.0) {
            return Some(first.0);
        }

        let contains_all = |center: &Point3<f64>, radius: f64| {
            spheres
                .iter()
                .all(|(_, p, t)| (p - center).norm() + t <= radius + SPHERE_EPS)
        };
        let mut keeper: Option<(VertexKey, f64)> = None;
        for &(key, p, t) in &spheres {
            if contains_all(&p, t) && keeper.map_or(true, |(_, best)| t > best) {
                keeper = Some((key, t));
            }
        }

        let target = match keeper {
            Some((key, _)) => key,
            None => {
                let n = spheres.len() as f64;
                let sum = spheres
                    .iter()
                    .fold(nalgebra::Vector3::zeros(), |acc, (_, p, _)| acc + p.coords);
                let center = Point3::from(sum / n);
                let radius = spheres
                    .iter()
                    .map(|(_, p, t)| (p - center).norm() + t)
                    .fold(0.0, f64::max);
                let vertex = self.arena.add_vertex_with_tolerance(center, radius);
                self.ds.append_vertex(self.arena, vertex);
                tracing::debug!(members = spheres.len(), tolerance = radius, "Vertices merged into a new vertex");
                vertex
            }
        };
        for &(key, _, _) in &spheres {
            self.ds.set_same_domain(key, target);
        }
        Some(self.ds.resolve(target))
    }

    /// Merges vertices that were created by one stage and landed within
    /// tolerance of each other.
    pub(crate) fn merge_new_vertices(&mut self, created: &[VertexKey]) {
        if created.len() < 2 {
            return;
        }
        let spheres: Vec<(Point3<f64>, f64)> = created
            .iter()
            .map(|&v| {
                self.ds
                    .vertex_geometry(self.arena, v)
                    .unwrap_or((Point3::origin(), 0.0))
            })
            .collect();
        let fuzzy = self.ds.fuzzy();
        let boxes: Vec<Aabb> = spheres
            .iter()
            .map(|(p, t)| {
                let mut bbox = Aabb::from_points([p]);
                bbox.enlarge(t + 0.5 * fuzzy);
                bbox
            })
            .collect();
        let tree = BoxTree::new(boxes.iter().copied().enumerate().map(|(i, b)| (b, i)));
        let mut sets = UnionFind::new(created.len());
        let mut any = false;
        for (i, bbox) in boxes.iter().enumerate() {
            for j in tree.query(bbox).into_iter().filter(|&j| j > i) {
                let ((pi, ti), (pj, tj)) = (spheres[i], spheres[j]);
                if (pi - pj).norm() <= ti + tj + fuzzy {
                    any |= sets.union(i, j);
                }
            }
        }
        if !any {
            return;
        }
        for group in sets.groups().into_iter().filter(|g| g.len() > 1) {
            let keys: Vec<VertexKey> = group.iter().map(|&i| created[i]).collect();
            self.merge_vertices(&keys);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BooleanOptions;
    use crate::progress::NoProgress;
    use paver_topology::ShapeArena;

    #[test]
    fn merged_tolerance_covers_all_members() {
        let mut arena = ShapeArena::new();
        let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (b, _, _) = arena.make_box([1.0 + 4e-6, 0.0, 0.0], [2.0, 1.0, 1.0]).unwrap();
        let options = BooleanOptions::default().with_fuzzy_value(1e-5);
        let mut filler =
            PaveFiller::new(&mut arena, &[a.into()], &[b.into()], &options, &NoProgress).unwrap();
        filler.run().unwrap();

        let merged: Vec<_> = filler
            .ds()
            .interferences()
            .iter()
            .filter(|i| i.kind == InterferenceKind::VertexVertex)
            .collect();
        assert_eq!(merged.len(), 4);
        for interference in merged {
            let InterferenceGeometry::Point { vertex, .. } = interference.geometry else {
                panic!("vertex/vertex interference without a point");
            };
            let result = filler.arena().vertex(vertex).unwrap();
            for id in [interference.first, interference.second] {
                let key = filler.ds().info(id).key.as_vertex().unwrap();
                let original = filler.arena().vertex(key).unwrap();
                assert!(result.tolerance >= original.tolerance);
                assert!((result.point - original.point).norm() + original.tolerance <= result.tolerance + 1e-12);
                assert_eq!(filler.ds().resolve(key), vertex);
            }
        }
    }

    #[test]
    fn containing_vertex_is_kept() {
        let mut arena = ShapeArena::new();
        let big = arena.add_vertex_with_tolerance(Point3::origin(), 1e-3);
        let small = arena.add_vertex_with_tolerance(Point3::new(1e-4, 0.0, 0.0), 1e-6);
        let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let options = BooleanOptions::default();
        let mut filler =
            PaveFiller::new(&mut arena, &[a.into()], &[a.into()], &options, &NoProgress).unwrap();
        assert_eq!(filler.merge_vertices(&[small, big]), Some(big));
        assert_eq!(filler.ds().resolve(small), big);
    }

    #[test]
    fn close_new_vertices_are_merged() {
        let mut arena = ShapeArena::new();
        let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let near = [
            arena.add_vertex(Point3::new(5.0, 0.0, 0.0)),
            arena.add_vertex(Point3::new(5.0 + 1e-8, 0.0, 0.0)),
        ];
        let far = arena.add_vertex(Point3::new(9.0, 0.0, 0.0));
        let options = BooleanOptions::default();
        let mut filler =
            PaveFiller::new(&mut arena, &[a.into()], &[a.into()], &options, &NoProgress).unwrap();
        filler.merge_new_vertices(&[near[0], far, near[1]]);
        assert_eq!(filler.ds().resolve(near[0]), filler.ds().resolve(near[1]));
        assert_eq!(filler.ds().resolve(far), far);
    }
}
