// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shell splitting: the selected faces are connected across their shared
//! edges into closed shells.
//!
//! Two face usages connect through an edge when they traverse it in
//! opposite senses. Where more than two selected faces meet at an edge,
//! each face is connected to its nearest neighbour on the material side,
//! measured by the dihedral angle about the edge.

use std::f64::consts::TAU;

use nalgebra::Vector3;
use paver_topology::{EdgeKey, FaceKey, Orientation, Oriented, ShapeArena, ShapeKey, ShellKey};
use rustc_hash::FxHashMap;

use super::Builder;
use crate::report::AlertKind;
use crate::union_find::UnionFind;

/// One traversal of an edge by a selected face usage.
#[derive(Debug, Clone, Copy)]
struct Occurrence {
    face: usize,
    sense: Orientation,
}

impl Builder<'_, '_> {
    pub(super) fn build_shells(&mut self, selected: &[Oriented<FaceKey>]) -> Vec<ShellKey> {
        let mut slot_of: FxHashMap<EdgeKey, usize> = FxHashMap::default();
        let mut around: Vec<(EdgeKey, Vec<Occurrence>)> = Vec::new();
        for (face, usage) in selected.iter().enumerate() {
            for eu in self.filler.arena.face_edge_usages(usage.key) {
                let slot = *slot_of.entry(eu.key).or_insert_with(|| {
                    around.push((eu.key, Vec::new()));
                    around.len() - 1
                });
                around[slot].1.push(Occurrence {
                    face,
                    sense: eu.orientation.compose(usage.orientation),
                });
            }
        }

        let mode = self.filler.options.failure_mode;
        let mut sets = UnionFind::new(selected.len());
        let mut total = vec![0usize; selected.len()];
        let mut paired = vec![0usize; selected.len()];
        for (edge, occurrences) in &around {
            for o in occurrences {
                total[o.face] += 1;
            }
            let pairs = match occurrences.as_slice() {
                [_] => Vec::new(),
                [a, b] if a.sense != b.sense => vec![(*a, *b)],
                [_, _] => {
                    self.filler
                        .report
                        .add_warning(AlertKind::UnableToOrientTheShape, vec![(*edge).into()]);
                    Vec::new()
                }
                _ => {
                    let pairs = pair_around_edge(self.filler.arena, selected, *edge, occurrences);
                    if 2 * pairs.len() != occurrences.len() {
                        self.filler
                            .report
                            .add_warning(AlertKind::UnableToOrientTheShape, vec![(*edge).into()]);
                    }
                    pairs
                }
            };
            for (a, b) in pairs {
                sets.union(a.face, b.face);
                paired[a.face] += 1;
                paired[b.face] += 1;
            }
        }

        let mut shells = Vec::new();
        for group in sets.groups() {
            let usages: Vec<Oriented<FaceKey>> = group.iter().map(|&i| selected[i]).collect();
            if group.iter().any(|&i| paired[i] != total[i]) {
                let shapes = usages.iter().map(|u| ShapeKey::from(u.key)).collect();
                self.filler
                    .report
                    .add_builder_issue(AlertKind::SolidBuilderUnusedFaces, shapes, mode);
                continue;
            }
            match self.filler.arena.add_shell(&usages) {
                Ok(shell) => shells.push(shell),
                Err(err) => {
                    tracing::debug!(%err, "Shell rejected");
                    self.filler.report.add_warning(
                        AlertKind::BuilderFailed,
                        usages.iter().map(|u| ShapeKey::from(u.key)).collect(),
                    );
                }
            }
        }
        tracing::debug!(faces = selected.len(), shells = shells.len(), "Shells built");
        shells
    }
}

/// Pairs the faces around an edge shared by more than two of them.
///
/// Around the edge direction `d`, each face leaves the edge towards its
/// material side `n x (s d)`, where `n` is its outward normal and `s` its
/// sense on the edge. Going round clockwise from a face traversing the edge
/// forward, the first face met bounds the same material and must traverse
/// it backward.
fn pair_around_edge(
    arena: &ShapeArena,
    selected: &[Oriented<FaceKey>],
    edge: EdgeKey,
    occurrences: &[Occurrence],
) -> Vec<(Occurrence, Occurrence)> {
    let Some(d) = arena.edge(edge).map(|e| e.curve.direction) else {
        return Vec::new();
    };
    let e1 = perpendicular(&d);
    let e2 = d.cross(&e1);

    let mut sorted: Vec<(f64, Occurrence)> = occurrences
        .iter()
        .filter_map(|o| {
            let n = arena.oriented_normal(selected[o.face])?;
            let t = n.cross(&(d * o.sense.sign()));
            Some((t.dot(&e2).atan2(t.dot(&e1)).rem_euclid(TAU), *o))
        })
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let m = sorted.len();
    let mut taken = vec![false; m];
    let mut pairs = Vec::new();
    for k in 0..m {
        if sorted[k].1.sense != Orientation::Forward || taken[k] {
            continue;
        }
        let j = (k + m - 1) % m;
        if j != k && !taken[j] && sorted[j].1.sense == Orientation::Reversed {
            taken[k] = true;
            taken[j] = true;
            pairs.push((sorted[k].1, sorted[j].1));
        }
    }
    pairs
}

/// A unit vector perpendicular to the unit vector `d`.
fn perpendicular(d: &Vector3<f64>) -> Vector3<f64> {
    let axis = if d.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
    d.cross(&axis).normalize()
}
