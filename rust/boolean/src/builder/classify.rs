// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face classification and selection.
//!
//! Split faces with the same boundary form one group. For each operand the
//! builder works out on which sides of the group the operand has material:
//! from the sense of the copies its solids own, or by classifying one
//! interior point against the solids that own no copy. The operation then
//! keeps one copy, facing the empty side, when result material lies on
//! exactly one side.

use nalgebra::Point3;
use paver_topology::{FaceKey, Orientation, Oriented, ShapeArena, ShapeKey, ShapeType, SolidKey};
use rustc_hash::{FxHashMap, FxHashSet};

use super::Builder;
use crate::classifier::ClassifyError;
use crate::context::Context;
use crate::ds::{Part, Rank};
use crate::intersect::PointState;
use crate::parallel::map_slots;
use crate::progress::Abort;
use crate::report::AlertKind;
use crate::Operation;

/// Copy of a split face owned by one solid part.
#[derive(Debug, Clone, Copy)]
struct Member {
    face: Oriented<FaceKey>,
    rank: Rank,
    part: usize,
}

#[derive(Debug, Clone, Default)]
struct FaceGroup {
    images: Vec<FaceKey>,
    members: Vec<Member>,
}

/// Where an operand has material around a face, relative to the normal
/// of the first copy of its group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Sides {
    front: bool,
    back: bool,
}

impl Sides {
    const BOTH: Sides = Sides {
        front: true,
        back: true,
    };
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Keep(Oriented<FaceKey>),
    Drop,
    Ambiguous,
    Interfering(SolidKey),
}

impl Builder<'_, '_> {
    /// Oriented faces of the result.
    pub(super) fn select_faces(&mut self) -> Result<Vec<Oriented<FaceKey>>, Abort> {
        let retries = self.filler.options.classifier_retries;
        let mut solids: Vec<SolidKey> = Vec::new();
        let mut seen = FxHashSet::default();
        for solid in self.filler.ds.parts().iter().filter_map(|p| p.solid) {
            if seen.insert(solid) {
                solids.push(solid);
            }
        }
        for &solid in &solids {
            self.filler.context.prepare_solid(self.filler.arena, solid, retries);
        }
        for &solid in &solids {
            if let Some(Err(err)) = self.filler.context.solid(solid) {
                let kind = match err {
                    ClassifyError::OpenShell(_) => AlertKind::OpenShellForClassification,
                    ClassifyError::SelfInterfering => AlertKind::SelfInterferingShape,
                    ClassifyError::Empty => AlertKind::UnsupportedType,
                };
                self.filler.report.add_fail(kind, vec![solid.into()]);
            }
        }
        self.filler.check_fail()?;

        let groups = self.face_groups();
        let outcomes = {
            let arena = &*self.filler.arena;
            let context = &self.filler.context;
            let progress = self.filler.progress;
            let parts = self.filler.ds.parts();
            let fuzzy = self.filler.ds.fuzzy();
            let operation = self.operation;
            map_slots(&groups, self.filler.options.run_parallel, |group| {
                if progress.user_break() {
                    return None;
                }
                Some(decide(arena, context, parts, group, operation, fuzzy))
            })
        };
        self.filler.check_break()?;

        let mode = self.filler.options.failure_mode;
        let mut selected = Vec::new();
        for (group, outcome) in groups.iter().zip(outcomes) {
            match outcome {
                None | Some(Outcome::Drop) => {}
                Some(Outcome::Keep(face)) => {
                    for &image in group.images.iter().filter(|&&f| f != face.key) {
                        self.images.survivors.insert(image, face.key);
                    }
                    selected.push(face);
                }
                Some(Outcome::Ambiguous) => {
                    let shapes = group.images.iter().map(|&f| ShapeKey::from(f)).collect();
                    self.filler
                        .report
                        .add_builder_issue(AlertKind::AmbiguousClassification, shapes, mode);
                }
                Some(Outcome::Interfering(solid)) => {
                    self.filler
                        .report
                        .add_fail(AlertKind::SelfInterferingShape, vec![solid.into()]);
                }
            }
        }
        self.filler.check_fail()?;
        tracing::debug!(groups = groups.len(), kept = selected.len(), "Faces selected");
        Ok(selected)
    }

    /// Split faces grouped by boundary, each with the copies owned by
    /// solid parts. Faces owned by no solid are left out.
    fn face_groups(&self) -> Vec<FaceGroup> {
        let ds = &self.filler.ds;
        let arena = &*self.filler.arena;
        let senses: Vec<FxHashMap<FaceKey, Orientation>> = ds
            .parts()
            .iter()
            .map(|p| {
                let mut out = FxHashMap::default();
                if let Some(solid) = p.solid {
                    for usage in arena.oriented_faces(solid.into()) {
                        out.entry(usage.key).or_insert(usage.orientation);
                    }
                }
                out
            })
            .collect();

        let mut groups: Vec<FaceGroup> = Vec::new();
        let mut slot: FxHashMap<FaceKey, usize> = FxHashMap::default();
        for images in &self.same_domain {
            for &image in images {
                slot.insert(image, groups.len());
            }
            groups.push(FaceGroup {
                images: images.clone(),
                members: Vec::new(),
            });
        }

        for face in self.filler.shape_keys(ShapeType::Face).filter_map(|k| k.as_face()) {
            let Some(info) = ds.info_of(face.into()) else {
                continue;
            };
            for &image in self.images.faces.get(&face).into_iter().flatten() {
                let g = *slot.entry(image).or_insert_with(|| {
                    groups.push(FaceGroup {
                        images: vec![image],
                        members: Vec::new(),
                    });
                    groups.len() - 1
                });
                for &part in &info.parts {
                    if let Some(&sense) = senses[part].get(&face) {
                        groups[g].members.push(Member {
                            face: Oriented::new(image, sense),
                            rank: ds.parts()[part].rank,
                            part,
                        });
                    }
                }
            }
        }
        groups.retain(|g| !g.members.is_empty());
        groups
    }
}

fn decide(
    arena: &ShapeArena,
    context: &Context,
    parts: &[Part],
    group: &FaceGroup,
    operation: Operation,
    fuzzy: f64,
) -> Outcome {
    let first = group.members[0];
    let Some(reference) = arena.oriented_normal(first.face) else {
        return Outcome::Drop;
    };
    let faces_front = |m: &Member| arena.oriented_normal(m.face).map(|n| n.dot(&reference) > 0.0);
    let tol = arena.face(first.face.key).map_or(0.0, |f| f.tolerance) + fuzzy;
    let mut point = None;

    let mut sides = [Sides::default(); 2];
    for rank in [Rank::Object, Rank::Tool] {
        let own: Vec<&Member> = group.members.iter().filter(|m| m.rank == rank).collect();
        let mut s = Sides::default();
        for m in &own {
            // Material lies behind an outward normal.
            match faces_front(*m) {
                Some(true) => s.back = true,
                Some(false) => s.front = true,
                None => {}
            }
        }
        if s != Sides::BOTH {
            let others: Vec<SolidKey> = parts
                .iter()
                .enumerate()
                .filter(|&(i, p)| p.rank == rank && !own.iter().any(|m| m.part == i))
                .filter_map(|(_, p)| p.solid)
                .collect();
            if !others.is_empty() {
                if point.is_none() {
                    point = arena.face_interior_point(first.face.key);
                }
                let Some(p) = point else {
                    return Outcome::Ambiguous;
                };
                match classify_point(context, &p, tol, &others) {
                    Err(solid) => return Outcome::Interfering(solid),
                    Ok(PointState::In) => s = Sides::BOTH,
                    Ok(PointState::On) => return Outcome::Ambiguous,
                    Ok(PointState::Out) => {}
                }
            }
        }
        sides[rank.slot()] = s;
    }

    let Some(front) = kept_facing_front(operation, sides[0], sides[1]) else {
        return Outcome::Drop;
    };
    let objects_first = group
        .members
        .iter()
        .filter(|m| m.rank == Rank::Object)
        .chain(group.members.iter().filter(|m| m.rank == Rank::Tool));
    for m in objects_first {
        if faces_front(m) == Some(front) {
            return Outcome::Keep(m.face);
        }
    }
    Outcome::Keep(first.face.reversed())
}

/// State of a point relative to the union of `solids`.
/// `Err` names a solid whose classifier failed.
fn classify_point(
    context: &Context,
    point: &Point3<f64>,
    tol: f64,
    solids: &[SolidKey],
) -> Result<PointState, SolidKey> {
    let mut state = PointState::Out;
    for &solid in solids {
        let Some(Ok(classifier)) = context.solid(solid) else {
            continue;
        };
        match classifier.classify(point, tol).map_err(|_| solid)? {
            PointState::In => return Ok(PointState::In),
            PointState::On => state = PointState::On,
            PointState::Out => {}
        }
    }
    Ok(state)
}

/// Whether a point with the given operand material is result material.
fn material(operation: Operation, object: bool, tool: bool) -> bool {
    match operation {
        Operation::Common => object && tool,
        Operation::Fuse => object || tool,
        Operation::Cut => object && !tool,
        Operation::CutReverse => tool && !object,
        Operation::Section => false,
    }
}

/// Whether the result keeps a face with its normal towards the reference
/// side (`true`) or away from it (`false`). `None` when the result has
/// material on both sides or on neither.
fn kept_facing_front(operation: Operation, object: Sides, tool: Sides) -> Option<bool> {
    let front = material(operation, object.front, tool.front);
    let back = material(operation, object.back, tool.back);
    (front != back).then_some(back)
}
