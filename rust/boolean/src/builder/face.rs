// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face splitting.
//!
//! The split boundary of a face and the split edges found inside it form a
//! planar graph. Boundary edges are walked in their own sense only, inner
//! edges in both. Loops are traced in the `(u, v)` frame of the face plane,
//! leaving each vertex on the first edge clockwise from the one arrived
//! on, so every loop keeps its region on the left: counter-clockwise loops
//! are outer boundaries and clockwise loops are holes.

use std::f64::consts::{PI, TAU};
use std::slice;

use nalgebra::Point2;
use paver_topology::geometry::signed_area_2d;
use paver_topology::{EdgeKey, FaceKey, Orientation, Oriented, Plane, ShapeArena, ShapeKey, ShapeType, VertexKey};
use rustc_hash::{FxHashMap, FxHashSet};

use super::Builder;
use crate::intersect::{classify_point_in_polygon, PointState};
use crate::parallel::map_slots;
use crate::progress::Abort;
use crate::report::AlertKind;

/// Face to rebuild, with its split boundary and inner edges.
#[derive(Debug, Clone)]
struct FaceJob {
    face: FaceKey,
    boundary: Vec<Oriented<EdgeKey>>,
    internal: Vec<EdgeKey>,
}

/// Traced loops of one face.
#[derive(Debug, Default)]
struct FacePlan {
    /// Outer loop with its holes, per new face.
    faces: Vec<(Vec<Oriented<EdgeKey>>, Vec<Vec<Oriented<EdgeKey>>>)>,
    unused_edges: Vec<EdgeKey>,
    unused_holes: usize,
}

impl Builder<'_, '_> {
    pub(super) fn split_faces(&mut self) -> Result<(), Abort> {
        let faces: Vec<FaceKey> = self
            .filler
            .shape_keys(ShapeType::Face)
            .filter_map(|k| k.as_face())
            .collect();

        let mut jobs = Vec::new();
        for face in faces {
            let usages = self.filler.arena.face_edge_usages(face);
            let boundary: Vec<Oriented<EdgeKey>> =
                usages.iter().flat_map(|&u| self.edge_usage_images(u)).collect();
            let internal = self.internal_edges(face, &boundary);
            if internal.is_empty() && usages.iter().all(|u| self.stands_for_itself(u.key)) {
                self.images.faces.insert(face, vec![face]);
            } else {
                jobs.push(FaceJob {
                    face,
                    boundary,
                    internal,
                });
            }
        }

        let plans = {
            let arena = &*self.filler.arena;
            let progress = self.filler.progress;
            map_slots(&jobs, self.filler.options.run_parallel, |job| {
                if progress.user_break() {
                    return None;
                }
                Some(trace_face(arena, job))
            })
        };
        self.filler.check_break()?;

        let mut split = 0usize;
        for (job, plan) in jobs.iter().zip(plans) {
            let Some(plan) = plan else {
                continue;
            };
            let images = self.commit_face_plan(job, plan);
            if images.len() > 1 {
                split += 1;
            }
            self.images.faces.insert(job.face, images);
        }
        tracing::debug!(rebuilt = jobs.len(), split, "Faces split");
        Ok(())
    }

    /// An operand edge that is its own single image.
    fn stands_for_itself(&self, edge: EdgeKey) -> bool {
        let ds = &self.filler.ds;
        ds.is_edge_unchanged(self.filler.arena, edge)
            && ds.edge_blocks(edge).first().and_then(|&b| self.images.blocks[b]) == Some(edge)
    }

    /// Images of the section blocks and in-plane blocks of a face that are
    /// not already on its boundary.
    fn internal_edges(&self, face: FaceKey, boundary: &[Oriented<EdgeKey>]) -> Vec<EdgeKey> {
        let ds = &self.filler.ds;
        let Some(info) = ds.face_info(face) else {
            return Vec::new();
        };
        let on_boundary: FxHashSet<EdgeKey> = boundary.iter().map(|u| u.key).collect();
        let mut seen = FxHashSet::default();
        info.sections
            .iter()
            .flat_map(|&s| ds.sections[s].blocks.iter().copied())
            .chain(info.blocks_in.iter().copied())
            .filter_map(|b| self.images.blocks[b])
            .filter(|e| !on_boundary.contains(e) && seen.insert(*e))
            .collect()
    }

    fn commit_face_plan(&mut self, job: &FaceJob, plan: FacePlan) -> Vec<FaceKey> {
        let source = ShapeKey::from(job.face);
        let mode = self.filler.options.failure_mode;
        if !plan.unused_edges.is_empty() {
            let mut shapes = vec![source];
            shapes.extend(plan.unused_edges.iter().map(|&e| ShapeKey::from(e)));
            self.filler
                .report
                .add_builder_issue(AlertKind::FaceBuilderUnusedEdges, shapes, mode);
        }
        if plan.unused_holes > 0 {
            self.filler
                .report
                .add_builder_issue(AlertKind::FaceBuilderUnusedHoles, vec![source], mode);
        }

        let Some((surface, tolerance)) = self.filler.arena.face(job.face).map(|f| (f.surface, f.tolerance)) else {
            return Vec::new();
        };
        let mut images = Vec::with_capacity(plan.faces.len());
        for (outer, holes) in &plan.faces {
            match self.make_face(surface, tolerance, outer, holes) {
                Ok(face) => images.push(face),
                Err(err) => {
                    tracing::debug!(%err, "Split face rejected");
                    self.filler.report.add_warning(AlertKind::BuilderFailed, vec![source]);
                }
            }
        }
        images
    }

    fn make_face(
        &mut self,
        surface: Plane,
        tolerance: f64,
        outer: &[Oriented<EdgeKey>],
        holes: &[Vec<Oriented<EdgeKey>>],
    ) -> paver_topology::Result<FaceKey> {
        let arena = &mut *self.filler.arena;
        let outer = arena.add_wire(outer)?;
        let holes = holes
            .iter()
            .map(|h| arena.add_wire(h))
            .collect::<paver_topology::Result<Vec<_>>>()?;
        arena.add_face_on(surface, outer, holes, tolerance)
    }

    /// Groups the split faces of coplanar operand faces that have the same
    /// edges.
    pub(super) fn find_same_domain_faces(&mut self) {
        let arena = &*self.filler.arena;
        let edge_set = |face: FaceKey| {
            let mut edges = arena.face_edges(face);
            edges.sort_unstable();
            edges
        };

        let mut groups = SameDomainGroups::default();
        for &(a, b) in self.filler.ds.coplanar_faces() {
            let (Some(first), Some(second)) = (self.images.faces.get(&a), self.images.faces.get(&b)) else {
                continue;
            };
            let second: Vec<(FaceKey, Vec<EdgeKey>)> = second.iter().map(|&f| (f, edge_set(f))).collect();
            for &f in first {
                let set = edge_set(f);
                for (g, other) in &second {
                    if *g != f && *other == set {
                        groups.join(f, *g);
                    }
                }
            }
        }
        let groups = groups.into_groups();
        tracing::debug!(groups = groups.len(), "Same-domain faces");
        self.same_domain = groups;
    }
}

/// Union-find over face keys, groups returned in first-seen order.
#[derive(Debug, Default)]
struct SameDomainGroups {
    slot: FxHashMap<FaceKey, usize>,
    faces: Vec<FaceKey>,
    parent: Vec<usize>,
}

impl SameDomainGroups {
    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn slot_of(&mut self, face: FaceKey) -> usize {
        if let Some(&i) = self.slot.get(&face) {
            return i;
        }
        let i = self.faces.len();
        self.faces.push(face);
        self.parent.push(i);
        self.slot.insert(face, i);
        i
    }

    fn join(&mut self, a: FaceKey, b: FaceKey) {
        let (a, b) = (self.slot_of(a), self.slot_of(b));
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }

    fn into_groups(mut self) -> Vec<Vec<FaceKey>> {
        let mut index: FxHashMap<usize, usize> = FxHashMap::default();
        let mut groups: Vec<Vec<FaceKey>> = Vec::new();
        for i in 0..self.faces.len() {
            let root = self.find(i);
            let g = *index.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[g].push(self.faces[i]);
        }
        groups
    }
}

// ============================================================================
// Loop tracing
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct HalfEdge {
    usage: Oriented<EdgeKey>,
    from: VertexKey,
    to: VertexKey,
    /// Direction angle in the face frame.
    angle: f64,
    item: usize,
}

#[derive(Debug, Clone, Copy)]
struct Item {
    edge: EdgeKey,
    ends: (VertexKey, VertexKey),
    alive: bool,
}

#[derive(Debug, Clone)]
struct Loop {
    halves: Vec<usize>,
    points: Vec<Point2<f64>>,
    area: f64,
}

#[derive(Debug, Default)]
struct LoopGraph {
    halves: Vec<HalfEdge>,
    items: Vec<Item>,
    uv: FxHashMap<VertexKey, Point2<f64>>,
}

impl LoopGraph {
    fn add_item(&mut self, arena: &ShapeArena, plane: &Plane, edge: EdgeKey, senses: &[Orientation]) {
        let Some(data) = arena.edge(edge) else {
            return;
        };
        for v in [data.start, data.end] {
            if let Some(p) = arena.vertex_point(v) {
                self.uv.entry(v).or_insert_with(|| plane.to_uv(&p));
            }
        }
        let item = self.items.len();
        self.items.push(Item {
            edge,
            ends: (data.start, data.end),
            alive: true,
        });
        for &sense in senses {
            let (from, to) = data.oriented_ends(sense);
            let d = plane.dir_to_uv(&(data.curve.direction * sense.sign()));
            self.halves.push(HalfEdge {
                usage: Oriented::new(edge, sense),
                from,
                to,
                angle: d.y.atan2(d.x),
                item,
            });
        }
    }

    /// Drops edges with a free end until none is left. Returns the dropped
    /// edges.
    fn remove_dangling(&mut self) -> Vec<EdgeKey> {
        let mut degree: FxHashMap<VertexKey, usize> = FxHashMap::default();
        for item in &self.items {
            *degree.entry(item.ends.0).or_default() += 1;
            *degree.entry(item.ends.1).or_default() += 1;
        }
        let mut removed = Vec::new();
        loop {
            let mut changed = false;
            for item in self.items.iter_mut().filter(|i| i.alive) {
                let (a, b) = item.ends;
                if degree[&a] > 1 && degree[&b] > 1 {
                    continue;
                }
                item.alive = false;
                for v in [a, b] {
                    if let Some(d) = degree.get_mut(&v) {
                        *d -= 1;
                    }
                }
                removed.push(item.edge);
                changed = true;
            }
            if !changed {
                return removed;
            }
        }
    }

    fn outgoing(&self) -> FxHashMap<VertexKey, Vec<usize>> {
        let mut out: FxHashMap<VertexKey, Vec<usize>> = FxHashMap::default();
        for (i, half) in self.halves.iter().enumerate() {
            if self.items[half.item].alive {
                out.entry(half.from).or_default().push(i);
            }
        }
        out
    }

    /// The half edge leaving the end of `h` first clockwise from the way
    /// back. Turning back on the same edge comes last.
    fn next(&self, out: &FxHashMap<VertexKey, Vec<usize>>, h: usize) -> Option<usize> {
        let arrived = &self.halves[h];
        let back = arrived.angle + PI;
        let mut best: Option<(usize, f64)> = None;
        for &c in out.get(&arrived.to)? {
            let candidate = &self.halves[c];
            let mut turn = (back - candidate.angle).rem_euclid(TAU);
            if candidate.item == arrived.item || turn <= 1e-12 {
                turn = TAU;
            }
            if best.map_or(true, |(_, t)| turn < t) {
                best = Some((c, turn));
            }
        }
        best.map(|(c, _)| c)
    }

    /// Closed loops, plus the edges of walks that did not close.
    fn trace(&self) -> (Vec<Loop>, Vec<EdgeKey>) {
        let out = self.outgoing();
        let mut used = vec![false; self.halves.len()];
        let mut loops = Vec::new();
        let mut broken = Vec::new();
        for start in 0..self.halves.len() {
            if used[start] || !self.items[self.halves[start].item].alive {
                continue;
            }
            used[start] = true;
            let mut path = vec![start];
            let mut current = start;
            let closed = loop {
                let Some(next) = self.next(&out, current) else {
                    break false;
                };
                if next == start {
                    break true;
                }
                if used[next] {
                    break false;
                }
                used[next] = true;
                path.push(next);
                current = next;
            };
            if closed {
                let points: Vec<Point2<f64>> = path
                    .iter()
                    .filter_map(|&h| self.uv.get(&self.halves[h].from).copied())
                    .collect();
                let area = signed_area_2d(&points);
                loops.push(Loop {
                    halves: path,
                    points,
                    area,
                });
            } else {
                broken.extend(path.iter().map(|&h| self.halves[h].usage.key));
            }
        }
        (loops, broken)
    }

    fn usages(&self, l: &Loop) -> Vec<Oriented<EdgeKey>> {
        l.halves.iter().map(|&h| self.halves[h].usage).collect()
    }

    /// Points of a loop to test it against another: edge midpoints first,
    /// then vertices.
    fn sample_points(&self, l: &Loop) -> Vec<Point2<f64>> {
        let n = l.points.len();
        let mids = (0..n).map(|i| Point2::from((l.points[i].coords + l.points[(i + 1) % n].coords) * 0.5));
        mids.chain(l.points.iter().copied()).collect()
    }
}

fn trace_face(arena: &ShapeArena, job: &FaceJob) -> FacePlan {
    let mut plan = FacePlan::default();
    let Some(face) = arena.face(job.face) else {
        return plan;
    };
    let plane = face.surface;
    let tol = face.tolerance;

    let mut graph = LoopGraph::default();
    for usage in &job.boundary {
        graph.add_item(arena, &plane, usage.key, &[usage.orientation]);
    }
    for &edge in &job.internal {
        graph.add_item(arena, &plane, edge, &[Orientation::Forward, Orientation::Reversed]);
    }
    plan.unused_edges = graph.remove_dangling();

    let (loops, broken) = graph.trace();
    plan.unused_edges.extend(broken);

    let eps = tol * tol;
    let mut outers: Vec<(Loop, Vec<Loop>)> = Vec::new();
    let mut holes: Vec<Loop> = Vec::new();
    for l in loops {
        if l.area > eps {
            outers.push((l, Vec::new()));
        } else if l.area < -eps {
            holes.push(l);
        } else {
            plan.unused_edges.extend(l.halves.iter().map(|&h| graph.halves[h].usage.key));
        }
    }

    // Each hole goes to the smallest outer loop around it.
    for hole in holes {
        let samples = graph.sample_points(&hole);
        let mut best: Option<(usize, f64)> = None;
        for (k, (outer, _)) in outers.iter().enumerate() {
            let state = samples
                .iter()
                .map(|p| classify_point_in_polygon(p, slice::from_ref(&outer.points), tol))
                .find(|s| *s != PointState::On);
            if state == Some(PointState::In) && best.map_or(true, |(_, a)| outer.area < a) {
                best = Some((k, outer.area));
            }
        }
        match best {
            Some((k, _)) => outers[k].1.push(hole),
            None => plan.unused_holes += 1,
        }
    }

    plan.faces = outers
        .iter()
        .map(|(outer, holes)| (graph.usages(outer), holes.iter().map(|h| graph.usages(h)).collect()))
        .collect();
    plan
}
