// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Intersection data structure.
//!
//! One [`Ds`] is created per boolean run. It indexes every sub-shape of
//! both operands (plus the vertices created along the way), stores the
//! interferences found between them and the per-edge and per-face
//! bookkeeping that the builder consumes: paves, pave blocks, common
//! blocks, section curves and face info.
//!
//! Vertices are never modified. When vertices coincide, or when a vertex
//! tolerance has to grow, the replacement is recorded in a same-domain map
//! and [`Ds::resolve`] returns the vertex that currently stands for a key.

use std::num::NonZeroU32;

use nalgebra::Point3;
use paver_topology::{Aabb, EdgeKey, FaceKey, Line, ShapeArena, ShapeKey, ShapeType, SolidKey, VertexKey};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::error::{Error, Result};

// ============================================================================
// Identifiers and ranks
// ============================================================================

/// Dense index of a shape in the DS. Zero is never a valid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(NonZeroU32);

impl ShapeId {
    fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index + 1).unwrap_or(u32::MAX);
        Self(NonZeroU32::new(raw).unwrap_or(NonZeroU32::MAX))
    }

    /// Zero-based position in the shape table.
    pub fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

/// Operand an argument belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    Object,
    Tool,
}

impl Rank {
    pub fn other(self) -> Self {
        match self {
            Rank::Object => Rank::Tool,
            Rank::Tool => Rank::Object,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Rank::Object => 1,
            Rank::Tool => 2,
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Rank::Object => 0,
            Rank::Tool => 1,
        }
    }
}

/// Set of operands a shape belongs to. Empty for shapes created by the
/// run itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Ranks(u8);

impl Ranks {
    pub const NONE: Ranks = Ranks(0);

    pub fn of(rank: Rank) -> Self {
        Ranks(rank.bit())
    }

    pub fn contains(self, rank: Rank) -> bool {
        self.0 & rank.bit() != 0
    }

    pub fn insert(&mut self, rank: Rank) {
        self.0 |= rank.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Belongs to both operands (the same key was passed in both lists).
    pub fn is_shared(self) -> bool {
        self.0 == 3
    }

    /// The single rank, if the shape belongs to exactly one operand.
    pub fn single(self) -> Option<Rank> {
        match self.0 {
            1 => Some(Rank::Object),
            2 => Some(Rank::Tool),
            _ => None,
        }
    }
}

/// Unit of intersection: one solid of an argument root, or whatever the
/// root holds outside its solids.
///
/// Different parts are intersected with each other even when they belong
/// to the same operand, so overlapping arguments of one list are merged
/// like the two operands are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    pub rank: Rank,
    /// Position of the root in its argument list.
    pub root: usize,
    pub solid: Option<SolidKey>,
}

/// Whether two indexed shapes form a pair that must be intersected.
///
/// `a` and `b` are sorted part lists. When every part of one shape is a
/// part of the other, both lie on the same solids (or are the same key
/// passed twice) and are never intersected.
pub fn is_valid_pair(a: &[usize], b: &[usize]) -> bool {
    let within = |x: &[usize], y: &[usize]| x.iter().all(|p| y.binary_search(p).is_ok());
    !within(a, b) && !within(b, a)
}

// ============================================================================
// Records
// ============================================================================

/// One indexed shape.
#[derive(Debug, Clone)]
pub struct ShapeInfo {
    pub key: ShapeKey,
    pub ranks: Ranks,
    /// Sorted indices into [`Ds::parts`].
    pub parts: SmallVec<[usize; 2]>,
    /// Box enlarged by the shape tolerance plus half the fuzzy value.
    pub bbox: Aabb,
    pub sub_shapes: Vec<ShapeId>,
    pub tolerance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterferenceKind {
    VertexVertex,
    VertexEdge,
    EdgeEdge,
    VertexFace,
    EdgeFace,
    FaceFace,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterferenceGeometry {
    /// A coincidence point, with its parameters on the edges involved.
    Point {
        vertex: VertexKey,
        params: SmallVec<[f64; 2]>,
    },
    /// Collinear edges sharing a sub-range.
    Overlap {
        range1: (f64, f64),
        range2: (f64, f64),
    },
    /// An edge lying in the plane of a face, or two coplanar faces.
    Coplanar,
    /// Section curves produced by a face/face pair.
    Curves(Vec<usize>),
}

/// A recorded coincidence between two indexed shapes, stored once per
/// unordered pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Interference {
    pub first: ShapeId,
    pub second: ShapeId,
    pub kind: InterferenceKind,
    pub geometry: InterferenceGeometry,
}

/// A vertex bound to a parameter on an edge or a section curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pave {
    pub vertex: VertexKey,
    pub parameter: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockOrigin {
    Edge(EdgeKey),
    Section(usize),
}

/// The part of an edge or section curve between two consecutive paves.
#[derive(Debug, Clone, PartialEq)]
pub struct PaveBlock {
    pub origin: BlockOrigin,
    pub start: Pave,
    pub end: Pave,
    /// Index of the common block this block belongs to.
    pub common: Option<usize>,
}

impl PaveBlock {
    pub fn span(&self) -> f64 {
        self.end.parameter - self.start.parameter
    }
}

/// Pave blocks of different edges or section curves that are one
/// geometric segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonBlock {
    pub blocks: Vec<usize>,
}

/// A maximal run of a face/face intersection line lying in both faces.
#[derive(Debug, Clone)]
pub struct SectionCurve {
    pub faces: (FaceKey, FaceKey),
    pub line: Line,
    pub tolerance: f64,
    /// Sorted by parameter on `line`.
    pub paves: Vec<Pave>,
    pub blocks: Vec<usize>,
}

/// What the intersection stages found on or inside a face.
#[derive(Debug, Clone, Default)]
pub struct FaceInfo {
    /// Vertices strictly inside the face.
    pub vertices_in: Vec<VertexKey>,
    /// Edges of the other operand lying in the face plane.
    pub edges_in: Vec<EdgeKey>,
    /// Section curves of this face.
    pub sections: Vec<usize>,
    /// Blocks of `edges_in` strictly inside the face.
    pub blocks_in: Vec<usize>,
}

// ============================================================================
// The data structure
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Ds {
    fuzzy: f64,
    shapes: Vec<ShapeInfo>,
    index: FxHashMap<ShapeKey, ShapeId>,
    arguments: [Vec<ShapeKey>; 2],
    parts: Vec<Part>,
    /// Part pairs of one root that share sub-shapes.
    linked: FxHashSet<(usize, usize)>,
    interferences: Vec<Interference>,
    interfered: FxHashSet<(ShapeId, ShapeId)>,
    same_domain: FxHashMap<VertexKey, VertexKey>,
    extra_paves: FxHashMap<EdgeKey, Vec<Pave>>,
    face_info: FxHashMap<FaceKey, FaceInfo>,
    coplanar_faces: Vec<(FaceKey, FaceKey)>,
    pub(crate) sections: Vec<SectionCurve>,
    pub(crate) pave_blocks: Vec<PaveBlock>,
    pub(crate) edge_blocks: FxHashMap<EdgeKey, Vec<usize>>,
    pub(crate) common_blocks: Vec<CommonBlock>,
}

impl Ds {
    pub fn new(fuzzy: f64) -> Self {
        Self {
            fuzzy,
            ..Self::default()
        }
    }

    pub fn fuzzy(&self) -> f64 {
        self.fuzzy
    }

    // --- Indexing ---

    /// Indexes both argument lists. Fails on a key that is not in the arena.
    ///
    /// Each solid of a root is indexed as its own part, then the rest of
    /// the root as one more part. A key repeated in one list is indexed
    /// once.
    pub fn index_arguments(
        &mut self,
        arena: &ShapeArena,
        objects: &[ShapeKey],
        tools: &[ShapeKey],
    ) -> Result<()> {
        for (rank, list) in [(Rank::Object, objects), (Rank::Tool, tools)] {
            for &key in list {
                if !arena.contains(key) {
                    return Err(Error::UnknownShape(key));
                }
                if self.arguments[rank.slot()].contains(&key) {
                    continue;
                }
                let root = self.arguments[rank.slot()].len();
                self.arguments[rank.slot()].push(key);
                for solid in arena.explode(key, ShapeType::Solid).into_iter().filter_map(|k| k.as_solid()) {
                    let part = self.solid_part(rank, root, solid);
                    self.index_shape(arena, solid.into(), part);
                }
                if key.shape_type() != ShapeType::Solid {
                    let part = self.parts.len();
                    self.parts.push(Part { rank, root, solid: None });
                    self.index_shape(arena, key, part);
                }
            }
        }
        Ok(())
    }

    /// The part of `solid` in one operand, created on first use.
    fn solid_part(&mut self, rank: Rank, root: usize, solid: SolidKey) -> usize {
        if let Some(i) = self.parts.iter().position(|p| p.rank == rank && p.solid == Some(solid)) {
            return i;
        }
        self.parts.push(Part {
            rank,
            root,
            solid: Some(solid),
        });
        self.parts.len() - 1
    }

    /// Indexes a shape and all its sub-shapes under `part`. A shape reached
    /// again (shared between parents, parts or operands) keeps its id and
    /// gains the part. The remainder part of a root stops at solids.
    fn index_shape(&mut self, arena: &ShapeArena, key: ShapeKey, part: usize) -> ShapeId {
        if let Some(&id) = self.index.get(&key) {
            if self.parts[part].solid.is_some() || key.shape_type() != ShapeType::Solid {
                self.add_part(id, part);
            }
            return id;
        }
        let sub_shapes: Vec<ShapeId> = arena
            .children(key)
            .into_iter()
            .map(|child| self.index_shape(arena, child, part))
            .collect();
        let ranks = Ranks::of(self.parts[part].rank);
        self.push_shape(arena, key, ranks, SmallVec::from_elem(part, 1), sub_shapes)
    }

    fn add_part(&mut self, id: ShapeId, part: usize) {
        let info = &self.shapes[id.index()];
        let Err(at) = info.parts.binary_search(&part) else {
            return;
        };
        let new = self.parts[part];
        for &other in &info.parts {
            let p = self.parts[other];
            if p.rank == new.rank && p.root == new.root {
                self.linked.insert((other.min(part), other.max(part)));
            }
        }
        let info = &mut self.shapes[id.index()];
        info.parts.insert(at, part);
        info.ranks.insert(new.rank);
        let subs = info.sub_shapes.clone();
        for sub in subs {
            if new.solid.is_none() && self.shapes[sub.index()].key.shape_type() == ShapeType::Solid {
                continue;
            }
            self.add_part(sub, part);
        }
    }

    fn push_shape(
        &mut self,
        arena: &ShapeArena,
        key: ShapeKey,
        ranks: Ranks,
        parts: SmallVec<[usize; 2]>,
        sub_shapes: Vec<ShapeId>,
    ) -> ShapeId {
        let tolerance = arena.tolerance(key);
        let mut bbox = arena.bounding_box(key);
        bbox.enlarge(bbox.gap().max(tolerance) + 0.5 * self.fuzzy);
        let id = ShapeId::from_index(self.shapes.len());
        self.shapes.push(ShapeInfo {
            key,
            ranks,
            parts,
            bbox,
            sub_shapes,
            tolerance,
        });
        self.index.insert(key, id);
        id
    }

    /// Indexes a vertex created during the run.
    pub fn append_vertex(&mut self, arena: &ShapeArena, vertex: VertexKey) -> ShapeId {
        let key = ShapeKey::from(vertex);
        match self.index.get(&key) {
            Some(&id) => id,
            None => self.push_shape(arena, key, Ranks::NONE, SmallVec::new(), Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn id(&self, key: ShapeKey) -> Option<ShapeId> {
        self.index.get(&key).copied()
    }

    pub fn info(&self, id: ShapeId) -> &ShapeInfo {
        &self.shapes[id.index()]
    }

    pub fn info_of(&self, key: ShapeKey) -> Option<&ShapeInfo> {
        self.id(key).map(|id| self.info(id))
    }

    pub fn ranks(&self, key: ShapeKey) -> Ranks {
        self.info_of(key).map_or(Ranks::NONE, |i| i.ranks)
    }

    /// Every indexed shape in id order.
    pub fn shapes(&self) -> impl Iterator<Item = (ShapeId, &ShapeInfo)> {
        self.shapes
            .iter()
            .enumerate()
            .map(|(i, info)| (ShapeId::from_index(i), info))
    }

    /// Ids of operand shapes of one type, in id order.
    pub fn ids_of_type(&self, ty: ShapeType) -> Vec<ShapeId> {
        self.shapes()
            .filter(|(_, info)| !info.ranks.is_empty() && info.key.shape_type() == ty)
            .map(|(id, _)| id)
            .collect()
    }

    /// Argument roots of one operand.
    pub fn arguments(&self, rank: Rank) -> &[ShapeKey] {
        &self.arguments[rank.slot()]
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// The solid of a part, or its root for the remainder part.
    pub fn part_shape(&self, part: usize) -> ShapeKey {
        let p = self.parts[part];
        match p.solid {
            Some(solid) => solid.into(),
            None => self.arguments[p.rank.slot()][p.root],
        }
    }

    /// Belongs to more than one argument (or to one argument in both
    /// operands).
    pub fn spans_arguments(&self, info: &ShapeInfo) -> bool {
        let mut roots = info.parts.iter().map(|&p| (self.parts[p].rank, self.parts[p].root));
        roots.next().is_some_and(|first| roots.any(|r| r != first))
    }

    /// Pairs of unlinked parts of one argument root with an interference
    /// between their sub-shapes, each pair once in interference order.
    pub fn self_interfering_parts(&self) -> Vec<(usize, usize)> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for i in &self.interferences {
            let a = &self.info(i.first).parts;
            let b = &self.info(i.second).parts;
            for &u in a.iter().filter(|p| !b.contains(p)) {
                for &v in b.iter().filter(|p| !a.contains(p)) {
                    let (pu, pv) = (self.parts[u], self.parts[v]);
                    let pair = (u.min(v), u.max(v));
                    if pu.rank == pv.rank && pu.root == pv.root && !self.linked.contains(&pair) && seen.insert(pair) {
                        out.push(pair);
                    }
                }
            }
        }
        out
    }

    // --- Interferences ---

    pub fn add_interference(
        &mut self,
        first: ShapeId,
        second: ShapeId,
        kind: InterferenceKind,
        geometry: InterferenceGeometry,
    ) {
        let pair = if first <= second { (first, second) } else { (second, first) };
        if self.interfered.insert(pair) {
            self.interferences.push(Interference {
                first,
                second,
                kind,
                geometry,
            });
        }
    }

    pub fn interferences(&self) -> &[Interference] {
        &self.interferences
    }

    pub fn has_interfered(&self, a: ShapeId, b: ShapeId) -> bool {
        let pair = if a <= b { (a, b) } else { (b, a) };
        self.interfered.contains(&pair)
    }

    // --- Same-domain vertices ---

    /// The vertex currently standing for `v`.
    pub fn resolve(&self, v: VertexKey) -> VertexKey {
        let mut current = v;
        // Chains are acyclic: `set_same_domain` only links roots.
        while let Some(&next) = self.same_domain.get(&current) {
            current = next;
        }
        current
    }

    /// Makes `target` stand for `v` (and everything already resolving to
    /// `v`).
    pub fn set_same_domain(&mut self, v: VertexKey, target: VertexKey) {
        let from = self.resolve(v);
        let to = self.resolve(target);
        if from != to {
            self.same_domain.insert(from, to);
        }
    }

    /// Whether `v` has been replaced.
    pub fn is_replaced(&self, v: VertexKey) -> bool {
        self.same_domain.contains_key(&v)
    }

    /// Point and tolerance of the vertex standing for `v`.
    pub fn vertex_geometry(&self, arena: &ShapeArena, v: VertexKey) -> Option<(Point3<f64>, f64)> {
        arena
            .vertex(self.resolve(v))
            .map(|data| (data.point, data.tolerance))
    }

    /// Replaces `v` by a new vertex at the same point whose tolerance is at
    /// least `tolerance`. Returns the vertex standing for `v` afterwards.
    pub fn grow_vertex(&mut self, arena: &mut ShapeArena, v: VertexKey, tolerance: f64) -> VertexKey {
        let current = self.resolve(v);
        let Some(data) = arena.vertex(current) else {
            return current;
        };
        if data.tolerance >= tolerance {
            return current;
        }
        let point = data.point;
        let grown = arena.add_vertex_with_tolerance(point, tolerance);
        self.append_vertex(arena, grown);
        self.set_same_domain(current, grown);
        tracing::debug!(tolerance, "Vertex tolerance grown");
        grown
    }

    // --- Paves ---

    pub fn add_pave(&mut self, edge: EdgeKey, pave: Pave) {
        self.extra_paves.entry(edge).or_default().push(pave);
    }

    /// Paves found on the interior of an edge, in discovery order.
    pub fn extra_paves(&self, edge: EdgeKey) -> &[Pave] {
        self.extra_paves.get(&edge).map(Vec::as_slice).unwrap_or(&[])
    }

    // --- Faces ---

    pub fn face_info(&self, face: FaceKey) -> Option<&FaceInfo> {
        self.face_info.get(&face)
    }

    pub fn face_info_mut(&mut self, face: FaceKey) -> &mut FaceInfo {
        self.face_info.entry(face).or_default()
    }

    pub fn add_coplanar_faces(&mut self, a: FaceKey, b: FaceKey) {
        self.coplanar_faces.push((a, b));
    }

    /// Face pairs of different operands lying in one plane.
    pub fn coplanar_faces(&self) -> &[(FaceKey, FaceKey)] {
        &self.coplanar_faces
    }

    // --- Blocks ---

    pub fn sections(&self) -> &[SectionCurve] {
        &self.sections
    }

    pub fn pave_blocks(&self) -> &[PaveBlock] {
        &self.pave_blocks
    }

    pub fn pave_block(&self, index: usize) -> &PaveBlock {
        &self.pave_blocks[index]
    }

    /// Blocks of an edge in ascending parameter order.
    pub fn edge_blocks(&self, edge: EdgeKey) -> &[usize] {
        self.edge_blocks.get(&edge).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn common_blocks(&self) -> &[CommonBlock] {
        &self.common_blocks
    }

    /// Whether an operand edge passes through the pipeline untouched: one
    /// block running between its own, unreplaced end vertices.
    pub fn is_edge_unchanged(&self, arena: &ShapeArena, edge: EdgeKey) -> bool {
        let Some(data) = arena.edge(edge) else {
            return false;
        };
        match self.edge_blocks(edge) {
            [single] => {
                let block = &self.pave_blocks[*single];
                block.start.vertex == data.start && block.end.vertex == data.end
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_id_is_never_zero() {
        let id = ShapeId::from_index(0);
        assert_eq!(id.index(), 0);
        assert_eq!(id.0.get(), 1);
    }

    #[test]
    fn pair_validity() {
        assert!(is_valid_pair(&[0], &[1]));
        assert!(is_valid_pair(&[1], &[0]));
        assert!(!is_valid_pair(&[0], &[0]));
        assert!(is_valid_pair(&[0, 1], &[2]));
        assert!(!is_valid_pair(&[0, 1], &[0, 1]));
        // A face shared by two solids and a face of one of them.
        assert!(!is_valid_pair(&[0, 1], &[1]));
        assert!(!is_valid_pair(&[], &[1]));
    }

    #[test]
    fn each_argument_is_its_own_part() {
        let mut arena = ShapeArena::new();
        let (a1, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (a2, _, _) = arena.make_box([0.5; 3], [1.5; 3]).unwrap();
        let (b, _, _) = arena.make_box([3.0; 3], [4.0; 3]).unwrap();
        let mut ds = Ds::new(0.0);
        ds.index_arguments(&arena, &[a1.into(), a2.into()], &[b.into()]).unwrap();
        assert_eq!(ds.parts().len(), 3);
        assert_eq!(ds.parts()[1], Part { rank: Rank::Object, root: 1, solid: Some(a2) });
        let f1 = ds.info_of(arena.explode(a1.into(), ShapeType::Face)[0]).unwrap();
        let f2 = ds.info_of(arena.explode(a2.into(), ShapeType::Face)[0]).unwrap();
        assert_eq!(f1.ranks, f2.ranks);
        assert!(is_valid_pair(&f1.parts, &f2.parts));
    }

    #[test]
    fn solids_of_one_compound_are_separate_parts() {
        let mut arena = ShapeArena::new();
        let (a1, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (a2, _, _) = arena.make_box([0.5; 3], [1.5; 3]).unwrap();
        let (b, _, _) = arena.make_box([3.0; 3], [4.0; 3]).unwrap();
        let compound = arena.add_compound(vec![a1.into(), a2.into()]).unwrap();
        let mut ds = Ds::new(0.0);
        ds.index_arguments(&arena, &[compound.into()], &[b.into()]).unwrap();
        // Two solids plus the compound itself.
        assert_eq!(ds.parts().len(), 4);
        assert_eq!((ds.parts()[0].root, ds.parts()[1].root), (0, 0));
        assert_eq!(ds.part_shape(2), ShapeKey::from(compound));
        let compound_info = ds.info_of(compound.into()).unwrap();
        assert_eq!(compound_info.parts.as_slice(), &[2]);
        let solid_info = ds.info_of(a1.into()).unwrap();
        assert_eq!(solid_info.parts.as_slice(), &[0]);
    }

    #[test]
    fn repeated_argument_is_indexed_once() {
        let mut arena = ShapeArena::new();
        let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (b, _, _) = arena.make_box([3.0; 3], [4.0; 3]).unwrap();
        let mut ds = Ds::new(0.0);
        ds.index_arguments(&arena, &[a.into(), a.into()], &[b.into()]).unwrap();
        assert_eq!(ds.arguments(Rank::Object).len(), 1);
        assert_eq!(ds.parts().len(), 2);
    }

    #[test]
    fn indexing_deduplicates_shared_sub_shapes() {
        let mut arena = ShapeArena::new();
        let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (b, _, _) = arena.make_box([0.5, 0.0, 0.0], [1.5, 1.0, 1.0]).unwrap();
        let mut ds = Ds::new(0.0);
        ds.index_arguments(&arena, &[a.into()], &[b.into()]).unwrap();
        assert_eq!(ds.ids_of_type(ShapeType::Vertex).len(), 16);
        assert_eq!(ds.ids_of_type(ShapeType::Edge).len(), 24);
        assert_eq!(ds.ids_of_type(ShapeType::Face).len(), 12);
        assert_eq!(ds.arguments(Rank::Object), &[ShapeKey::from(a)]);
    }

    #[test]
    fn same_key_in_both_operands_is_shared() {
        let mut arena = ShapeArena::new();
        let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let mut ds = Ds::new(0.0);
        ds.index_arguments(&arena, &[a.into()], &[a.into()]).unwrap();
        assert_eq!(ds.ids_of_type(ShapeType::Face).len(), 6);
        assert!(ds
            .shapes()
            .all(|(_, info)| info.ranks.is_shared() && info.parts.len() == 2));
        assert!(ds.shapes().all(|(_, info)| ds.spans_arguments(info)));
    }

    #[test]
    fn unknown_argument_is_an_error() {
        let mut arena = ShapeArena::new();
        let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        // The arena holds no compound, so a compound key from elsewhere
        // cannot resolve in it.
        let mut other = ShapeArena::new();
        let missing: ShapeKey = other.add_compound(Vec::new()).unwrap().into();
        let mut ds = Ds::new(0.0);
        assert!(matches!(
            ds.index_arguments(&arena, &[a.into()], &[missing]),
            Err(Error::UnknownShape(_))
        ));
    }

    #[test]
    fn same_domain_resolves_transitively() {
        let mut arena = ShapeArena::new();
        let a = arena.add_vertex(Point3::origin());
        let b = arena.add_vertex(Point3::origin());
        let c = arena.add_vertex(Point3::origin());
        let mut ds = Ds::new(0.0);
        ds.set_same_domain(a, b);
        ds.set_same_domain(b, c);
        assert_eq!(ds.resolve(a), c);
        ds.set_same_domain(a, c);
        assert_eq!(ds.resolve(b), c);
        assert!(!ds.is_replaced(c));
    }

    #[test]
    fn growing_creates_a_new_vertex() {
        let mut arena = ShapeArena::new();
        let v = arena.add_vertex(Point3::new(1.0, 2.0, 3.0));
        let mut ds = Ds::new(0.0);
        let grown = ds.grow_vertex(&mut arena, v, 0.1);
        assert_ne!(grown, v);
        assert_eq!(ds.resolve(v), grown);
        assert_eq!(arena.vertex(v).unwrap().tolerance, paver_topology::precision::CONFUSION);
        assert_eq!(arena.vertex(grown).unwrap().tolerance, 0.1);
        assert_eq!(ds.grow_vertex(&mut arena, v, 0.05), grown);
    }
}
