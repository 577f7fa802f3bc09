// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Section result: the split edges where the arguments meet, plus the
//! contact vertices that lie on none of them.

use paver_topology::{EdgeKey, ShapeKey, ShapeType, VertexKey};
use rustc_hash::FxHashSet;

use super::Builder;
use crate::ds::{InterferenceGeometry, InterferenceKind};
use crate::progress::Abort;

impl Builder<'_, '_> {
    /// Compound of the images of face/face section blocks, common blocks,
    /// blocks of edges shared by several arguments and blocks of one
    /// argument lying inside a face of another.
    pub(super) fn build_section(&mut self) -> Result<ShapeKey, Abort> {
        let ds = &self.filler.ds;
        let mut blocks: Vec<usize> = ds.sections.iter().flat_map(|s| s.blocks.iter().copied()).collect();

        for cb in ds.common_blocks.iter().filter(|cb| cb.blocks.len() > 1) {
            blocks.extend(cb.blocks.iter().copied());
        }

        for id in ds.ids_of_type(ShapeType::Edge) {
            let info = ds.info(id);
            if let (true, Some(edge)) = (ds.spans_arguments(info), info.key.as_edge()) {
                blocks.extend(ds.edge_blocks(edge).iter().copied());
            }
        }

        for id in ds.ids_of_type(ShapeType::Face) {
            if let Some(info) = ds.info(id).key.as_face().and_then(|f| ds.face_info(f)) {
                blocks.extend(info.blocks_in.iter().copied());
            }
        }

        let mut seen = FxHashSet::default();
        let edges: Vec<EdgeKey> = blocks
            .into_iter()
            .filter_map(|b| self.images.blocks[b])
            .filter(|e: &EdgeKey| seen.insert(*e))
            .collect();

        let arena = &*self.filler.arena;
        let on_edges: FxHashSet<VertexKey> = edges
            .iter()
            .filter_map(|&e| arena.edge(e))
            .flat_map(|e| [e.start, e.end])
            .collect();
        let mut contact = FxHashSet::default();
        let mut vertices = Vec::new();
        for v in self.contact_vertices() {
            if !on_edges.contains(&v) && contact.insert(v) {
                vertices.push(v);
            }
        }

        tracing::debug!(edges = edges.len(), vertices = vertices.len(), "Section built");
        let children = edges
            .into_iter()
            .map(ShapeKey::from)
            .chain(vertices.into_iter().map(ShapeKey::from))
            .collect();
        self.make_compound(children).ok_or(Abort)
    }

    /// Vertices where arguments touch: merged vertices, vertices on an
    /// edge or face of another argument, and points where edges meet
    /// edges or faces. Operand vertices shared by several arguments count
    /// too.
    fn contact_vertices(&self) -> Vec<VertexKey> {
        let ds = &self.filler.ds;
        let mut out = Vec::new();
        for i in ds.interferences() {
            let InterferenceGeometry::Point { vertex, .. } = i.geometry else {
                continue;
            };
            match i.kind {
                InterferenceKind::VertexVertex
                | InterferenceKind::VertexEdge
                | InterferenceKind::VertexFace
                | InterferenceKind::EdgeEdge
                | InterferenceKind::EdgeFace => out.push(ds.resolve(vertex)),
                InterferenceKind::FaceFace => {}
            }
        }
        for id in ds.ids_of_type(ShapeType::Vertex) {
            let info = ds.info(id);
            if let (true, Some(v)) = (ds.spans_arguments(info), info.key.as_vertex()) {
                out.push(ds.resolve(v));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::{section, Status};
    use paver_topology::{ShapeArena, ShapeType};

    #[test]
    fn cubes_touching_at_a_corner_meet_in_one_vertex() {
        let mut arena = ShapeArena::new();
        let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (b, _, _) = arena.make_box([1.0; 3], [2.0; 3]).unwrap();
        let result = section(&mut arena, a.into(), b.into()).unwrap();
        assert_eq!(result.status, Status::Done);
        let shape = result.shape.unwrap();
        assert!(arena.explode(shape, ShapeType::Edge).is_empty());
        let vertices = arena.explode(shape, ShapeType::Vertex);
        assert_eq!(vertices.len(), 1);
        let p = arena.vertex_point(vertices[0].as_vertex().unwrap()).unwrap();
        assert!((p - nalgebra::Point3::new(1.0, 1.0, 1.0)).norm() < 1e-9);
    }

    #[test]
    fn contact_vertices_on_section_edges_are_not_repeated() {
        let mut arena = ShapeArena::new();
        let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (b, _, _) = arena.make_box([0.5; 3], [1.5; 3]).unwrap();
        let result = section(&mut arena, a.into(), b.into()).unwrap();
        assert_eq!(result.status, Status::Done);
        let children = arena.children(result.shape.unwrap());
        assert_eq!(children.len(), 6);
        assert!(children.iter().all(|c| c.shape_type() == ShapeType::Edge));
    }
}
