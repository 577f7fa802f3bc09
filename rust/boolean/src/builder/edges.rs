// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Split edges: one result edge per pave block, shared by all blocks of a
//! common block.

use paver_topology::{EdgeKey, Orientation, Oriented, ShapeKey};

use super::Builder;
use crate::ds::{BlockOrigin, Rank};
use crate::report::AlertKind;

impl Builder<'_, '_> {
    pub(super) fn split_edges(&mut self) {
        let count = self.filler.ds.pave_blocks.len();
        self.images.blocks = vec![None; count];

        for index in 0..self.filler.ds.common_blocks.len() {
            let blocks = self.filler.ds.common_blocks[index].blocks.clone();
            let image = self.common_block_image(&blocks);
            for b in blocks {
                self.images.blocks[b] = image;
            }
        }

        let mut created = 0usize;
        for b in 0..count {
            if self.filler.ds.pave_blocks[b].common.is_some() {
                continue;
            }
            let origin = self.filler.ds.pave_blocks[b].origin;
            let image = match origin {
                BlockOrigin::Edge(edge) if self.filler.ds.is_edge_unchanged(self.filler.arena, edge) => Some(edge),
                _ => {
                    created += 1;
                    self.block_edge(b)
                }
            };
            self.images.blocks[b] = image;
        }
        tracing::debug!(
            blocks = count,
            common = self.filler.ds.common_blocks.len(),
            created,
            "Edges split"
        );
    }

    /// Edge shared by a group of coincident blocks. An untouched operand
    /// edge is reused, the object's first.
    fn common_block_image(&mut self, blocks: &[usize]) -> Option<EdgeKey> {
        let ds = &self.filler.ds;
        let arena = &*self.filler.arena;
        let edge_of = |b: usize| match ds.pave_blocks[b].origin {
            BlockOrigin::Edge(e) => Some(e),
            BlockOrigin::Section(_) => None,
        };
        let of_object = |e: EdgeKey| ds.ranks(e.into()).contains(Rank::Object);

        let unchanged: Vec<EdgeKey> = blocks
            .iter()
            .filter_map(|&b| edge_of(b))
            .filter(|&e| ds.is_edge_unchanged(arena, e))
            .collect();
        if let Some(&edge) = unchanged.iter().find(|&&e| of_object(e)).or(unchanged.first()) {
            return Some(edge);
        }

        let representative = blocks
            .iter()
            .copied()
            .find(|&b| edge_of(b).is_some_and(of_object))
            .or_else(|| blocks.iter().copied().find(|&b| edge_of(b).is_some()))
            .or_else(|| blocks.first().copied())?;
        self.block_edge(representative)
    }

    /// New edge over the range of one block, on the carrier line of its
    /// edge or section curve.
    fn block_edge(&mut self, b: usize) -> Option<EdgeKey> {
        let block = self.filler.ds.pave_blocks[b].clone();
        let (curve, tolerance, source): (_, _, Vec<ShapeKey>) = match block.origin {
            BlockOrigin::Edge(edge) => {
                let data = self.filler.arena.edge(edge)?;
                (data.curve, data.tolerance, vec![edge.into()])
            }
            BlockOrigin::Section(index) => {
                let section = &self.filler.ds.sections[index];
                let (f1, f2) = section.faces;
                (section.line, section.tolerance, vec![f1.into(), f2.into()])
            }
        };
        match self.filler.arena.add_edge_on(
            block.start.vertex,
            block.end.vertex,
            curve,
            (block.start.parameter, block.end.parameter),
            tolerance,
        ) {
            Ok(edge) => Some(edge),
            Err(err) => {
                tracing::debug!(%err, block = b, "Split edge rejected");
                self.filler.report.add_warning(AlertKind::BuilderFailed, source);
                None
            }
        }
    }

    /// Sense of the image edge relative to the block it stands for.
    pub(super) fn block_orientation(&self, b: usize, image: EdgeKey) -> Orientation {
        let start = self.filler.ds.pave_blocks[b].start.vertex;
        match self.filler.arena.edge(image) {
            Some(data) if data.start != start => Orientation::Reversed,
            _ => Orientation::Forward,
        }
    }

    /// Image usages replacing one usage of an operand edge, in traversal
    /// order.
    pub(super) fn edge_usage_images(&self, usage: Oriented<EdgeKey>) -> Vec<Oriented<EdgeKey>> {
        let mut blocks = self.filler.ds.edge_blocks(usage.key).to_vec();
        if usage.orientation == Orientation::Reversed {
            blocks.reverse();
        }
        blocks
            .into_iter()
            .filter_map(|b| {
                let image = self.images.blocks[b]?;
                let sense = self.block_orientation(b, image).compose(usage.orientation);
                Some(Oriented::new(image, sense))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BooleanOptions;
    use crate::pave_filler::PaveFiller;
    use crate::progress::NoProgress;
    use crate::Operation;
    use approx::assert_relative_eq;
    use paver_topology::ShapeArena;

    #[test]
    fn coincident_blocks_share_one_edge() {
        let mut arena = ShapeArena::new();
        let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (b, _, _) = arena.make_box([0.5, 0.0, 0.0], [1.5, 1.0, 1.0]).unwrap();
        let options = BooleanOptions::default();
        let mut filler =
            PaveFiller::new(&mut arena, &[a.into()], &[b.into()], &options, &NoProgress).unwrap();
        filler.run().unwrap();
        let mut builder = Builder::new(&mut filler, Operation::Fuse);
        builder.split_edges();

        let ds = &builder.filler.ds;
        assert!(builder.images.blocks.iter().all(Option::is_some));
        for cb in ds.common_blocks() {
            let first = builder.images.blocks[cb.blocks[0]];
            assert!(cb.blocks.iter().all(|&b| builder.images.blocks[b] == first));
        }
        // Untouched edges stand for themselves.
        for (b, block) in ds.pave_blocks().iter().enumerate() {
            if let BlockOrigin::Edge(edge) = block.origin {
                if block.common.is_none() && ds.is_edge_unchanged(builder.filler.arena, edge) {
                    assert_eq!(builder.images.blocks[b], Some(edge));
                }
            }
        }
    }

    #[test]
    fn usage_images_chain_in_traversal_order() {
        let mut arena = ShapeArena::new();
        let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (b, _, _) = arena.make_box([0.5, 0.0, 0.0], [1.5, 1.0, 1.0]).unwrap();
        let edges: Vec<EdgeKey> = arena
            .explode(a.into(), paver_topology::ShapeType::Edge)
            .into_iter()
            .filter_map(|k| k.as_edge())
            .collect();
        let options = BooleanOptions::default();
        let mut filler =
            PaveFiller::new(&mut arena, &[a.into()], &[b.into()], &options, &NoProgress).unwrap();
        filler.run().unwrap();
        let mut builder = Builder::new(&mut filler, Operation::Fuse);
        builder.split_edges();

        for edge in edges {
            for sense in [Orientation::Forward, Orientation::Reversed] {
                let usage = Oriented::new(edge, sense);
                let images = builder.edge_usage_images(usage);
                let arena = &*builder.filler.arena;
                let (from, to) = arena.edge(edge).unwrap().oriented_ends(sense);
                let ends: Vec<_> = images
                    .iter()
                    .map(|u| arena.edge(u.key).unwrap().oriented_ends(u.orientation))
                    .collect();
                assert_eq!(ends.first().unwrap().0, builder.filler.ds.resolve(from));
                assert_eq!(ends.last().unwrap().1, builder.filler.ds.resolve(to));
                for pair in ends.windows(2) {
                    assert_eq!(pair[0].1, pair[1].0);
                }
                let length: f64 = images.iter().map(|u| arena.edge_length(u.key)).sum();
                assert_relative_eq!(length, arena.edge_length(edge), epsilon = 1e-12);
            }
        }
    }
}
