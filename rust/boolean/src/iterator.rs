// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Candidate pairs of one intersection category.
//!
//! Pairs come out of a box tree query, never from an all-pairs scan, and
//! are returned in a deterministic order (ascending first id, then second
//! id) so that pair slots are stable between runs.

use paver_topology::ShapeType;

use crate::box_tree::BoxTree;
use crate::ds::{is_valid_pair, Ds, ShapeId};

/// All pairs `(a, b)` with `a` of type `first` and `b` of type `second`
/// whose gapped boxes overlap and that belong to different parts.
/// For `first == second` each unordered pair appears once, with `a < b`.
pub fn candidate_pairs(ds: &Ds, first: ShapeType, second: ShapeType) -> Vec<(ShapeId, ShapeId)> {
    let firsts = ds.ids_of_type(first);
    let seconds = if first == second {
        firsts.clone()
    } else {
        ds.ids_of_type(second)
    };
    if firsts.is_empty() || seconds.is_empty() {
        return Vec::new();
    }

    let tree = BoxTree::new(
        seconds
            .iter()
            .enumerate()
            .map(|(slot, &id)| (ds.info(id).bbox, slot)),
    );

    let mut pairs = Vec::new();
    for &a in &firsts {
        let info_a = ds.info(a);
        for slot in tree.query(&info_a.bbox) {
            let b = seconds[slot];
            if first == second && b <= a {
                continue;
            }
            if is_valid_pair(&info_a.parts, &ds.info(b).parts) {
                pairs.push((a, b));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use paver_topology::ShapeArena;

    fn offset_cubes(dx: f64) -> (ShapeArena, Ds) {
        let mut arena = ShapeArena::new();
        let (a, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (b, _, _) = arena.make_box([dx, 0.0, 0.0], [dx + 1.0, 1.0, 1.0]).unwrap();
        let mut ds = Ds::new(0.0);
        ds.index_arguments(&arena, &[a.into()], &[b.into()]).unwrap();
        (arena, ds)
    }

    #[test]
    fn far_apart_operands_have_no_pairs() {
        let (_, ds) = offset_cubes(5.0);
        for (a, b) in [
            (ShapeType::Vertex, ShapeType::Vertex),
            (ShapeType::Edge, ShapeType::Edge),
            (ShapeType::Face, ShapeType::Face),
        ] {
            assert!(candidate_pairs(&ds, a, b).is_empty());
        }
    }

    #[test]
    fn pairs_cross_operands() {
        let (_, ds) = offset_cubes(0.5);
        let pairs = candidate_pairs(&ds, ShapeType::Face, ShapeType::Face);
        assert!(!pairs.is_empty());
        for (a, b) in pairs {
            assert!(a < b);
            assert!(is_valid_pair(&ds.info(a).parts, &ds.info(b).parts));
        }
    }

    #[test]
    fn pairs_are_deterministic() {
        let (_, ds) = offset_cubes(0.5);
        assert_eq!(
            candidate_pairs(&ds, ShapeType::Edge, ShapeType::Face),
            candidate_pairs(&ds, ShapeType::Edge, ShapeType::Face)
        );
    }

    #[test]
    fn arguments_of_one_list_pair_up() {
        let mut arena = ShapeArena::new();
        let (a1, _, _) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (a2, _, _) = arena.make_box([0.5, 0.0, 0.0], [1.5, 1.0, 1.0]).unwrap();
        let (b, _, _) = arena.make_box([5.0; 3], [6.0; 3]).unwrap();
        let mut ds = Ds::new(0.0);
        ds.index_arguments(&arena, &[a1.into(), a2.into()], &[b.into()]).unwrap();
        assert!(!candidate_pairs(&ds, ShapeType::Face, ShapeType::Face).is_empty());
    }

    #[test]
    fn touching_vertices_pair_up() {
        let (_, ds) = offset_cubes(1.0);
        // Four vertices of the shared square coincide.
        assert_eq!(candidate_pairs(&ds, ShapeType::Vertex, ShapeType::Vertex).len(), 4);
    }
}
