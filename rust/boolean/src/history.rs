// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shape history: which result sub-shapes replace each operand sub-shape.
//!
//! Every indexed sub-shape of both operands has exactly one entry. An
//! untouched shape that survives maps to itself, a shape with no part in
//! the result maps to nothing.

use paver_topology::{ShapeArena, ShapeKey, ShapeType};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::builder::Images;
use crate::ds::Ds;

/// Images of one operand sub-shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Result sub-shapes replacing the shape.
    pub images: Vec<ShapeKey>,
    /// The operation cut the shape into more than one piece, whether or
    /// not all of them made it into the result.
    pub split: bool,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<(ShapeKey, HistoryEntry)>,
    index: FxHashMap<ShapeKey, usize>,
}

/// Result shapes containing each result sub-shape, by type.
#[derive(Default)]
struct Containers {
    present: FxHashSet<ShapeKey>,
    wires: FxHashMap<ShapeKey, Vec<ShapeKey>>,
    shells: FxHashMap<ShapeKey, Vec<ShapeKey>>,
    solids: FxHashMap<ShapeKey, Vec<ShapeKey>>,
}

impl Containers {
    fn new(arena: &ShapeArena, result: ShapeKey) -> Self {
        let mut out = Self::default();
        for ty in [
            ShapeType::Vertex,
            ShapeType::Edge,
            ShapeType::Wire,
            ShapeType::Face,
            ShapeType::Shell,
            ShapeType::Solid,
            ShapeType::CompSolid,
            ShapeType::Compound,
        ] {
            out.present.extend(arena.explode(result, ty));
        }
        for (parent_type, child_type, map) in [
            (ShapeType::Wire, ShapeType::Edge, &mut out.wires),
            (ShapeType::Shell, ShapeType::Face, &mut out.shells),
            (ShapeType::Solid, ShapeType::Face, &mut out.solids),
        ] {
            for parent in arena.explode(result, parent_type) {
                for child in arena.explode(parent, child_type) {
                    map.entry(child).or_default().push(parent);
                }
            }
        }
        out
    }
}

impl History {
    pub(crate) fn build(arena: &ShapeArena, ds: &Ds, images: &Images, result: ShapeKey) -> Self {
        let containers = Containers::new(arena, result);
        let mut history = Self::default();

        let edge_images = |key: ShapeKey| -> Vec<ShapeKey> {
            key.as_edge()
                .map(|e| {
                    ds.edge_blocks(e)
                        .iter()
                        .filter_map(|&b| images.blocks.get(b).copied().flatten())
                        .map(ShapeKey::from)
                        .collect()
                })
                .unwrap_or_default()
        };
        let face_images = |key: ShapeKey| -> Vec<ShapeKey> {
            key.as_face()
                .and_then(|f| images.faces.get(&f))
                .map(|list| {
                    list.iter()
                        .map(|f| ShapeKey::from(images.survivors.get(f).copied().unwrap_or(*f)))
                        .collect()
                })
                .unwrap_or_default()
        };
        let lift = |leaves: Vec<ShapeKey>, map: &FxHashMap<ShapeKey, Vec<ShapeKey>>| -> Vec<ShapeKey> {
            leaves
                .iter()
                .filter_map(|leaf| map.get(leaf))
                .flatten()
                .copied()
                .collect()
        };

        for (_, info) in ds.shapes() {
            if info.ranks.is_empty() {
                continue;
            }
            let key = info.key;
            let raw: Vec<ShapeKey> = match key {
                ShapeKey::Vertex(v) => vec![ds.resolve(v).into()],
                ShapeKey::Edge(_) => edge_images(key),
                ShapeKey::Face(_) => face_images(key),
                ShapeKey::Wire(_) => {
                    let leaves = arena.children(key).into_iter().flat_map(&edge_images).collect();
                    lift(leaves, &containers.wires)
                }
                ShapeKey::Shell(_) => {
                    let leaves = arena.children(key).into_iter().flat_map(&face_images).collect();
                    lift(leaves, &containers.shells)
                }
                ShapeKey::Solid(_) | ShapeKey::CompSolid(_) | ShapeKey::Compound(_) => {
                    let leaves = arena
                        .explode(key, ShapeType::Face)
                        .into_iter()
                        .flat_map(&face_images)
                        .collect();
                    lift(leaves, &containers.solids)
                }
            };
            let raw = dedup(raw);
            let entry = HistoryEntry {
                split: raw.len() > 1,
                images: raw.into_iter().filter(|s| containers.present.contains(s)).collect(),
            };
            history.index.insert(key, history.entries.len());
            history.entries.push((key, entry));
        }
        history
    }

    /// Result sub-shapes replacing `shape`. Empty for a deleted shape or a
    /// shape that has no entry.
    pub fn images(&self, shape: ShapeKey) -> &[ShapeKey] {
        self.entry(shape).map(|e| e.images.as_slice()).unwrap_or(&[])
    }

    /// Result sub-shapes generated from `shape`, itself included when it
    /// survives untouched.
    pub fn generated(&self, shape: ShapeKey) -> &[ShapeKey] {
        self.images(shape)
    }

    /// Result sub-shapes replacing `shape`, other than `shape` itself.
    pub fn modified(&self, shape: ShapeKey) -> Vec<ShapeKey> {
        self.images(shape).iter().copied().filter(|&s| s != shape).collect()
    }

    /// Whether `shape` has an entry and no part of it is in the result.
    pub fn is_deleted(&self, shape: ShapeKey) -> bool {
        self.entry(shape).is_some_and(|e| e.images.is_empty())
    }

    pub fn is_split(&self, shape: ShapeKey) -> bool {
        self.entry(shape).is_some_and(|e| e.split)
    }

    /// Whether any shape was replaced by something other than itself.
    pub fn has_modified(&self) -> bool {
        self.entries
            .iter()
            .any(|(key, e)| e.images.iter().any(|s| s != key))
    }

    pub fn entry(&self, shape: ShapeKey) -> Option<&HistoryEntry> {
        self.index.get(&shape).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, shape: ShapeKey) -> bool {
        self.index.contains_key(&shape)
    }

    /// Entries in the order the shapes were indexed.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeKey, &HistoryEntry)> {
        self.entries.iter().map(|(k, e)| (*k, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn dedup(list: Vec<ShapeKey>) -> Vec<ShapeKey> {
    let mut seen = FxHashSet::default();
    list.into_iter().filter(|s| seen.insert(*s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::options::BooleanOptions;
    use crate::pave_filler::PaveFiller;
    use crate::progress::NoProgress;
    use crate::Operation;

    #[test]
    fn offset_cubes_fuse_history() {
        let mut arena = ShapeArena::new();
        let (a, _, fa) = arena.make_box([0.0; 3], [1.0; 3]).unwrap();
        let (b, _, _) = arena.make_box([0.5, 0.0, 0.0], [1.5, 1.0, 1.0]).unwrap();
        let options = BooleanOptions::default();
        let mut filler =
            PaveFiller::new(&mut arena, &[a.into()], &[b.into()], &options, &NoProgress).unwrap();
        filler.run().unwrap();
        let (_, history) = Builder::new(&mut filler, Operation::Fuse).build().unwrap();

        // Every indexed operand shape has an entry.
        let indexed = filler.ds().shapes().filter(|(_, i)| !i.ranks.is_empty()).count();
        assert_eq!(history.len(), indexed);

        // The far face of the first cube survives untouched.
        let far: ShapeKey = fa
            .iter()
            .copied()
            .find(|&f| {
                let d = filler.arena().face(f).unwrap();
                d.surface.normal.x < -0.5
            })
            .unwrap()
            .into();
        assert_eq!(history.images(far), &[far]);
        assert!(!history.is_split(far));

        // The face inside the second cube is gone.
        let inner: ShapeKey = fa
            .iter()
            .copied()
            .find(|&f| filler.arena().face(f).unwrap().surface.normal.x > 0.5)
            .unwrap()
            .into();
        assert!(history.is_deleted(inner));
        assert!(history.has_modified());
    }
}
