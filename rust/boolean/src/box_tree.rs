// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounding volume hierarchy over gapped boxes.
//!
//! Built once per shape type and operand, read-only afterwards. The split
//! is a median split of box centers along the longest axis of the node.

use paver_topology::Aabb;

const LEAF_SIZE: usize = 4;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        bbox: Aabb,
        start: usize,
        end: usize,
    },
    Inner {
        bbox: Aabb,
        left: usize,
        right: usize,
    },
}

impl Node {
    fn bbox(&self) -> &Aabb {
        match self {
            Node::Leaf { bbox, .. } | Node::Inner { bbox, .. } => bbox,
        }
    }
}

/// Box tree answering "which items may touch this box" queries.
#[derive(Debug, Clone, Default)]
pub struct BoxTree {
    nodes: Vec<Node>,
    items: Vec<(Aabb, usize)>,
}

impl BoxTree {
    /// Builds the tree over `(box, payload)` pairs. Void boxes are skipped.
    pub fn new(entries: impl IntoIterator<Item = (Aabb, usize)>) -> Self {
        let mut items: Vec<(Aabb, usize)> = entries.into_iter().filter(|(b, _)| !b.is_void()).collect();
        let mut nodes = Vec::new();
        if !items.is_empty() {
            let len = items.len();
            build(&mut nodes, &mut items, 0, len);
        }
        Self { nodes, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Payloads of all items whose box overlaps `query`, in ascending order.
    pub fn query(&self, query: &Aabb) -> Vec<usize> {
        let mut out = Vec::new();
        if self.nodes.is_empty() || query.is_void() {
            return out;
        }
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.bbox().overlaps(query) {
                continue;
            }
            match node {
                Node::Leaf { start, end, .. } => {
                    for (bbox, payload) in &self.items[*start..*end] {
                        if bbox.overlaps(query) {
                            out.push(*payload);
                        }
                    }
                }
                Node::Inner { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
        out.sort_unstable();
        out
    }
}

/// Builds the subtree over `items[start..end]` and returns its node index.
fn build(nodes: &mut Vec<Node>, items: &mut [(Aabb, usize)], start: usize, end: usize) -> usize {
    let mut bbox = Aabb::void();
    for (b, _) in &items[start..end] {
        bbox.add_box(b);
    }

    let index = nodes.len();
    if end - start <= LEAF_SIZE {
        nodes.push(Node::Leaf { bbox, start, end });
        return index;
    }

    let extent = bbox.max() - bbox.min();
    let axis = if extent.x >= extent.y && extent.x >= extent.z {
        0
    } else if extent.y >= extent.z {
        1
    } else {
        2
    };
    let center = |b: &Aabb| b.center().map_or(0.0, |c| c[axis]);
    items[start..end].sort_by(|a, b| center(&a.0).total_cmp(&center(&b.0)));

    // Placeholder, patched once both children exist.
    nodes.push(Node::Leaf { bbox, start, end });
    let mid = start + (end - start) / 2;
    let left = build(nodes, items, start, mid);
    let right = build(nodes, items, mid, end);
    nodes[index] = Node::Inner { bbox, left, right };
    index
}
