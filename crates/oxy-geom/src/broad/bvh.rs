// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::types::{aabb::Aabb, coord::Coord};
use core::cmp::Ordering;

/// Default maximum number of items per leaf.
pub const DEFAULT_LEAF_SIZE: usize = 8;

/// Payload of a [`BvhNode`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Leaf covering `items[start..end]` of the hierarchy's leaf-ordered item list.
    Leaf {
        /// First item slot (inclusive).
        start: usize,
        /// Last item slot (exclusive).
        end: usize,
    },
    /// Internal node with two children (indices into the node arena).
    Branch {
        /// Left child index.
        left: usize,
        /// Right child index.
        right: usize,
    },
}

/// One node of a [`Bvh`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BvhNode {
    bbox: Aabb,
    kind: NodeKind,
}

impl BvhNode {
    /// Bounds of every item below this node.
    #[must_use]
    pub const fn bbox(&self) -> &Aabb {
        &self.bbox
    }

    /// Leaf range or child links.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }
}

#[derive(Debug, Copy, Clone)]
struct Task {
    slot: usize,
    start: usize,
    end: usize,
}

/// Static bounding-volume hierarchy over item boxes.
///
/// Items are identified by their position in the slice passed to
/// [`Bvh::build`]. The tree is immutable once built; a new item set needs a
/// new hierarchy.
///
/// Construction sorts each range by box center along the longer axis of the
/// centers' extent (ties broken by item id) and splits at the median, so the
/// tree is balanced and its depth is `O(log n)`. Work is driven from an
/// explicit stack; the host call stack never grows with the item count.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    items: Vec<u32>,
    item_boxes: Vec<Aabb>,
    leaf_size: usize,
}

impl Bvh {
    /// Builds a hierarchy over `boxes`, where item `i` has bounds `boxes[i]`.
    ///
    /// `leaf_size` is clamped to at least 1. An empty slice yields an empty
    /// hierarchy (no nodes), which answers every query with no candidates.
    /// Callers must keep `boxes.len()` within `u32` range.
    #[must_use]
    pub fn build(boxes: &[Aabb], leaf_size: usize) -> Self {
        let leaf_size = leaf_size.max(1);
        #[allow(clippy::cast_possible_truncation)]
        let mut items: Vec<u32> = (0..boxes.len()).map(|i| i as u32).collect();
        let Some(first) = boxes.first() else {
            return Self {
                leaf_size,
                ..Self::default()
            };
        };

        let centers: Vec<Coord> = boxes.iter().map(Aabb::center).collect();
        let placeholder = BvhNode {
            bbox: *first,
            kind: NodeKind::Leaf { start: 0, end: 0 },
        };
        let mut nodes = Vec::with_capacity(2 * boxes.len() / leaf_size + 1);
        nodes.push(placeholder);

        let mut work = vec![Task {
            slot: 0,
            start: 0,
            end: items.len(),
        }];
        while let Some(task) = work.pop() {
            let range = &mut items[task.start..task.end];
            let bbox = bounds_of(range, boxes);
            if range.len() <= leaf_size {
                nodes[task.slot] = BvhNode {
                    bbox,
                    kind: NodeKind::Leaf {
                        start: task.start,
                        end: task.end,
                    },
                };
                continue;
            }

            let axis = split_axis(range, &centers);
            range.sort_unstable_by(|a, b| {
                let ca = centers[*a as usize].to_array()[axis];
                let cb = centers[*b as usize].to_array()[axis];
                match ca.total_cmp(&cb) {
                    Ordering::Equal => a.cmp(b),
                    o => o,
                }
            });
            let mid = task.start + range.len() / 2;

            let left = nodes.len();
            nodes.push(placeholder);
            let right = nodes.len();
            nodes.push(placeholder);
            nodes[task.slot] = BvhNode {
                bbox,
                kind: NodeKind::Branch { left, right },
            };
            // Left is popped first; at most one pending sibling per level.
            work.push(Task {
                slot: right,
                start: mid,
                end: task.end,
            });
            work.push(Task {
                slot: left,
                start: task.start,
                end: mid,
            });
        }

        let item_boxes = items.iter().map(|id| boxes[*id as usize]).collect();
        Self {
            nodes,
            items,
            item_boxes,
            leaf_size,
        }
    }

    /// Returns the ids of every item whose box overlaps `query`, in leaf order.
    ///
    /// The order is deterministic for a given build but otherwise unspecified;
    /// sort the result if order matters.
    #[must_use]
    pub fn query(&self, query: &Aabb) -> Vec<u32> {
        let mut out = Vec::new();
        self.visit(query, |id| out.push(id));
        out
    }

    /// Calls `f` with the id of every item whose box overlaps `query`.
    pub fn visit(&self, query: &Aabb, mut f: impl FnMut(u32)) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![0_usize];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if !node.bbox.overlaps(query) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, end } => {
                    for slot in start..end {
                        if self.item_boxes[slot].overlaps(query) {
                            f(self.items[slot]);
                        }
                    }
                }
                NodeKind::Branch { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }

    /// Node arena; index 0 is the root when non-empty.
    #[must_use]
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Item ids stored in the leaf range `start..end`.
    #[must_use]
    pub fn leaf_items(&self, start: usize, end: usize) -> &[u32] {
        self.items.get(start..end).unwrap_or(&[])
    }

    /// Bounds of the whole item set, if any.
    #[must_use]
    pub fn bounds(&self) -> Option<&Aabb> {
        self.nodes.first().map(BvhNode::bbox)
    }

    /// Number of indexed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when no items are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Configured maximum items per leaf.
    #[must_use]
    pub const fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// Number of leaf nodes.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Leaf { .. }))
            .count()
    }

    /// Longest root-to-leaf path, counted in nodes (0 for an empty hierarchy).
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut deepest = 0;
        let mut stack = vec![(0_usize, 1_usize)];
        while let Some((idx, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let NodeKind::Branch { left, right } = self.nodes[idx].kind {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        deepest
    }

    /// Approximate heap footprint in bytes.
    #[must_use]
    pub fn heap_bytes(&self) -> usize {
        self.nodes.capacity() * core::mem::size_of::<BvhNode>()
            + self.items.capacity() * core::mem::size_of::<u32>()
            + self.item_boxes.capacity() * core::mem::size_of::<Aabb>()
    }
}

fn bounds_of(range: &[u32], boxes: &[Aabb]) -> Aabb {
    let mut iter = range.iter().map(|id| boxes[*id as usize]);
    let first = iter.next().unwrap_or_else(|| Aabb::from_point(Coord::default()));
    iter.fold(first, |acc, bb| acc.union(&bb))
}

/// 0 for x, 1 for y: whichever spread of item centers is wider.
fn split_axis(range: &[u32], centers: &[Coord]) -> usize {
    let pts: Vec<Coord> = range.iter().map(|id| centers[*id as usize]).collect();
    match Aabb::from_points(&pts) {
        Some(spread) => {
            let [w, h] = spread.extent();
            usize::from(h > w)
        }
        None => 0,
    }
}
