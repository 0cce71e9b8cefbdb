// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![doc = r"Geometry primitives for Oxy.

This crate provides:
- Planar coordinates (`Coord`) and axis-aligned bounding boxes (`Aabb`).
- Exact shape-vs-box intersection tests for points, line strings, and polygons.
- A static bounding-volume hierarchy (`Bvh`) for range queries over boxes.

Design notes:
- Deterministic: builds depend only on input order; ties are broken by item id.
- Bounded stack: both construction and queries run on explicit work stacks.
- Overlap is inclusive on edges; touching boxes intersect.
"]

/// Broad-phase spatial index.
pub mod broad;
/// Exact shape-vs-box intersection tests.
pub mod exact;
/// Foundational geometric types.
pub mod types;

pub use broad::bvh::{Bvh, BvhNode, NodeKind};
pub use exact::{intersects_box, Shape};
pub use types::aabb::Aabb;
pub use types::coord::Coord;
