// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Broad-phase spatial index.
//!
//! Soundness contract (applies to all implementations used here):
//! - A query returns every item whose bounding box overlaps the query box.
//! - Overlap is inclusive on edges (touching boxes are candidates).
//! - Results may include items whose true shape misses the query; callers run
//!   an exact test from [`crate::exact`] on the candidates.

#[doc = "Static bounding-volume hierarchy and its node types."]
pub mod bvh;
