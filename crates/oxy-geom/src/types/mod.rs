// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core geometry types used by the index (coordinates, AABB).
//!
//! Values are `f64` in whatever planar or geographic unit the dataset uses;
//! nothing here projects or wraps longitudes.

#[doc = "Axis-aligned bounding boxes."]
pub mod aabb;
#[doc = "Planar coordinate pairs."]
pub mod coord;
