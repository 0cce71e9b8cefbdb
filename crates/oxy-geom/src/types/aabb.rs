// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::types::coord::Coord;

/// Axis-aligned bounding box in dataset coordinates.
///
/// Invariants:
/// - `min` components are less than or equal to `max` components.
/// - A degenerate box (`min == max`) is valid and bounds a single point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    min: Coord,
    max: Coord,
}

impl Aabb {
    /// Constructs an AABB from its minimum and maximum corners.
    ///
    /// Returns `None` if `min` exceeds `max` on either axis or if any
    /// component is NaN.
    #[must_use]
    pub fn new(min: Coord, max: Coord) -> Option<Self> {
        if min.x <= max.x && min.y <= max.y {
            Some(Self { min, max })
        } else {
            None
        }
    }

    /// Builds the degenerate box around a single point.
    #[must_use]
    pub const fn from_point(p: Coord) -> Self {
        Self { min: p, max: p }
    }

    /// Builds the minimal AABB that contains all `points`.
    ///
    /// Returns `None` if `points` is empty.
    #[must_use]
    pub fn from_points(points: &[Coord]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bb = Self::from_point(*first);
        for p in rest {
            bb = bb.expand_to(*p);
        }
        Some(bb)
    }

    /// Returns the minimum corner.
    #[must_use]
    pub const fn min(&self) -> Coord {
        self.min
    }

    /// Returns the maximum corner.
    #[must_use]
    pub const fn max(&self) -> Coord {
        self.max
    }

    /// Returns the four corners, counter-clockwise from `min`.
    #[must_use]
    pub const fn corners(&self) -> [Coord; 4] {
        [
            self.min,
            Coord::new(self.max.x, self.min.y),
            self.max,
            Coord::new(self.min.x, self.max.y),
        ]
    }

    /// Returns the box center.
    #[must_use]
    pub fn center(&self) -> Coord {
        Coord::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    /// Width and height of the box.
    #[must_use]
    pub fn extent(&self) -> [f64; 2] {
        [self.max.x - self.min.x, self.max.y - self.min.y]
    }

    /// Returns `true` if this AABB overlaps another (inclusive on edges).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    /// Returns `true` if `p` lies inside or on the boundary of this box.
    #[must_use]
    pub fn contains_point(&self, p: Coord) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Returns `true` if `other` lies entirely within this box.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Returns the union of two AABBs.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Coord::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Coord::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Returns this box grown to include `p`.
    #[must_use]
    pub fn expand_to(&self, p: Coord) -> Self {
        Self {
            min: Coord::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: Coord::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }
}
