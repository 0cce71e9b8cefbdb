// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

/// A single `(x, y)` coordinate pair.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Coord {
    /// Horizontal component (longitude for geographic data).
    pub x: f64,
    /// Vertical component (latitude for geographic data).
    pub y: f64,
}

impl Coord {
    /// Constructs a coordinate.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` when both components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Returns the components as an array.
    #[must_use]
    pub const fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl From<[f64; 2]> for Coord {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}
