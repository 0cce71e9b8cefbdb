// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Exact shape-vs-box tests.
//!
//! The BVH only knows bounding boxes, so a line string whose box overlaps a
//! query may still miss it entirely. These tests close that gap. All of them
//! are inclusive on edges, matching [`Aabb::overlaps`].

use crate::types::{aabb::Aabb, coord::Coord};

/// Interpretation of a coordinate sequence.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A single coordinate.
    Point,
    /// An open polyline.
    LineString,
    /// A single closed ring (first coordinate equals the last).
    Polygon,
}

/// Returns `true` if the shape described by `coords` touches `bbox`.
///
/// An empty coordinate slice never intersects anything.
#[must_use]
pub fn intersects_box(shape: Shape, coords: &[Coord], bbox: &Aabb) -> bool {
    match shape {
        Shape::Point => coords.first().is_some_and(|p| bbox.contains_point(*p)),
        Shape::LineString => polyline_intersects(coords, bbox),
        Shape::Polygon => {
            polyline_intersects(coords, bbox)
                || bbox
                    .corners()
                    .first()
                    .is_some_and(|corner| ring_contains(coords, *corner))
        }
    }
}

fn polyline_intersects(coords: &[Coord], bbox: &Aabb) -> bool {
    match coords {
        [] => false,
        [only] => bbox.contains_point(*only),
        _ => coords
            .windows(2)
            .any(|seg| segment_intersects(seg[0], seg[1], bbox)),
    }
}

/// Parametric (Liang-Barsky) clip of segment `a..b` against `bbox`.
fn segment_intersects(a: Coord, b: Coord, bbox: &Aabb) -> bool {
    if bbox.contains_point(a) || bbox.contains_point(b) {
        return true;
    }
    let (min, max) = (bbox.min(), bbox.max());
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [
        (-dx, a.x - min.x),
        (dx, max.x - a.x),
        (-dy, a.y - min.y),
        (dy, max.y - a.y),
    ] {
        if p == 0.0 {
            // Parallel to this edge: reject if outside the slab.
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return false;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return false;
            }
            t1 = t1.min(r);
        }
    }
    t0 <= t1
}

/// Even-odd ray cast. Points exactly on an edge may land either side; callers
/// already treat edge contact via [`segment_intersects`].
fn ring_contains(ring: &[Coord], p: Coord) -> bool {
    let mut inside = false;
    for seg in ring.windows(2) {
        let (a, b) = (seg[0], seg[1]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn bbox(x0: f64, y0: f64, x1: f64, y1: f64) -> Aabb {
        Aabb::new(Coord::new(x0, y0), Coord::new(x1, y1)).unwrap()
    }

    fn coords(pts: &[[f64; 2]]) -> Vec<Coord> {
        pts.iter().copied().map(Coord::from).collect()
    }

    #[test]
    fn point_on_edge_is_inside() {
        let q = bbox(0.0, 0.0, 1.0, 1.0);
        assert!(intersects_box(Shape::Point, &coords(&[[1.0, 0.5]]), &q));
        assert!(!intersects_box(Shape::Point, &coords(&[[1.01, 0.5]]), &q));
        assert!(!intersects_box(Shape::Point, &[], &q));
    }

    #[test]
    fn diagonal_line_missing_corner_box() {
        // Line from (0,0) to (10,10): its bbox covers (8,0)-(9,1), the line does not.
        let line = coords(&[[0.0, 0.0], [10.0, 10.0]]);
        assert!(!intersects_box(Shape::LineString, &line, &bbox(8.0, 0.0, 9.0, 1.0)));
        assert!(intersects_box(Shape::LineString, &line, &bbox(4.0, 4.5, 6.0, 5.5)));
    }

    #[test]
    fn line_crossing_box_without_vertices_inside() {
        let line = coords(&[[-5.0, 0.5], [5.0, 0.5]]);
        assert!(intersects_box(Shape::LineString, &line, &bbox(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn polygon_containing_box_intersects() {
        let ring = coords(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]);
        assert!(intersects_box(Shape::Polygon, &ring, &bbox(4.0, 4.0, 5.0, 5.0)));
    }

    #[test]
    fn triangle_misses_box_in_its_bbox_corner() {
        let ring = coords(&[[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [0.0, 0.0]]);
        assert!(!intersects_box(Shape::Polygon, &ring, &bbox(8.0, 8.0, 9.0, 9.0)));
        assert!(intersects_box(Shape::Polygon, &ring, &bbox(1.0, 1.0, 2.0, 2.0)));
    }
}
