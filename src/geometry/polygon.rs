//! Simple polygons used as tiling regions.
//!
//! Regions are closed, non-self-intersecting rings given as a vertex list
//! (the closing edge is implicit). Tests against tile rectangles treat both
//! shapes as closed sets, so a tile that only touches a region edge counts as
//! intersecting.

use serde::{Deserialize, Serialize};

use super::{BoundingBox, Point};

/// Polygon region in the caller's coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Axis-aligned rectangle as a four-vertex polygon.
    pub fn rectangle(bbox: &BoundingBox) -> Self {
        Self::new(bbox.corners().to_vec())
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Iterate over edges as `(start, end)` pairs, including the closing edge.
    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Signed area (positive for counter-clockwise rings in a y-up frame).
    pub fn signed_area(&self) -> f64 {
        self.edges()
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum::<f64>()
            / 2.0
    }

    /// Area centroid. Falls back to the vertex mean for zero-area rings.
    pub fn centroid(&self) -> Point {
        let area = self.signed_area();
        if area.abs() < f64::EPSILON {
            let n = self.vertices.len().max(1) as f64;
            let (sx, sy) = self
                .vertices
                .iter()
                .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
            return Point::new(sx / n, sy / n);
        }

        let (cx, cy) = self.edges().fold((0.0, 0.0), |(cx, cy), (a, b)| {
            let cross = a.x * b.y - b.x * a.y;
            (cx + (a.x + b.x) * cross, cy + (a.y + b.y) * cross)
        });
        Point::new(cx / (6.0 * area), cy / (6.0 * area))
    }

    /// Bounding rectangle of all vertices.
    pub fn bounds(&self) -> BoundingBox {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in &self.vertices {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if self.vertices.is_empty() {
            return BoundingBox::new(0.0, 0.0, 0.0, 0.0);
        }
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }

    /// Even-odd ray casting test. Points exactly on an edge may fall either way.
    pub fn contains(&self, p: Point) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Whether the polygon and the closed rectangle share at least one point.
    pub fn intersects_box(&self, bbox: &BoundingBox) -> bool {
        if self.vertices.is_empty() {
            return false;
        }

        // Quick reject on bounds
        let bounds = self.bounds();
        if bounds.max_x() < bbox.min_x()
            || bounds.min_x() > bbox.max_x()
            || bounds.max_y() < bbox.min_y()
            || bounds.min_y() > bbox.max_y()
        {
            return false;
        }

        if self.vertices.iter().any(|p| bbox.contains(*p)) {
            return true;
        }

        let corners = bbox.corners();
        if corners.iter().any(|c| self.contains(*c)) {
            return true;
        }

        let rect_edges = [
            (corners[0], corners[1]),
            (corners[1], corners[2]),
            (corners[2], corners[3]),
            (corners[3], corners[0]),
        ];
        self.edges().any(|(a, b)| {
            rect_edges
                .iter()
                .any(|(c, d)| segments_intersect(a, b, *c, *d))
        })
    }
}

// =============================================================================
// Segment Tests
// =============================================================================

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Closed segment intersection, collinear overlaps included.
fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

// =============================================================================
// Tests
// =============================================================================
