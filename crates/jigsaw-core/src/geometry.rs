//! Small polygon helpers in image coordinates (x right, y down).

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box of a point set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Bounding box of `points`, or `None` for an empty slice.
pub fn bounding_box(points: &[Point2<f64>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let mut bb = BoundingBox {
        min_x: first.x,
        min_y: first.y,
        max_x: first.x,
        max_y: first.y,
    };
    for p in &points[1..] {
        bb.min_x = bb.min_x.min(p.x);
        bb.min_y = bb.min_y.min(p.y);
        bb.max_x = bb.max_x.max(p.x);
        bb.max_y = bb.max_y.max(p.y);
    }
    Some(bb)
}

/// Shoelace area of the closed polygon `points`.
///
/// In image coordinates a polygon that runs counter-clockwise as seen on
/// screen has a negative area.
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        acc += a.x * b.y - b.x * a.y;
    }
    0.5 * acc
}

/// Area centroid (first-order moments over zeroth) of a closed polygon.
///
/// Falls back to the vertex mean when the polygon has (almost) no area, and
/// returns `None` only for an empty slice.
pub fn polygon_centroid(points: &[Point2<f64>]) -> Option<Point2<f64>> {
    if points.is_empty() {
        return None;
    }

    let n = points.len();
    let mut m00 = 0.0;
    let mut m10 = 0.0;
    let mut m01 = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let cross = a.x * b.y - b.x * a.y;
        m00 += cross;
        m10 += (a.x + b.x) * cross;
        m01 += (a.y + b.y) * cross;
    }

    if m00.abs() < 1e-9 {
        let inv = 1.0 / n as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return Some(Point2::new(sx * inv, sy * inv));
    }

    // m00 holds twice the signed area, so 3 * m00 = 6A.
    Some(Point2::new(m10 / (3.0 * m00), m01 / (3.0 * m00)))
}

/// Reverse `points` in place unless the polygon already runs
/// counter-clockwise on screen (negative [`signed_area`]).
///
/// Returns `true` when the order was flipped.
pub fn ensure_counter_clockwise_on_screen(points: &mut [Point2<f64>]) -> bool {
    if signed_area(points) > 0.0 {
        points.reverse();
        true
    } else {
        false
    }
}

/// Wrap an angle in degrees to `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}
