//! Planar polygon predicates
//!
//! Operate on point slices in a local 2D frame. A slice may or may not repeat
//! its first point at the end; the closing edge is implied either way.

use glam::DVec2;

/// Signed area by the shoelace formula (counter-clockwise positive)
pub fn signed_area(points: &[DVec2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum();
    twice * 0.5
}

/// Signed area and area centroid.
///
/// Returns `None` for polygons with (near) zero area.
pub fn area_centroid(points: &[DVec2]) -> Option<(f64, DVec2)> {
    if points.len() < 3 {
        return None;
    }
    let n = points.len();
    let mut twice = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        let cross = p.perp_dot(q);
        twice += cross;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    if twice.abs() < f64::EPSILON {
        return None;
    }
    let area = twice * 0.5;
    Some((area, DVec2::new(cx / (3.0 * twice), cy / (3.0 * twice))))
}

/// Even-odd point-in-polygon test (ray cast toward +x)
pub fn contains_point(polygon: &[DVec2], point: DVec2) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Orientation of `c` relative to the directed line `a → b`
fn orientation(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

fn within_box(a: DVec2, b: DVec2, p: DVec2, tolerance: f64) -> bool {
    p.x >= a.x.min(b.x) - tolerance
        && p.x <= a.x.max(b.x) + tolerance
        && p.y >= a.y.min(b.y) - tolerance
        && p.y <= a.y.max(b.y) + tolerance
}

/// Test whether segments `a1-a2` and `b1-b2` touch or cross.
///
/// Orientation values within `tolerance` (scaled by the segment length) are
/// treated as collinear, so touching endpoints count as intersecting.
pub fn segments_intersect(a1: DVec2, a2: DVec2, b1: DVec2, b2: DVec2, tolerance: f64) -> bool {
    let scale_a = (a2 - a1).length().max(f64::EPSILON);
    let scale_b = (b2 - b1).length().max(f64::EPSILON);

    let d1 = orientation(b1, b2, a1) / scale_b;
    let d2 = orientation(b1, b2, a2) / scale_b;
    let d3 = orientation(a1, a2, b1) / scale_a;
    let d4 = orientation(a1, a2, b2) / scale_a;

    let straddles = |p: f64, q: f64| (p > tolerance && q < -tolerance) || (p < -tolerance && q > tolerance);
    if straddles(d1, d2) && straddles(d3, d4) {
        return true;
    }

    (d1.abs() <= tolerance && within_box(b1, b2, a1, tolerance))
        || (d2.abs() <= tolerance && within_box(b1, b2, a2, tolerance))
        || (d3.abs() <= tolerance && within_box(a1, a2, b1, tolerance))
        || (d4.abs() <= tolerance && within_box(a1, a2, b2, tolerance))
}

/// Test whether a closed polygon crosses itself.
///
/// `vertices` lists each corner once. Neighbouring edges share a vertex and
/// are not compared.
pub fn is_self_intersecting(vertices: &[DVec2], tolerance: f64) -> bool {
    let n = vertices.len();
    if n < 4 {
        return false;
    }
    let edge = |i: usize| (vertices[i], vertices[(i + 1) % n]);
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let ((a1, a2), (b1, b2)) = (edge(i), edge(j));
            if segments_intersect(a1, a2, b1, b2, tolerance) {
                return true;
            }
        }
    }
    false
}

/// Axis-aligned bounds `(min, max)` of a point set
pub fn bounds(points: &[DVec2]) -> Option<(DVec2, DVec2)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
    )
}
