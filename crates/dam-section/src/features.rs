//! Geometric features of a section profile
//!
//! Area, centroid and the key points a stability check needs: toes, crest
//! corners, widths, height and face slopes. Everything is measured in the
//! profile's local frame (+x downstream, +y up).

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::constants::LEVEL_TOLERANCE;
use crate::geometry::polygon;
use crate::profile::{CurveLoop, Profile2D};

/// Measured features of a section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionFeatures {
    /// Net area (main contour minus holes)
    pub area: f64,
    /// Area-weighted centroid, holes subtracted
    pub centroid: DVec2,
    /// Horizontal extent at the base level
    pub base_width: f64,
    /// Horizontal extent at the crest level
    pub crest_width: f64,
    /// Vertical extent of the main contour
    pub height: f64,
    /// Minimum y of the main contour
    pub base_level: f64,
    /// Maximum y of the main contour
    pub crest_level: f64,
    /// Leftmost base point (the heel)
    pub upstream_toe: DVec2,
    /// Rightmost base point
    pub downstream_toe: DVec2,
    /// Leftmost crest point
    pub upstream_crest: DVec2,
    /// Rightmost crest point
    pub downstream_crest: DVec2,
    /// Upstream batter, horizontal run per unit height (positive leans downstream)
    pub upstream_slope: f64,
    /// Downstream batter, horizontal run per unit height
    pub downstream_slope: f64,
    /// Bounding box `(min, max)` of the main contour
    pub bounds: (DVec2, DVec2),
}

/// Measure a profile with the default level tolerance.
///
/// Returns `None` when the profile has no usable main contour.
pub fn analyze(profile: &Profile2D) -> Option<SectionFeatures> {
    analyze_with_tolerance(profile, LEVEL_TOLERANCE)
}

/// Measure a profile; vertices within `level_tolerance` of the minimum or
/// maximum y count as base or crest points.
pub fn analyze_with_tolerance(profile: &Profile2D, level_tolerance: f64) -> Option<SectionFeatures> {
    let profile = profile.normalized();
    let main = profile.main_contour();
    if main.vertex_count() < 3 {
        return None;
    }

    let (area, centroid) = net_area_centroid(main, profile.inner_contours())?;
    let (min, max) = polygon::bounds(main.vertices())?;

    let (upstream_toe, downstream_toe) = extremes_at_level(main, min.y, level_tolerance)?;
    let (upstream_crest, downstream_crest) = extremes_at_level(main, max.y, level_tolerance)?;

    let height = max.y - min.y;
    let (upstream_slope, downstream_slope) = if height > level_tolerance {
        (
            (upstream_crest.x - upstream_toe.x) / height,
            (downstream_toe.x - downstream_crest.x) / height,
        )
    } else {
        (0.0, 0.0)
    };

    Some(SectionFeatures {
        area,
        centroid,
        base_width: downstream_toe.x - upstream_toe.x,
        crest_width: downstream_crest.x - upstream_crest.x,
        height,
        base_level: min.y,
        crest_level: max.y,
        upstream_toe,
        downstream_toe,
        upstream_crest,
        downstream_crest,
        upstream_slope,
        downstream_slope,
        bounds: (min, max),
    })
}

/// Net area and centroid; holes carry negative signed area after normalization
fn net_area_centroid(main: &CurveLoop, holes: &[CurveLoop]) -> Option<(f64, DVec2)> {
    let mut area = 0.0;
    let mut moment = DVec2::ZERO;
    for contour in std::iter::once(main).chain(holes) {
        if let Some((a, c)) = polygon::area_centroid(contour.vertices()) {
            area += a;
            moment += c * a;
        }
    }

    if area.abs() < f64::EPSILON {
        // Zero-area section: report the box center so callers can still flag it
        let (min, max) = polygon::bounds(main.vertices())?;
        return Some((0.0, (min + max) * 0.5));
    }
    Some((area, moment / area))
}

fn extremes_at_level(contour: &CurveLoop, level: f64, tolerance: f64) -> Option<(DVec2, DVec2)> {
    let mut at_level = contour
        .vertices()
        .iter()
        .copied()
        .filter(|p| (p.y - level).abs() <= tolerance);
    let first = at_level.next()?;
    Some(at_level.fold((first, first), |(left, right), p| {
        (
            if p.x < left.x { p } else { left },
            if p.x > right.x { p } else { right },
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Plane;
    use crate::section::GeometryExtractionError;
    use approx::assert_abs_diff_eq;
    use uuid::Uuid;

    fn trapezoid() -> Profile2D {
        // Upstream run 2, crest 5, base 15, height 20
        let main = CurveLoop::from_vertices(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(15.0, 0.0),
            DVec2::new(7.0, 20.0),
            DVec2::new(2.0, 20.0),
        ]);
        Profile2D::new(Uuid::nil(), Plane::xy(), main, Vec::new())
    }

    #[test]
    fn test_trapezoid_features() {
        let f = analyze(&trapezoid()).unwrap();
        assert_abs_diff_eq!(f.area, 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(f.base_width, 15.0);
        assert_abs_diff_eq!(f.crest_width, 5.0);
        assert_abs_diff_eq!(f.height, 20.0);
        assert_eq!(f.upstream_toe, DVec2::new(0.0, 0.0));
        assert_eq!(f.downstream_toe, DVec2::new(15.0, 0.0));
        assert_abs_diff_eq!(f.upstream_slope, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(f.downstream_slope, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_trapezoid_centroid() {
        // h(b + 2a) / (3(a + b)) with b = 15, a = 5
        let f = analyze(&trapezoid()).unwrap();
        let expected_y = 20.0 * (15.0 + 2.0 * 5.0) / (3.0 * 20.0);
        assert_abs_diff_eq!(f.centroid.y, expected_y, epsilon = 1e-9);
        assert!(f.centroid.x > 2.0 && f.centroid.x < 15.0);
    }

    #[test]
    fn test_hole_shifts_centroid() {
        let main = CurveLoop::from_vertices(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(0.0, 10.0),
        ]);
        let hole = CurveLoop::from_vertices(vec![
            DVec2::new(1.0, 1.0),
            DVec2::new(3.0, 1.0),
            DVec2::new(3.0, 3.0),
            DVec2::new(1.0, 3.0),
        ]);
        let profile = Profile2D::new(Uuid::nil(), Plane::xy(), main, vec![hole]);
        let f = analyze(&profile).unwrap();

        assert_abs_diff_eq!(f.area, 96.0, epsilon = 1e-9);
        // (100 * 5 - 4 * 2) / 96
        let expected = (500.0 - 8.0) / 96.0;
        assert_abs_diff_eq!(f.centroid.x, expected, epsilon = 1e-9);
        assert_abs_diff_eq!(f.centroid.y, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_unnormalized_input_is_handled() {
        let main = CurveLoop::from_vertices(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(0.0, 4.0),
            DVec2::new(4.0, 4.0),
            DVec2::new(4.0, 0.0),
        ]);
        let profile = Profile2D::new(Uuid::nil(), Plane::xy(), main, Vec::new());
        assert!(!profile.is_normalized());
        let f = analyze(&profile).unwrap();
        assert!(f.area > 0.0, "area must be positive after re-normalization");
        assert_abs_diff_eq!(f.area, 16.0, epsilon = 1e-12);
    }

    #[test]
    fn test_failed_profile_has_no_features() {
        let failed = Profile2D::failed(
            Uuid::nil(),
            Plane::xy(),
            GeometryExtractionError::NoIntersection,
        );
        assert!(analyze(&failed).is_none());
    }

    #[test]
    fn test_level_tolerance_picks_near_base_points() {
        let main = CurveLoop::from_vertices(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(8.0, 0.0005),
            DVec2::new(6.0, 10.0),
            DVec2::new(0.0, 10.0),
        ]);
        let profile = Profile2D::new(Uuid::nil(), Plane::xy(), main, Vec::new());
        let f = analyze(&profile).unwrap();
        assert_abs_diff_eq!(f.base_width, 8.0);

        let strict = analyze_with_tolerance(&profile, 1e-6).unwrap();
        assert_abs_diff_eq!(strict.base_width, 0.0);
    }
}
