//! 2D section profiles
//!
//! A [`Profile2D`] is the result of cutting one solid with one plane: a main
//! contour, zero or more holes, any chains that failed to close, and a status
//! that moves through `Extracted → Validated | RequiresReview → Accepted |
//! Rejected`. Contours are stored in the plane's local frame.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::geometry::{Plane, polygon};
use crate::section::GeometryExtractionError;

/// An ordered, closed sequence of 2D points.
///
/// The closing point is stored explicitly: the last point equals the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveLoop {
    points: Vec<DVec2>,
}

impl CurveLoop {
    /// Build a loop from vertices, appending the closing point when missing
    pub fn from_vertices(mut points: Vec<DVec2>) -> Self {
        if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied())
            && points.len() > 1
            && first != last
        {
            points.push(first);
        }
        Self { points }
    }

    /// Empty loop (used by failed profiles)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if the loop has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points including the repeated closing point
    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    /// Distinct vertices (closing point excluded)
    pub fn vertices(&self) -> &[DVec2] {
        match self.points.len() {
            0 => &self.points,
            n => &self.points[..n - 1],
        }
    }

    /// Number of distinct vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices().len()
    }

    /// Consecutive point pairs, closing edge included
    pub fn edges(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// Distance between the first and last stored points
    pub fn closure_gap(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) => a.distance(*b),
            _ => f64::INFINITY,
        }
    }

    /// Check the closure invariant
    pub fn is_closed(&self, tolerance: f64) -> bool {
        self.points.len() >= 4 && self.closure_gap() < tolerance
    }

    /// Shoelace signed area (counter-clockwise positive)
    pub fn signed_area(&self) -> f64 {
        polygon::signed_area(&self.points)
    }

    /// Absolute area
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Check if the loop is counter-clockwise
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// The loop traversed in the opposite direction
    pub fn reversed(&self) -> Self {
        Self {
            points: self.points.iter().rev().copied().collect(),
        }
    }

    /// The loop with the requested orientation
    pub fn oriented(&self, ccw: bool) -> Self {
        if self.is_ccw() == ccw {
            self.clone()
        } else {
            self.reversed()
        }
    }

    /// Check whether a point lies inside the loop
    pub fn contains(&self, point: DVec2) -> bool {
        polygon::contains_point(&self.points, point)
    }
}

/// A chain of points that could not be closed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenChain {
    /// Chain points in stitching order
    pub points: Vec<DVec2>,
    /// Distance between the chain's two open ends
    pub gap: f64,
}

impl OpenChain {
    /// Create an open chain, computing its end gap
    pub fn new(points: Vec<DVec2>) -> Self {
        let gap = match (points.first(), points.last()) {
            (Some(a), Some(b)) => a.distance(*b),
            _ => 0.0,
        };
        Self { points, gap }
    }
}

/// Lifecycle status of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileStatus {
    /// Produced by the extraction kernel, not yet validated
    Extracted,
    /// Validation found no critical issue
    Validated,
    /// Validation found a critical issue; a human must review it
    RequiresReview,
    /// Accepted by the host's review step
    Accepted,
    /// Rejected by the host's review step
    Rejected,
    /// Extraction failed; the main contour is empty
    Failed,
}

/// Illegal status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot move profile from {from:?} to {to:?}")]
pub struct StatusTransitionError {
    /// Current status
    pub from: ProfileStatus,
    /// Requested status
    pub to: ProfileStatus,
}

/// A 2D cross-section of a solid in a cutting plane's local frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile2D {
    solid_id: Uuid,
    frame: Plane,
    main_contour: CurveLoop,
    inner_contours: Vec<CurveLoop>,
    open_chains: Vec<OpenChain>,
    status: ProfileStatus,
    failure: Option<GeometryExtractionError>,
    ambiguous_main: bool,
}

impl Profile2D {
    /// Create an extracted profile from assembled contours
    pub fn new(
        solid_id: Uuid,
        frame: Plane,
        main_contour: CurveLoop,
        inner_contours: Vec<CurveLoop>,
    ) -> Self {
        Self {
            solid_id,
            frame,
            main_contour,
            inner_contours,
            open_chains: Vec::new(),
            status: ProfileStatus::Extracted,
            failure: None,
            ambiguous_main: false,
        }
    }

    /// Create a failed profile carrying its reason
    pub fn failed(solid_id: Uuid, frame: Plane, reason: GeometryExtractionError) -> Self {
        Self {
            solid_id,
            frame,
            main_contour: CurveLoop::empty(),
            inner_contours: Vec::new(),
            open_chains: Vec::new(),
            status: ProfileStatus::Failed,
            failure: Some(reason),
            ambiguous_main: false,
        }
    }

    /// Attach leftover open chains
    pub fn with_open_chains(mut self, open_chains: Vec<OpenChain>) -> Self {
        self.open_chains = open_chains;
        self
    }

    /// Flag that the main contour was picked among near-equal candidates
    pub fn with_ambiguous_main(mut self, ambiguous: bool) -> Self {
        self.ambiguous_main = ambiguous;
        self
    }

    /// Source solid
    pub fn solid_id(&self) -> Uuid {
        self.solid_id
    }

    /// Local frame (the cutting plane)
    pub fn frame(&self) -> &Plane {
        &self.frame
    }

    /// Outer boundary
    pub fn main_contour(&self) -> &CurveLoop {
        &self.main_contour
    }

    /// Holes
    pub fn inner_contours(&self) -> &[CurveLoop] {
        &self.inner_contours
    }

    /// Chains that did not close
    pub fn open_chains(&self) -> &[OpenChain] {
        &self.open_chains
    }

    /// Current status
    pub fn status(&self) -> ProfileStatus {
        self.status
    }

    /// Failure reason of a failed profile
    pub fn failure(&self) -> Option<&GeometryExtractionError> {
        self.failure.as_ref()
    }

    /// Whether the main contour choice was ambiguous
    pub fn is_main_ambiguous(&self) -> bool {
        self.ambiguous_main
    }

    /// Check if extraction failed
    pub fn is_failed(&self) -> bool {
        self.status == ProfileStatus::Failed
    }

    /// Main area minus hole areas, independent of orientation
    pub fn net_area(&self) -> f64 {
        self.main_contour.area() - self.inner_contours.iter().map(|c| c.area()).sum::<f64>()
    }

    /// Check the orientation invariant (main CCW, holes CW)
    pub fn is_normalized(&self) -> bool {
        self.main_contour.signed_area() > 0.0
            && self.inner_contours.iter().all(|c| c.signed_area() < 0.0)
    }

    /// Copy with the orientation invariant restored
    pub fn normalized(&self) -> Self {
        if self.is_normalized() || self.main_contour.is_empty() {
            return self.clone();
        }
        Self {
            main_contour: self.main_contour.oriented(true),
            inner_contours: self.inner_contours.iter().map(|c| c.oriented(false)).collect(),
            ..self.clone()
        }
    }

    /// Apply a validation outcome. Failed, accepted and rejected profiles keep
    /// their status.
    pub fn reviewed(mut self, requires_review: bool) -> Self {
        if matches!(
            self.status,
            ProfileStatus::Extracted | ProfileStatus::Validated | ProfileStatus::RequiresReview
        ) {
            self.status = if requires_review {
                ProfileStatus::RequiresReview
            } else {
                ProfileStatus::Validated
            };
        }
        self
    }

    /// Host decision: accept a validated or reviewed profile
    pub fn accept(self) -> Result<Self, StatusTransitionError> {
        self.decide(ProfileStatus::Accepted)
    }

    /// Host decision: reject a validated or reviewed profile
    pub fn reject(self) -> Result<Self, StatusTransitionError> {
        self.decide(ProfileStatus::Rejected)
    }

    fn decide(mut self, to: ProfileStatus) -> Result<Self, StatusTransitionError> {
        match self.status {
            ProfileStatus::Validated | ProfileStatus::RequiresReview => {
                self.status = to;
                Ok(self)
            }
            from => Err(StatusTransitionError { from, to }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> CurveLoop {
        CurveLoop::from_vertices(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(size, 0.0),
            DVec2::new(size, size),
            DVec2::new(0.0, size),
        ])
    }

    #[test]
    fn test_loop_is_stored_closed() {
        let sq = square(2.0);
        assert_eq!(sq.points().len(), 5);
        assert_eq!(sq.vertex_count(), 4);
        assert!(sq.is_closed(1e-9));
        assert_eq!(sq.edges().count(), 4);
    }

    #[test]
    fn test_already_closed_input_is_not_duplicated() {
        let mut pts = square(1.0).points().to_vec();
        let again = CurveLoop::from_vertices(pts.clone());
        assert_eq!(again.points().len(), 5);
        pts.pop();
        assert_eq!(CurveLoop::from_vertices(pts).points().len(), 5);
    }

    #[test]
    fn test_normalization() {
        let main = square(4.0).reversed();
        let hole = CurveLoop::from_vertices(vec![
            DVec2::new(1.0, 1.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(1.0, 2.0),
        ]);
        let profile = Profile2D::new(Uuid::nil(), Plane::xy(), main, vec![hole]);
        assert!(!profile.is_normalized());

        let fixed = profile.normalized();
        assert!(fixed.is_normalized());
        assert!((fixed.net_area() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_review_state_machine() {
        let profile = Profile2D::new(Uuid::nil(), Plane::xy(), square(1.0), Vec::new());
        assert_eq!(profile.status(), ProfileStatus::Extracted);

        // Cannot accept before validation
        let err = profile.clone().accept().unwrap_err();
        assert_eq!(err.from, ProfileStatus::Extracted);

        let reviewed = profile.reviewed(true);
        assert_eq!(reviewed.status(), ProfileStatus::RequiresReview);

        let accepted = reviewed.accept().unwrap();
        assert_eq!(accepted.status(), ProfileStatus::Accepted);

        // Terminal states stay put
        let again = accepted.reviewed(false);
        assert_eq!(again.status(), ProfileStatus::Accepted);
        assert!(again.reject().is_err());
    }

    #[test]
    fn test_failed_profile_keeps_status() {
        let failed = Profile2D::failed(
            Uuid::nil(),
            Plane::xy(),
            GeometryExtractionError::NoIntersection,
        );
        assert!(failed.main_contour().is_empty());
        let reviewed = failed.reviewed(false);
        assert!(reviewed.is_failed());
        assert_eq!(
            reviewed.failure(),
            Some(&GeometryExtractionError::NoIntersection)
        );
    }
}
