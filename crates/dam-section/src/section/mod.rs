//! Section extraction
//!
//! Cuts a [`BrepSnapshot`] with a [`Plane`] and assembles the resulting
//! segments into a [`Profile2D`]:
//!
//! ```text
//! BrepSnapshot + Plane
//!       ↓  SectionPlaneIntersector (3D segments)
//!       ↓  CurveLoopAssembler (closed 2D loops)
//! Profile2D (Extracted | Failed)
//! ```
//!
//! [`extract_section`] never returns an error: failures come back as a
//! `Failed` profile carrying a [`GeometryExtractionError`].

mod assemble;
mod intersect;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{ARC_SAMPLES, CONNECTION_TOLERANCE, INTERSECTION_TOLERANCE};
use crate::diagnostics::DiagnosticSink;
use crate::geometry::Plane;
use crate::kernel::{BrepSnapshot, KernelError};
use crate::profile::Profile2D;

pub use assemble::{CurveLoopAssembler, StitchOutcome};
pub use intersect::{CurveSegment, SectionPlaneIntersector};

/// Geometry extraction errors
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum GeometryExtractionError {
    /// The plane does not cut the solid
    #[error("Cutting plane does not intersect the solid")]
    NoIntersection,

    /// Segments were found but none closed into a loop
    #[error("{chains} open chain(s), largest gap {max_gap:.6}")]
    OpenContour {
        /// Number of open chains
        chains: usize,
        /// Largest gap between a chain's ends
        max_gap: f64,
    },

    /// A contour crosses itself or another contour
    #[error("Contour {contour} intersects itself")]
    SelfIntersecting {
        /// Index of the offending contour (0 = main)
        contour: usize,
    },

    /// Loops collapsed to zero area or too few points
    #[error("Degenerate dimensions: {0}")]
    DegenerateDimensions(String),

    /// The cutting plane's frame is not orthonormal
    #[error("Invalid cutting plane: {0}")]
    InvalidPlane(String),

    /// The snapshot failed its well-formedness check
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl From<KernelError> for GeometryExtractionError {
    fn from(error: KernelError) -> Self {
        GeometryExtractionError::InvalidSnapshot(error.to_string())
    }
}

/// Result type for extraction steps
pub type ExtractionResult<T> = Result<T, GeometryExtractionError>;

/// Tolerances and sampling for one extraction run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionOptions {
    /// Signed-distance tolerance against the cutting plane (ε1)
    pub intersection_tolerance: f64,
    /// Endpoint connection tolerance while stitching (ε2)
    pub connection_tolerance: f64,
    /// Chords per arc
    pub arc_samples: u32,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            intersection_tolerance: INTERSECTION_TOLERANCE,
            connection_tolerance: CONNECTION_TOLERANCE,
            arc_samples: ARC_SAMPLES,
        }
    }
}

impl ExtractionOptions {
    /// Set the plane classification tolerance
    pub fn with_intersection_tolerance(mut self, tolerance: f64) -> Self {
        self.intersection_tolerance = tolerance;
        self
    }

    /// Set the stitching tolerance
    pub fn with_connection_tolerance(mut self, tolerance: f64) -> Self {
        self.connection_tolerance = tolerance;
        self
    }

    /// Set the number of chords per arc (at least 1)
    pub fn with_arc_samples(mut self, samples: u32) -> Self {
        self.arc_samples = samples.max(1);
        self
    }
}

/// Cut a solid with a plane and assemble the section profile.
///
/// Deterministic for identical inputs. Never fails: unrecoverable conditions
/// yield a `Failed` profile with the reason attached.
pub fn extract_section(
    snapshot: &BrepSnapshot,
    plane: &Plane,
    options: &ExtractionOptions,
    sink: &dyn DiagnosticSink,
) -> Profile2D {
    let intersector = SectionPlaneIntersector::new(options);
    let segments = match snapshot
        .check()
        .map_err(GeometryExtractionError::from)
        .and_then(|_| intersector.intersect(snapshot, plane, sink))
    {
        Ok(segments) => segments,
        Err(e) => {
            sink.warn("intersect", &format!("Section of '{}' failed: {}", snapshot.name, e));
            return Profile2D::failed(snapshot.solid_id, *plane, e);
        }
    };

    let assembler = CurveLoopAssembler::new(options);
    assembler.assemble(&segments, plane, snapshot.solid_id, sink)
}
