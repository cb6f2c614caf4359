//! Section Geometry Kernel
//!
//! This crate provides:
//! - A geometry kernel adapter seam with immutable B-rep snapshots
//! - Extrusion builders for prismatic test and host solids
//! - Plane / B-rep intersection and loop assembly into 2D profiles
//! - Geometric feature analysis (area, centroid, toes, crest, slopes)
//! - Diagnostic sinks passed explicitly through every entry point

pub mod constants;
pub mod diagnostics;
pub mod features;
pub mod geometry;
pub mod kernel;
pub mod profile;
pub mod section;

// Re-exports for convenience
pub use diagnostics::{
    CollectingSink, DiagnosticLevel, DiagnosticRecord, DiagnosticSink, NullSink, TracingSink,
};
pub use features::{SectionFeatures, analyze, analyze_with_tolerance};
pub use geometry::{ArcDescriptor, Plane};
pub use kernel::{
    BoundingBox, BrepSnapshot, EdgeSnapshot, FaceId, FaceSnapshot, FaceSurface,
    GeometryKernelAdapter, KernelError, KernelResult, MonolithDimensions, NullKernel, ProfileEdge,
    ProfileLoop, SnapshotBuilder, SnapshotKernel,
};
pub use profile::{CurveLoop, OpenChain, Profile2D, ProfileStatus, StatusTransitionError};
pub use section::{
    CurveLoopAssembler, CurveSegment, ExtractionOptions, ExtractionResult,
    GeometryExtractionError, SectionPlaneIntersector, StitchOutcome, extract_section,
};
