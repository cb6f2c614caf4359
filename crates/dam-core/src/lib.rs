//! Gravity-Dam Stability Core
//!
//! This crate provides:
//! - Material properties and load-case parameters
//! - Profile validation with severity-scored issues
//! - Load assembly (self weight, water, uplift, seismic)
//! - Sliding / overturning safety factors and base stresses
//! - A section pipeline with a parallel, cancellable batch runner

pub mod constants;
pub mod loads;
pub mod material;
pub mod parameters;
pub mod pipeline;
pub mod stability;
pub mod validation;

// Re-exports for convenience
pub use loads::{Force, ForceKind, ForceSystem, LoadAssembler};
pub use material::MaterialProperties;
pub use parameters::AnalysisParameters;
pub use pipeline::{
    BatchSummary, CancellationToken, GoverningFactor, SectionAnalyzer, SectionOutcome,
    SectionReport, SectionRequest,
};
pub use stability::{
    BasePressure, CalculationError, ContactMode, SafetyCheck, StabilityCalculator,
    StabilityResult, StabilityStatus, StabilityWarning,
};
pub use validation::{
    IssueCode, Severity, ValidationEngine, ValidationIssue, ValidationOptions, ValidationReport,
};
