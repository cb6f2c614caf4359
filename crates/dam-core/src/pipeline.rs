//! Section pipeline and batch runner
//!
//! Runs extract → validate → features → loads → stability for one cutting
//! plane, and fans a list of planes out over rayon. Sections never share
//! mutable state; cancellation is checked before each section starts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use dam_section::{
    BrepSnapshot, DiagnosticSink, ExtractionOptions, Plane, Profile2D, SectionFeatures, analyze,
    extract_section,
};

use crate::loads::{ForceSystem, LoadAssembler};
use crate::material::MaterialProperties;
use crate::parameters::AnalysisParameters;
use crate::stability::{CalculationError, StabilityCalculator, StabilityResult, StabilityStatus};
use crate::validation::{ValidationEngine, ValidationOptions, ValidationReport};

/// A named cutting plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRequest {
    /// Section name (e.g. chainage)
    pub name: String,
    /// Cutting plane
    pub plane: Plane,
}

impl SectionRequest {
    /// Create a request
    pub fn new(name: impl Into<String>, plane: Plane) -> Self {
        Self {
            name: name.into(),
            plane,
        }
    }
}

/// Everything computed for one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionReport {
    /// Section name
    pub name: String,
    /// Extracted and validated profile
    pub profile: Profile2D,
    /// Validation findings
    pub validation: ValidationReport,
    /// Measured features, absent when extraction failed
    pub features: Option<SectionFeatures>,
    /// Assembled loads
    pub forces: ForceSystem,
    /// Stability outcome
    pub result: StabilityResult,
}

impl SectionReport {
    /// Check whether the profile needs human review
    pub fn requires_review(&self) -> bool {
        self.validation.requires_review
    }
}

/// Outcome of one section in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SectionOutcome {
    /// The section ran to completion
    Completed(Box<SectionReport>),
    /// The batch was cancelled before this section started
    Cancelled {
        /// Section name
        name: String,
    },
}

impl SectionOutcome {
    /// Section name
    pub fn name(&self) -> &str {
        match self {
            SectionOutcome::Completed(report) => &report.name,
            SectionOutcome::Cancelled { name } => name,
        }
    }

    /// Report of a completed section
    pub fn report(&self) -> Option<&SectionReport> {
        match self {
            SectionOutcome::Completed(report) => Some(report.as_ref()),
            SectionOutcome::Cancelled { .. } => None,
        }
    }
}

/// Cooperative cancellation flag shared with the caller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; sections already running finish
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Governing (minimum) safety factor and the section it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoverningFactor {
    /// Section name
    pub section: String,
    /// Safety factor value
    pub factor: f64,
}

/// Aggregate counts over a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Sections requested
    pub total: usize,
    /// Sections passing every check
    pub stable: usize,
    /// Sections failing a check
    pub unstable: usize,
    /// Sections without a result
    pub failed: usize,
    /// Sections skipped by cancellation
    pub cancelled: usize,
    /// Sections whose profile needs review
    pub requires_review: usize,
    /// Lowest sliding safety factor
    pub governing_sliding: Option<GoverningFactor>,
    /// Lowest overturning safety factor
    pub governing_overturning: Option<GoverningFactor>,
}

impl BatchSummary {
    /// Summarize batch outcomes
    pub fn from_outcomes(outcomes: &[SectionOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };

        for outcome in outcomes {
            let Some(report) = outcome.report() else {
                summary.cancelled += 1;
                continue;
            };
            if report.requires_review() {
                summary.requires_review += 1;
            }
            match report.result.status {
                StabilityStatus::Stable => summary.stable += 1,
                StabilityStatus::Unstable => summary.unstable += 1,
                StabilityStatus::Failed => {
                    summary.failed += 1;
                    continue;
                }
            }
            keep_lower(&mut summary.governing_sliding, &report.name, report.result.sliding_sf);
            keep_lower(
                &mut summary.governing_overturning,
                &report.name,
                report.result.overturning_sf,
            );
        }
        summary
    }

    /// Check if every completed section is stable and nothing was skipped
    pub fn all_stable(&self) -> bool {
        self.total > 0 && self.stable == self.total
    }
}

fn keep_lower(slot: &mut Option<GoverningFactor>, section: &str, factor: f64) {
    if slot.as_ref().is_none_or(|g| factor < g.factor) {
        *slot = Some(GoverningFactor {
            section: section.to_string(),
            factor,
        });
    }
}

/// Runs the full analysis for sections of one solid
#[derive(Debug, Clone)]
pub struct SectionAnalyzer {
    extraction: ExtractionOptions,
    validation: ValidationOptions,
    material: Option<MaterialProperties>,
    parameters: AnalysisParameters,
}

impl SectionAnalyzer {
    /// Create an analyzer with default options and no material
    pub fn new(parameters: AnalysisParameters) -> Self {
        Self {
            extraction: ExtractionOptions::default(),
            validation: ValidationOptions::default(),
            material: None,
            parameters,
        }
    }

    /// Assign the section material
    pub fn with_material(mut self, material: MaterialProperties) -> Self {
        self.material = Some(material);
        self
    }

    /// Set the extraction options
    pub fn with_extraction_options(mut self, options: ExtractionOptions) -> Self {
        self.extraction = options;
        self
    }

    /// Set the validation options
    pub fn with_validation_options(mut self, options: ValidationOptions) -> Self {
        self.validation = options;
        self
    }

    /// Analyze one section
    pub fn analyze(
        &self,
        snapshot: &BrepSnapshot,
        request: &SectionRequest,
        sink: &dyn DiagnosticSink,
    ) -> SectionReport {
        let profile = extract_section(snapshot, &request.plane, &self.extraction, sink);

        let validation = ValidationEngine::new(self.validation).validate(
            &profile,
            self.material.as_ref(),
            sink,
        );
        let profile = validation.apply_to(profile);

        let features = analyze(&profile);

        let result = match (&self.material, profile.failure()) {
            (_, Some(reason)) => StabilityResult::failed(CalculationError::GeometryUnavailable(
                reason.to_string(),
            )),
            (None, None) => StabilityResult::failed(CalculationError::InvalidParameters(
                "no material assigned".to_string(),
            )),
            (Some(material), None) => {
                StabilityCalculator::new(material.clone(), self.parameters.clone())
                    .evaluate(&profile, sink)
            }
        };

        let forces = if result.is_failed() {
            match (&features, &self.material) {
                (Some(f), Some(m)) => LoadAssembler.assemble(f, m, &self.parameters),
                _ => ForceSystem::default(),
            }
        } else {
            result.forces.clone()
        };

        sink.info(
            "pipeline",
            &format!(
                "Section '{}': {:?}, profile {:?}",
                request.name,
                result.status,
                profile.status()
            ),
        );

        SectionReport {
            name: request.name.clone(),
            profile,
            validation,
            features,
            forces,
            result,
        }
    }

    /// Analyze many sections in parallel, preserving request order
    pub fn analyze_batch(
        &self,
        snapshot: &BrepSnapshot,
        requests: &[SectionRequest],
        token: &CancellationToken,
        sink: &dyn DiagnosticSink,
    ) -> Vec<SectionOutcome> {
        requests
            .par_iter()
            .map(|request| {
                if token.is_cancelled() {
                    sink.debug("pipeline", &format!("Section '{}' cancelled", request.name));
                    return SectionOutcome::Cancelled {
                        name: request.name.clone(),
                    };
                }
                SectionOutcome::Completed(Box::new(self.analyze(snapshot, request, sink)))
            })
            .collect()
    }
}
