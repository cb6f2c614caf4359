//! Profile validation
//!
//! Geometric and engineering checks over a [`Profile2D`]. Issues never block
//! computation: a critical issue only marks the profile for human review.

use serde::{Deserialize, Serialize};

use dam_section::constants::CONNECTION_TOLERANCE;
use dam_section::geometry::polygon;
use dam_section::{CurveLoop, DiagnosticSink, Profile2D, analyze};

use crate::constants::{MIN_BASE_WIDTH, MIN_HEIGHT, SCORE_CRITICAL, SCORE_INFO, SCORE_WARNING};
use crate::material::MaterialProperties;

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational note
    Info,
    /// Suspicious but usable
    Warning,
    /// Requires human review
    Critical,
}

/// Identifies which check raised an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueCode {
    /// Extraction failed; there is no main contour
    MissingContour,
    /// A contour does not return to its start
    OpenContour,
    /// A contour crosses itself
    SelfIntersection,
    /// Two contours cross each other
    ContourCrossing,
    /// Main contour is not counter-clockwise or a hole is not clockwise
    Orientation,
    /// Hole lies outside the main contour
    HoleOutsideMain,
    /// Base narrower than the configured minimum
    BaseTooNarrow,
    /// Section lower than the configured minimum
    HeightTooSmall,
    /// No material assigned
    MissingMaterial,
    /// Stitching left open chains
    SmallGaps,
    /// Main contour was chosen among near-equal loops
    AmbiguousMainContour,
    /// Number of holes in the section
    InnerContours,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Which check fired
    pub code: IssueCode,
    /// How bad it is
    pub severity: Severity,
    /// Human-readable detail
    pub message: String,
}

impl ValidationIssue {
    fn new(code: IssueCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
        }
    }
}

/// Outcome of validating one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// All findings, in check order
    pub issues: Vec<ValidationIssue>,
    /// 100 minus severity-weighted deductions, floored at 0
    pub score: f64,
    /// True when any issue is critical
    pub requires_review: bool,
}

impl ValidationReport {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let deduction: f64 = issues
            .iter()
            .map(|i| match i.severity {
                Severity::Critical => SCORE_CRITICAL,
                Severity::Warning => SCORE_WARNING,
                Severity::Info => SCORE_INFO,
            })
            .sum();
        let requires_review = issues.iter().any(|i| i.severity == Severity::Critical);
        Self {
            issues,
            score: (100.0 - deduction).max(0.0),
            requires_review,
        }
    }

    /// Number of issues at a given severity
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Check whether an issue with this code was raised
    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    /// Move the profile to `Validated` or `RequiresReview`.
    /// A failed profile stays failed.
    pub fn apply_to(&self, profile: Profile2D) -> Profile2D {
        profile.reviewed(self.requires_review)
    }
}

/// Thresholds for the validation checks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Minimum acceptable base width, m
    pub min_base_width: f64,
    /// Minimum acceptable height, m
    pub min_height: f64,
    /// Closure and intersection tolerance, m
    pub tolerance: f64,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            min_base_width: MIN_BASE_WIDTH,
            min_height: MIN_HEIGHT,
            tolerance: CONNECTION_TOLERANCE,
        }
    }
}

impl ValidationOptions {
    /// Set the minimum base width
    pub fn with_min_base_width(mut self, width: f64) -> Self {
        self.min_base_width = width;
        self
    }

    /// Set the minimum height
    pub fn with_min_height(mut self, height: f64) -> Self {
        self.min_height = height;
        self
    }

    /// Set the geometric tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Runs the validation checks
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    options: ValidationOptions,
}

impl ValidationEngine {
    /// Create an engine with the given thresholds
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    /// Thresholds in use
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate a profile and the presence of its material
    pub fn validate(
        &self,
        profile: &Profile2D,
        material: Option<&MaterialProperties>,
        sink: &dyn DiagnosticSink,
    ) -> ValidationReport {
        let mut issues = Vec::new();

        if profile.is_failed() || profile.main_contour().is_empty() {
            let reason = profile
                .failure()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no main contour".to_string());
            issues.push(ValidationIssue::new(
                IssueCode::MissingContour,
                Severity::Critical,
                reason,
            ));
        } else {
            self.check_contours(profile, &mut issues);
        }

        if !profile.open_chains().is_empty() {
            let max_gap = profile
                .open_chains()
                .iter()
                .map(|c| c.gap)
                .fold(0.0, f64::max);
            issues.push(ValidationIssue::new(
                IssueCode::SmallGaps,
                Severity::Warning,
                format!(
                    "{} open chain(s) left after stitching, largest gap {:.4} m",
                    profile.open_chains().len(),
                    max_gap
                ),
            ));
        }

        if profile.is_main_ambiguous() {
            issues.push(ValidationIssue::new(
                IssueCode::AmbiguousMainContour,
                Severity::Warning,
                "main contour chosen among loops of near-equal area",
            ));
        }

        if material.is_none() {
            issues.push(ValidationIssue::new(
                IssueCode::MissingMaterial,
                Severity::Critical,
                "no material assigned to the section",
            ));
        }

        let report = ValidationReport::from_issues(issues);
        for issue in report.issues.iter().filter(|i| i.severity == Severity::Critical) {
            sink.warn("validate", &issue.message);
        }
        sink.debug(
            "validate",
            &format!("score {:.0}, {} issue(s)", report.score, report.issues.len()),
        );
        report
    }

    fn check_contours(&self, profile: &Profile2D, issues: &mut Vec<ValidationIssue>) {
        let tol = self.options.tolerance;
        let main = profile.main_contour();
        let holes = profile.inner_contours();
        let contours: Vec<&CurveLoop> = std::iter::once(main).chain(holes).collect();

        for (index, contour) in contours.iter().enumerate() {
            if !contour.is_closed(tol) {
                issues.push(ValidationIssue::new(
                    IssueCode::OpenContour,
                    Severity::Critical,
                    format!("contour {} is not closed (gap {:.6})", index, contour.closure_gap()),
                ));
            }
            if polygon::is_self_intersecting(contour.vertices(), tol) {
                issues.push(ValidationIssue::new(
                    IssueCode::SelfIntersection,
                    Severity::Critical,
                    format!("contour {} intersects itself", index),
                ));
            }
        }

        for i in 0..contours.len() {
            for j in (i + 1)..contours.len() {
                if contours_cross(contours[i], contours[j], tol) {
                    issues.push(ValidationIssue::new(
                        IssueCode::ContourCrossing,
                        Severity::Critical,
                        format!("contours {} and {} cross", i, j),
                    ));
                }
            }
        }

        if !profile.is_normalized() {
            issues.push(ValidationIssue::new(
                IssueCode::Orientation,
                Severity::Critical,
                "main contour must be counter-clockwise and holes clockwise",
            ));
        }

        for (index, hole) in holes.iter().enumerate() {
            if !hole.vertices().iter().all(|p| main.contains(*p)) {
                issues.push(ValidationIssue::new(
                    IssueCode::HoleOutsideMain,
                    Severity::Critical,
                    format!("inner contour {} is not inside the main contour", index + 1),
                ));
            }
        }

        if let Some(features) = analyze(profile) {
            if features.base_width < self.options.min_base_width {
                issues.push(ValidationIssue::new(
                    IssueCode::BaseTooNarrow,
                    Severity::Critical,
                    format!(
                        "base width {:.3} m below minimum {:.3} m",
                        features.base_width, self.options.min_base_width
                    ),
                ));
            }
            if features.height < self.options.min_height {
                issues.push(ValidationIssue::new(
                    IssueCode::HeightTooSmall,
                    Severity::Critical,
                    format!(
                        "height {:.3} m below minimum {:.3} m",
                        features.height, self.options.min_height
                    ),
                ));
            }
        }

        if !holes.is_empty() {
            issues.push(ValidationIssue::new(
                IssueCode::InnerContours,
                Severity::Info,
                format!("{} inner contour(s)", holes.len()),
            ));
        }
    }
}

/// Pairwise test over non-adjacent edges
fn contours_cross(a: &CurveLoop, b: &CurveLoop, tolerance: f64) -> bool {
    a.edges().any(|(a1, a2)| {
        b.edges()
            .any(|(b1, b2)| polygon::segments_intersect(a1, a2, b1, b2, tolerance))
    })
}
