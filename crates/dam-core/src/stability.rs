//! Stability calculator
//!
//! Sliding and overturning safety factors plus the base-stress distribution
//! of a section. Moments are taken about the downstream toe; a
//! counter-clockwise moment (in the +x downstream, +y up frame) resists
//! overturning.
//!
//! Base stresses follow the rigid-base model: full contact while the
//! resultant stays in the middle third, a triangular partial-contact block
//! once it leaves it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dam_section::{DiagnosticSink, Profile2D, SectionFeatures, analyze};

use crate::constants::{
    LOW_MARGIN_RATIO, SENTINEL_SAFETY_FACTOR, ZERO_AREA_TOLERANCE, ZERO_LENGTH_TOLERANCE,
    ZERO_LOAD_TOLERANCE,
};
use crate::loads::{ForceSystem, LoadAssembler};
use crate::material::MaterialProperties;
use crate::parameters::AnalysisParameters;

/// Unrecoverable calculation errors
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum CalculationError {
    /// The section has no area
    #[error("Section area is zero")]
    ZeroBaseArea,

    /// The section has no base to stand on
    #[error("Base width is zero")]
    ZeroBaseWidth,

    /// Material or load-case values are not physical
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// No usable profile was extracted
    #[error("Section geometry unavailable: {0}")]
    GeometryUnavailable(String),
}

/// Which safety factor a margin warning refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyCheck {
    /// Sliding along the base
    Sliding,
    /// Overturning about the downstream toe
    Overturning,
}

/// Recoverable conditions attached to a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StabilityWarning {
    /// Resultant outside the middle third of the base
    EccentricityExceeded,
    /// Part of the base is in no-contact (uplift) state
    BaseUpliftZone,
    /// Water above the crest
    Overtopping,
    /// Tailwater above the reservoir level
    ReverseHead,
    /// Uplift exceeds the vertical loads
    NetUplift,
    /// A passing safety factor is close to its requirement
    LowSafetyMargin {
        /// The check concerned
        check: SafetyCheck,
        /// Computed factor
        factor: f64,
        /// Required factor
        required: f64,
    },
}

/// Overall outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityStatus {
    /// Every enabled check passes
    Stable,
    /// At least one check fails
    Unstable,
    /// No result could be computed
    Failed,
}

/// How the base bears on the foundation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactMode {
    /// Resultant within the middle third; the whole base is compressed
    Full,
    /// Resultant outside the middle third; only part of the base bears
    Partial,
    /// Resultant outside the base, or no net downward load
    Lost,
}

/// Base pressure distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasePressure {
    /// Maximum stress, kPa
    pub max: f64,
    /// Minimum stress, kPa
    pub min: f64,
    /// Width in compression, m
    pub effective_width: f64,
    /// Contact mode
    pub contact: ContactMode,
}

impl BasePressure {
    /// Stresses for a vertical load `vertical` on a base `width` wide with the
    /// resultant `eccentricity` from the base center
    pub fn compute(vertical: f64, width: f64, eccentricity: f64) -> Self {
        let e = eccentricity.abs();
        // Relative slack so e = B/6 computed through moments stays in full contact
        if e <= width / 6.0 * (1.0 + 1e-12) {
            let mean = vertical / width;
            let bending = 6.0 * e / width;
            return Self {
                max: mean * (1.0 + bending),
                min: mean * (1.0 - bending),
                effective_width: width,
                contact: ContactMode::Full,
            };
        }

        let effective_width = 3.0 * (width / 2.0 - e);
        if effective_width <= 0.0 {
            return Self {
                max: SENTINEL_SAFETY_FACTOR,
                min: 0.0,
                effective_width: 0.0,
                contact: ContactMode::Lost,
            };
        }
        Self {
            max: 2.0 * vertical / effective_width,
            min: 0.0,
            effective_width,
            contact: ContactMode::Partial,
        }
    }
}

/// Result of a stability check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityResult {
    /// Overall status
    pub status: StabilityStatus,
    /// Reason when `Failed`
    pub failure: Option<CalculationError>,
    /// Sliding safety factor
    pub sliding_sf: f64,
    /// Overturning safety factor
    pub overturning_sf: f64,
    /// Sliding check passed
    pub sliding_ok: bool,
    /// Overturning check passed
    pub overturning_ok: bool,
    /// Stress check passed (true when disabled)
    pub stress_ok: bool,
    /// Sum of resisting moments about the downstream toe, kN·m/m
    pub resisting_moment: f64,
    /// Sum of overturning moments about the downstream toe, kN·m/m
    pub overturning_moment: f64,
    /// Net vertical load, positive downward, kN/m
    pub vertical_load: f64,
    /// Net horizontal load, positive downstream, kN/m
    pub horizontal_load: f64,
    /// Base width, m
    pub base_width: f64,
    /// Resultant position measured from the downstream toe, m
    pub resultant_position: Option<f64>,
    /// Eccentricity from the base center, positive toward downstream, m
    pub eccentricity: Option<f64>,
    /// Maximum base stress, kPa
    pub max_base_stress: f64,
    /// Minimum base stress, kPa
    pub min_base_stress: f64,
    /// Width of the base in compression, m
    pub effective_base_width: f64,
    /// Contact mode of the base
    pub contact: ContactMode,
    /// Force breakdown
    pub forces: ForceSystem,
    /// Recoverable conditions
    pub warnings: Vec<StabilityWarning>,
}

impl StabilityResult {
    /// A failed result carrying its reason
    pub fn failed(error: CalculationError) -> Self {
        Self {
            status: StabilityStatus::Failed,
            failure: Some(error),
            sliding_sf: 0.0,
            overturning_sf: 0.0,
            sliding_ok: false,
            overturning_ok: false,
            stress_ok: false,
            resisting_moment: 0.0,
            overturning_moment: 0.0,
            vertical_load: 0.0,
            horizontal_load: 0.0,
            base_width: 0.0,
            resultant_position: None,
            eccentricity: None,
            max_base_stress: 0.0,
            min_base_stress: 0.0,
            effective_base_width: 0.0,
            contact: ContactMode::Lost,
            forces: ForceSystem::default(),
            warnings: Vec::new(),
        }
    }

    /// Check if every enabled check passed
    pub fn is_stable(&self) -> bool {
        self.status == StabilityStatus::Stable
    }

    /// Check if the calculation failed
    pub fn is_failed(&self) -> bool {
        self.status == StabilityStatus::Failed
    }

    /// Check whether a warning was raised
    pub fn has_warning(&self, warning: &StabilityWarning) -> bool {
        self.warnings.iter().any(|w| {
            std::mem::discriminant(w) == std::mem::discriminant(warning)
        })
    }
}

/// Evaluates sliding, overturning and base stresses
#[derive(Debug, Clone)]
pub struct StabilityCalculator {
    material: MaterialProperties,
    parameters: AnalysisParameters,
}

impl StabilityCalculator {
    /// Create a calculator for one material and load case
    pub fn new(material: MaterialProperties, parameters: AnalysisParameters) -> Self {
        Self {
            material,
            parameters,
        }
    }

    /// Material in use
    pub fn material(&self) -> &MaterialProperties {
        &self.material
    }

    /// Load case in use
    pub fn parameters(&self) -> &AnalysisParameters {
        &self.parameters
    }

    /// Evaluate a profile. Failed or empty profiles give a `Failed` result.
    pub fn evaluate(&self, profile: &Profile2D, sink: &dyn DiagnosticSink) -> StabilityResult {
        if let Some(reason) = profile.failure() {
            return StabilityResult::failed(CalculationError::GeometryUnavailable(
                reason.to_string(),
            ));
        }
        match analyze(profile) {
            Some(features) => self.evaluate_features(&features, sink),
            None => StabilityResult::failed(CalculationError::GeometryUnavailable(
                "profile has no main contour".to_string(),
            )),
        }
    }

    /// Evaluate measured section features
    pub fn evaluate_features(
        &self,
        features: &SectionFeatures,
        sink: &dyn DiagnosticSink,
    ) -> StabilityResult {
        if let Err(e) = self.check_inputs(features) {
            sink.warn("stability", &e.to_string());
            return StabilityResult::failed(e);
        }

        let params = &self.parameters;
        let material = &self.material;
        let forces = LoadAssembler.assemble(features, material, params);
        let width = features.base_width;

        let vertical = forces.vertical_load();
        let horizontal = forces.horizontal_load();
        let (resisting, overturning) = forces.moments_about(features.downstream_toe);
        let mut warnings = forces.warnings.clone();

        let sliding_sf = if horizontal.abs() < ZERO_LOAD_TOLERANCE {
            SENTINEL_SAFETY_FACTOR
        } else {
            (vertical.max(0.0) * material.friction_coefficient + material.cohesion * width)
                / horizontal.abs()
        };
        let overturning_sf = if overturning < ZERO_LOAD_TOLERANCE {
            SENTINEL_SAFETY_FACTOR
        } else {
            resisting / overturning
        };

        let (resultant_position, eccentricity, pressure) = if vertical > ZERO_LOAD_TOLERANCE {
            let x_r = (resisting - overturning) / vertical;
            let e = width / 2.0 - x_r;
            (Some(x_r), Some(e), BasePressure::compute(vertical, width, e))
        } else {
            warnings.push(StabilityWarning::NetUplift);
            let lost = BasePressure {
                max: SENTINEL_SAFETY_FACTOR,
                min: 0.0,
                effective_width: 0.0,
                contact: ContactMode::Lost,
            };
            (None, None, lost)
        };

        if pressure.contact != ContactMode::Full {
            warnings.push(StabilityWarning::EccentricityExceeded);
            warnings.push(StabilityWarning::BaseUpliftZone);
        }

        let sliding_ok = sliding_sf >= params.required_sliding_sf;
        let overturning_ok =
            overturning_sf >= params.required_overturning_sf && pressure.contact != ContactMode::Lost;
        let stress_ok = !params.check_base_stress
            || (pressure.max <= material.compressive_strength
                && pressure.min >= -material.tensile_strength);

        for (check, factor, required, ok) in [
            (SafetyCheck::Sliding, sliding_sf, params.required_sliding_sf, sliding_ok),
            (
                SafetyCheck::Overturning,
                overturning_sf,
                params.required_overturning_sf,
                overturning_ok,
            ),
        ] {
            if ok && factor < required * (1.0 + LOW_MARGIN_RATIO) {
                warnings.push(StabilityWarning::LowSafetyMargin {
                    check,
                    factor,
                    required,
                });
            }
        }

        let status = if sliding_ok && overturning_ok && stress_ok {
            StabilityStatus::Stable
        } else {
            StabilityStatus::Unstable
        };

        sink.debug(
            "stability",
            &format!(
                "sliding {:.3}, overturning {:.3}, sigma {:.1}/{:.1} kPa, {:?}",
                sliding_sf, overturning_sf, pressure.max, pressure.min, status
            ),
        );

        StabilityResult {
            status,
            failure: None,
            sliding_sf,
            overturning_sf,
            sliding_ok,
            overturning_ok,
            stress_ok,
            resisting_moment: resisting,
            overturning_moment: overturning,
            vertical_load: vertical,
            horizontal_load: horizontal,
            base_width: width,
            resultant_position,
            eccentricity,
            max_base_stress: pressure.max,
            min_base_stress: pressure.min,
            effective_base_width: pressure.effective_width,
            contact: pressure.contact,
            forces,
            warnings,
        }
    }

    fn check_inputs(&self, features: &SectionFeatures) -> Result<(), CalculationError> {
        self.material.validate()?;
        self.parameters.validate()?;
        if features.area.abs() < ZERO_AREA_TOLERANCE {
            return Err(CalculationError::ZeroBaseArea);
        }
        if features.base_width < ZERO_LENGTH_TOLERANCE {
            return Err(CalculationError::ZeroBaseWidth);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use dam_section::{CurveLoop, NullSink, Plane};
    use glam::DVec2;
    use uuid::Uuid;

    fn profile(points: &[(f64, f64)]) -> Profile2D {
        let main = CurveLoop::from_vertices(points.iter().map(|&(x, y)| DVec2::new(x, y)).collect());
        Profile2D::new(Uuid::nil(), Plane::xy(), main, Vec::new())
    }

    fn block(width: f64, height: f64) -> Profile2D {
        profile(&[(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)])
    }

    /// Vertical upstream face, base 15, crest 5, height 20
    fn trapezoid() -> Profile2D {
        profile(&[(0.0, 0.0), (15.0, 0.0), (5.0, 20.0), (0.0, 20.0)])
    }

    fn calculator(material: MaterialProperties, params: AnalysisParameters) -> StabilityCalculator {
        StabilityCalculator::new(material, params)
    }

    #[test]
    fn test_scenario_rectangle_sliding() {
        let material = MaterialProperties::default().with_unit_weight(24.0).with_friction(0.75);
        let params = AnalysisParameters::default().with_water_levels(8.0, 0.0);
        let result = calculator(material, params).evaluate(&block(10.0, 10.0), &NullSink);

        assert_abs_diff_eq!(result.forces.self_weight(), 2400.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.forces.horizontal_water_force(), 313.92, epsilon = 1e-9);
        assert_relative_eq!(result.sliding_sf, 5.733, max_relative = 1e-3);
        assert!(result.sliding_ok);
    }

    #[test]
    fn test_scenario_trapezoid_moments() {
        let params = AnalysisParameters::default().with_water_levels(18.0, 0.0);
        let result = calculator(MaterialProperties::default(), params).evaluate(&trapezoid(), &NullSink);

        // Rectangle 5 x 20 at arm 12.5, triangle at arm 15 - 25/3
        let resisting = 2400.0 * 12.5 + 2400.0 * (15.0 - 25.0 / 3.0);
        let overturning = 0.5 * 9.81 * 18.0 * 18.0 * 6.0;
        assert_relative_eq!(result.resisting_moment, resisting, max_relative = 0.01);
        assert_relative_eq!(result.overturning_moment, overturning, max_relative = 0.01);
        assert_relative_eq!(result.overturning_sf, resisting / overturning, max_relative = 0.01);
    }

    #[test]
    fn test_scenario_trapezoid_with_uplift() {
        let params = AnalysisParameters::default()
            .with_water_levels(18.0, 0.0)
            .with_uplift(1.0);
        let result = calculator(MaterialProperties::default(), params).evaluate(&trapezoid(), &NullSink);

        let uplift = 0.5 * 9.81 * 15.0 * 18.0;
        let overturning = 0.5 * 9.81 * 18.0 * 18.0 * 6.0 + uplift * 10.0;
        assert_relative_eq!(result.overturning_moment, overturning, max_relative = 0.01);
        assert_relative_eq!(result.vertical_load, 4800.0 - uplift, max_relative = 1e-9);
    }

    #[test]
    fn test_no_horizontal_load_gives_sentinel() {
        let result = calculator(MaterialProperties::default(), AnalysisParameters::default())
            .evaluate(&block(10.0, 10.0), &NullSink);
        assert_eq!(result.sliding_sf, SENTINEL_SAFETY_FACTOR);
        assert_eq!(result.overturning_sf, SENTINEL_SAFETY_FACTOR);
        assert_abs_diff_eq!(result.eccentricity.unwrap(), 0.0, epsilon = 1e-9);
        assert!(result.is_stable());
    }

    #[test]
    fn test_friction_monotonicity() {
        let params = AnalysisParameters::default().with_water_levels(9.0, 1.0).with_uplift(0.5);
        let mut previous = 0.0;
        for step in 0..10 {
            let friction = 0.3 + 0.1 * step as f64;
            let material = MaterialProperties::default().with_friction(friction);
            let sf = calculator(material, params.clone())
                .evaluate(&trapezoid(), &NullSink)
                .sliding_sf;
            assert!(sf >= previous, "sliding SF dropped at friction {}", friction);
            previous = sf;
        }
    }

    #[test]
    fn test_seismic_monotonicity() {
        let mut previous = f64::MAX;
        for step in 0..10 {
            let k = 0.03 * step as f64;
            let params = AnalysisParameters::default().with_water_levels(15.0, 0.0).with_seismic(k);
            let sf = calculator(MaterialProperties::default(), params)
                .evaluate(&trapezoid(), &NullSink)
                .overturning_sf;
            assert!(sf <= previous, "overturning SF rose at k = {}", k);
            previous = sf;
        }
    }

    #[test]
    fn test_middle_third_boundary_is_continuous() {
        let width = 10.0;
        let vertical = 1000.0;
        let at = BasePressure::compute(vertical, width, width / 6.0);
        assert_eq!(at.contact, ContactMode::Full);
        assert_abs_diff_eq!(at.min, 0.0, epsilon = 1e-9);

        let beyond = BasePressure::compute(vertical, width, width / 6.0 * 1.001);
        assert_eq!(beyond.contact, ContactMode::Partial);
        let jump = (beyond.max - at.max).abs() / at.max;
        assert!(jump < 0.05, "stress jump {:.4} at the middle-third limit", jump);
    }

    #[test]
    fn test_partial_contact_flags() {
        let params = AnalysisParameters::default()
            .with_water_levels(10.0, 0.0)
            .with_uplift(1.0);
        let result = calculator(MaterialProperties::default(), params).evaluate(&block(5.0, 10.0), &NullSink);

        assert_eq!(result.contact, ContactMode::Partial);
        assert!(result.has_warning(&StabilityWarning::BaseUpliftZone));
        assert!(result.has_warning(&StabilityWarning::EccentricityExceeded));
        assert_eq!(result.min_base_stress, 0.0);

        let x_r = result.resultant_position.unwrap();
        assert_relative_eq!(result.effective_base_width, 3.0 * x_r, max_relative = 1e-9);
        assert_relative_eq!(
            result.max_base_stress,
            2.0 * result.vertical_load / (3.0 * x_r),
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_overturned_section() {
        // Slender wall under full head: the resultant leaves the base
        let params = AnalysisParameters::default()
            .with_water_levels(20.0, 0.0)
            .with_uplift(1.0);
        let result = calculator(MaterialProperties::default(), params).evaluate(&block(2.0, 20.0), &NullSink);
        assert!(!result.overturning_ok);
        assert_eq!(result.status, StabilityStatus::Unstable);
        assert_eq!(result.contact, ContactMode::Lost);
    }

    #[test]
    fn test_overtopping_and_reverse_head_proceed() {
        let params = AnalysisParameters::default().with_water_levels(4.0, 12.0);
        let result = calculator(MaterialProperties::default(), params).evaluate(&block(10.0, 10.0), &NullSink);
        assert!(!result.is_failed());
        assert!(result.has_warning(&StabilityWarning::Overtopping));
        assert!(result.has_warning(&StabilityWarning::ReverseHead));
        assert!(result.horizontal_load < 0.0);
        assert!(result.sliding_sf.is_finite());
    }

    #[test]
    fn test_low_margin_warning() {
        // Sliding SF just above 1.5 with a 1.5 requirement
        let material = MaterialProperties::default().with_friction(0.75);
        let params = AnalysisParameters::default()
            .with_water_levels(8.0, 0.0)
            .with_required_factors(5.5, 1.5);
        let result = calculator(material, params).evaluate(&block(10.0, 10.0), &NullSink);
        assert!(result.sliding_ok);
        assert!(result.warnings.iter().any(|w| matches!(
            w,
            StabilityWarning::LowSafetyMargin {
                check: SafetyCheck::Sliding,
                ..
            }
        )));
    }

    #[test]
    fn test_invalid_inputs_fail() {
        let material = MaterialProperties::default().with_unit_weight(0.0);
        let result = calculator(material, AnalysisParameters::default()).evaluate(&block(10.0, 10.0), &NullSink);
        assert!(result.is_failed());
        assert!(matches!(
            result.failure,
            Some(CalculationError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_degenerate_geometry_fails() {
        let calc = calculator(MaterialProperties::default(), AnalysisParameters::default());

        // Triangle standing on its tip: the base has no width
        let tip = profile(&[(5.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        assert_eq!(
            calc.evaluate(&tip, &NullSink).failure,
            Some(CalculationError::ZeroBaseWidth)
        );

        let failed = Profile2D::failed(
            Uuid::nil(),
            Plane::xy(),
            dam_section::GeometryExtractionError::NoIntersection,
        );
        assert!(matches!(
            calc.evaluate(&failed, &NullSink).failure,
            Some(CalculationError::GeometryUnavailable(_))
        ));
    }

    #[test]
    fn test_stress_check_can_be_disabled() {
        let material = MaterialProperties {
            compressive_strength: 10.0,
            ..MaterialProperties::default()
        };
        let params = AnalysisParameters::default().with_water_levels(5.0, 0.0);
        let strict = calculator(material.clone(), params.clone()).evaluate(&block(10.0, 10.0), &NullSink);
        assert!(!strict.stress_ok);
        assert!(!strict.is_stable());

        let relaxed = calculator(material, params.with_base_stress_check(false))
            .evaluate(&block(10.0, 10.0), &NullSink);
        assert!(relaxed.stress_ok);
    }

    #[test]
    fn test_cohesion_adds_base_shear() {
        let material = MaterialProperties::roller_compacted();
        let params = AnalysisParameters::default().with_water_levels(8.0, 0.0);
        let result = calculator(material, params).evaluate(&block(10.0, 10.0), &NullSink);

        // (W·f + c·B) / H with W = 23.5 · 100, c = 300, B = 10
        let expected = (2350.0 * 0.7 + 300.0 * 10.0) / 313.92;
        assert_relative_eq!(result.sliding_sf, expected, max_relative = 1e-9);

        let frictional = calculator(
            MaterialProperties::roller_compacted().with_cohesion(0.0),
            AnalysisParameters::default().with_water_levels(8.0, 0.0),
        )
        .evaluate(&block(10.0, 10.0), &NullSink);
        assert_relative_eq!(
            result.sliding_sf - frictional.sliding_sf,
            3000.0 / 313.92,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_net_uplift_keeps_only_cohesion() {
        // 10 x 1 slab under a 30 m head: uplift 1471.5 outweighs 240 kN of concrete
        let material = MaterialProperties::default().with_cohesion(150.0);
        let params = AnalysisParameters::default()
            .with_water_levels(30.0, 0.0)
            .with_uplift(1.0);
        let result = calculator(material, params).evaluate(&block(10.0, 1.0), &NullSink);

        assert_relative_eq!(result.vertical_load, 240.0 - 1471.5, max_relative = 1e-9);
        assert!(result.vertical_load < 0.0);
        // Face pressure is clipped to the 1 m section height
        let horizontal = 0.5 * 9.81;
        assert_relative_eq!(result.sliding_sf, 150.0 * 10.0 / horizontal, max_relative = 1e-9);
        assert_eq!(result.contact, ContactMode::Lost);
        assert!(result.has_warning(&StabilityWarning::NetUplift));
        assert!(!result.is_stable());
    }

    #[test]
    fn test_sub_millimetre_base_is_zero_width() {
        let calc = calculator(MaterialProperties::default(), AnalysisParameters::default());
        let features = analyze(&block(10.0, 10.0)).unwrap();
        let sliver = SectionFeatures {
            base_width: 5e-7,
            ..features
        };
        assert_eq!(
            calc.evaluate_features(&sliver, &NullSink).failure,
            Some(CalculationError::ZeroBaseWidth)
        );
    }
}
