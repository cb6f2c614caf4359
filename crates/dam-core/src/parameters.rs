//! Hydraulic and acceptance parameters of a stability check

use serde::{Deserialize, Serialize};

use crate::constants::{REQUIRED_OVERTURNING_SF, REQUIRED_SLIDING_SF, WATER_UNIT_WEIGHT};
use crate::stability::CalculationError;

/// Load case and acceptance criteria.
///
/// Water levels are depths above the lowest point of the section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParameters {
    /// Reservoir depth on the upstream face, m
    pub upstream_water_level: f64,
    /// Tailwater depth on the downstream face, m
    pub downstream_water_level: f64,
    /// Unit weight of water, kN/m³
    pub water_unit_weight: f64,
    /// Horizontal pseudo-static seismic coefficient
    pub seismic_coefficient: f64,
    /// Apply uplift on the base
    pub consider_uplift: bool,
    /// Fraction of the full uplift head that acts (drainage reduces it)
    pub uplift_reduction_factor: f64,
    /// Required sliding safety factor
    pub required_sliding_sf: f64,
    /// Required overturning safety factor
    pub required_overturning_sf: f64,
    /// Compare base stresses with the material's allowable stresses
    pub check_base_stress: bool,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            upstream_water_level: 0.0,
            downstream_water_level: 0.0,
            water_unit_weight: WATER_UNIT_WEIGHT,
            seismic_coefficient: 0.0,
            consider_uplift: false,
            uplift_reduction_factor: 1.0,
            required_sliding_sf: REQUIRED_SLIDING_SF,
            required_overturning_sf: REQUIRED_OVERTURNING_SF,
            check_base_stress: true,
        }
    }
}

impl AnalysisParameters {
    /// Set upstream and downstream water depths
    pub fn with_water_levels(mut self, upstream: f64, downstream: f64) -> Self {
        self.upstream_water_level = upstream;
        self.downstream_water_level = downstream;
        self
    }

    /// Enable uplift with a reduction factor
    pub fn with_uplift(mut self, reduction_factor: f64) -> Self {
        self.consider_uplift = true;
        self.uplift_reduction_factor = reduction_factor;
        self
    }

    /// Set the seismic coefficient
    pub fn with_seismic(mut self, coefficient: f64) -> Self {
        self.seismic_coefficient = coefficient;
        self
    }

    /// Set the required safety factors
    pub fn with_required_factors(mut self, sliding: f64, overturning: f64) -> Self {
        self.required_sliding_sf = sliding;
        self.required_overturning_sf = overturning;
        self
    }

    /// Enable or disable the allowable-stress check
    pub fn with_base_stress_check(mut self, enabled: bool) -> Self {
        self.check_base_stress = enabled;
        self
    }

    /// Reject non-physical values
    pub fn validate(&self) -> Result<(), CalculationError> {
        let invalid = |message: &str| Err(CalculationError::InvalidParameters(message.to_string()));
        let values = [
            self.upstream_water_level,
            self.downstream_water_level,
            self.water_unit_weight,
            self.seismic_coefficient,
            self.uplift_reduction_factor,
            self.required_sliding_sf,
            self.required_overturning_sf,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return invalid("parameters must be finite");
        }
        if self.water_unit_weight <= 0.0 {
            return invalid("water unit weight must be positive");
        }
        if self.seismic_coefficient < 0.0 {
            return invalid("seismic coefficient must not be negative");
        }
        if !(0.0..=1.0).contains(&self.uplift_reduction_factor) {
            return invalid("uplift reduction factor must lie in [0, 1]");
        }
        if self.required_sliding_sf <= 0.0 || self.required_overturning_sf <= 0.0 {
            return invalid("required safety factors must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = AnalysisParameters::default();
        assert_eq!(params.required_sliding_sf, 3.0);
        assert_eq!(params.required_overturning_sf, 1.5);
        assert!(params.check_base_stress);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_uplift_factor() {
        let params = AnalysisParameters::default().with_uplift(1.5);
        assert!(params.validate().is_err(), "factor above 1 must be rejected");
    }

    #[test]
    fn test_non_finite_level() {
        let params = AnalysisParameters::default().with_water_levels(f64::NAN, 0.0);
        assert!(params.validate().is_err());
    }
}
