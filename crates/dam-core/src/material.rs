//! Material properties of the dam body and its foundation contact

use serde::{Deserialize, Serialize};

use crate::constants::CONCRETE_UNIT_WEIGHT;
use crate::stability::CalculationError;

/// Material properties used by the load and stability checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialProperties {
    /// Display name
    pub name: String,
    /// Unit weight (density × g), kN/m³
    pub unit_weight: f64,
    /// Friction coefficient on the base contact
    pub friction_coefficient: f64,
    /// Cohesion on the base contact, kPa
    pub cohesion: f64,
    /// Allowable compressive stress, kPa
    pub compressive_strength: f64,
    /// Allowable tensile stress (positive number), kPa
    pub tensile_strength: f64,
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self::mass_concrete()
    }
}

impl MaterialProperties {
    /// Typical mass concrete on sound rock
    pub fn mass_concrete() -> Self {
        Self {
            name: "Mass concrete".to_string(),
            unit_weight: CONCRETE_UNIT_WEIGHT,
            friction_coefficient: 0.75,
            cohesion: 0.0,
            compressive_strength: 10_000.0,
            tensile_strength: 0.0,
        }
    }

    /// Roller-compacted concrete with lift-joint strength
    pub fn roller_compacted() -> Self {
        Self {
            name: "Roller-compacted concrete".to_string(),
            unit_weight: 23.5,
            friction_coefficient: 0.7,
            cohesion: 300.0,
            compressive_strength: 8_000.0,
            tensile_strength: 100.0,
        }
    }

    /// Set the friction coefficient
    pub fn with_friction(mut self, friction_coefficient: f64) -> Self {
        self.friction_coefficient = friction_coefficient;
        self
    }

    /// Set the cohesion
    pub fn with_cohesion(mut self, cohesion: f64) -> Self {
        self.cohesion = cohesion;
        self
    }

    /// Set the unit weight
    pub fn with_unit_weight(mut self, unit_weight: f64) -> Self {
        self.unit_weight = unit_weight;
        self
    }

    /// Reject non-physical values
    pub fn validate(&self) -> Result<(), CalculationError> {
        let invalid = |message: &str| Err(CalculationError::InvalidParameters(message.to_string()));
        let values = [
            self.unit_weight,
            self.friction_coefficient,
            self.cohesion,
            self.compressive_strength,
            self.tensile_strength,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return invalid("material values must be finite");
        }
        if self.unit_weight <= 0.0 {
            return invalid("unit weight must be positive");
        }
        if self.friction_coefficient < 0.0 {
            return invalid("friction coefficient must not be negative");
        }
        if self.cohesion < 0.0 || self.compressive_strength < 0.0 || self.tensile_strength < 0.0 {
            return invalid("cohesion and strengths must not be negative");
        }
        Ok(())
    }
}
