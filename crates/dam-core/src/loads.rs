//! Load assembly
//!
//! Turns section features, material and load-case parameters into a
//! [`ForceSystem`] per metre run (plane strain). Forces live in the section's
//! local frame: +x downstream, +y up.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use dam_section::SectionFeatures;

use crate::material::MaterialProperties;
use crate::parameters::AnalysisParameters;
use crate::stability::StabilityWarning;

/// Which load a force represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForceKind {
    /// Weight of the section
    SelfWeight,
    /// Reservoir pressure on the upstream face
    UpstreamWater,
    /// Tailwater pressure on the downstream face
    DownstreamWater,
    /// Seepage pressure under the base
    Uplift,
    /// Pseudo-static earthquake inertia
    Seismic,
}

/// A resultant force with its line of action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Force {
    /// Load type
    pub kind: ForceKind,
    /// Magnitude, kN/m (non-negative)
    pub magnitude: f64,
    /// Unit direction
    pub direction: DVec2,
    /// Point of application
    pub point: DVec2,
}

impl Force {
    /// Create a force; the direction is normalized
    pub fn new(kind: ForceKind, magnitude: f64, direction: DVec2, point: DVec2) -> Self {
        Self {
            kind,
            magnitude,
            direction: direction.normalize_or_zero(),
            point,
        }
    }

    /// Force vector
    pub fn vector(&self) -> DVec2 {
        self.direction * self.magnitude
    }

    /// Moment about `pivot`, counter-clockwise positive
    pub fn moment_about(&self, pivot: DVec2) -> f64 {
        (self.point - pivot).perp_dot(self.vector())
    }
}

/// All forces acting on one section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForceSystem {
    /// Individual forces in assembly order
    pub forces: Vec<Force>,
    /// Load-case warnings (overtopping, reverse head)
    pub warnings: Vec<StabilityWarning>,
}

impl ForceSystem {
    /// Look up a force by kind
    pub fn get(&self, kind: ForceKind) -> Option<&Force> {
        self.forces.iter().find(|f| f.kind == kind)
    }

    /// Magnitude of a force, 0 when absent
    pub fn magnitude(&self, kind: ForceKind) -> f64 {
        self.get(kind).map_or(0.0, |f| f.magnitude)
    }

    /// Self weight, kN/m
    pub fn self_weight(&self) -> f64 {
        self.magnitude(ForceKind::SelfWeight)
    }

    /// Uplift, kN/m
    pub fn uplift(&self) -> f64 {
        self.magnitude(ForceKind::Uplift)
    }

    /// Seismic inertia force, kN/m
    pub fn seismic(&self) -> f64 {
        self.magnitude(ForceKind::Seismic)
    }

    /// Net horizontal water force, positive toward downstream
    pub fn horizontal_water_force(&self) -> f64 {
        self.magnitude(ForceKind::UpstreamWater) - self.magnitude(ForceKind::DownstreamWater)
    }

    /// Sum of horizontal components, positive toward downstream
    pub fn horizontal_load(&self) -> f64 {
        self.forces.iter().map(|f| f.vector().x).sum()
    }

    /// Sum of vertical components, positive downward
    pub fn vertical_load(&self) -> f64 {
        -self.forces.iter().map(|f| f.vector().y).sum::<f64>()
    }

    /// Resisting (counter-clockwise) and overturning (clockwise) moment sums
    /// about `pivot`, both returned as non-negative numbers
    pub fn moments_about(&self, pivot: DVec2) -> (f64, f64) {
        self.forces
            .iter()
            .map(|f| f.moment_about(pivot))
            .fold((0.0, 0.0), |(resisting, overturning), m| {
                if m >= 0.0 {
                    (resisting + m, overturning)
                } else {
                    (resisting, overturning - m)
                }
            })
    }
}

/// Builds the force system of a section
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadAssembler;

impl LoadAssembler {
    /// Assemble self weight, water, uplift and seismic forces.
    ///
    /// Water on the faces is clipped to the section height; uplift uses the
    /// full heads. Forces with zero magnitude are omitted, except self weight.
    pub fn assemble(
        &self,
        features: &SectionFeatures,
        material: &MaterialProperties,
        parameters: &AnalysisParameters,
    ) -> ForceSystem {
        let mut system = ForceSystem::default();
        let height = features.height;
        let base = features.base_level;
        let gamma_w = parameters.water_unit_weight;
        let upstream = parameters.upstream_water_level;
        let downstream = parameters.downstream_water_level;

        let weight = features.area * material.unit_weight;
        system.forces.push(Force::new(
            ForceKind::SelfWeight,
            weight,
            DVec2::NEG_Y,
            features.centroid,
        ));

        let h_up = upstream.clamp(0.0, height);
        if h_up > 0.0 {
            system.forces.push(Force::new(
                ForceKind::UpstreamWater,
                0.5 * gamma_w * h_up * h_up,
                DVec2::X,
                DVec2::new(features.upstream_toe.x, base + h_up / 3.0),
            ));
        }

        let h_down = downstream.clamp(0.0, height);
        if h_down > 0.0 {
            system.forces.push(Force::new(
                ForceKind::DownstreamWater,
                0.5 * gamma_w * h_down * h_down,
                DVec2::NEG_X,
                DVec2::new(features.downstream_toe.x, base + h_down / 3.0),
            ));
        }

        if parameters.consider_uplift {
            let h1 = upstream.max(0.0);
            let h2 = downstream.max(0.0);
            let width = features.base_width;
            let uplift = parameters.uplift_reduction_factor * gamma_w * width * (h1 + h2) * 0.5;
            if uplift > 0.0 {
                // Trapezoid centroid measured from the upstream toe
                let offset = width * (h1 + 2.0 * h2) / (3.0 * (h1 + h2));
                system.forces.push(Force::new(
                    ForceKind::Uplift,
                    uplift,
                    DVec2::Y,
                    DVec2::new(features.upstream_toe.x + offset, base),
                ));
            }
        }

        if parameters.seismic_coefficient > 0.0 {
            system.forces.push(Force::new(
                ForceKind::Seismic,
                parameters.seismic_coefficient * weight,
                DVec2::X,
                features.centroid,
            ));
        }

        if upstream > height || downstream > height {
            system.warnings.push(StabilityWarning::Overtopping);
        }
        if downstream > upstream {
            system.warnings.push(StabilityWarning::ReverseHead);
        }

        system
    }
}
