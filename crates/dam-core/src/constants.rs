//! Engineering defaults for dam-core

/// Safety factor reported when the destabilizing term is zero
pub const SENTINEL_SAFETY_FACTOR: f64 = f64::MAX;

/// Net loads below this magnitude count as zero (kN/m, kN·m/m)
pub const ZERO_LOAD_TOLERANCE: f64 = 1e-9;

/// Areas below this count as a missing base (m²)
pub const ZERO_AREA_TOLERANCE: f64 = 1e-9;

/// Base widths below this count as no base at all (m)
pub const ZERO_LENGTH_TOLERANCE: f64 = 1e-6;

/// Unit weight of water (kN/m³)
pub const WATER_UNIT_WEIGHT: f64 = 9.81;

/// Unit weight of mass concrete (kN/m³)
pub const CONCRETE_UNIT_WEIGHT: f64 = 24.0;

/// Default required sliding safety factor
pub const REQUIRED_SLIDING_SF: f64 = 3.0;

/// Default required overturning safety factor
pub const REQUIRED_OVERTURNING_SF: f64 = 1.5;

/// A passing safety factor within this fraction of its requirement raises a margin warning
pub const LOW_MARGIN_RATIO: f64 = 0.10;

/// Minimum base width accepted without a validation issue (m)
pub const MIN_BASE_WIDTH: f64 = 0.5;

/// Minimum section height accepted without a validation issue (m)
pub const MIN_HEIGHT: f64 = 0.5;

/// Validation score deductions per issue
pub const SCORE_CRITICAL: f64 = 40.0;
/// Deduction per warning
pub const SCORE_WARNING: f64 = 10.0;
/// Deduction per informational issue
pub const SCORE_INFO: f64 = 1.0;
