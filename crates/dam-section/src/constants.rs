//! Default tolerances and sampling settings for section extraction

/// Signed-distance tolerance when classifying vertices against a cutting plane (ε1)
pub const INTERSECTION_TOLERANCE: f64 = 1e-6;

/// Maximum gap between two segment endpoints that still counts as connected (ε2)
pub const CONNECTION_TOLERANCE: f64 = 1e-3;

/// Number of chords used to approximate an arc
pub const ARC_SAMPLES: u32 = 10;

/// Vertical tolerance used to decide which vertices sit at the base or crest level
pub const LEVEL_TOLERANCE: f64 = 1e-3;

/// Relative area difference under which two loop candidates are treated as equal
pub const AMBIGUOUS_AREA_RATIO: f64 = 1e-6;
