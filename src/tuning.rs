//! Stability tuning knobs
//!
//! Every numeric threshold and clamp used by the resolver lives here, so an
//! embedder can trade stiffness against stability without recompiling. Values
//! serialize to JSON; missing fields fall back to defaults.

use serde::{Deserialize, Serialize};

/// Resolver thresholds and clamps.
///
/// The defaults are calibrated for a pixel-ish world scale (bodies tens to
/// hundreds of units across). Scale-sensitive fields are the three ceilings
/// and `deep_penetration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Velocity/denominator epsilon for degenerate-case guards
    pub epsilon: f64,

    // === Positional correction ===
    /// Penetration below this depth is left to the impulse pass
    pub penetration_slop: f64,
    /// Fraction of the penetration removed per step (Baumgarte factor)
    pub correction_percent: f64,
    /// Ceiling on a single positional correction, world units
    pub max_correction: f64,
    /// Penetration beyond this depth triggers one-shot emergency separation
    /// instead of the fractional correction
    pub deep_penetration: f64,

    // === Impulse clamps ===
    /// Ceiling on the normal impulse magnitude
    pub max_impulse: f64,
    /// Ceiling on the friction impulse magnitude
    pub max_friction_impulse: f64,

    // === Stuck-pair fallback ===
    /// Centers closer than this fraction of the summed extent radii count as
    /// stuck and get pushed apart directly
    pub stuck_fraction: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            epsilon: 1e-3,

            penetration_slop: 1e-3,
            correction_percent: 0.2,
            max_correction: 10.0,
            deep_penetration: 25.0,

            max_impulse: 1000.0,
            max_friction_impulse: 500.0,

            stuck_fraction: 0.15,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON. Unknown fields are ignored, missing fields
    /// take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
