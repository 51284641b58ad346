//! Outcome Synthesizer
//!
//! Turns a confidence into the typed decision and descriptive fields.
//!
//! The orbital period, temperature and transit depth reported for a
//! detection are presentation placeholders drawn uniformly from fixed
//! ranges. They carry no scientific meaning, are not derived from the input
//! and differ between calls. The random source is a parameter so tests can
//! pass a seeded generator.

use std::ops::RangeInclusive;

use rand::Rng;

use crate::models::{Confidence, Estimate, PlanetType, PredictionResult};

/// Days
pub const ORBITAL_PERIOD_RANGE: RangeInclusive<f64> = 1.5..=365.0;
/// Kelvin
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 200.0..=2000.0;
/// Fractional flux drop
pub const TRANSIT_DEPTH_RANGE: RangeInclusive<f64> = 0.001..=0.05;

/// Build the prediction result for one classifier outcome
pub fn synthesize<R: Rng + ?Sized>(confidence: Confidence, features_used: usize, rng: &mut R) -> PredictionResult {
    let is_exoplanet = confidence.is_exoplanet();
    let planet_type = PlanetType::from_confidence(confidence);

    let (orbital_period, temperature, transit_depth) = if is_exoplanet {
        (
            Estimate::Value(rng.gen_range(ORBITAL_PERIOD_RANGE)),
            Estimate::Value(rng.gen_range(TEMPERATURE_RANGE)),
            Estimate::Value(format!("{:.4}", rng.gen_range(TRANSIT_DEPTH_RANGE))),
        )
    } else {
        (
            Estimate::NotApplicable,
            Estimate::NotApplicable,
            Estimate::NotApplicable,
        )
    };

    PredictionResult {
        is_exoplanet,
        confidence,
        planet_type,
        orbital_period,
        temperature,
        transit_depth,
        features_used,
    }
}
