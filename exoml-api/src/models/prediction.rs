//! Prediction request/response types

use serde::{Deserialize, Serialize, Serializer};

/// Version string reported with every prediction
pub const MODEL_VERSION: &str = "1.0";

/// Rendered marker for derived fields of non-exoplanet outcomes
pub const NOT_APPLICABLE: &str = "N/A";

/// POST /api/predict body
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    /// Comma-separated text, header row first
    pub data: Option<String>,
}

/// Classifier score scaled to percent
///
/// Not clamped: a classifier emitting a score outside [0, 1] yields a
/// confidence outside [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f64);

impl Confidence {
    /// Decision threshold in percent, compared with strict greater-than
    pub const EXOPLANET_THRESHOLD: f64 = 50.0;

    /// From a raw classifier score (probability)
    pub fn from_score(score: f64) -> Self {
        Self(score * 100.0)
    }

    /// From an already-scaled percentage
    pub fn from_percent(percent: f64) -> Self {
        Self(percent)
    }

    pub fn percent(&self) -> f64 {
        self.0
    }

    pub fn probability(&self) -> f64 {
        self.0 / 100.0
    }

    pub fn is_exoplanet(&self) -> bool {
        self.0 > Self::EXOPLANET_THRESHOLD
    }
}

/// Planet class inferred from confidence alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlanetType {
    #[serde(rename = "Hot Jupiter")]
    HotJupiter,
    #[serde(rename = "Super-Earth")]
    SuperEarth,
    #[serde(rename = "Neptune-like")]
    NeptuneLike,
    Unknown,
}

impl PlanetType {
    /// Piecewise thresholds, strict greater-than, highest first
    pub fn from_confidence(confidence: Confidence) -> Self {
        let c = confidence.percent();
        if c > 80.0 {
            PlanetType::HotJupiter
        } else if c > 60.0 {
            PlanetType::SuperEarth
        } else if c > 40.0 {
            PlanetType::NeptuneLike
        } else {
            PlanetType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanetType::HotJupiter => "Hot Jupiter",
            PlanetType::SuperEarth => "Super-Earth",
            PlanetType::NeptuneLike => "Neptune-like",
            PlanetType::Unknown => "Unknown",
        }
    }
}

/// A derived field, or the explicit "not applicable" marker
#[derive(Debug, Clone, PartialEq)]
pub enum Estimate<T> {
    Value(T),
    NotApplicable,
}

impl<T> Estimate<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Estimate::Value(v) => Some(v),
            Estimate::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Estimate::Value(_))
    }
}

impl<T: Serialize> Serialize for Estimate<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Estimate::Value(v) => v.serialize(serializer),
            Estimate::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

/// Outcome of one prediction request
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub is_exoplanet: bool,
    pub confidence: Confidence,
    pub planet_type: PlanetType,
    /// Days; placeholder, not derived from the input
    pub orbital_period: Estimate<f64>,
    /// Kelvin; placeholder, not derived from the input
    pub temperature: Estimate<f64>,
    /// Fraction formatted to 4 decimals; placeholder, not derived from the input
    pub transit_depth: Estimate<String>,
    pub features_used: usize,
}

/// Wire format of a successful prediction
///
/// Several fields are duplicated under a short alias for older clients.
#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    #[serde(rename = "isExoplanet")]
    pub is_exoplanet: bool,
    pub prediction: u8,
    pub confidence: f64,
    pub probability: f64,
    #[serde(rename = "planetType")]
    pub planet_type: PlanetType,
    #[serde(rename = "type")]
    pub kind: PlanetType,
    #[serde(rename = "orbitalPeriod")]
    pub orbital_period: Estimate<f64>,
    pub period: Estimate<f64>,
    pub temperature: Estimate<f64>,
    pub temp: Estimate<f64>,
    #[serde(rename = "transitDepth")]
    pub transit_depth: Estimate<String>,
    pub model_version: &'static str,
    pub features_used: usize,
}

impl From<&PredictionResult> for PredictResponse {
    fn from(result: &PredictionResult) -> Self {
        let orbital_period = round_estimate(&result.orbital_period, 2);
        let temperature = round_estimate(&result.temperature, 2);

        Self {
            is_exoplanet: result.is_exoplanet,
            prediction: u8::from(result.is_exoplanet),
            confidence: round_to(result.confidence.percent(), 2),
            probability: round_to(result.confidence.probability(), 4),
            planet_type: result.planet_type,
            kind: result.planet_type,
            period: orbital_period.clone(),
            orbital_period,
            temp: temperature.clone(),
            temperature,
            transit_depth: result.transit_depth.clone(),
            model_version: MODEL_VERSION,
            features_used: result.features_used,
        }
    }
}

fn round_estimate(estimate: &Estimate<f64>, decimals: i32) -> Estimate<f64> {
    match estimate {
        Estimate::Value(v) => Estimate::Value(round_to(*v, decimals)),
        Estimate::NotApplicable => Estimate::NotApplicable,
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
