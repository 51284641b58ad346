//! Frozen artifact types
//!
//! The classifier, the fitted scaler and the metadata descriptor are
//! produced by the training environment and never modified here. The scaler
//! and metadata files hold the fitted attributes as JSON; either file may
//! contain `null`, meaning "not provided".

use serde::Deserialize;
use std::fmt;

use crate::services::feature_normalizer::PreprocessError;
use crate::services::inference_engine::Classifier;

/// Classifier input shape (timesteps, channels), batch dimension excluded
///
/// Deserializes from a two-element array, e.g. `[39, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "(usize, usize)")]
pub struct InputShape {
    pub timesteps: usize,
    pub channels: usize,
}

impl InputShape {
    /// Shape assumed when metadata is absent or carries no `input_shape`
    pub const FALLBACK: InputShape = InputShape {
        timesteps: 39,
        channels: 1,
    };

    pub const fn new(timesteps: usize, channels: usize) -> Self {
        Self {
            timesteps,
            channels,
        }
    }

    /// Number of scalar values in one sample
    pub fn len(&self) -> usize {
        self.timesteps * self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<(usize, usize)> for InputShape {
    fn from((timesteps, channels): (usize, usize)) -> Self {
        Self::new(timesteps, channels)
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.timesteps, self.channels)
    }
}

/// Metadata descriptor shipped next to the classifier
///
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelMetadata {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    #[serde(default)]
    pub input_shape: Option<InputShape>,
}

impl ModelMetadata {
    /// Reject descriptors no classifier could have been trained against
    pub fn validate(&self) -> Result<(), String> {
        if let Some(shape) = self.input_shape {
            if shape.timesteps == 0 || shape.channels == 0 {
                return Err(format!("input_shape {} has a zero dimension", shape));
            }
        }
        if let Some(names) = &self.feature_names {
            if names.is_empty() {
                return Err("feature_names is empty".to_string());
            }
        }
        Ok(())
    }
}

/// Fitted per-column transform, stored as the transformer's learned attributes
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedScaler {
    /// `(x - mean) / scale`; a zero scale behaves as 1
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl FittedScaler {
    /// Number of columns the scaler was fitted on
    pub fn n_features(&self) -> usize {
        match self {
            FittedScaler::Standard { scale, .. } | FittedScaler::MinMax { scale, .. } => scale.len(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let (offsets, scale) = match self {
            FittedScaler::Standard { mean, scale } => (mean, scale),
            FittedScaler::MinMax { min, scale } => (min, scale),
        };
        if scale.is_empty() {
            return Err("scaler has no fitted columns".to_string());
        }
        if offsets.len() != scale.len() {
            return Err(format!(
                "scaler attribute lengths differ ({} vs {})",
                offsets.len(),
                scale.len()
            ));
        }
        if offsets.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return Err("scaler attributes contain non-finite values".to_string());
        }
        Ok(())
    }

    /// Transform a row-major matrix with `columns` columns in place
    ///
    /// A scaler fitted on a single column applies to every column.
    pub fn transform_in_place(&self, values: &mut [f64], columns: usize) -> Result<(), PreprocessError> {
        let fitted = self.n_features();
        if fitted != 1 && fitted != columns {
            return Err(PreprocessError::ScalerMismatch {
                expected: fitted,
                actual: columns,
            });
        }

        for (i, value) in values.iter_mut().enumerate() {
            let col = if fitted == 1 { 0 } else { i % columns };
            *value = self.transform_one(col, *value);
        }
        Ok(())
    }

    fn transform_one(&self, col: usize, value: f64) -> f64 {
        match self {
            FittedScaler::Standard { mean, scale } => {
                let s = if scale[col] == 0.0 { 1.0 } else { scale[col] };
                (value - mean[col]) / s
            }
            FittedScaler::MinMax { min, scale } => value * scale[col] + min[col],
        }
    }
}

/// The three loaded artifacts, immutable once built
#[derive(Debug)]
pub struct ArtifactBundle {
    pub classifier: Box<dyn Classifier>,
    pub scaler: Option<FittedScaler>,
    pub metadata: Option<ModelMetadata>,
}

impl ArtifactBundle {
    /// `input_shape` from metadata, if the descriptor carries one
    pub fn declared_shape(&self) -> Option<InputShape> {
        self.metadata.as_ref().and_then(|m| m.input_shape)
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.metadata
            .as_ref()
            .and_then(|m| m.feature_names.as_deref())
    }
}
