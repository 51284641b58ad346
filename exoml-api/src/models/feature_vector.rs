//! Classifier input tensor

use super::artifacts::InputShape;
use crate::services::feature_normalizer::PreprocessError;

/// Batch-of-one input of shape (1, T, C), stored row-major
///
/// Every element is finite; construction fails otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    shape: InputShape,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(shape: InputShape, values: Vec<f64>) -> Result<Self, PreprocessError> {
        if values.len() != shape.len() {
            return Err(PreprocessError::LengthMismatch {
                expected: shape.len(),
                actual: values.len(),
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(PreprocessError::NonFiniteValue { index });
        }
        Ok(Self { shape, values })
    }

    /// Full tensor shape including the batch dimension
    pub fn shape(&self) -> [usize; 3] {
        [1, self.shape.timesteps, self.shape.channels]
    }

    pub fn input_shape(&self) -> InputShape {
        self.shape
    }

    pub fn timesteps(&self) -> usize {
        self.shape.timesteps
    }

    pub fn channels(&self) -> usize {
        self.shape.channels
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Single-precision copy for runtimes that take f32 tensors
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }
}
