//! Inference Engine
//!
//! Runs one normalized vector through the frozen classifier and scales the
//! first output element to a percentage. Out-of-range scores are passed
//! through unclamped; non-finite scores are rejected because they cannot be
//! rendered in the response.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tract_onnx::prelude::*;
use tracing::debug;

use crate::models::{Confidence, FeatureVector, InputShape};

/// Classifier invocation errors
#[derive(Debug, Error)]
#[error("classifier invocation failed: {cause}")]
pub struct InferenceError {
    pub cause: String,
}

impl InferenceError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// Frozen binary classifier
///
/// `predict` is inference-only and returns the flattened output for the
/// batch of one; element 0 is the exoplanet probability.
pub trait Classifier: Send + Sync + fmt::Debug {
    fn predict(&self, input: &FeatureVector) -> Result<Vec<f64>, InferenceError>;
}

/// Score one vector: exactly one classifier invocation
pub fn infer(vector: &FeatureVector, classifier: &dyn Classifier) -> Result<Confidence, InferenceError> {
    let output = classifier.predict(vector)?;

    let score = *output
        .first()
        .ok_or_else(|| InferenceError::new("classifier returned an empty output"))?;

    if !score.is_finite() {
        return Err(InferenceError::new(format!(
            "classifier returned a non-finite score ({})",
            score
        )));
    }

    let confidence = Confidence::from_score(score);
    debug!(score, confidence = confidence.percent(), "Classifier scored input");
    Ok(confidence)
}

/// ONNX export of the trained recurrent classifier
pub struct OnnxClassifier {
    path: PathBuf,
    shape: InputShape,
    plan: TypedRunnableModel<TypedModel>,
}

impl OnnxClassifier {
    /// Load and optimize the graph with its input pinned to (1, T, C)
    pub fn load(path: &Path, shape: InputShape) -> TractResult<Self> {
        let plan = tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(0, f32::fact([1, shape.timesteps, shape.channels]).into())?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self {
            path: path.to_path_buf(),
            shape,
            plan,
        })
    }

    pub fn input_shape(&self) -> InputShape {
        self.shape
    }
}

impl fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("path", &self.path)
            .field("shape", &self.shape)
            .finish()
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        if input.input_shape() != self.shape {
            return Err(InferenceError::new(format!(
                "classifier input pinned to {}, got {}",
                self.shape,
                input.input_shape()
            )));
        }

        let tensor = Tensor::from_shape(&input.shape(), &input.to_f32())
            .map_err(|e| InferenceError::new(format!("{:#}", e)))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::new(format!("{:#}", e)))?;

        let first = outputs
            .first()
            .ok_or_else(|| InferenceError::new("model produced no outputs"))?;

        let view = first
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::new(format!("{:#}", e)))?;

        Ok(view.iter().map(|&v| v as f64).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedClassifier(Vec<f64>);

    impl Classifier for FixedClassifier {
        fn predict(&self, _input: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug)]
    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn predict(&self, _input: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
            Err(InferenceError::new("graph execution failed"))
        }
    }

    fn vector() -> FeatureVector {
        FeatureVector::new(InputShape::FALLBACK, vec![0.0; 39]).unwrap()
    }

    #[test]
    fn test_scales_first_element() {
        let c = infer(&vector(), &FixedClassifier(vec![0.85, 0.15])).unwrap();
        assert!((c.percent() - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_score_not_clamped() {
        let c = infer(&vector(), &FixedClassifier(vec![1.2])).unwrap();
        assert!((c.percent() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_output_is_error() {
        assert!(infer(&vector(), &FixedClassifier(vec![])).is_err());
    }

    #[test]
    fn test_nan_score_is_error() {
        assert!(infer(&vector(), &FixedClassifier(vec![f64::NAN])).is_err());
    }

    #[test]
    fn test_classifier_failure_propagates() {
        let err = infer(&vector(), &FailingClassifier).unwrap_err();
        assert_eq!(err.cause, "graph execution failed");
    }

    #[test]
    fn test_onnx_missing_file_fails_to_load() {
        let result = OnnxClassifier::load(Path::new("/nonexistent/model.onnx"), InputShape::FALLBACK);
        assert!(result.is_err());
    }
}
