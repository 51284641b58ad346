//! Feature Normalizer
//!
//! Turns raw tabular text into the fixed-shape tensor the classifier was
//! trained on. The metadata descriptor is the shape/feature contract; when it
//! is absent, `InputShape::FALLBACK` applies.
//!
//! Two policies exist, chosen once per deployment:
//! - **Flattened** (default): all numeric cells, row-major, form one time
//!   series that is zero-padded or truncated to T·C values. The earliest
//!   values win on truncation.
//! - **Aligned**: columns are matched by name to `feature_names`; the first
//!   data row is the sample and absent features are zero.

use exoml_common::config::{MissingValueFill, PreprocessingConfig, PreprocessingPolicy};
use thiserror::Error;
use tracing::{debug, warn};

use super::tabular::{read_numeric_table, NumericTable};
use crate::models::{ArtifactBundle, FeatureVector, InputShape};

/// Preprocessing errors (client input could not be shaped for the classifier)
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// No column held only numeric or missing values
    #[error("no numeric columns found in input; expected numerical flux data")]
    NoNumericColumns,

    /// Every numeric cell was non-finite after filling
    #[error("no valid numeric data found in input after cleaning")]
    NoValidNumericData,

    /// Header row could not be read
    #[error("malformed input: {cause}")]
    MalformedInput { cause: String },

    /// Aligned sample does not match the declared classifier shape
    #[error("shape mismatch: classifier expects {expected}, input provides {actual}")]
    ShapeMismatch {
        expected: InputShape,
        actual: InputShape,
    },

    /// Scaler was fitted on a different number of columns
    #[error("scaler fitted on {expected} columns cannot transform {actual} columns")]
    ScalerMismatch { expected: usize, actual: usize },

    /// Value count differs from the target shape
    #[error("expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Scaling produced a non-finite value
    #[error("non-finite value at position {index} after scaling")]
    NonFiniteValue { index: usize },
}

/// Configured normalizer; holds no per-request state
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureNormalizer {
    policy: PreprocessingPolicy,
    fill: MissingValueFill,
}

impl FeatureNormalizer {
    pub fn new(config: PreprocessingConfig) -> Self {
        Self {
            policy: config.policy,
            fill: config.missing_values,
        }
    }

    pub fn policy(&self) -> PreprocessingPolicy {
        self.policy
    }

    /// Shape the classifier will be fed under this policy
    ///
    /// Used by the artifact loader to pin the classifier's input before the
    /// first request arrives.
    pub fn expected_shape(&self, declared: Option<InputShape>, feature_names: Option<&[String]>) -> InputShape {
        match (self.policy, declared, feature_names) {
            (_, Some(shape), _) => shape,
            (PreprocessingPolicy::Aligned, None, Some(names)) => InputShape::new(names.len(), 1),
            _ => InputShape::FALLBACK,
        }
    }

    /// Build the classifier input for one request
    pub fn normalize(&self, raw: &str, bundle: &ArtifactBundle) -> Result<FeatureVector, PreprocessError> {
        let table = read_numeric_table(raw)?;
        if table.columns.is_empty() {
            return Err(PreprocessError::NoNumericColumns);
        }
        if table.skipped_rows > 0 {
            warn!(skipped = table.skipped_rows, "Skipped malformed input rows");
        }

        let filled = self.fill_missing(&table);

        match self.policy {
            PreprocessingPolicy::Flattened => self.flattened(&filled, bundle),
            PreprocessingPolicy::Aligned => self.aligned(&table.columns, &filled, bundle),
        }
    }

    fn fill_missing(&self, table: &NumericTable) -> Vec<Vec<f64>> {
        let fills: Vec<f64> = match self.fill {
            MissingValueFill::Zero => vec![0.0; table.columns.len()],
            MissingValueFill::ColumnMean => (0..table.columns.len())
                .map(|col| table.column_mean(col).unwrap_or(0.0))
                .collect(),
        };

        table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&fills)
                    .map(|(cell, fill)| cell.unwrap_or(*fill))
                    .collect()
            })
            .collect()
    }

    fn flattened(&self, rows: &[Vec<f64>], bundle: &ArtifactBundle) -> Result<FeatureVector, PreprocessError> {
        let shape = match bundle.declared_shape() {
            Some(shape) => shape,
            None => {
                debug!(shape = %InputShape::FALLBACK, "No input_shape in metadata, using fallback");
                InputShape::FALLBACK
            }
        };

        let mut sequence: Vec<f64> = rows
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .collect();

        if sequence.is_empty() {
            return Err(PreprocessError::NoValidNumericData);
        }

        debug!(
            values = sequence.len(),
            timesteps = shape.timesteps,
            channels = shape.channels,
            "Fitting sequence to classifier shape"
        );
        sequence.resize(shape.len(), 0.0);

        if let Some(scaler) = &bundle.scaler {
            scaler.transform_in_place(&mut sequence, shape.channels)?;
        }

        FeatureVector::new(shape, sequence)
    }

    fn aligned(
        &self,
        columns: &[String],
        rows: &[Vec<f64>],
        bundle: &ArtifactBundle,
    ) -> Result<FeatureVector, PreprocessError> {
        // The table has at least one row whenever it has numeric columns
        let first = rows.first().ok_or(PreprocessError::NoValidNumericData)?;

        let mut sample: Vec<f64> = match bundle.feature_names() {
            Some(names) => names
                .iter()
                .map(|name| {
                    columns
                        .iter()
                        .position(|c| c == name)
                        .map(|col| first[col])
                        .unwrap_or(0.0)
                })
                .collect(),
            None => first.clone(),
        };

        for value in sample.iter_mut().filter(|v| !v.is_finite()) {
            *value = 0.0;
        }

        let actual = InputShape::new(sample.len(), 1);
        if let Some(expected) = bundle.declared_shape() {
            if expected != actual {
                return Err(PreprocessError::ShapeMismatch { expected, actual });
            }
        }

        if let Some(scaler) = &bundle.scaler {
            // One row of F features: every value is its own column
            scaler.transform_in_place(&mut sample, actual.timesteps)?;
        }

        FeatureVector::new(actual, sample)
    }
}
