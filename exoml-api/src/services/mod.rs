//! Prediction services for exoml-api

pub mod artifact_store;
pub mod feature_normalizer;
pub mod inference_engine;
pub mod outcome_synthesizer;
pub mod prediction_pipeline;
pub mod tabular;

pub use artifact_store::{
    ArtifactLoadError, ArtifactLoader, ArtifactPaths, ArtifactStore, FsArtifactLoader, Readiness,
};
pub use feature_normalizer::{FeatureNormalizer, PreprocessError};
pub use inference_engine::{infer, Classifier, InferenceError, OnnxClassifier};
pub use outcome_synthesizer::synthesize;
pub use prediction_pipeline::{PipelineError, PredictionPipeline, Stage};
pub use tabular::{read_numeric_table, NumericTable};
