//! Data models for exoml-api

pub mod artifacts;
pub mod feature_vector;
pub mod prediction;

pub use artifacts::{ArtifactBundle, FittedScaler, InputShape, ModelMetadata};
pub use feature_vector::FeatureVector;
pub use prediction::{
    Confidence, Estimate, PlanetType, PredictRequest, PredictResponse, PredictionResult,
    MODEL_VERSION, NOT_APPLICABLE,
};
