//! Prediction Pipeline
//!
//! Artifact Store → Feature Normalizer → Inference Engine → Outcome
//! Synthesizer, run to completion per request. Artifact loading and the
//! classifier call run on blocking workers under configurable deadlines.
//! Any failure discards the request's intermediate state.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use exoml_common::config::TimeoutConfig;
use thiserror::Error;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use super::artifact_store::{ArtifactLoadError, ArtifactStore, Readiness};
use super::feature_normalizer::{FeatureNormalizer, PreprocessError};
use super::inference_engine::{infer, InferenceError};
use super::outcome_synthesizer::synthesize;
use crate::models::{ArtifactBundle, PredictionResult};

/// Pipeline stage, for timeout and worker failure reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ArtifactLoad,
    Inference,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ArtifactLoad => "artifact load",
            Stage::Inference => "inference",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure of a prediction request
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    ArtifactLoad(#[from] ArtifactLoadError),

    #[error("error preprocessing data: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Stage exceeded its configured deadline
    #[error("{stage} exceeded {limit_ms}ms deadline")]
    Timeout { stage: Stage, limit_ms: u64 },

    /// Blocking worker panicked or was cancelled
    #[error("{stage} worker failed: {cause}")]
    WorkerFailed { stage: Stage, cause: String },
}

/// Request pipeline over one artifact store
pub struct PredictionPipeline {
    store: Arc<ArtifactStore>,
    normalizer: FeatureNormalizer,
    timeouts: TimeoutConfig,
}

impl PredictionPipeline {
    pub fn new(store: ArtifactStore, normalizer: FeatureNormalizer, timeouts: TimeoutConfig) -> Self {
        Self {
            store: Arc::new(store),
            normalizer,
            timeouts,
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.store.readiness()
    }

    /// Load artifacts ahead of the first request, under the load deadline
    pub async fn preload(&self) -> Result<(), PipelineError> {
        self.load_bundle().await.map(|_| ())
    }

    /// Run one request on the async runtime
    pub async fn predict(&self, raw: String) -> Result<PredictionResult, PipelineError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("predict", %request_id, bytes = raw.len());

        async move {
            let bundle = self.load_bundle().await?;
            let vector = self.normalizer.normalize(&raw, &bundle)?;
            let features_used = vector.timesteps();

            let confidence = run_stage(Stage::Inference, self.timeouts.inference(), {
                let bundle = Arc::clone(&bundle);
                move || infer(&vector, bundle.classifier.as_ref())
            })
            .await??;

            let result = synthesize(confidence, features_used, &mut rand::thread_rng());
            debug!(
                is_exoplanet = result.is_exoplanet,
                confidence = confidence.percent(),
                planet_type = result.planet_type.as_str(),
                "Prediction complete"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// Same stages on the calling thread, without deadlines
    pub fn predict_blocking(&self, raw: &str) -> Result<PredictionResult, PipelineError> {
        let bundle = self.store.get_or_load()?;
        let vector = self.normalizer.normalize(raw, &bundle)?;
        let confidence = infer(&vector, bundle.classifier.as_ref())?;
        Ok(synthesize(confidence, vector.timesteps(), &mut rand::thread_rng()))
    }

    async fn load_bundle(&self) -> Result<Arc<ArtifactBundle>, PipelineError> {
        // Skip the worker hop once loaded
        if let Some(bundle) = self.store.loaded() {
            return Ok(bundle);
        }

        let store = Arc::clone(&self.store);
        let bundle = run_stage(Stage::ArtifactLoad, self.timeouts.artifact_load(), move || {
            store.get_or_load()
        })
        .await??;
        Ok(bundle)
    }
}

/// Run blocking work on the worker pool, bounded by an optional deadline
///
/// On timeout the worker keeps running to completion in the background; a
/// late artifact load still populates the store for the next request.
fn run_stage<T, F>(
    stage: Stage,
    limit: Option<Duration>,
    work: F,
) -> impl Future<Output = Result<T, PipelineError>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    async move {
        let handle = tokio::task::spawn_blocking(work);

        let joined = match limit {
            Some(limit) => tokio::time::timeout(limit, handle)
                .await
                .map_err(|_| PipelineError::Timeout {
                    stage,
                    limit_ms: limit.as_millis() as u64,
                })?,
            None => handle.await,
        };

        joined.map_err(|e| PipelineError::WorkerFailed {
            stage,
            cause: e.to_string(),
        })
    }
}
