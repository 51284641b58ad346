//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use exoml_api::models::{ArtifactBundle, FeatureVector, FittedScaler, ModelMetadata};
use exoml_api::services::{
    ArtifactLoadError, ArtifactLoader, ArtifactStore, Classifier, FeatureNormalizer, InferenceError,
    PredictionPipeline,
};
use exoml_common::config::TimeoutConfig;

/// Returns a fixed score and records every input it sees
#[derive(Debug)]
pub struct RecordingClassifier {
    pub score: f64,
    pub delay: Option<Duration>,
    pub inputs: Arc<Mutex<Vec<FeatureVector>>>,
}

impl Classifier for RecordingClassifier {
    fn predict(&self, input: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.inputs.lock().unwrap().push(input.clone());
        Ok(vec![self.score])
    }
}

/// In-memory loader with a load counter
pub struct MockLoader {
    pub score: f64,
    pub scaler: Option<FittedScaler>,
    pub metadata: Option<ModelMetadata>,
    /// Number of leading calls that fail
    pub failures: usize,
    pub load_delay: Option<Duration>,
    pub inference_delay: Option<Duration>,
    pub calls: Arc<AtomicUsize>,
    pub inputs: Arc<Mutex<Vec<FeatureVector>>>,
}

impl MockLoader {
    pub fn scoring(score: f64) -> Self {
        Self {
            score,
            scaler: None,
            metadata: None,
            failures: 0,
            load_delay: None,
            inference_delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ArtifactLoader for MockLoader {
    fn load(&self) -> Result<ArtifactBundle, ArtifactLoadError> {
        if let Some(delay) = self.load_delay {
            std::thread::sleep(delay);
        }

        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(ArtifactLoadError::new(
                "model_files/exoplanet_bilstm.onnx",
                "No such file or directory (os error 2)",
            ));
        }

        Ok(ArtifactBundle {
            classifier: Box::new(RecordingClassifier {
                score: self.score,
                delay: self.inference_delay,
                inputs: Arc::clone(&self.inputs),
            }),
            scaler: self.scaler.clone(),
            metadata: self.metadata.clone(),
        })
    }
}

/// Probes kept by a test after the loader moves into the store
pub struct Probes {
    pub calls: Arc<AtomicUsize>,
    pub inputs: Arc<Mutex<Vec<FeatureVector>>>,
}

impl Probes {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<FeatureVector> {
        self.inputs.lock().unwrap().clone()
    }
}

pub fn pipeline_with(loader: MockLoader, timeouts: TimeoutConfig) -> (PredictionPipeline, Probes) {
    let probes = Probes {
        calls: Arc::clone(&loader.calls),
        inputs: Arc::clone(&loader.inputs),
    };
    let pipeline = PredictionPipeline::new(
        ArtifactStore::new(loader),
        FeatureNormalizer::default(),
        timeouts,
    );
    (pipeline, probes)
}

pub fn pipeline(loader: MockLoader) -> (PredictionPipeline, Probes) {
    pipeline_with(loader, TimeoutConfig::default())
}
