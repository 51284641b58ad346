//! Artifact Store
//!
//! Owns the process-wide bundle (classifier, scaler, metadata). The first
//! `get_or_load` call runs the loader; later calls return the cached
//! `Arc` without touching storage. Concurrent first callers block on the
//! same load. A failed load leaves the slot empty so the next call retries.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use exoml_common::config::ArtifactFiles;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::feature_normalizer::FeatureNormalizer;
use super::inference_engine::OnnxClassifier;
use crate::models::{ArtifactBundle, FittedScaler, ModelMetadata};

/// Artifact missing or not deserializable
#[derive(Debug, Clone, Error)]
#[error("failed to load artifact {}: {cause}", .path.display())]
pub struct ArtifactLoadError {
    pub path: PathBuf,
    pub cause: String,
}

impl ArtifactLoadError {
    pub fn new(path: impl Into<PathBuf>, cause: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cause: cause.into(),
        }
    }
}

/// Produces a fresh bundle; called at most once per successful load
pub trait ArtifactLoader: Send + Sync {
    fn load(&self) -> Result<ArtifactBundle, ArtifactLoadError>;
}

/// Absolute locations of the three artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    /// Resolve configured file names against the model directory
    pub fn resolve(model_dir: &Path, files: &ArtifactFiles) -> Self {
        Self {
            model: model_dir.join(&files.model),
            scaler: model_dir.join(&files.scaler),
            metadata: model_dir.join(&files.metadata),
        }
    }
}

/// Loads artifacts from the model directory
///
/// Metadata and scaler are read first: the metadata decides the shape the
/// classifier's input is pinned to.
#[derive(Debug, Clone)]
pub struct FsArtifactLoader {
    paths: ArtifactPaths,
    normalizer: FeatureNormalizer,
}

impl FsArtifactLoader {
    pub fn new(paths: ArtifactPaths, normalizer: FeatureNormalizer) -> Self {
        Self { paths, normalizer }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }
}

impl ArtifactLoader for FsArtifactLoader {
    fn load(&self) -> Result<ArtifactBundle, ArtifactLoadError> {
        let started = Instant::now();

        let metadata: Option<ModelMetadata> = read_json_artifact(&self.paths.metadata)?;
        if let Some(meta) = &metadata {
            meta.validate()
                .map_err(|cause| ArtifactLoadError::new(&self.paths.metadata, cause))?;
        }
        info!(path = %self.paths.metadata.display(), present = metadata.is_some(), "Metadata loaded");

        let scaler: Option<FittedScaler> = read_json_artifact(&self.paths.scaler)?;
        if let Some(scaler) = &scaler {
            scaler
                .validate()
                .map_err(|cause| ArtifactLoadError::new(&self.paths.scaler, cause))?;
        }
        info!(path = %self.paths.scaler.display(), present = scaler.is_some(), "Scaler loaded");

        let shape = self.normalizer.expected_shape(
            metadata.as_ref().and_then(|m| m.input_shape),
            metadata.as_ref().and_then(|m| m.feature_names.as_deref()),
        );
        let classifier = OnnxClassifier::load(&self.paths.model, shape)
            .map_err(|e| ArtifactLoadError::new(&self.paths.model, format!("{:#}", e)))?;
        info!(path = %self.paths.model.display(), %shape, "Classifier loaded");

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "Artifacts ready");

        Ok(ArtifactBundle {
            classifier: Box::new(classifier),
            scaler,
            metadata,
        })
    }
}

/// Read a JSON artifact; a `null` document yields `None`
fn read_json_artifact<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ArtifactLoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| ArtifactLoadError::new(path, e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| ArtifactLoadError::new(path, e.to_string()))
}

/// Independent readiness flags, one per artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub model_loaded: bool,
    pub scaler_loaded: bool,
    pub metadata_loaded: bool,
}

/// Lazily-initialized, load-once artifact cache
pub struct ArtifactStore {
    loader: Box<dyn ArtifactLoader>,
    bundle: OnceCell<Arc<ArtifactBundle>>,
}

impl ArtifactStore {
    pub fn new(loader: impl ArtifactLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            bundle: OnceCell::new(),
        }
    }

    /// Return the cached bundle, loading it on first use
    pub fn get_or_load(&self) -> Result<Arc<ArtifactBundle>, ArtifactLoadError> {
        self.bundle
            .get_or_try_init(|| {
                info!("Loading model artifacts");
                self.loader.load().map(Arc::new).map_err(|e| {
                    warn!(path = %e.path.display(), cause = %e.cause, "Artifact load failed");
                    e
                })
            })
            .map(Arc::clone)
    }

    /// Bundle if already loaded; never triggers a load
    pub fn loaded(&self) -> Option<Arc<ArtifactBundle>> {
        self.bundle.get().map(Arc::clone)
    }

    pub fn readiness(&self) -> Readiness {
        match self.bundle.get() {
            Some(bundle) => Readiness {
                model_loaded: true,
                scaler_loaded: bundle.scaler.is_some(),
                metadata_loaded: bundle.metadata.is_some(),
            },
            None => Readiness::default(),
        }
    }
}
