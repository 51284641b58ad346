//! Filesystem artifact loader failure paths
//!
//! The loader reads metadata, then scaler, then the classifier graph, so
//! each test fixes the earlier files and breaks the one under test.

use std::fs;
use std::path::Path;

use exoml_api::services::{
    ArtifactLoader, ArtifactPaths, ArtifactStore, FeatureNormalizer, FsArtifactLoader,
};
use exoml_common::config::ArtifactFiles;
use tempfile::TempDir;

fn loader(dir: &Path) -> FsArtifactLoader {
    let paths = ArtifactPaths::resolve(dir, &ArtifactFiles::default());
    FsArtifactLoader::new(paths, FeatureNormalizer::default())
}

fn write(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(name), content).expect("Should write artifact");
}

#[test]
fn test_missing_directory_reports_metadata_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist");

    let err = loader(&missing).load().unwrap_err();

    assert_eq!(err.path, missing.join("metadata.json"));
    assert!(err.to_string().contains("metadata.json"));
}

#[test]
fn test_malformed_metadata_json() {
    let dir = TempDir::new().unwrap();
    write(&dir, "metadata.json", "{ \"input_shape\": [39, ");

    let err = loader(dir.path()).load().unwrap_err();

    assert_eq!(err.path, dir.path().join("metadata.json"));
    assert!(!err.cause.is_empty());
}

#[test]
fn test_zero_dimension_shape_rejected() {
    let dir = TempDir::new().unwrap();
    write(&dir, "metadata.json", r#"{"input_shape": [0, 1]}"#);

    let err = loader(dir.path()).load().unwrap_err();

    assert_eq!(err.path, dir.path().join("metadata.json"));
    assert!(err.cause.contains("zero dimension"));
}

#[test]
fn test_scaler_with_unequal_attributes_rejected() {
    let dir = TempDir::new().unwrap();
    write(&dir, "metadata.json", "null");
    write(
        &dir,
        "scaler.json",
        r#"{"kind": "standard", "mean": [0.1, 0.2], "scale": [1.0]}"#,
    );

    let err = loader(dir.path()).load().unwrap_err();

    assert_eq!(err.path, dir.path().join("scaler.json"));
    assert!(err.cause.contains("lengths differ"));
}

#[test]
fn test_unknown_scaler_kind_rejected() {
    let dir = TempDir::new().unwrap();
    write(&dir, "metadata.json", r#"{"feature_names": ["flux"], "extra": true}"#);
    write(&dir, "scaler.json", r#"{"kind": "robust", "center": [0.0]}"#);

    let err = loader(dir.path()).load().unwrap_err();

    assert_eq!(err.path, dir.path().join("scaler.json"));
}

#[test]
fn test_null_optionals_reach_model_load() {
    let dir = TempDir::new().unwrap();
    write(&dir, "metadata.json", "null");
    write(&dir, "scaler.json", "null");

    let err = loader(dir.path()).load().unwrap_err();

    assert_eq!(err.path, dir.path().join("exoplanet_bilstm.onnx"));
}

#[test]
fn test_corrupt_model_rejected() {
    let dir = TempDir::new().unwrap();
    write(&dir, "metadata.json", r#"{"input_shape": [39, 1]}"#);
    write(
        &dir,
        "scaler.json",
        r#"{"kind": "min_max", "min": [0.0], "scale": [0.5]}"#,
    );
    write(&dir, "exoplanet_bilstm.onnx", "not an onnx graph");

    let err = loader(dir.path()).load().unwrap_err();

    assert_eq!(err.path, dir.path().join("exoplanet_bilstm.onnx"));
}

#[test]
fn test_store_stays_empty_after_failed_loads() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(loader(dir.path()));

    assert!(store.get_or_load().is_err());
    assert!(store.get_or_load().is_err());
    assert!(store.loaded().is_none());

    let readiness = store.readiness();
    assert!(!readiness.model_loaded);
    assert!(!readiness.scaler_loaded);
    assert!(!readiness.metadata_loaded);
}
