//! Integration tests for model artifact persistence

use schemalock::error::PipelineError;
use schemalock::model::{ForestParams, ModelArtifact, ARTIFACT_FORMAT};
use schemalock::pipeline::{fit_artifact, build_training_set, PipelineConfig};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::create_separable_dir;

fn trained_artifact() -> ModelArtifact {
    let (dir, _) = create_separable_dir(10);
    let set = build_training_set(&PipelineConfig::with_data_dir(dir.path())).unwrap();
    let params = ForestParams {
        n_estimators: 4,
        ..Default::default()
    };
    fit_artifact(&set, &params).unwrap().artifact
}

fn rewrite(path: &Path, edit: impl FnOnce(&mut Value)) {
    let mut value: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    edit(&mut value);
    std::fs::write(path, serde_json::to_string(&value).unwrap()).unwrap();
}

fn assert_corrupt(path: &Path, needle: &str) {
    match ModelArtifact::load(path) {
        Err(PipelineError::ArtifactCorrupt { reason, .. }) => {
            assert!(reason.contains(needle), "unexpected reason: {}", reason)
        }
        other => panic!("expected ArtifactCorrupt, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_load_returns_identical_schema() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("model.json");
    let artifact = trained_artifact();

    artifact.persist(&path).unwrap();
    let loaded = ModelArtifact::load(&path).unwrap();

    assert_eq!(loaded.feature_columns(), artifact.feature_columns());
    assert_eq!(loaded.metadata(), artifact.metadata());

    let (model, columns) = loaded.into_parts();
    assert_eq!(columns, vec!["color_blue", "color_green", "color_red", "noise", "signal"]);
    assert_eq!(model.trees().len(), 4);
}

#[test]
fn test_persist_replaces_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("model.json");
    std::fs::write(&path, "old contents").unwrap();

    trained_artifact().persist(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains(ARTIFACT_FORMAT));
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[test]
fn test_persist_into_missing_directory_fails_cleanly() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing").join("model.json");

    let err = trained_artifact().persist(&path).unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
    assert!(!path.exists());
}

#[test]
fn test_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = ModelArtifact::load(&temp_dir.path().join("none.json")).unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
}

#[test]
fn test_corrupt_artifacts_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("model.json");
    let artifact = trained_artifact();

    artifact.persist(&path).unwrap();
    rewrite(&path, |v| v["format"] = json!("something-else"));
    assert_corrupt(&path, "format tag");

    artifact.persist(&path).unwrap();
    rewrite(&path, |v| v["version"] = json!(99));
    assert_corrupt(&path, "version");

    artifact.persist(&path).unwrap();
    rewrite(&path, |v| v["feature_columns"] = json!([]));
    assert_corrupt(&path, "empty");

    artifact.persist(&path).unwrap();
    rewrite(&path, |v| {
        v["feature_columns"] = json!(["a", "a", "b", "c", "d"]);
    });
    assert_corrupt(&path, "duplicate");

    artifact.persist(&path).unwrap();
    rewrite(&path, |v| {
        v.as_object_mut().unwrap().remove("model");
    });
    assert_corrupt(&path, "model");

    std::fs::write(&path, "not json at all").unwrap();
    assert!(matches!(
        ModelArtifact::load(&path),
        Err(PipelineError::ArtifactCorrupt { .. })
    ));
}
