//! Persisted (model, feature schema) pair
//!
//! The artifact is the only thing that crosses from training to inference.
//! It is written once through a temporary file in the destination directory
//! and renamed into place, so a reader either sees the previous file or the
//! complete new one.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::forest::RandomForest;
use super::Classifier;
use crate::error::{PipelineError, Result};
use crate::pipeline::FeatureMatrix;

/// Format tag written at the top of every artifact file
pub const ARTIFACT_FORMAT: &str = "schemalock-artifact";

/// Current artifact layout version
pub const ARTIFACT_VERSION: u32 = 1;

/// Unix permission bits of a written artifact
#[cfg(unix)]
const ARTIFACT_MODE: u32 = 0o644;

/// Descriptive fields stored next to the model; not needed for prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub crate_version: String,
    /// RFC 3339 timestamp of the training run
    pub created_at: String,
    /// Column the labels were taken from
    pub target_column: String,
    pub training_rows: usize,
}

/// On-disk layout
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArtifactFile {
    format: String,
    version: u32,
    metadata: ArtifactMetadata,
    feature_columns: Vec<String>,
    model: RandomForest,
}

/// A fitted model bound to the ordered feature columns it was trained on
///
/// The two halves can only be obtained together: there is no way to load a
/// model without its schema.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    model: RandomForest,
    feature_columns: Vec<String>,
    metadata: ArtifactMetadata,
}

impl ModelArtifact {
    /// Pair a fitted model with the columns of the matrix it was fitted on
    pub fn new(model: RandomForest, features: &FeatureMatrix, target_column: &str) -> Result<Self> {
        let feature_columns = features.column_names();
        if model.n_features() != feature_columns.len() {
            return Err(PipelineError::InvalidInput {
                reason: format!(
                    "model expects {} features but the matrix has {}",
                    model.n_features(),
                    feature_columns.len()
                ),
            });
        }
        Ok(Self {
            model,
            feature_columns,
            metadata: ArtifactMetadata {
                crate_version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: Utc::now().to_rfc3339(),
                target_column: target_column.to_string(),
                training_rows: features.n_rows(),
            },
        })
    }

    pub fn model(&self) -> &RandomForest {
        &self.model
    }

    /// Training schema: feature names in the exact order the model expects
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn into_parts(self) -> (RandomForest, Vec<String>) {
        (self.model, self.feature_columns)
    }

    /// Write the artifact to `path` atomically
    pub fn persist(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let file = ArtifactFile {
            format: ARTIFACT_FORMAT.to_string(),
            version: ARTIFACT_VERSION,
            metadata: self.metadata.clone(),
            feature_columns: self.feature_columns.clone(),
            model: self.model.clone(),
        };

        let mut tmp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &file)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        // Temp files are created owner-only; the artifact is meant to be shared.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(ARTIFACT_MODE))?;
        }
        tmp.persist(path).map_err(|e| PipelineError::Io(e.error))?;

        info!(
            "Wrote model artifact {} ({} features)",
            path.display(),
            self.feature_columns.len()
        );
        Ok(())
    }

    /// Read an artifact, verifying that it decomposes into (model, schema)
    pub fn load(path: &Path) -> Result<Self> {
        let corrupt = |reason: String| PipelineError::ArtifactCorrupt {
            path: path.to_path_buf(),
            reason,
        };

        let reader = std::io::BufReader::new(File::open(path)?);
        let file: ArtifactFile =
            serde_json::from_reader(reader).map_err(|e| corrupt(e.to_string()))?;

        if file.format != ARTIFACT_FORMAT {
            return Err(corrupt(format!("unexpected format tag '{}'", file.format)));
        }
        if file.version != ARTIFACT_VERSION {
            return Err(corrupt(format!(
                "unsupported artifact version {} (expected {})",
                file.version, ARTIFACT_VERSION
            )));
        }
        if file.feature_columns.is_empty() {
            return Err(corrupt("feature column list is empty".to_string()));
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = file.feature_columns.iter().find(|c| !seen.insert(*c)) {
            return Err(corrupt(format!("duplicate feature column '{}'", dup)));
        }
        if file.model.n_features() != file.feature_columns.len() {
            return Err(corrupt(format!(
                "model expects {} features but {} column names are stored",
                file.model.n_features(),
                file.feature_columns.len()
            )));
        }
        file.model.validate().map_err(corrupt)?;

        Ok(Self {
            model: file.model,
            feature_columns: file.feature_columns,
            metadata: file.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ForestParams;
    use polars::prelude::*;
    use tempfile::TempDir;

    fn fitted() -> (RandomForest, FeatureMatrix) {
        let fm = FeatureMatrix::from_columns(vec![
            Column::new("a".into(), [1.0f64, 2.0, 8.0, 9.0]),
            Column::new("b_x".into(), [0.0f64, 1.0, 0.0, 1.0]),
        ])
        .unwrap();
        let labels: Vec<String> = ["n", "n", "y", "y"].iter().map(|s| s.to_string()).collect();
        let params = ForestParams {
            n_estimators: 3,
            ..Default::default()
        };
        let model = RandomForest::fit(&fm.to_rows().unwrap(), &labels, &params).unwrap();
        (model, fm)
    }

    #[test]
    fn test_round_trip_preserves_schema() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        let (model, fm) = fitted();

        let artifact = ModelArtifact::new(model, &fm, "label").unwrap();
        artifact.persist(&path).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.feature_columns(), fm.column_names().as_slice());
        assert_eq!(loaded.metadata().target_column, "label");

        let rows = fm.to_rows().unwrap();
        assert_eq!(
            loaded.model().predict_proba(&rows),
            artifact.model().predict_proba(&rows)
        );
    }

    #[test]
    fn test_persist_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        let (model, fm) = fitted();

        ModelArtifact::new(model, &fm, "label")
            .unwrap()
            .persist(&path)
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_persisted_artifact_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        let (model, fm) = fitted();
        ModelArtifact::new(model, &fm, "label")
            .unwrap()
            .persist(&path)
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        std::fs::write(&path, b"{\"model\": 3}").unwrap();

        let err = ModelArtifact::load(&path).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactCorrupt { .. }));
    }

    #[test]
    fn test_schema_length_mismatch_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        let (model, fm) = fitted();
        ModelArtifact::new(model, &fm, "label")
            .unwrap()
            .persist(&path)
            .unwrap();

        let mut json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        json["feature_columns"] = serde_json::json!(["a"]);
        std::fs::write(&path, serde_json::to_vec(&json).unwrap()).unwrap();

        let err = ModelArtifact::load(&path).unwrap_err();
        assert!(err.to_string().contains("model expects 2 features"));
    }

    #[test]
    fn test_model_and_matrix_must_agree() {
        let (model, _) = fitted();
        let other = FeatureMatrix::from_columns(vec![Column::new("a".into(), [1.0f64])]).unwrap();
        assert!(ModelArtifact::new(model, &other, "label").is_err());
    }
}
