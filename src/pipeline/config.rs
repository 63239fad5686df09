//! Pipeline configuration shared by the training and inference paths

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Label column names tried in priority order when none is configured
pub const DEFAULT_TARGET_CANDIDATES: [&str; 4] = ["disposition", "Disposition", "LABEL", "label"];

/// File extensions picked up from the data directory by default
pub const DEFAULT_EXTENSIONS: [&str; 1] = ["csv"];

/// Default number of rows polars inspects when inferring CSV column types
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 10_000;

/// Settings for ingestion and target resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the tabular observation files
    pub data_dir: PathBuf,
    /// Extensions (without the dot) of files to ingest, matched case-insensitively
    pub extensions: Vec<String>,
    /// Acceptable target column names, highest priority first
    pub target_candidates: Vec<String>,
    /// Rows used for CSV schema inference; 0 scans the whole file
    pub infer_schema_length: usize,
    /// Also remove non-chosen candidate columns from the features
    pub exclude_other_candidates: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            target_candidates: DEFAULT_TARGET_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            infer_schema_length: DEFAULT_INFER_SCHEMA_LENGTH,
            exclude_other_candidates: false,
        }
    }
}

impl PipelineConfig {
    /// Default configuration reading from `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Polars' schema inference length, where `None` means a full scan
    pub fn schema_length(&self) -> Option<usize> {
        schema_length(self.infer_schema_length)
    }
}

/// Convert the CLI convention (0 = full scan) into polars' `Option`
pub fn schema_length(infer_schema_length: usize) -> Option<usize> {
    if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    }
}
