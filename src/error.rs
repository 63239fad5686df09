//! Error types for the training and inference pipeline.
//!
//! `FileParse` is the only recoverable variant: the loader logs it and moves
//! on to the next file. Every other variant aborts the current run and names
//! the precondition that failed.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by ingestion, encoding, alignment and artifact handling.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A single input file could not be parsed into a table.
    #[error("Failed to parse '{}': {source}", path.display())]
    FileParse {
        path: PathBuf,
        #[source]
        source: polars::prelude::PolarsError,
    },

    /// Not a single input file could be parsed, so there is nothing to concatenate.
    #[error(
        "No parseable input files in '{}' ({attempted} candidate file(s) attempted)",
        dir.display()
    )]
    NoParseableFiles { dir: PathBuf, attempted: usize },

    /// None of the candidate target names exist as a column.
    #[error("No target column found: none of {candidates:?} present in columns {available:?}")]
    NoTargetColumn {
        candidates: Vec<String>,
        available: Vec<String>,
    },

    /// Target filtering removed every row.
    #[error("No labeled rows remain for target column '{target}'")]
    NoLabeledRows { target: String },

    /// Nothing left to train on once the target was removed.
    #[error("Empty feature set: no feature columns remain after removing the target")]
    EmptyFeatureSet,

    /// A generated indicator name collides with another feature name.
    #[error("Duplicate feature name '{name}' produced by encoding")]
    DuplicateFeatureName { name: String },

    /// The artifact file does not decompose into (model, ordered feature names).
    #[error("Corrupt model artifact '{}': {reason}", path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },

    /// Alignment against the stored schema is impossible.
    #[error("Schema mismatch: {reason}")]
    SchemaMismatch { reason: String },

    /// Inputs handed to a fitting or explanation routine are inconsistent.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data frame error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether processing may continue with reduced input after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::FileParse { .. })
    }
}
