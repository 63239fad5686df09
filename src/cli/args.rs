//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::explain::{PermutationOptions, ShapOptions};
use crate::model::ForestParams;
use crate::pipeline::PipelineConfig;

/// Schemalock - Train a tabular classifier and score new data against its exact feature schema
#[derive(Parser, Debug)]
#[command(name = "schemalock")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Consolidate a directory of labeled files, train a model and write the artifact
    Train(TrainArgs),

    /// Score a new data file with a trained model artifact
    Predict(PredictArgs),

    /// Rank features by permutation importance on labeled data
    Importance(ImportanceArgs),

    /// Estimate SHAP values for the rows of a data file
    Shap(ShapArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding the observation files
    #[arg(short, long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Model artifact output path
    #[arg(short, long, default_value = "model.json")]
    pub output: PathBuf,

    /// Target column names to try, highest priority first (comma-separated)
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "disposition,Disposition,LABEL,label"
    )]
    pub target_candidates: Vec<String>,

    /// File extensions to ingest from the data directory (comma-separated).
    /// Supported: csv, parquet
    #[arg(long, value_delimiter = ',', default_value = "csv")]
    pub extensions: Vec<String>,

    /// Seed for bootstrap sampling and feature subsampling
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Number of trees in the forest
    #[arg(long, default_value = "100", value_parser = validate_positive)]
    pub n_estimators: usize,

    /// Maximum tree depth. Trees grow until leaves are pure when omitted.
    #[arg(long, value_parser = validate_positive)]
    pub max_depth: Option<usize>,

    /// Minimum number of rows a node needs before it may be split
    #[arg(long, default_value = "2", value_parser = validate_min_samples_split)]
    pub min_samples_split: usize,

    /// Features examined per split. Defaults to sqrt(number of features).
    #[arg(long, value_parser = validate_positive)]
    pub max_features: Option<usize>,

    /// Also remove candidate label columns that were not chosen as target
    #[arg(long, default_value = "false")]
    pub exclude_other_candidates: bool,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,
}

impl TrainArgs {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            data_dir: self.data_dir.clone(),
            extensions: self.extensions.clone(),
            target_candidates: self.target_candidates.clone(),
            infer_schema_length: self.infer_schema_length,
            exclude_other_candidates: self.exclude_other_candidates,
        }
    }

    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: self.max_features,
            seed: self.seed,
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Trained model artifact
    #[arg(short, long)]
    pub model: PathBuf,

    /// New data file to score (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Write predictions to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of predictions to print
    #[arg(long, default_value = "20")]
    pub show: usize,

    /// Number of rows to use for schema inference (CSV only). Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Args, Debug)]
pub struct ImportanceArgs {
    /// Trained model artifact
    #[arg(short, long)]
    pub model: PathBuf,

    /// Directory holding labeled observation files
    #[arg(short, long, default_value = "data")]
    pub data_dir: PathBuf,

    /// File extensions to ingest from the data directory (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "csv")]
    pub extensions: Vec<String>,

    /// Shuffles per feature
    #[arg(long, default_value = "30", value_parser = validate_positive)]
    pub repeats: usize,

    /// Seed for the column shuffles
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Only show the N most important features
    #[arg(long)]
    pub top: Option<usize>,

    /// Export the ranked importances to a JSON file
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Number of rows to use for schema inference (CSV only). Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

impl ImportanceArgs {
    /// Configuration that rebuilds the labeled matrix for the artifact's target
    pub fn pipeline_config(&self, target: &str) -> PipelineConfig {
        PipelineConfig {
            data_dir: self.data_dir.clone(),
            extensions: self.extensions.clone(),
            target_candidates: vec![target.to_string()],
            infer_schema_length: self.infer_schema_length,
            exclude_other_candidates: false,
        }
    }

    pub fn options(&self) -> PermutationOptions {
        PermutationOptions {
            n_repeats: self.repeats,
            seed: self.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct ShapArgs {
    /// Trained model artifact
    #[arg(short, long)]
    pub model: PathBuf,

    /// Data file whose rows are explained (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Background data file. Defaults to the input file.
    #[arg(long)]
    pub background: Option<PathBuf>,

    /// Maximum number of background rows (deterministic subsample)
    #[arg(long, default_value = "50", value_parser = validate_positive)]
    pub background_rows: usize,

    /// Random feature orders sampled per (row, background row) pair
    #[arg(long, default_value = "10", value_parser = validate_positive)]
    pub permutations: usize,

    /// Only explain the first N rows of the input
    #[arg(long, value_parser = validate_positive)]
    pub max_rows: Option<usize>,

    /// Class whose probability is explained. Defaults to the first class.
    #[arg(long)]
    pub class: Option<String>,

    /// Seed for background subsampling and feature orders
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Only show the N features with the largest mean |SHAP|
    #[arg(long)]
    pub top: Option<usize>,

    /// Export SHAP values and their summary to a JSON file
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Number of rows to use for schema inference (CSV only). Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

impl ShapArgs {
    pub fn options(&self) -> ShapOptions {
        ShapOptions {
            max_background: self.background_rows,
            n_permutations: self.permutations,
            seed: self.seed,
            class: self.class.clone(),
        }
    }
}

/// Validator for counts that must be at least 1
fn validate_positive(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid non-negative integer", s))?;

    if value == 0 {
        Err("value must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Validator for min_samples_split parameter
fn validate_min_samples_split(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid non-negative integer", s))?;

    if value < 2 {
        Err(format!("min_samples_split must be at least 2, got {}", value))
    } else {
        Ok(value)
    }
}
