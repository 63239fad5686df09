//! Ingestion and consolidation of a directory of tabular files
//!
//! Every matching file is parsed on its own; a file that fails to parse is
//! logged and skipped. The survivors are stacked row-wise with the union of
//! their columns, in file-name order.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use polars::prelude::*;
use rayon::prelude::*;

use super::config::schema_length;
use super::schema::TableSchema;
use crate::error::{PipelineError, Result};

/// A consolidated raw table together with its typed schema
#[derive(Debug, Clone)]
pub struct RawTable {
    frame: DataFrame,
    schema: TableSchema,
    sources: Vec<PathBuf>,
}

impl RawTable {
    /// Wrap a DataFrame, deriving the schema from its dtypes
    pub fn new(frame: DataFrame, sources: Vec<PathBuf>) -> Self {
        let schema = TableSchema::from_frame(&frame);
        Self {
            frame,
            schema,
            sources,
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Files whose rows make up this table, in concatenation order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// Replace the frame, keeping the source list and re-deriving the schema
    pub(crate) fn with_frame(&self, frame: DataFrame) -> Self {
        Self::new(frame, self.sources.clone())
    }
}

/// Options controlling which files are read and how
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Extensions (without the dot), matched case-insensitively
    pub extensions: Vec<String>,
    /// CSV schema inference length; 0 scans the whole file
    pub infer_schema_length: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["csv".to_string()],
            infer_schema_length: super::config::DEFAULT_INFER_SCHEMA_LENGTH,
        }
    }
}

impl From<&super::config::PipelineConfig> for LoadOptions {
    fn from(config: &super::config::PipelineConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            infer_schema_length: config.infer_schema_length,
        }
    }
}

/// A file that was left out of consolidation
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of loading a directory
#[derive(Debug, Clone)]
pub struct Consolidated {
    pub table: RawTable,
    pub skipped: Vec<SkippedFile>,
}

/// List files in `dir` whose extension is in `extensions`, sorted by file name
pub fn discover_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let wanted: Vec<String> = extensions.iter().map(|e| e.to_lowercase()).collect();

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| wanted.contains(&e.to_lowercase()))
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Parse one file into a DataFrame (CSV with header row, or Parquet)
///
/// Any failure, including an unsupported extension, is reported as
/// [`PipelineError::FileParse`] so callers can decide whether to skip it.
pub fn load_table_file(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    read_frame(path, infer_schema_length).map_err(|source| PipelineError::FileParse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_frame(path: &Path, infer_schema_length: usize) -> PolarsResult<DataFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(schema_length(infer_schema_length))
            .finish()?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())?,
        _ => {
            return Err(PolarsError::ComputeError(
                format!(
                    "unsupported file format '{}'. Supported formats: csv, parquet",
                    extension
                )
                .into(),
            ))
        }
    };

    lf.collect()
}

/// Load every matching file in `dir` and concatenate them row-wise
///
/// Files are parsed in parallel; the results are put back into file-name order
/// before concatenation. Column sets may differ between files: the result
/// carries the union of columns, null where a file lacked one.
pub fn load_and_combine(dir: &Path, options: &LoadOptions) -> Result<Consolidated> {
    let files = discover_files(dir, &options.extensions)?;
    debug!("Found {} candidate file(s) in {}", files.len(), dir.display());

    let mut parsed: Vec<(PathBuf, Result<DataFrame>)> = files
        .par_iter()
        .map(|path| (path.clone(), load_table_file(path, options.infer_schema_length)))
        .collect();
    parsed.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));

    let mut frames = Vec::with_capacity(parsed.len());
    let mut sources = Vec::with_capacity(parsed.len());
    let mut skipped = Vec::new();

    for (path, result) in parsed {
        match result {
            Ok(df) => {
                info!("Loaded {} ({} rows)", path.display(), df.height());
                frames.push(df);
                sources.push(path);
            }
            Err(err) => {
                warn!("Skipping file {}: {}", path.display(), err);
                skipped.push(SkippedFile {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }

    if frames.is_empty() {
        return Err(PipelineError::NoParseableFiles {
            dir: dir.to_path_buf(),
            attempted: files.len(),
        });
    }

    let frame = concat_union(frames)?;
    Ok(Consolidated {
        table: RawTable::new(frame, sources),
        skipped,
    })
}

/// Load a single file as a raw table (the inference path)
pub fn load_single_file(path: &Path, infer_schema_length: usize) -> Result<RawTable> {
    let frame = load_table_file(path, infer_schema_length)?;
    Ok(RawTable::new(frame, vec![path.to_path_buf()]))
}

/// Stack frames row-wise over the union of their columns
///
/// Columns are unified to a common supertype (e.g. an integer column in one
/// file and a float column in another become float).
pub fn concat_union(mut frames: Vec<DataFrame>) -> Result<DataFrame> {
    if frames.len() == 1 {
        return Ok(frames.remove(0));
    }

    let lazy: Vec<LazyFrame> = frames.into_iter().map(|df| df.lazy()).collect();
    let args = UnionArgs {
        to_supertypes: true,
        ..Default::default()
    };
    Ok(concat_lf_diagonal(lazy, args)?.collect()?)
}
