//! Target column resolution
//!
//! Files from different sources name their label column differently. The
//! label is taken from the first candidate name (in priority order) that
//! exists in the consolidated table; rows with no value in any candidate
//! column carry no label at all and are dropped.

use std::collections::BTreeMap;

use log::{debug, info};
use polars::prelude::*;

use super::loader::RawTable;
use super::schema::TableSchema;
use crate::error::{PipelineError, Result};

/// Display name used for rows whose resolved label is null
pub const MISSING_LABEL: &str = "<missing>";

/// Feature table and row-aligned labels after the target has been split off
#[derive(Debug, Clone)]
pub struct LabeledTable {
    /// Name of the chosen target column
    pub target: String,
    /// Remaining columns (target removed)
    pub features: RawTable,
    /// One label per feature row; `None` when the chosen column was null
    pub labels: Vec<Option<String>>,
    /// Rows dropped because every candidate column was null
    pub dropped_rows: usize,
}

/// Pick the first candidate, in list order, that exists as a column
pub fn resolve_target(schema: &TableSchema, candidates: &[String]) -> Result<String> {
    candidates
        .iter()
        .find(|c| schema.contains(c))
        .cloned()
        .ok_or_else(|| PipelineError::NoTargetColumn {
            candidates: candidates.to_vec(),
            available: schema.names(),
        })
}

/// Candidate names that exist in the table, in priority order
pub fn present_candidates(schema: &TableSchema, candidates: &[String]) -> Vec<String> {
    candidates
        .iter()
        .filter(|c| schema.contains(c))
        .cloned()
        .collect()
}

/// Drop rows whose value is null in every candidate column present in the table
///
/// A row survives if any candidate column holds a value, even when that column
/// is not the one eventually chosen as target.
pub fn drop_unlabeled_rows(table: &RawTable, candidates: &[String]) -> Result<RawTable> {
    let present = present_candidates(table.schema(), candidates);
    if present.is_empty() {
        return Err(PipelineError::NoTargetColumn {
            candidates: candidates.to_vec(),
            available: table.schema().names(),
        });
    }

    let df = table.frame();
    let mut keep = vec![false; df.height()];
    for name in &present {
        let missing = missing_mask(df.column(name)?)?;
        for (flag, is_missing) in keep.iter_mut().zip(missing) {
            if !is_missing {
                *flag = true;
            }
        }
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let filtered = df.filter(&mask)?;
    debug!(
        "Dropped {} row(s) with no value in any of {:?}",
        df.height() - filtered.height(),
        present
    );
    Ok(table.with_frame(filtered))
}

/// Per-row flag: null, or NaN in a float column
fn missing_mask(col: &Column) -> Result<Vec<bool>> {
    Ok(match col.dtype() {
        DataType::Float32 | DataType::Float64 => col
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.map_or(true, f64::is_nan))
            .collect(),
        _ => col
            .as_materialized_series()
            .is_null()
            .into_iter()
            .map(|v| v.unwrap_or(true))
            .collect(),
    })
}

/// Resolve the target, drop unlabeled rows and split labels from features
///
/// With `exclude_other_candidates`, candidate columns that were not chosen are
/// removed from the features as well; otherwise only the target is removed.
pub fn split_target(
    table: &RawTable,
    candidates: &[String],
    exclude_other_candidates: bool,
) -> Result<LabeledTable> {
    let target = resolve_target(table.schema(), candidates)?;
    let filtered = drop_unlabeled_rows(table, candidates)?;
    let dropped_rows = table.height() - filtered.height();

    if filtered.height() == 0 {
        return Err(PipelineError::NoLabeledRows { target });
    }

    let labels = column_to_string_vec(filtered.frame().column(&target)?)?;

    let to_remove = if exclude_other_candidates {
        present_candidates(table.schema(), candidates)
    } else {
        vec![target.clone()]
    };
    let features = filtered.with_frame(filtered.frame().drop_many(to_remove.iter().cloned()));

    info!(
        "Resolved target '{}' ({} labeled rows, {} dropped)",
        target,
        labels.len(),
        dropped_rows
    );

    Ok(LabeledTable {
        target,
        features,
        labels,
        dropped_rows,
    })
}

/// Count rows per class, most frequent first (ties by name)
///
/// Null labels are counted under [`MISSING_LABEL`].
pub fn class_distribution(labels: &[Option<String>]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for label in labels {
        let key = label.clone().unwrap_or_else(|| MISSING_LABEL.to_string());
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut distribution: Vec<(String, usize)> = counts.into_iter().collect();
    distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    distribution
}

/// Convert a column to a Vec of Option<String>, one entry per row
pub fn column_to_string_vec(col: &Column) -> Result<Vec<Option<String>>> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = col.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.filter(|n| !n.is_nan()).map(|n| format!("{}", n)))
                .collect()
        }
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| b.to_string()))
            .collect(),
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };

    Ok(values)
}
