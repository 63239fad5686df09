//! Projection of an inference batch onto a trained feature schema
//!
//! A batch encoded from new data has whatever indicator columns its own
//! categorical values produce. Before prediction it is forced into the exact
//! column list the model was trained on:
//!
//! 1. schema columns missing from the batch are added as all-zero columns
//!    (the feature was not observed, so the indicator is false);
//! 2. batch columns not in the schema are dropped (categories never seen at
//!    training time carry no weight in the model);
//! 3. the columns are put in schema order.

use std::collections::HashSet;

use log::debug;
use polars::prelude::*;

use super::encoder::FeatureMatrix;
use crate::error::{PipelineError, Result};

/// What alignment had to change to fit the batch to the schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentReport {
    /// Schema columns absent from the batch, zero-filled
    pub added: Vec<String>,
    /// Batch columns absent from the schema, discarded
    pub dropped: Vec<String>,
}

impl AlignmentReport {
    /// True when the batch already matched the schema's column set
    pub fn is_exact(&self) -> bool {
        self.added.is_empty() && self.dropped.is_empty()
    }
}

/// Align `batch` to `schema`, returning exactly `schema.len()` columns in order
///
/// Fails only when there is nothing to align: an empty schema or a batch
/// without rows.
pub fn align_to_schema(
    batch: &FeatureMatrix,
    schema: &[String],
) -> Result<(FeatureMatrix, AlignmentReport)> {
    if schema.is_empty() {
        return Err(PipelineError::SchemaMismatch {
            reason: "trained feature schema is empty".to_string(),
        });
    }
    let n_rows = batch.n_rows();
    if n_rows == 0 {
        return Err(PipelineError::SchemaMismatch {
            reason: "inference batch has no rows".to_string(),
        });
    }

    let frame = batch.frame();
    let batch_names: HashSet<String> = batch.column_names().into_iter().collect();
    let schema_names: HashSet<&str> = schema.iter().map(|s| s.as_str()).collect();

    let mut report = AlignmentReport::default();
    let mut columns = Vec::with_capacity(schema.len());

    for name in schema {
        if batch_names.contains(name) {
            columns.push(frame.column(name)?.clone());
        } else {
            report.added.push(name.clone());
            columns.push(Column::new(name.as_str().into(), vec![0.0f64; n_rows]));
        }
    }

    report.dropped = batch
        .column_names()
        .into_iter()
        .filter(|name| !schema_names.contains(name.as_str()))
        .collect();

    debug!(
        "Aligned batch to {} feature(s): {} zero-filled, {} dropped",
        schema.len(),
        report.added.len(),
        report.dropped.len()
    );

    Ok((FeatureMatrix::from_columns(columns)?, report))
}
