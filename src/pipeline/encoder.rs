//! Feature encoding: median imputation plus one-hot expansion
//!
//! The encoder turns a raw table into a numeric [`FeatureMatrix`] whose column
//! names and order are fully determined by the table's contents. That order is
//! the schema a trained model is bound to.
//!
//! Null categorical values get no indicator of their own: the row is `0.0` in
//! every indicator of that column. A batch with nulls therefore produces the
//! same column set as one without.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;
use polars::prelude::*;

use super::loader::RawTable;
use super::missing::impute_numeric_medians;
use super::schema::{ColumnKind, TableSchema};
use crate::error::{PipelineError, Result};

/// Separator between a column name and a category value in indicator names
pub const INDICATOR_SEPARATOR: &str = "_";

/// Numeric, rectangular feature table with an ordered, named column schema
///
/// Every column is `Float64` without nulls.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    frame: DataFrame,
}

impl FeatureMatrix {
    /// Build a matrix from columns, keeping their order
    ///
    /// Columns are cast to `Float64`; remaining nulls become `0.0`.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut numeric = Vec::with_capacity(columns.len());
        for col in columns {
            let name = col.name().to_string();
            if !seen.insert(name.clone()) {
                return Err(PipelineError::DuplicateFeatureName { name });
            }
            let cast = col.cast(&DataType::Float64)?;
            let values: Vec<f64> = cast
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            numeric.push(Column::new(name.into(), values));
        }
        Ok(Self {
            frame: DataFrame::new(numeric)?,
        })
    }

    /// Column names in schema order
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn n_rows(&self) -> usize {
        self.frame.height()
    }

    pub fn n_features(&self) -> usize {
        self.frame.width()
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Values of one feature column
    pub fn column_values(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self
            .frame
            .column(name)?
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect())
    }

    /// Row-major copy of the values, as consumed by the classifier
    pub fn to_rows(&self) -> Result<Vec<Vec<f64>>> {
        let n_rows = self.n_rows();
        let mut rows = vec![Vec::with_capacity(self.n_features()); n_rows];
        for col in self.frame.get_columns() {
            for (row, value) in rows.iter_mut().zip(col.f64()?.into_iter()) {
                row.push(value.unwrap_or(0.0));
            }
        }
        Ok(rows)
    }

    /// Keep only the rows where `mask` is true
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Self> {
        let mask = BooleanChunked::from_slice("mask".into(), mask);
        Ok(Self {
            frame: self.frame.filter(&mask)?,
        })
    }
}

/// Name of the indicator column for `value` of categorical `column`
pub fn indicator_name(column: &str, value: &str) -> String {
    format!("{}{}{}", column, INDICATOR_SEPARATOR, value)
}

/// Expand every categorical column into one indicator per observed value
///
/// Indicators are produced per column in ascending value order. Values never
/// observed produce no column; nulls set no indicator.
pub fn one_hot_expand(df: &DataFrame, schema: &TableSchema) -> Result<Vec<Column>> {
    let mut indicators = Vec::new();

    for descriptor in schema.of_kind(ColumnKind::Categorical) {
        let cast = df.column(&descriptor.name)?.cast(&DataType::String)?;
        let values: Vec<Option<&str>> = cast.str()?.into_iter().collect();

        let mut positions: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (row, value) in values.iter().enumerate() {
            if let Some(v) = value {
                positions.entry(v).or_default().push(row);
            }
        }

        debug!(
            "Expanding '{}' into {} indicator(s)",
            descriptor.name,
            positions.len()
        );

        for (value, rows) in positions {
            let mut indicator = vec![0.0f64; values.len()];
            for row in rows {
                indicator[row] = 1.0;
            }
            indicators.push(Column::new(
                indicator_name(&descriptor.name, value).into(),
                indicator,
            ));
        }
    }

    Ok(indicators)
}

/// Encode a raw feature table into a numeric feature matrix
///
/// Numeric columns are median-imputed, categorical columns one-hot expanded,
/// and the result is sorted lexically by column name.
pub fn encode_features(table: &RawTable) -> Result<FeatureMatrix> {
    FeatureMatrix::from_columns(encoded_columns(table)?)
}

/// Encode a batch destined for a trained schema
///
/// A generated name that occurs more than once is ambiguous. When the schema
/// does not know it the model would discard it anyway, so every copy is
/// dropped and reported; when the schema does know it, encoding fails with
/// [`PipelineError::DuplicateFeatureName`].
pub fn encode_for_schema(
    table: &RawTable,
    schema: &[String],
) -> Result<(FeatureMatrix, Vec<String>)> {
    let columns = encoded_columns(table)?;

    let mut counts: HashMap<String, usize> = HashMap::new();
    for col in &columns {
        *counts.entry(col.name().to_string()).or_default() += 1;
    }
    let mut ambiguous: Vec<String> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(name, _)| name)
        .collect();
    ambiguous.sort();

    if let Some(name) = ambiguous.iter().find(|name| schema.contains(name)) {
        return Err(PipelineError::DuplicateFeatureName { name: name.clone() });
    }
    if !ambiguous.is_empty() {
        debug!(
            "Discarding {} ambiguous column name(s) unknown to the schema: {:?}",
            ambiguous.len(),
            ambiguous
        );
    }

    let kept: Vec<Column> = columns
        .into_iter()
        .filter(|col| !ambiguous.iter().any(|name| name.as_str() == col.name().as_str()))
        .collect();
    if kept.is_empty() {
        return Err(PipelineError::EmptyFeatureSet);
    }

    Ok((FeatureMatrix::from_columns(kept)?, ambiguous))
}

/// Imputed numeric columns plus indicators, sorted by name
fn encoded_columns(table: &RawTable) -> Result<Vec<Column>> {
    if table.width() == 0 {
        return Err(PipelineError::EmptyFeatureSet);
    }

    let (imputed, _) = impute_numeric_medians(table.frame(), table.schema())?;

    let mut columns: Vec<Column> = table
        .schema()
        .of_kind(ColumnKind::Numeric)
        .map(|d| imputed.column(&d.name).cloned())
        .collect::<PolarsResult<Vec<_>>>()?;
    columns.extend(one_hot_expand(&imputed, table.schema())?);

    if columns.is_empty() {
        return Err(PipelineError::EmptyFeatureSet);
    }

    columns.sort_by(|a, b| a.name().as_str().cmp(b.name().as_str()));
    Ok(columns)
}
