//! Missing value imputation for numeric columns

use log::warn;
use polars::prelude::*;

use super::schema::{ColumnKind, TableSchema};
use crate::error::Result;

/// Record of one numeric column's imputation
#[derive(Debug, Clone, PartialEq)]
pub struct Imputation {
    pub column: String,
    /// Value written into the missing cells
    pub fill_value: f64,
    /// Number of cells that were missing (null or NaN)
    pub filled: usize,
}

/// Median of the non-missing values of a numeric column
///
/// Nulls and NaNs are ignored. Returns `None` when no value is present.
pub fn column_median(col: &Column) -> Result<Option<f64>> {
    let cast = col.cast(&DataType::Float64)?;
    let mut values: Vec<f64> = cast
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect();

    if values.is_empty() {
        return Ok(None);
    }

    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    };
    Ok(Some(median))
}

/// Replace missing numeric values with each column's median
///
/// Numeric columns come back as `Float64`; categorical columns are returned
/// untouched (their missingness is handled by the encoder). A numeric column
/// with no values at all is filled with `0.0`.
pub fn impute_numeric_medians(
    df: &DataFrame,
    schema: &TableSchema,
) -> Result<(DataFrame, Vec<Imputation>)> {
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());
    let mut imputations = Vec::new();

    for col in df.get_columns() {
        let name = col.name().to_string();
        let is_numeric = schema
            .get(&name)
            .map(|d| d.kind == ColumnKind::Numeric)
            .unwrap_or(false);

        if !is_numeric {
            columns.push(col.clone());
            continue;
        }

        let fill_value = match column_median(col)? {
            Some(median) => median,
            None => {
                warn!(
                    "Numeric column '{}' has no values to take a median from, filling with 0",
                    name
                );
                0.0
            }
        };

        let cast = col.cast(&DataType::Float64)?;
        let mut filled = 0usize;
        let values: Vec<f64> = cast
            .f64()?
            .into_iter()
            .map(|v| match v {
                Some(x) if !x.is_nan() => x,
                _ => {
                    filled += 1;
                    fill_value
                }
            })
            .collect();

        if filled > 0 {
            imputations.push(Imputation {
                column: name.clone(),
                fill_value,
                filled,
            });
        }
        columns.push(Column::new(name.into(), values));
    }

    Ok((DataFrame::new(columns)?, imputations))
}
