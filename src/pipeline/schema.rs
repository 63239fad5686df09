//! Typed column descriptors for ingested tables
//!
//! The schema is derived once, when a table enters the pipeline, so later
//! stages ask "is this column numeric?" of a descriptor rather than poking at
//! polars dtypes again.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// How a raw column is treated by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Integer, float or boolean - imputed with the median, kept as one feature
    Numeric,
    /// Everything else - expanded into one indicator per observed value
    Categorical,
}

impl ColumnKind {
    /// Classify a polars dtype
    pub fn from_dtype(dtype: &DataType) -> Self {
        if dtype.is_primitive_numeric() || dtype.is_bool() {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered column descriptors of a table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    /// Build the schema from a DataFrame's current columns
    pub fn from_frame(df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|col| ColumnDescriptor {
                name: col.name().to_string(),
                kind: ColumnKind::from_dtype(col.dtype()),
            })
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Descriptors of the given kind, in table order
    pub fn of_kind(&self, kind: ColumnKind) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(move |c| c.kind == kind)
    }

    /// A copy of this schema without the named columns
    pub fn without(&self, names: &[String]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|c| !names.contains(&c.name))
                .cloned()
                .collect(),
        }
    }
}
