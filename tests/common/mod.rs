//! Shared test utilities and fixture generators
#![allow(dead_code)]

use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write `body` to `name` inside `dir`, returning the file path
pub fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// A data directory with two CSV files that name their label column differently
///
/// `a.csv` labels with `disposition`, `b.csv` with `label`. One row in `a.csv`
/// has no label at all.
pub fn create_mixed_label_dir() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        "a.csv",
        "period,radius,kind,disposition\n\
         1.0,0.5,rocky,FALSE POSITIVE\n\
         2.0,0.7,rocky,FALSE POSITIVE\n\
         30.0,2.5,gas,CONFIRMED\n\
         35.0,,gas,CONFIRMED\n\
         3.0,0.6,rocky,\n",
    );
    write_file(
        temp_dir.path(),
        "b.csv",
        "period,radius,kind,label\n\
         40.0,3.0,gas,CONFIRMED\n\
         1.5,0.4,rocky,FALSE POSITIVE\n",
    );
    temp_dir
}

/// Iris-like training data: one numeric column and a 2-valued categorical
pub fn iris_training_csv() -> String {
    let mut body = String::from("sepal_len,species,label\n");
    for i in 0..20 {
        let (len, species, label) = if i % 2 == 0 {
            (4.5 + (i as f64) * 0.01, "setosa", "small")
        } else {
            (6.5 + (i as f64) * 0.01, "versicolor", "large")
        };
        body.push_str(&format!("{},{},{}\n", len, species, label));
    }
    body
}

/// Separable two-class training set written as one CSV per half
///
/// Returns (directory, number of rows). `signal` determines the class;
/// `noise` is unrelated to it.
pub fn create_separable_dir(rows_per_file: usize) -> (TempDir, usize) {
    let temp_dir = TempDir::new().unwrap();
    for (file, offset) in [("part1.csv", 0usize), ("part2.csv", rows_per_file)] {
        let mut body = String::from("signal,noise,color,disposition\n");
        for i in 0..rows_per_file {
            let n = i + offset;
            let positive = n % 2 == 0;
            let signal = if positive { 10.0 + (n % 5) as f64 } else { (n % 5) as f64 };
            let color = ["red", "green", "blue"][n % 3];
            let label = if positive { "CONFIRMED" } else { "FALSE POSITIVE" };
            body.push_str(&format!("{},{},{},{}\n", signal, (n * 7) % 11, color, label));
        }
        write_file(temp_dir.path(), file, &body);
    }
    (temp_dir, rows_per_file * 2)
}

/// Write a DataFrame as Parquet into `dir`
pub fn write_parquet(dir: &Path, name: &str, df: &mut DataFrame) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();
    path
}

/// Column names of a DataFrame as owned strings
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}
