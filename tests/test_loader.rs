//! Integration tests for directory ingestion and consolidation

use polars::prelude::*;
use schemalock::error::PipelineError;
use schemalock::pipeline::{
    discover_files, load_and_combine, load_single_file, load_table_file, ColumnKind, LoadOptions,
};
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::{assert_shape, column_names, write_file, write_parquet};

#[test]
fn test_discover_files_filters_and_sorts() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "b.csv", "x\n1\n");
    write_file(temp_dir.path(), "a.CSV", "x\n2\n");
    write_file(temp_dir.path(), "notes.txt", "ignore me");
    std::fs::create_dir(temp_dir.path().join("nested.csv")).unwrap();

    let files = discover_files(temp_dir.path(), &["csv".to_string()]).unwrap();
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.CSV", "b.csv"]);
}

#[test]
fn test_missing_directory_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = discover_files(&temp_dir.path().join("nope"), &["csv".to_string()]).unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
}

#[test]
fn test_union_of_columns_with_nulls() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "1.csv", "a,b\n1,x\n2,y\n");
    write_file(temp_dir.path(), "2.csv", "a,c\n3,1.5\n");

    let consolidated = load_and_combine(temp_dir.path(), &LoadOptions::default()).unwrap();
    let table = consolidated.table;

    assert_shape(table.frame(), 3, 3);
    assert_eq!(column_names(table.frame()), vec!["a", "b", "c"]);
    assert_eq!(table.frame().column("b").unwrap().null_count(), 1);
    assert_eq!(table.frame().column("c").unwrap().null_count(), 2);
    assert_eq!(table.sources().len(), 2);
    assert!(consolidated.skipped.is_empty());

    // file order is preserved: rows of 1.csv come first
    let a: Vec<Option<i64>> = table.frame().column("a").unwrap().i64().unwrap().into_iter().collect();
    assert_eq!(a, vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn test_some_files_failing_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "good1.csv", "a,label\n1,x\n");
    write_file(temp_dir.path(), "empty.csv", "");
    write_file(temp_dir.path(), "good2.csv", "a,label\n2,y\n3,x\n");

    let consolidated = load_and_combine(temp_dir.path(), &LoadOptions::default()).unwrap();
    assert_eq!(consolidated.table.height(), 3);
    assert_eq!(consolidated.skipped.len(), 1);
    assert!(consolidated.skipped[0].path.ends_with("empty.csv"));
}

#[test]
fn test_all_files_failing_is_no_parseable_files() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "empty1.csv", "");
    write_file(temp_dir.path(), "empty2.csv", "");

    let err = load_and_combine(temp_dir.path(), &LoadOptions::default()).unwrap_err();
    match err {
        PipelineError::NoParseableFiles { attempted, .. } => assert_eq!(attempted, 2),
        other => panic!("expected NoParseableFiles, got {:?}", other),
    }
}

#[test]
fn test_no_matching_files_is_no_parseable_files() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "data.txt", "a\n1\n");

    let err = load_and_combine(temp_dir.path(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, PipelineError::NoParseableFiles { attempted: 0, .. }));
}

#[test]
fn test_parquet_and_csv_together() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "a.csv", "x,label\n1.5,p\n");
    let mut df = df! {
        "x" => [2.5f64, 3.5],
        "label" => ["q", "p"],
    }
    .unwrap();
    write_parquet(temp_dir.path(), "b.parquet", &mut df);

    let options = LoadOptions {
        extensions: vec!["csv".to_string(), "parquet".to_string()],
        ..Default::default()
    };
    let consolidated = load_and_combine(temp_dir.path(), &options).unwrap();
    assert_shape(consolidated.table.frame(), 3, 2);
}

#[test]
fn test_schema_kinds_from_dtypes() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(temp_dir.path(), "t.csv", "n,f,s,b\n1,1.5,x,true\n2,2.5,y,false\n");

    let table = load_single_file(&path, 100).unwrap();
    let schema = table.schema();
    assert_eq!(schema.get("n").unwrap().kind, ColumnKind::Numeric);
    assert_eq!(schema.get("f").unwrap().kind, ColumnKind::Numeric);
    assert_eq!(schema.get("b").unwrap().kind, ColumnKind::Numeric);
    assert_eq!(schema.get("s").unwrap().kind, ColumnKind::Categorical);
}

#[test]
fn test_unsupported_extension_is_file_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(temp_dir.path(), "data.json", "{}");

    let err = load_table_file(&path, 100).unwrap_err();
    assert!(err.is_recoverable());
}
