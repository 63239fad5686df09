//! Prediction output: console table and CSV export

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use polars::prelude::*;

use crate::pipeline::Predictions;

/// Name of the probability column for `class` in exported predictions
pub fn probability_column(class: &str) -> String {
    format!("p_{}", class)
}

/// Predictions as a frame: `row`, `predicted`, then one `p_<class>` per class
pub fn predictions_frame(predictions: &Predictions) -> Result<DataFrame> {
    let n = predictions.len();
    let mut columns = Vec::with_capacity(predictions.classes.len() + 2);

    columns.push(Column::new("row".into(), (0..n as u64).collect::<Vec<u64>>()));
    columns.push(Column::new(
        "predicted".into(),
        predictions.labels.clone(),
    ));
    for (k, class) in predictions.classes.iter().enumerate() {
        let values: Vec<f64> = predictions.probabilities.iter().map(|p| p[k]).collect();
        columns.push(Column::new(probability_column(class).into(), values));
    }

    DataFrame::new(columns).context("Failed to assemble predictions table")
}

/// Write predictions to a CSV file
pub fn export_predictions_csv(predictions: &Predictions, output_path: &Path) -> Result<()> {
    let mut df = predictions_frame(predictions)?;
    let mut file = std::fs::File::create(output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;
    CsvWriter::new(&mut file)
        .finish(&mut df)
        .with_context(|| format!("Failed to write CSV file: {}", output_path.display()))?;
    Ok(())
}

/// Table of the first `limit` predictions with their class probabilities
pub fn predictions_table(predictions: &Predictions, limit: usize) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);

    let mut header = vec![
        Cell::new("Row").add_attribute(Attribute::Bold),
        Cell::new("Predicted").add_attribute(Attribute::Bold),
    ];
    header.extend(
        predictions
            .classes
            .iter()
            .map(|c| Cell::new(format!("P({})", c)).add_attribute(Attribute::Bold)),
    );
    table.set_header(header);

    for (i, (label, proba)) in predictions
        .labels
        .iter()
        .zip(&predictions.probabilities)
        .take(limit)
        .enumerate()
    {
        let mut row = vec![
            Cell::new(i).set_alignment(CellAlignment::Right),
            Cell::new(label).fg(Color::Cyan),
        ];
        row.extend(
            proba
                .iter()
                .map(|p| Cell::new(format!("{:.3}", p)).set_alignment(CellAlignment::Right)),
        );
        table.add_row(row);
    }
    table
}

/// Number of rows predicted per class, in class order
pub fn predicted_counts(predictions: &Predictions) -> Vec<(String, usize)> {
    predictions
        .classes
        .iter()
        .map(|c| {
            let n = predictions.labels.iter().filter(|l| *l == c).count();
            (c.clone(), n)
        })
        .collect()
}
