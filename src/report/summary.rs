//! Training summary report

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{TrainingOutcome, TrainingSet};

/// Figures shown after a training run
#[derive(Debug, Clone, Default)]
pub struct TrainingSummary {
    pub source_files: usize,
    pub skipped_files: usize,
    pub target: String,
    pub rows_dropped: usize,
    pub rows_unlabeled: usize,
    pub rows_fitted: usize,
    pub features: usize,
    pub trees: usize,
    pub distribution: Vec<(String, usize)>,
}

impl TrainingSummary {
    pub fn new(set: &TrainingSet, outcome: &TrainingOutcome) -> Self {
        Self {
            source_files: set.labeled.features.sources().len(),
            skipped_files: set.skipped.len(),
            target: set.labeled.target.clone(),
            rows_dropped: set.labeled.dropped_rows,
            rows_unlabeled: outcome.unlabeled_excluded,
            rows_fitted: outcome.distribution.iter().map(|(_, n)| n).sum(),
            features: outcome.artifact.feature_columns().len(),
            trees: outcome.artifact.model().trees().len(),
            distribution: outcome.distribution.clone(),
        }
    }

    /// Class distribution as a table: class, rows, share of fitted rows
    pub fn distribution_table(&self) -> Table {
        let total = self.rows_fitted.max(1) as f64;

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Class").add_attribute(Attribute::Bold),
            Cell::new("Rows").add_attribute(Attribute::Bold),
            Cell::new("Share").add_attribute(Attribute::Bold),
        ]);
        for (class, count) in &self.distribution {
            table.add_row(vec![
                Cell::new(class),
                Cell::new(count).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.1}%", *count as f64 / total * 100.0))
                    .set_alignment(CellAlignment::Right),
            ]);
        }
        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("TRAINING SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("📁 Files Loaded"),
            Cell::new(self.source_files),
        ]);
        table.add_row(vec![
            Cell::new("🚫 Files Skipped"),
            Cell::new(self.skipped_files).fg(if self.skipped_files == 0 {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("🎯 Target Column"),
            Cell::new(&self.target).fg(Color::Cyan),
        ]);
        table.add_row(vec![
            Cell::new("🗑️  Rows Without Any Label"),
            Cell::new(self.rows_dropped).fg(if self.rows_dropped == 0 {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);
        table.add_row(vec![
            Cell::new("❔ Rows With Null Target"),
            Cell::new(self.rows_unlabeled).fg(if self.rows_unlabeled == 0 {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);
        table.add_row(vec![
            Cell::new("✅ Rows Fitted"),
            Cell::new(self.rows_fitted)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![Cell::new("🔢 Features"), Cell::new(self.features)]);
        table.add_row(vec![Cell::new("🌲 Trees"), Cell::new(self.trees)]);

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        println!();
        println!(
            "    {} {}",
            style("📊").cyan(),
            style("CLASS DISTRIBUTION").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        for line in self.distribution_table().to_string().lines() {
            println!("    {}", line);
        }
    }
}
