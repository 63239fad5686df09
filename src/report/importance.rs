//! Ranked feature importance and SHAP summary output

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use serde::Serialize;

use crate::explain::{ExplanationSet, FeatureAttribution, FeatureImportance, ImportanceReport};

/// Metadata about the explainability run
#[derive(Debug, Serialize)]
pub struct ExportMetadata {
    /// Timestamp of the export (ISO 8601 format)
    pub timestamp: String,
    pub schemalock_version: String,
    /// Model artifact the explanation was computed for
    pub model_file: String,
    pub seed: u64,
}

impl ExportMetadata {
    pub fn new(model_file: &Path, seed: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            schemalock_version: env!("CARGO_PKG_VERSION").to_string(),
            model_file: model_file.display().to_string(),
            seed,
        }
    }
}

#[derive(Serialize)]
struct ImportanceExport {
    metadata: ExportMetadata,
    baseline_score: f64,
    baseline_f1: f64,
    n_rows: usize,
    n_repeats: usize,
    /// Ranked, highest importance first
    features: Vec<FeatureImportance>,
}

#[derive(Serialize)]
struct ShapExport<'a> {
    metadata: ExportMetadata,
    class: &'a str,
    base_value: f64,
    n_rows: usize,
    /// Mean |SHAP| per feature, highest first
    summary: Vec<FeatureAttribution>,
    feature_names: &'a [String],
    values: &'a [Vec<f64>],
}

/// Ranked permutation importances, limited to `top` rows when given
pub fn importance_table(report: &ImportanceReport, top: Option<usize>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Rank").add_attribute(Attribute::Bold),
        Cell::new("Feature").add_attribute(Attribute::Bold),
        Cell::new("Mean Drop").add_attribute(Attribute::Bold),
        Cell::new("Std").add_attribute(Attribute::Bold),
    ]);

    let ranked = report.ranked();
    for (i, feature) in ranked.iter().take(top.unwrap_or(ranked.len())).enumerate() {
        let color = if feature.mean > 0.0 {
            Color::Green
        } else if feature.mean < 0.0 {
            Color::Red
        } else {
            Color::White
        };
        table.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(&feature.name),
            Cell::new(format!("{:.4}", feature.mean))
                .fg(color)
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.4}", feature.std)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Global mean |SHAP| per feature, limited to `top` rows when given
pub fn shap_summary_table(set: &ExplanationSet, top: Option<usize>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Rank").add_attribute(Attribute::Bold),
        Cell::new("Feature").add_attribute(Attribute::Bold),
        Cell::new("Mean |SHAP|").add_attribute(Attribute::Bold),
    ]);

    let summary = set.global_summary();
    for (i, entry) in summary.iter().take(top.unwrap_or(summary.len())).enumerate() {
        table.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(&entry.name),
            Cell::new(format!("{:.4}", entry.mean_abs)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Export ranked permutation importances to a JSON file
pub fn export_importance_json(
    report: &ImportanceReport,
    metadata: ExportMetadata,
    output_path: &Path,
) -> Result<()> {
    let export = ImportanceExport {
        metadata,
        baseline_score: report.baseline_score,
        baseline_f1: report.baseline_f1,
        n_rows: report.n_rows,
        n_repeats: report.n_repeats,
        features: report.ranked(),
    };

    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize feature importance to JSON")?;
    std::fs::write(output_path, json).with_context(|| {
        format!("Failed to write feature importance to {}", output_path.display())
    })?;
    Ok(())
}

/// Export SHAP values and their global summary to a JSON file
pub fn export_shap_json(
    set: &ExplanationSet,
    metadata: ExportMetadata,
    output_path: &Path,
) -> Result<()> {
    let export = ShapExport {
        metadata,
        class: &set.class,
        base_value: set.base_value,
        n_rows: set.values.len(),
        summary: set.global_summary(),
        feature_names: &set.feature_names,
        values: &set.values,
    };

    let json =
        serde_json::to_string_pretty(&export).context("Failed to serialize SHAP values to JSON")?;
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write SHAP values to {}", output_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn report() -> ImportanceReport {
        ImportanceReport {
            baseline_score: 0.9,
            baseline_f1: 0.88,
            n_rows: 10,
            n_repeats: 3,
            features: vec![
                FeatureImportance {
                    name: "noise".to_string(),
                    mean: 0.0,
                    std: 0.0,
                },
                FeatureImportance {
                    name: "signal".to_string(),
                    mean: 0.4,
                    std: 0.05,
                },
            ],
        }
    }

    #[test]
    fn test_importance_json_is_ranked() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("importance.json");
        export_importance_json(&report(), ExportMetadata::new(Path::new("m.json"), 42), &path)
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["features"][0]["name"], "signal");
        assert_eq!(json["metadata"]["seed"], 42);
        assert_eq!(json["n_repeats"], 3);
    }

    #[test]
    fn test_importance_table_top() {
        let rendered = importance_table(&report(), Some(1)).to_string();
        assert!(rendered.contains("signal"));
        assert!(!rendered.contains("noise"));
    }

    #[test]
    fn test_shap_json_has_summary() {
        let set = ExplanationSet {
            feature_names: vec!["a".to_string(), "b".to_string()],
            class: "yes".to_string(),
            base_value: 0.5,
            predictions: vec![0.7],
            values: vec![vec![0.05, 0.15]],
        };
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("shap.json");
        export_shap_json(&set, ExportMetadata::new(Path::new("m.json"), 1), &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["summary"][0]["name"], "b");
        assert_eq!(json["class"], "yes");
    }
}
