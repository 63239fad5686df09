//! `importance` and `shap` subcommands

use anyhow::{Context, Result};
use console::style;
use log::warn;

use super::args::{ImportanceArgs, ShapArgs};
use crate::explain::{permutation_importance, shap_values};
use crate::model::ModelArtifact;
use crate::pipeline::{align_to_schema, build_training_set, load_single_file, prepare_inference_matrix};
use crate::report::{
    export_importance_json, export_shap_json, importance_table, shap_summary_table, ExportMetadata,
};
use crate::utils::{create_spinner, finish_with_success, print_info, print_success};

fn load_artifact(path: &std::path::Path) -> Result<ModelArtifact> {
    let spinner = create_spinner("Loading model artifact...");
    let artifact = ModelArtifact::load(path)
        .with_context(|| format!("Failed to load model artifact {}", path.display()))?;
    finish_with_success(
        &spinner,
        &format!("Model loaded ({} features)", artifact.feature_columns().len()),
    );
    Ok(artifact)
}

fn print_section(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
}

pub fn run_importance(args: &ImportanceArgs) -> Result<()> {
    let artifact = load_artifact(&args.model)?;
    let config = args.pipeline_config(&artifact.metadata().target_column);

    let spinner = create_spinner("Rebuilding labeled data...");
    let set = build_training_set(&config)
        .with_context(|| format!("Failed to load labeled data from {}", config.data_dir.display()))?;
    let (matrix, alignment) = align_to_schema(&set.matrix, artifact.feature_columns())?;
    finish_with_success(
        &spinner,
        &format!("{} labeled rows aligned to the model schema", matrix.n_rows()),
    );
    if !alignment.is_exact() {
        warn!(
            "Labeled data differs from the training schema: {} added, {} dropped",
            alignment.added.len(),
            alignment.dropped.len()
        );
    }

    let spinner = create_spinner(&format!(
        "Shuffling {} features x {} repeats...",
        matrix.n_features(),
        args.repeats
    ));
    let report = permutation_importance(
        artifact.model(),
        &matrix,
        &set.labeled.labels,
        &args.options(),
    )
    .context("Permutation importance failed")?;
    finish_with_success(&spinner, "Permutation importance computed");

    print_info(&format!(
        "Baseline accuracy: {:.4}, weighted F1: {:.4}",
        report.baseline_score, report.baseline_f1
    ));
    print_section("📊", "PERMUTATION IMPORTANCE");
    for line in importance_table(&report, args.top).to_string().lines() {
        println!("    {}", line);
    }

    if let Some(path) = &args.json {
        export_importance_json(&report, ExportMetadata::new(&args.model, args.seed), path)?;
        print_success(&format!("Importances written to {}", path.display()));
    }
    Ok(())
}

pub fn run_shap(args: &ShapArgs) -> Result<()> {
    let artifact = load_artifact(&args.model)?;

    let spinner = create_spinner("Preparing rows to explain...");
    let raw = load_single_file(&args.input, args.infer_schema_length)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let (mut matrix, _) = prepare_inference_matrix(&artifact, &raw)?;
    if let Some(max_rows) = args.max_rows {
        if matrix.n_rows() > max_rows {
            let mask: Vec<bool> = (0..matrix.n_rows()).map(|i| i < max_rows).collect();
            matrix = matrix.filter_rows(&mask)?;
        }
    }

    let background = match &args.background {
        Some(path) => {
            let raw = load_single_file(path, args.infer_schema_length)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            prepare_inference_matrix(&artifact, &raw)?.0
        }
        None => prepare_inference_matrix(&artifact, &raw)?.0,
    };
    finish_with_success(
        &spinner,
        &format!(
            "{} rows to explain, {} background rows available",
            matrix.n_rows(),
            background.n_rows()
        ),
    );

    let spinner = create_spinner("Sampling Shapley values...");
    let set = shap_values(artifact.model(), &background, &matrix, &args.options())
        .context("SHAP estimation failed")?;
    finish_with_success(&spinner, "SHAP values computed");

    print_info(&format!(
        "Explaining P({}) - base value {:.4}",
        set.class, set.base_value
    ));
    print_section("🧭", "MEAN |SHAP| PER FEATURE");
    for line in shap_summary_table(&set, args.top).to_string().lines() {
        println!("    {}", line);
    }

    if let Some(path) = &args.json {
        export_shap_json(&set, ExportMetadata::new(&args.model, args.seed), path)?;
        print_success(&format!("SHAP values written to {}", path.display()));
    }
    Ok(())
}
