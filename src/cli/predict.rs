//! `predict` subcommand

use anyhow::{Context, Result};
use console::style;

use super::args::PredictArgs;
use crate::model::ModelArtifact;
use crate::pipeline::{load_single_file, predict_batch};
use crate::report::{export_predictions_csv, predicted_counts, predictions_table};
use crate::utils::{create_spinner, finish_with_success, print_info, print_success, print_warning};

pub fn run_predict(args: &PredictArgs) -> Result<()> {
    let spinner = create_spinner("Loading model artifact...");
    let artifact = ModelArtifact::load(&args.model)
        .with_context(|| format!("Failed to load model artifact {}", args.model.display()))?;
    finish_with_success(
        &spinner,
        &format!(
            "Model loaded ({} features, target '{}')",
            artifact.feature_columns().len(),
            artifact.metadata().target_column
        ),
    );

    let spinner = create_spinner("Reading new data...");
    let raw = load_single_file(&args.input, args.infer_schema_length)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    finish_with_success(
        &spinner,
        &format!("Read {} rows x {} columns", raw.height(), raw.width()),
    );

    let (predictions, alignment) = predict_batch(&artifact, &raw).context("Prediction failed")?;

    if !alignment.added.is_empty() {
        print_info(&format!(
            "{} trained feature(s) absent from the input were zero-filled",
            alignment.added.len()
        ));
    }
    if !alignment.dropped.is_empty() {
        print_warning(&format!(
            "{} input feature(s) unknown to the model were ignored",
            alignment.dropped.len()
        ));
    }

    println!();
    println!(
        "    {} {}",
        style("🔮").cyan(),
        style("PREDICTIONS").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    for line in predictions_table(&predictions, args.show).to_string().lines() {
        println!("    {}", line);
    }
    if predictions.len() > args.show {
        println!(
            "    {}",
            style(format!("... {} more row(s)", predictions.len() - args.show)).dim()
        );
    }

    println!();
    for (class, count) in predicted_counts(&predictions) {
        println!("      {}: {}", class, style(count).yellow().bold());
    }

    if let Some(output) = &args.output {
        export_predictions_csv(&predictions, output)?;
        print_success(&format!("Predictions written to {}", output.display()));
    }

    Ok(())
}
