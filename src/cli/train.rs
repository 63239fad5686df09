//! `train` subcommand

use std::time::Instant;

use anyhow::{Context, Result};

use super::args::TrainArgs;
use super::prompts::confirm_overwrite;
use crate::pipeline::{build_training_set, fit_artifact};
use crate::report::TrainingSummary;
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_config, print_count, print_info, print_step_header, print_step_time, print_success,
    print_warning, ConfigLine, FOLDER, SAVE, SEED, TARGET, TREE,
};

pub fn run_train(args: &TrainArgs) -> Result<()> {
    let config = args.pipeline_config();
    let params = args.forest_params();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&[
        ConfigLine::path(&FOLDER, "Data", &config.data_dir),
        ConfigLine::new(&TARGET, "Targets", config.target_candidates.join(", ")),
        ConfigLine::path(&SAVE, "Output", &args.output),
        ConfigLine::new(&TREE, "Trees", params.n_estimators.to_string()),
        ConfigLine::new(&SEED, "Seed", params.seed.to_string()),
    ]);

    if !confirm_overwrite(&args.output, args.no_confirm)? {
        println!("Cancelled by user.");
        return Ok(());
    }

    // Step 1: ingestion, target resolution and encoding
    print_step_header(1, "Load & Encode");
    let step_start = Instant::now();
    let spinner = create_spinner("Loading data files...");
    let set = build_training_set(&config)
        .with_context(|| format!("Failed to build training set from {}", config.data_dir.display()))?;
    if set.skipped.is_empty() {
        finish_with_success(&spinner, "Data files loaded");
    } else {
        finish_with_warning(
            &spinner,
            &format!("{} file(s) could not be parsed and were skipped", set.skipped.len()),
        );
        for skipped in &set.skipped {
            print_warning(&format!("{}: {}", skipped.path.display(), skipped.reason));
        }
    }
    print_info(&format!("Target column: {}", set.labeled.target));
    print_count(
        "feature column(s) after encoding",
        set.matrix.n_features(),
        Some(&format!("({} rows)", set.matrix.n_rows())),
    );
    print_step_time(step_start.elapsed());

    // Step 2: fit
    print_step_header(2, "Train Model");
    let step_start = Instant::now();
    let spinner = create_spinner(&format!("Fitting {} trees...", params.n_estimators));
    let outcome = fit_artifact(&set, &params).context("Failed to train model")?;
    finish_with_success(&spinner, "Model trained");
    if outcome.unlabeled_excluded > 0 {
        print_warning(&format!(
            "{} row(s) with a null target were excluded from fitting",
            outcome.unlabeled_excluded
        ));
    }
    print_step_time(step_start.elapsed());

    // Step 3: persist
    print_step_header(3, "Save Artifact");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing model artifact...");
    outcome
        .artifact
        .persist(&args.output)
        .with_context(|| format!("Failed to write model artifact {}", args.output.display()))?;
    finish_with_success(&spinner, &format!("Saved to {}", args.output.display()));
    print_step_time(step_start.elapsed());

    TrainingSummary::new(&set, &outcome).display();
    print_success(&format!(
        "Artifact binds {} feature column(s)",
        outcome.artifact.feature_columns().len()
    ));
    print_completion("Training complete!");

    Ok(())
}
