//! Schemalock: schema-locked tabular classification CLI
//!
//! Trains a random forest on a directory of labeled observation files and
//! scores or explains new data against the exact feature schema the model
//! was trained on.

use anyhow::Result;
use clap::Parser;

use schemalock::cli::{run_importance, run_predict, run_shap, run_train, Cli, Commands};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Predict(args) => run_predict(args),
        Commands::Importance(args) => run_importance(args),
        Commands::Shap(args) => run_shap(args),
    }
}
