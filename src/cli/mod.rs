//! CLI module - argument parsing, interactive prompts and subcommand runners

mod args;
mod explain;
mod predict;
mod prompts;
mod train;

pub use args::*;
pub use explain::{run_importance, run_shap};
pub use predict::run_predict;
pub use prompts::*;
pub use train::run_train;
