//! Interactive prompts using dialoguer

use std::path::Path;

use anyhow::Result;
use console::Term;
use dialoguer::Confirm;

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

/// Decide whether an existing artifact at `path` may be replaced
///
/// Without a terminal to ask on, or with `no_confirm`, the answer is yes.
pub fn confirm_overwrite(path: &Path, no_confirm: bool) -> Result<bool> {
    if no_confirm || !path.exists() || !Term::stdout().is_term() {
        return Ok(true);
    }
    confirm_step(&format!(
        "Model artifact {} already exists. Overwrite it?",
        path.display()
    ))
}
