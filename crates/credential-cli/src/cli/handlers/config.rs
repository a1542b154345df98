//! Configuration inspection handlers

use crate::cli::commands::ConfigAction;
use crate::error::{CliError, Result};
use color_eyre::eyre::eyre;
use credential_common::Config;

pub fn handle_config(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show => handle_show(config),
        ConfigAction::Example => handle_example(),
    }
}

fn handle_show(config: &Config) -> Result<()> {
    let mut shown = config.clone();
    if shown.local.source_token.is_some() {
        shown.local.source_token = Some("<redacted>".to_string());
    }
    let rendered = serde_json::to_string_pretty(&shown)
        .map_err(|e| CliError::Internal(eyre!("Failed to render configuration: {e}")))?;
    println!("{rendered}");
    Ok(())
}

fn handle_example() -> Result<()> {
    println!("{}", Config::generate_example()?);
    Ok(())
}
