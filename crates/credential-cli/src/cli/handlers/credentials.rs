//! API key and credential check handlers

use super::session::{connect, ensure_signed_in};
use crate::error::{CliError, Result};
use color_eyre::eyre::eyre;
use console::style;
use credential_common::Config;
use credential_sdk::{CredentialCheck, InteractionMode};

pub async fn handle_api_key(config: &Config) -> Result<()> {
    let app = connect(config).await?;
    ensure_signed_in(&app).await?;

    let key = app.create_api_key().await?;

    println!();
    println!("{}", style("API Key created successfully!").green().bold());
    println!();
    println!("  {}: {}", style("ID").bold(), key.id);
    if let Some(expires_at) = key.expires_at {
        println!(
            "  {}: {}",
            style("Expires").bold(),
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!();
    println!("{}", style("Key:").bold());
    println!("{}", style(&key.key).cyan());
    println!();
    println!(
        "{}",
        style("Save this key securely - it won't be shown again!")
            .yellow()
            .bold()
    );
    println!();
    Ok(())
}

pub async fn handle_check_key(config: &Config, key: &str) -> Result<()> {
    let app = connect(config).await?;
    let check = app.check_api_key(key).await?;
    print_check(&check)
}

/// The cookie only lives as long as this process, so sign in first
pub async fn handle_check_cookie(config: &Config) -> Result<()> {
    let app = connect(config).await?;
    app.sign_in(InteractionMode::Popup).await?;
    let check = app.check_auth_cookie().await?;
    print_check(&check)
}

fn print_check(check: &CredentialCheck) -> Result<()> {
    let rendered = serde_json::to_string_pretty(check)
        .map_err(|e| CliError::Internal(eyre!("Failed to render check result: {e}")))?;
    if check.valid {
        println!("{}", style("Credential is valid").green().bold());
    } else {
        println!("{}", style("Credential is not valid").red().bold());
    }
    println!("{rendered}");
    Ok(())
}
