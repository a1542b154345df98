use crate::cli::{commands::Commands, handlers};
use crate::error::Result;
use clap::Parser;
use clap_verbosity_flag::{OffLevel, Verbosity};
use credential_common::Config;
use std::path::PathBuf;

/// Credential CLI - sign in and manage credentials for the credential service
#[derive(Parser, Debug)]
#[command(
    name = "credential",
    version,
    about = "Credential CLI - sign in and manage credentials for the credential service",
    long_about = "Command-line front end for the credential service.

QUICK START:
  credential login                  # Sign in and get a service cookie
  credential api-key                # Create an API key
  credential check-key <KEY>        # Check an API key
  credential logout                 # Sign out

CONFIGURATION:
  credential config example         # Print an example credential.toml
  credential config show            # Show the effective configuration"
)]
pub struct Args {
    /// Configuration file path (defaults to ./credential.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<OffLevel>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match self.command {
            Commands::Config { action } => handlers::config::handle_config(action, &config),
            Commands::Login { mode } => {
                handlers::session::handle_login(&config, mode.try_into()?).await
            }
            Commands::Token => handlers::session::handle_token(&config).await,
            Commands::Logout => handlers::session::handle_logout(&config).await,
            Commands::Status => handlers::session::handle_status(&config).await,
            Commands::ApiKey => handlers::credentials::handle_api_key(&config).await,
            Commands::CheckKey { key } => {
                handlers::credentials::handle_check_key(&config, &key).await
            }
            Commands::CheckCookie => handlers::credentials::handle_check_cookie(&config).await,
        }
    }
}
