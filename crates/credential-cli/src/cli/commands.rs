use clap::{Subcommand, ValueEnum};
use crate::error::CliError;
use credential_sdk::InteractionMode;

/// Main CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and exchange the identity token for the service cookie
    Login {
        /// Interactive flow to run
        #[arg(long, value_enum, default_value_t = FlowMode::Popup)]
        mode: FlowMode,
    },

    /// Print an identity token for the active account
    Token,

    /// Create a long-lived API key
    ApiKey,

    /// Check an API key against the service
    CheckKey {
        /// API key to check
        key: String,
    },

    /// Sign in and check the service cookie
    CheckCookie,

    /// Sign out and clear the service cookie
    Logout,

    /// Show the current session
    Status,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print an example configuration file
    Example,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlowMode {
    Popup,
    Redirect,
}

/// A redirect needs a page in this process to come back to, so the CLI
/// only runs popup flows
impl TryFrom<FlowMode> for InteractionMode {
    type Error = CliError;

    fn try_from(mode: FlowMode) -> Result<Self, Self::Error> {
        match mode {
            FlowMode::Popup => Ok(InteractionMode::Popup),
            FlowMode::Redirect => Err(CliError::Unsupported(
                "redirect sign-in has no page to return to in the CLI; use --mode popup"
                    .to_string(),
            )),
        }
    }
}
