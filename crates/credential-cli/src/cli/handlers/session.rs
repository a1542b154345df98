//! Sign-in, sign-out and session inspection handlers

use crate::error::{CliError, Result};
use crate::observer::ConsoleObserver;
use color_eyre::eyre::eyre;
use console::style;
use credential_common::Config;
use credential_sdk::auth::TracingEventSink;
use credential_sdk::{
    Account, AppError, ClientBuilder, CredentialApp, InteractionMode, LocalTokenProvider,
    SessionManager, SignInOutcome,
};
use std::sync::Arc;
use tracing::debug;

/// Wire the local provider, the session manager and the service client
pub fn build_app(config: &Config) -> Result<CredentialApp> {
    let provider = LocalTokenProvider::from_config(&config.local);
    let session = SessionManager::builder(Arc::new(provider))
        .observer(Arc::new(ConsoleObserver))
        .event_sink(Arc::new(TracingEventSink::from_config(&config.logger)))
        .auth_config(&config.auth)?
        .build();
    let client = ClientBuilder::from_config(&config.api).build()?;
    Ok(CredentialApp::new(session, client))
}

/// Build the app and load its session
pub async fn connect(config: &Config) -> Result<CredentialApp> {
    let app = build_app(config)?;
    let session = app.load().await?;
    debug!("Session loaded: {}", session.state());
    Ok(app)
}

/// Sign in with a popup unless already signed in, without touching the service
pub async fn ensure_signed_in(app: &CredentialApp) -> Result<Account> {
    match app.session().sign_in(InteractionMode::Popup).await? {
        SignInOutcome::SignedIn(account) | SignInOutcome::AlreadySignedIn(account) => Ok(account),
        outcome => Err(CliError::Internal(eyre!(
            "Sign-in did not complete: {outcome:?}"
        ))),
    }
}

pub async fn handle_login(config: &Config, mode: InteractionMode) -> Result<()> {
    let app = connect(config).await?;
    match app.sign_in(mode).await? {
        SignInOutcome::SignedIn(_) => {
            println!("{}", style("Signed in to the credential service").green());
        }
        SignInOutcome::AlreadySignedIn(account) => {
            println!("Already signed in as {}", style(&account.username).bold());
        }
        SignInOutcome::Redirecting => {
            println!("Navigating away for redirect sign-in");
        }
        SignInOutcome::InProgress => {
            println!("Another sign-in is already in progress");
        }
    }
    Ok(())
}

pub async fn handle_token(config: &Config) -> Result<()> {
    let app = connect(config).await?;
    ensure_signed_in(&app).await?;

    let token = app
        .session()
        .get_token()
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NoIdToken)?;
    if let Some(expires_on) = token.expires_on() {
        eprintln!(
            "{}",
            style(format!("Expires {}", expires_on.format("%Y-%m-%d %H:%M:%S UTC"))).dim()
        );
    }
    println!("{}", token.secret());
    Ok(())
}

pub async fn handle_logout(config: &Config) -> Result<()> {
    let app = connect(config).await?;
    app.sign_out().await?;
    println!("{}", style("Signed out").green());
    Ok(())
}

pub async fn handle_status(config: &Config) -> Result<()> {
    let app = connect(config).await?;
    let session = app.session().snapshot();

    println!();
    println!("  {}: {}", style("Session").bold(), session.state());
    match session.active_account() {
        Some(account) => {
            println!("  {}: {}", style("Account").bold(), account.username);
            if let Some(name) = &account.name {
                println!("  {}: {}", style("Name").bold(), name);
            }
        }
        None => println!("  {}: none", style("Account").bold()),
    }
    println!("  {}: {}", style("Service").bold(), app.client().base_url());
    println!();
    Ok(())
}
