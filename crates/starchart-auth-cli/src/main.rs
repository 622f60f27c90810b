//! starchart-auth - command-line front end for the Star Chart credential store.
//!
//! Accounts and the session live as JSON files in the configured data
//! directory. Passwords are always prompted for, never read from arguments.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use starchart_auth_core::{
    AuthAction, AuthConfig, AuthError, AuthResponse, CredentialStore, FileStorage, PrefixSweep,
    SessionData, UserRole,
};

// ============================================================================
// Constants
// ============================================================================

/// Directory for an additional log file; stderr only when unset
const LOG_DIR_ENV: &str = "STARCHART_AUTH_LOG_DIR";

const LOG_FILE: &str = "starchart-auth.log";

const USAGE: &str = "\
Usage: starchart-auth <command>

Commands:
  register <username>   Create an account
  login <username>      Start a session
  logout                End the current session
  whoami                Show the logged-in user
  change-password       Change the logged-in user's password
  delete-account        Delete the logged-in user's account and data
  status                Show session and account counts
  help                  Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Register(String),
    Login(String),
    Logout,
    Whoami,
    ChangePassword,
    DeleteAccount,
    Status,
    Help,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut iter = args.iter().map(String::as_str);
    let command = match (iter.next(), iter.next()) {
        (Some("register"), Some(username)) => Command::Register(username.to_string()),
        (Some("login"), Some(username)) => Command::Login(username.to_string()),
        (Some("register" | "login"), None) => anyhow::bail!("Missing <username>"),
        (Some("logout"), None) => Command::Logout,
        (Some("whoami"), None) => Command::Whoami,
        (Some("change-password"), None) => Command::ChangePassword,
        (Some("delete-account"), None) => Command::DeleteAccount,
        (Some("status"), None) => Command::Status,
        (None | Some("help" | "-h" | "--help"), _) => Command::Help,
        (Some(other), _) => anyhow::bail!("Unknown command or extra arguments: {}", other),
    };
    if iter.next().is_some() {
        anyhow::bail!("Too many arguments");
    }
    Ok(command)
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// Render user-facing failures; propagate storage and digest faults.
fn respond(action: AuthAction, result: Result<(), AuthError>) -> Result<AuthResponse> {
    match result {
        Err(e) if !e.is_user_facing() => Err(e.into()),
        other => Ok(AuthResponse::from_result(action, other)),
    }
}

fn failure(message: impl Into<String>) -> AuthResponse {
    AuthResponse {
        success: false,
        message: message.into(),
    }
}

fn prompt_new_password(prompt: &str) -> Result<Option<String>> {
    let password = rpassword::prompt_password(prompt)?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    Ok((password == confirm).then_some(password))
}

fn whoami_line(session: &SessionData, is_admin: bool) -> String {
    let role = if is_admin { UserRole::Admin } else { UserRole::User };
    format!(
        "{} [{}] (logged in {} min)",
        session.username,
        role,
        session.minutes_logged_in()
    )
}

async fn execute(store: &CredentialStore, config: &AuthConfig, command: Command) -> Result<AuthResponse> {
    let response = match command {
        Command::Register(username) => match prompt_new_password("Password: ")? {
            Some(password) => respond(
                AuthAction::Register,
                store.register(&username, &password).await,
            )?,
            None => failure("Passwords do not match"),
        },
        Command::Login(username) => {
            let password = rpassword::prompt_password("Password: ")?;
            respond(AuthAction::Login, store.login(&username, &password).await)?
        }
        Command::Logout => respond(AuthAction::Logout, store.logout().await)?,
        Command::Whoami => match store.current_session()? {
            Some(session) => AuthResponse {
                success: true,
                message: whoami_line(&session, store.is_admin()),
            },
            None => failure(AuthError::NotLoggedIn.to_string()),
        },
        Command::ChangePassword => {
            let old_password = rpassword::prompt_password("Current password: ")?;
            match prompt_new_password("New password: ")? {
                Some(new_password) => respond(
                    AuthAction::ChangePassword,
                    store.change_password(&old_password, &new_password).await,
                )?,
                None => failure("Passwords do not match"),
            }
        }
        Command::DeleteAccount => {
            let password = rpassword::prompt_password("Password: ")?;
            respond(AuthAction::DeleteAccount, store.delete_account(&password).await)?
        }
        Command::Status => AuthResponse {
            success: true,
            message: format!(
                "users: {}\nsession: {}\ndigest: {}",
                store.user_count()?,
                store.current_user().unwrap_or_else(|| "none".to_string()),
                config.digest
            ),
        },
        Command::Help => AuthResponse {
            success: true,
            message: USAGE.to_string(),
        },
    };
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = AuthConfig::load()?.with_env_overrides()?;
    let storage_dir = config.storage_dir()?;
    let storage = FileStorage::new(storage_dir.clone())
        .with_context(|| format!("Failed to open storage at {}", storage_dir.display()))?;
    info!(dir = %storage_dir.display(), "starchart-auth starting");

    let store = CredentialStore::new(Arc::new(storage), &config).with_sweep(Arc::new(PrefixSweep));
    store.init().await?;

    let response = execute(&store, &config, command).await?;
    if response.success {
        println!("{}", response.message);
    } else {
        eprintln!("{}", response.message);
    }

    // Flush the file log before a failing exit skips destructors
    drop(log_guard);
    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
