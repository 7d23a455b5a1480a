//! tickbox - log in to the tickbox auth server from the terminal.
//!
//! Usage:
//!   tickbox login [--email <email>]
//!   tickbox logout
//!   tickbox status

use std::io::{self, Write};

use anyhow::{Context, Result};
use tickbox_core::{AuthManager, AuthState, Config, Credentials, LoginError};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "Usage: tickbox <login [--email <email>] | logout | status>";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

enum Command {
    Login { email: Option<String> },
    Logout,
    Status,
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args.first().map(String::as_str) {
        Some("login") => {
            let email = match args.get(1).map(String::as_str) {
                Some("--email") => Some(
                    args.get(2)
                        .cloned()
                        .ok_or_else(|| anyhow::anyhow!("--email needs a value"))?,
                ),
                Some(other) => anyhow::bail!("Unknown argument: {}\n{}", other, USAGE),
                None => None,
            };
            Ok(Command::Login { email })
        }
        Some("logout") => Ok(Command::Logout),
        Some("status") | None => Ok(Command::Status),
        Some(other) => anyhow::bail!("Unknown command: {}\n{}", other, USAGE),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    }
    .with_env_overrides();

    let manager = config.auth_manager()?;
    let state = manager.initialize();

    match command {
        Command::Status => print_state(&state),
        Command::Logout => {
            manager.logout();
            println!("Logged out.");
        }
        Command::Login { email } => {
            let email = match email.or_else(|| config.last_email.clone()) {
                Some(email) => email,
                None => prompt_email()?,
            };
            login(&manager, &mut config, email).await?;
        }
    }

    Ok(())
}

async fn login(manager: &AuthManager, config: &mut Config, email: String) -> Result<()> {
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    println!("Authenticating...");
    match manager.submit(Credentials::new(email.clone(), password)).await {
        Ok(user) => {
            config.last_email = Some(email);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            info!("Login complete");
            println!("Logged in as {} ({}).", user.display_name, user.email);
            if let Some(message) = manager.state().message {
                println!("{}", message);
            }
            Ok(())
        }
        Err(LoginError::Validation) => anyhow::bail!("Email and password are required"),
        Err(_) => anyhow::bail!("{}", failure_message(&manager.state())),
    }
}

/// Login failure text: the server message, then one line per field error
fn failure_message(state: &AuthState) -> String {
    let mut message = format!(
        "Login failed: {}",
        state.error.as_deref().unwrap_or("unknown error")
    );
    if let Some(fields) = &state.field_errors {
        let mut names: Vec<_> = fields.keys().collect();
        names.sort();
        for name in names {
            message.push_str(&format!("\n  {}: {}", name, fields[name].join(", ")));
        }
    }
    message
}

fn prompt_email() -> Result<String> {
    print!("Email: ");
    io::stdout().flush()?;

    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    Ok(email.trim().to_string())
}

fn print_state(state: &AuthState) {
    match &state.user {
        Some(user) if state.is_authenticated => {
            println!("Logged in as {} <{}>", user.display_name, user.email);
            println!("  id:   {}", user.id);
            println!("  role: {}", user.role);
            if let Some(expires_at) = state.expires_at {
                println!("  token expires: {}", expires_at.format("%Y-%m-%d %H:%M UTC"));
            }
        }
        _ => println!("Not logged in."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert!(matches!(parse_args(&args(&[])).unwrap(), Command::Status));
        assert!(matches!(parse_args(&args(&["logout"])).unwrap(), Command::Logout));
        assert!(matches!(
            parse_args(&args(&["login"])).unwrap(),
            Command::Login { email: None }
        ));
        match parse_args(&args(&["login", "--email", "a@b.com"])).unwrap() {
            Command::Login { email } => assert_eq!(email.as_deref(), Some("a@b.com")),
            _ => panic!("expected login"),
        }
    }

    #[test]
    fn test_failure_message_lists_field_errors() {
        let state = AuthState {
            error: Some("Invalid credentials".to_string()),
            field_errors: Some(
                [
                    ("password".to_string(), vec!["too short".to_string()]),
                    ("email".to_string(), vec!["not found".to_string(), "bad".to_string()]),
                ]
                .into_iter()
                .collect(),
            ),
            ..AuthState::default()
        };

        assert_eq!(
            failure_message(&state),
            "Login failed: Invalid credentials\n  email: not found, bad\n  password: too short"
        );
        assert_eq!(
            failure_message(&AuthState::default()),
            "Login failed: unknown error"
        );
    }

    #[test]
    fn test_parse_args_rejects_unknown() {
        assert!(parse_args(&args(&["frobnicate"])).is_err());
        assert!(parse_args(&args(&["login", "--email"])).is_err());
        assert!(parse_args(&args(&["login", "--bogus"])).is_err());
    }
}
