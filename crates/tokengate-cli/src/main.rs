//! tokengate - command-line front end for the session controller.
//!
//! Restores the session from the stored token, runs one transition (login,
//! register, logout) and carries out the redirect the controller asks for
//! by printing it.

mod prompt;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tokengate_core::{
    ApiClient, AuthOutcome, Config, Credentials, RegistrationData, SessionController, TokenStore,
};

// ============================================================================
// Constants
// ============================================================================

const USAGE: &str = "\
Usage: tokengate [command]

Commands:
  status                 Show who is signed in (default)
  login [username]       Sign in and store the session token
  register key=value...  Create an account (password is prompted if missing)
  logout                 Forget the stored session token
  config                 Show the effective configuration
  help                   Show this message

Environment:
  TOKENGATE_BACKEND_URL  Base URL of the auth backend
  TOKENGATE_TOKEN_STORE  Where to keep the token: file | keyring
  TOKENGATE_USERNAME     Username for non-interactive login
  TOKENGATE_PASSWORD     Password for non-interactive login
  RUST_LOG               Log filter (default: warn)";

const USERNAME_ENV: &str = "TOKENGATE_USERNAME";
const PASSWORD_ENV: &str = "TOKENGATE_PASSWORD";

type Controller = SessionController<ApiClient, Box<dyn TokenStore + Send + Sync>>;

#[derive(Debug, PartialEq)]
enum Command {
    Status,
    Login(Option<String>),
    Register(RegistrationData),
    Logout,
    ShowConfig,
    Help,
}

/// Initialize the tracing subscriber for logging.
/// Returns the guard that flushes the log file on drop, if one is open.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = dirs::cache_dir().and_then(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("tokengate")
            .filename_suffix("log")
            .build(dir.join("tokengate").join("logs"))
            .ok()
    });
    let (file_layer, guard) = match file_appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            return Ok(ExitCode::FAILURE);
        }
    };
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config()?;
    info!(backend = %config.backend_url, store = ?config.token_store, "tokengate starting");

    if command == Command::ShowConfig {
        show_config(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut controller = SessionController::new(config.api_client()?, config.token_store()?);

    let outcome = match command {
        Command::Status => {
            controller.initialize().await;
            print_status(&controller);
            return Ok(ExitCode::SUCCESS);
        }
        Command::Login(username) => {
            controller.initialize().await;
            login(&mut controller, username).await?
        }
        Command::Register(mut data) => {
            if !data.contains("password") {
                data.insert("password", prompt::password()?);
            }
            controller.register(&data).await
        }
        Command::Logout => controller.logout(),
        Command::ShowConfig | Command::Help => unreachable!("handled above"),
    };

    Ok(report(&controller, &outcome))
}

/// Config file plus environment; a broken file falls back to defaults
fn load_config() -> Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            let mut config = Config::default();
            config.apply_overrides(|key| std::env::var(key).ok())?;
            Ok(config)
        }
    }
}

fn show_config(config: &Config) -> Result<()> {
    let path = Config::init_file()?;
    println!("config file:   {}", path.display());
    println!("backend url:   {}", config.backend_url);
    println!("origin:        {}", config.origin()?);
    println!("token store:   {:?}", config.token_store);
    println!("timeout:       {}s", config.request_timeout().as_secs());
    Ok(())
}

async fn login(controller: &mut Controller, username: Option<String>) -> Result<AuthOutcome> {
    if let Some(name) = controller.current_user().and_then(|u| u.display_name()) {
        println!("Currently signed in as {}", name);
    }

    let username = match username.or_else(|| std::env::var(USERNAME_ENV).ok()) {
        Some(username) => username,
        None => prompt::username()?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) => prompt::password()?,
    };

    let credentials = Credentials::new(username, password);
    if !credentials.is_complete() {
        return Ok(AuthOutcome::Error {
            message: "Username and password required".to_string(),
        });
    }

    Ok(controller.login_with(&credentials).await)
}

fn print_status(controller: &Controller) {
    match controller.current_user() {
        Some(user) => match user.display_name() {
            Some(name) => println!("Signed in as {}", name),
            None => println!("Signed in as {}", user.as_value()),
        },
        None => println!("Not logged in"),
    }
}

/// Perform the outcome's redirect (here: print it) and pick the exit code
fn report(controller: &Controller, outcome: &AuthOutcome) -> ExitCode {
    match outcome {
        AuthOutcome::Success { redirect_to } => {
            print_status(controller);
            println!("-> {}", redirect_to.path());
            ExitCode::SUCCESS
        }
        AuthOutcome::Error { message } => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn parse_command(args: &[String]) -> Result<Command> {
    let Some((name, rest)) = args.split_first() else {
        return Ok(Command::Status);
    };

    match name.as_str() {
        "status" | "whoami" if rest.is_empty() => Ok(Command::Status),
        "login" if rest.len() <= 1 => Ok(Command::Login(rest.first().cloned())),
        "register" => Ok(Command::Register(parse_fields(rest)?)),
        "logout" if rest.is_empty() => Ok(Command::Logout),
        "config" if rest.is_empty() => Ok(Command::ShowConfig),
        "help" | "--help" | "-h" => Ok(Command::Help),
        "status" | "whoami" | "login" | "logout" | "config" => {
            Err(anyhow::anyhow!("Unexpected arguments for {}", name))
        }
        other => Err(anyhow::anyhow!("Unknown command: {}", other)),
    }
}

/// `key=value` pairs into registration fields
fn parse_fields(args: &[String]) -> Result<RegistrationData> {
    let mut data = RegistrationData::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .filter(|(key, _)| !key.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Expected key=value, got: {}", arg))?;
        data.insert(key, value);
    }
    if data.is_empty() {
        anyhow::bail!("register needs at least one key=value field");
    }
    Ok(data)
}

// ============================================================================
// Tests
// ============================================================================
