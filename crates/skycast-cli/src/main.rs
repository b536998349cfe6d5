//! skycast - a demo weather/clock client with locally-simulated sign-in.
//!
//! All "server" state lives as JSON records in the local data directory and
//! Telegram notifications are logged stand-ins; the state machine itself is
//! in skycast-core. This binary is only form input and screen dispatch.

mod widgets;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use skycast_core::{AccountStore, AuthEngine, AuthState, SessionStore, Storage, TelegramSim};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application name used for the data directory path.
const APP_NAME: &str = "skycast";

/// Initialize the tracing subscriber for logging.
/// Use the RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Data directory for persisted records. `SKYCAST_DATA_DIR` overrides the
/// platform default, which keeps demo runs self-contained.
fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SKYCAST_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
    Ok(base.join(APP_NAME))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();
    info!("skycast starting");

    let storage = Storage::new(data_dir()?)?;
    let mut engine = AuthEngine::new(
        AccountStore::new(storage.clone()),
        SessionStore::new(storage),
        Arc::new(TelegramSim),
    )?;

    println!("skycast - type 'help' for commands, 'quit' to exit");
    if let Some(user) = engine.current_user() {
        println!("welcome back, {}", user.username);
    } else if engine.pending_two_factor() {
        println!("a sign-in is awaiting confirmation; enter 'verify <code>' or 'cancel'");
    }

    let stdin = io::stdin();
    loop {
        print!("{}", prompt(&engine));
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };
        let args: Vec<&str> = parts.collect();

        if command == "quit" || command == "exit" {
            break;
        }
        if let Err(e) = dispatch(&mut engine, command, &args).await {
            println!("error: {e}");
        }
    }

    info!("skycast shutting down");
    Ok(())
}

fn prompt(engine: &AuthEngine) -> String {
    match engine.state() {
        AuthState::Authenticated(user) => format!("{}> ", user.username),
        AuthState::PendingTwoFactor(_) => "code> ".to_string(),
        AuthState::Anonymous => "guest> ".to_string(),
    }
}

/// Route-guard analogue: the command set follows the engine's derived state.
async fn dispatch(engine: &mut AuthEngine, command: &str, args: &[&str]) -> Result<()> {
    if engine.is_authenticated() {
        dispatch_authenticated(engine, command, args)
    } else if engine.pending_two_factor() {
        dispatch_pending(engine, command, args)
    } else {
        dispatch_anonymous(engine, command, args).await
    }
}

async fn dispatch_anonymous(engine: &mut AuthEngine, command: &str, args: &[&str]) -> Result<()> {
    match (command, args) {
        ("login", [email]) => {
            let password = rpassword::prompt_password("password: ")?;
            engine.login(email, &password).await?;
            match engine.state() {
                AuthState::PendingTwoFactor(pending) => println!(
                    "a confirmation code was sent to your Telegram; it is valid for {} more minutes",
                    pending.minutes_remaining()
                ),
                _ => println!("signed in"),
            }
        }
        ("register", [username, email, rest @ ..]) => {
            let password = rpassword::prompt_password("password: ")?;
            let confirm = rpassword::prompt_password("confirm password: ")?;
            if password != confirm {
                println!("passwords do not match");
                return Ok(());
            }
            engine.register(username, email, &password, rest.first().copied())?;
            println!("account created, you are signed in");
        }
        ("help", _) => {
            println!("login <email>");
            println!("register <username> <email> [telegram-id]");
            println!("quit");
        }
        _ => println!("sign in first; type 'help' for commands"),
    }
    Ok(())
}

fn dispatch_pending(engine: &mut AuthEngine, command: &str, args: &[&str]) -> Result<()> {
    match (command, args) {
        ("verify", [code]) => {
            engine.verify_two_factor(code)?;
            println!("signed in");
        }
        // Bare digits work too; the prompt already asks for the code.
        (code, []) if code.chars().all(|c| c.is_ascii_digit()) => {
            engine.verify_two_factor(code)?;
            println!("signed in");
        }
        ("cancel", _) => {
            engine.logout()?;
            println!("sign-in cancelled");
        }
        ("help", _) => {
            println!("verify <code>   (or just type the 6-digit code)");
            println!("cancel");
        }
        _ => println!("enter the confirmation code, or 'cancel'"),
    }
    Ok(())
}

fn dispatch_authenticated(engine: &mut AuthEngine, command: &str, args: &[&str]) -> Result<()> {
    match (command, args) {
        ("weather", _) => println!("{}", widgets::weather_report()),
        ("time", _) => println!("{}", widgets::clock()),
        ("whoami", _) => {
            // current_user is always present in this state
            if let Some(user) = engine.current_user() {
                println!("{} <{}>", user.username, user.email);
                println!(
                    "  telegram: {}",
                    user.telegram_id.as_deref().unwrap_or("not set")
                );
                println!(
                    "  two-factor: {}",
                    if user.two_factor_enabled { "on" } else { "off" }
                );
            }
        }
        ("telegram", [id]) => {
            engine.set_telegram_id(id)?;
            println!("telegram destination updated");
        }
        ("2fa", ["on"]) => {
            // Without a destination the code would have nowhere to go.
            if engine
                .current_user()
                .is_some_and(|u| u.telegram_id.is_none())
            {
                println!("set a telegram destination first: telegram <id>");
                return Ok(());
            }
            engine.set_two_factor_enabled(true)?;
            println!("two-factor sign-in enabled");
        }
        ("2fa", ["off"]) => {
            engine.set_two_factor_enabled(false)?;
            println!("two-factor sign-in disabled");
        }
        ("logout", _) => {
            engine.logout()?;
            println!("signed out");
        }
        ("help", _) => {
            println!("weather | time | whoami");
            println!("telegram <id>");
            println!("2fa on|off");
            println!("logout | quit");
        }
        _ => println!("unknown command; type 'help'"),
    }
    Ok(())
}
