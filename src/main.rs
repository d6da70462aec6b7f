use std::io::{self, BufRead, Write};
use std::sync::Arc;

use alphabase_console::config::ConsoleConfig;
use alphabase_console::console::Console;
use alphabase_console::discovery::CollectionSet;
use alphabase_console::summary::{collection_rows, AnalyticsSummary, DashboardSummary};
use alphabase_console::traits::SnapshotRenderer;
use alphabase_console::view::ActiveView;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prints each refreshed view to stdout.
struct StdoutRenderer;

impl SnapshotRenderer for StdoutRenderer {
    fn render(&self, view: ActiveView, snapshot: &CollectionSet) {
        let body = match view {
            ActiveView::Dashboard => DashboardSummary::from_snapshot(snapshot).to_string(),
            ActiveView::Analytics => AnalyticsSummary::from_snapshot(snapshot).to_string(),
            ActiveView::Collections => collection_rows(snapshot)
                .iter()
                .map(|row| format!("  {:<24} {:>6} items\n", row.name, row.items))
                .collect(),
            ActiveView::Data | ActiveView::None => return,
        };
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "== {} ==", view);
        let _ = write!(stdout, "{}", body);
        let _ = stdout.flush();
    }
}

fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("alphabase_console=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn env_or_prompt_username() -> Result<String> {
    if let Ok(username) = std::env::var("ALPHABASE_USERNAME") {
        if !username.trim().is_empty() {
            return Ok(username.trim().to_string());
        }
    }
    print!("Username: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let username = line.trim().to_string();
    if username.is_empty() {
        return Err(eyre!("a username is required"));
    }
    Ok(username)
}

fn env_or_prompt_password() -> Result<String> {
    match std::env::var("ALPHABASE_PASSWORD") {
        Ok(password) if !password.is_empty() => Ok(password),
        _ => rpassword::prompt_password("Password: ").wrap_err("failed to read password"),
    }
}

/// First non-flag argument, parsed as the view to open after sign in.
fn requested_view() -> Result<Option<ActiveView>> {
    match std::env::args().skip(1).find(|arg| !arg.starts_with('-')) {
        Some(arg) => arg
            .parse::<ActiveView>()
            .map(Some)
            .map_err(|e| eyre!("{}", e)),
        None => Ok(None),
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let config = ConsoleConfig::from_env().wrap_err("invalid configuration")?;
    let view = requested_view()?;

    println!("AlphaBase Console {} - {}", VERSION, config.base_url);
    let username = env_or_prompt_username()?;
    let password = env_or_prompt_password()?;

    let console = Console::with_defaults(config, Arc::new(StdoutRenderer))?;
    console
        .login(&username, &password)
        .await
        .map_err(|e| eyre!("{}", e.user_message()))?;

    if let Some(view) = view {
        console.switch_view(view);
    }

    println!("Listening for changes. Press Ctrl-C to quit.");
    tokio::signal::ctrl_c().await?;

    console.logout();
    println!("Signed out.");
    Ok(())
}

fn main() -> Result<()> {
    // Handle --version flag before any initialization
    if std::env::args().any(|arg| arg == "--version" || arg == "-V") {
        println!("alphabase-console {}", VERSION);
        std::process::exit(0);
    }

    color_eyre::install()?;
    setup_tracing();

    run()
}
