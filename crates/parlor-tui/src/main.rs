//! Parlor TUI entry point.

use std::{fs::File, sync::Mutex};

use clap::Parser;
use parlor_tui::{App, Runtime, TerminalDriver};
use tracing_subscriber::EnvFilter;

/// Parlor terminal chat client
#[derive(Parser, Debug)]
#[command(name = "parlor-tui")]
#[command(about = "Terminal client for the Parlor chat server")]
#[command(version)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:4433")]
    server: String,

    /// Display name to announce (the server picks one if omitted)
    #[arg(short, long)]
    name: Option<String>,

    /// Write logs to this file (the terminal is never used for logs)
    #[arg(long)]
    log_file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(File::create(path)?))
            .init();
    }

    tracing::info!(server = %args.server, "Parlor TUI starting");

    let app = App::new(args.server).with_display_name(args.name);
    let driver = TerminalDriver::new()?;

    Runtime::new(driver, app).run().await?;

    Ok(())
}
