//! Parlor server binary.
//!
//! # Usage
//!
//! ```bash
//! # Start with self-signed certificate (development)
//! parlor-server --bind 0.0.0.0:4433
//!
//! # Start with TLS certificate
//! parlor-server --bind 0.0.0.0:4433 --cert cert.pem --key key.pem
//!
//! # Tell apart several clients on the same host
//! parlor-server --id-with-port
//! ```

use std::time::Duration;

use clap::Parser;
use parlor_server::{DriverConfig, Server, ServerRuntimeConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Parlor chat server
#[derive(Parser, Debug)]
#[command(name = "parlor-server")]
#[command(about = "Parlor chat server")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:4433")]
    bind: String,

    /// Path to TLS certificate (PEM format)
    #[arg(short, long, requires = "key")]
    cert: Option<String>,

    /// Path to TLS private key (PEM format)
    #[arg(short, long, requires = "cert")]
    key: Option<String>,

    /// Seconds of silence before a connection is closed
    #[arg(long, default_value = "30")]
    idle_timeout: u64,

    /// Maximum concurrent connections
    #[arg(long, default_value = "10000")]
    max_connections: usize,

    /// Use `ip:port` instead of the bare IP as participant id
    #[arg(long)]
    id_with_port: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Parlor server starting");
    tracing::info!("Binding to {}", args.bind);

    let config = ServerRuntimeConfig {
        bind_address: args.bind,
        cert_path: args.cert,
        key_path: args.key,
        idle_timeout: Duration::from_secs(args.idle_timeout),
        driver: DriverConfig {
            max_connections: args.max_connections,
            id_with_port: args.id_with_port,
        },
    };

    let server = Server::bind(config)?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
