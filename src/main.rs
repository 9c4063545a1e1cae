//! Users API server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ pipeline ───────────────────────────┐
//!                                           │ fault translation                    │
//!                                           │   count → authenticate → authorize   │
//!                                           │   → rate limit → handler ─▶ store    │
//!                                           │ request log (stdout + daily files)   │
//!     ◀─────────────────────────────────────┴─────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use users_api::config::{load_config, AppConfig};
use users_api::http::HttpServer;
use users_api::lifecycle::{trigger_on_signal, Shutdown};
use users_api::observability::{logging, metrics};
use users_api::security::TokenService;

#[derive(Parser)]
#[command(name = "users-api", version, about = "Minimal Users API server")]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "USERS_API_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a bearer token signed with the configured key
    IssueToken {
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "user")]
        role: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_tracing(&config.logging.level);

    match cli.command.unwrap_or(Command::Serve) {
        Command::IssueToken { subject, role } => {
            let token = TokenService::from_config(&config.auth).issue(&subject, &role)?;
            println!("{token}");
            Ok(())
        }
        Command::Serve => serve(config).await,
    }
}

async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("users-api v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        global_permits = config.rate_limit.global.permit_limit,
        list_permits = config.rate_limit.list_users.permit_limit,
        file_logging = config.logging.file_enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config);

    let test_token = server.state().tokens.issue("Nikolai", "admin")?;
    tracing::info!(token = %test_token, "TEST TOKEN");

    let shutdown = Shutdown::new();
    tokio::spawn(trigger_on_signal(shutdown.clone()));
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
