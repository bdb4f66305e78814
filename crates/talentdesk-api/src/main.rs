//! Talentdesk REST API entry point.
//!
//! Binary name: `tdesk`
//!
//! Parses CLI arguments, initializes database and services, then starts
//! the REST API server.

mod http;
mod state;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use state::AppState;

#[derive(Parser)]
#[command(name = "tdesk", about = "Talentdesk recruiting assistant API", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "info,talentdesk=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => {
            let state = AppState::init().await?;
            tracing::info!(data_dir = %state.data_dir.display(), "application state initialized");
            let router = http::router::build_router(state);

            let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
            tracing::info!(%addr, "starting Talentdesk API server");

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}
