//! `research` binary.
//!
//! ```bash
//! # Serve the gateway on the configured port
//! RUST_LOG=info research serve --config research.toml
//!
//! # Drive one run from the terminal
//! research run --query "state of solid-state batteries"
//! ```

mod commands;
mod render;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "research",
    version = env!("CARGO_PKG_VERSION"),
    about = "Research pipeline gateway and local runner"
)]
struct Cli {
    /// Optional TOML file with non-secret settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the WebSocket gateway.
    Serve {
        /// Overrides the configured port.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Drive a single run locally and print the report.
    Run {
        #[arg(long)]
        query: String,

        /// Run identifier; a fresh one is generated when omitted.
        #[arg(long)]
        thread: Option<String>,
    },

    /// Continue a run from its latest checkpoint.
    Resume {
        #[arg(long)]
        thread: String,
    },

    /// List the stored checkpoints of a run.
    Checkpoints {
        #[arg(long)]
        thread: String,

        #[arg(long, env = "DATABASE_URL")]
        database: String,

        /// Print the full checkpoint records as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Command::Serve { port } => commands::serve(config, port).await,
        Command::Run { query, thread } => commands::run(config, query, thread).await,
        Command::Resume { thread } => commands::resume(config, &thread).await,
        Command::Checkpoints {
            thread,
            database,
            json,
        } => commands::checkpoints(&database, &thread, json).await,
    }
}
