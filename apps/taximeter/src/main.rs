//! # Taximeter Entry Point
//!
//! ```text
//! taximeter serve   [--port N] [--bind ADDR]   HTTP API for the meter page
//! taximeter ride    [--level N]                interactive terminal meter
//! taximeter history [--limit N]                list recorded trips
//!
//! Global: --data-dir DIR  --rates FILE  --db FILE
//! ```
//!
//! ## Startup Sequence
//! 1. Parse flags and resolve configuration (flags > env > defaults)
//! 2. Create the data directory and initialize logging
//! 3. Load rates, open the history database
//! 4. Run the chosen subcommand

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::info;

use taxi_core::LevelId;
use taxi_meter::config::{AppConfig, ConfigOverrides};
use taxi_meter::{build_state, cli, http, init_tracing};

#[derive(Parser)]
#[command(name = "taximeter", version, about = "Digital taximeter")]
struct Cli {
    /// Directory for the database, rate file and log file.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Rate document (JSON).
    #[arg(long, global = true)]
    rates: Option<PathBuf>,

    /// Trip history database.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        bind: Option<String>,
    },
    /// Ride interactively in the terminal.
    Ride {
        #[arg(long, default_value_t = 1)]
        level: u32,
    },
    /// Print recorded trips, newest first.
    History {
        /// Show only the newest N trips.
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let mut overrides = ConfigOverrides {
        data_dir: args.data_dir,
        rates_path: args.rates,
        db_path: args.db,
        ..Default::default()
    };
    if let Command::Serve { port, bind } = &args.cmd {
        overrides.http_port = *port;
        overrides.bind_addr = bind.clone();
    }

    let config = AppConfig::load(overrides)?;
    config.ensure_data_dir()?;
    init_tracing(Some(&config.log_path()))?;

    info!(data_dir = %config.data_dir.display(), "Starting taximeter");

    let state = build_state(config).await?;

    match args.cmd {
        Command::Serve { .. } => http::serve(state).await?,
        Command::Ride { level } => {
            let level = LevelId::new(level)?;
            cli::ride(
                &state,
                level,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await?;
            state.db.close().await;
        }
        Command::History { limit } => {
            cli::print_history(&state, limit, tokio::io::stdout()).await?;
            state.db.close().await;
        }
    }

    Ok(())
}
