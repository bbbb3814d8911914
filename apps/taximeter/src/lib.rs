//! # Taximeter Host Library
//!
//! Everything the `taximeter` binary wires together.
//!
//! ## Module Organization
//! ```text
//! taxi_meter/
//! ├── lib.rs          ◄─── You are here (logging & state bootstrap)
//! ├── config.rs       ◄─── AppConfig, rate-file loading
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState
//! │   └── session.rs  ◄─── SessionState (Mutex<MeterSession>)
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   └── trip.rs     ◄─── start / toggle / snapshot / stop / history
//! ├── http.rs         ◄─── axum routes and graceful shutdown
//! ├── cli.rs          ◄─── interactive ride loop, history listing
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod state;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use config::{load_rates, AppConfig};
use state::AppState;
use taxi_db::{Database, DbConfig};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,taxi=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// Events go to stderr and, when `log_file` is given, are appended to that
/// file without ANSI colors.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=taxi_core=trace` - Show trace for one crate only
/// - Default: [`DEFAULT_LOG_FILTER`]
pub fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Loads rates, opens the history database and builds the shared state.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Load rates ─────► <data_dir>/rates.json, or defaults              │
/// │  2. Open database ──► SQLite (WAL), run pending migrations             │
/// │  3. Build AppState ─► idle meter, customer "Guest"                     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn build_state(config: AppConfig) -> anyhow::Result<Arc<AppState>> {
    let rates = load_rates(&config.rates_path);

    let db = Database::new(DbConfig::new(&config.db_path)).await?;
    info!(path = %config.db_path.display(), "Trip history ready");

    Ok(Arc::new(AppState::new(config, rates, db)))
}
