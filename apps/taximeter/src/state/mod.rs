//! # State Module
//!
//! Application state shared by the HTTP server and the CLI.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  main.rs builds one Arc<AppState>                                      │
//! │                              │                                          │
//! │          ┌──────────────────┼──────────────────┐                       │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │ SessionState │  │   Database   │  │    AppConfig     │              │
//! │  │ Mutex<       │  │  (SQLite     │  │  paths, bind     │              │
//! │  │  MeterSession│  │   pool)      │  │  address         │              │
//! │  │ >            │  │              │  │                  │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • SessionState: Mutex, one meter call at a time                       │
//! │  • Database: internal connection pool                                  │
//! │  • AppConfig: read-only after startup                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod session;

pub use session::{MeterSession, SessionState};

use taxi_core::RateConfig;
use taxi_db::Database;

use crate::config::AppConfig;

/// Everything a command needs.
#[derive(Debug)]
pub struct AppState {
    pub session: SessionState,
    pub db: Database,
    pub config: AppConfig,
}

impl AppState {
    /// Creates application state with an idle meter using `rates`.
    pub fn new(config: AppConfig, rates: RateConfig, db: Database) -> Self {
        AppState {
            session: SessionState::new(rates),
            db,
            config,
        }
    }
}
