//! # taxi-db: Trip History Storage
//!
//! SQLite-backed history of finished trips, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Taximeter Data Flow                              │
//! │                                                                         │
//! │  stop_trip command                                                     │
//! │       │  FinishedTrip + customer name                                  │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     taxi-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repository   │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│  (trip.rs)    │    │  (embedded)  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  <data dir>/trips.db                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use taxi_db::{Database, DbConfig, NewTrip};
//!
//! let db = Database::new(DbConfig::new("trips.db")).await?;
//! db.trips().record_trip(&NewTrip::from_finished(&finished, "Ana")).await?;
//! let history = db.trips().list_trips().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::trip::{NewTrip, TripRepository};
