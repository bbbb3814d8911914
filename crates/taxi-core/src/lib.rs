//! # taxi-core: Pure Fare Logic for the Taximeter
//!
//! This crate is the **heart** of the taximeter. It contains the fare
//! state machine and everything it needs, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Taximeter Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Front-ends (HTTP API polled by a web page, CLI)        │   │
//! │  │    start ──► toggle state/option ──► live snapshot ──► stop     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Utc::now() passed in                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ taxi-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   rates   │  │   meter   │  │ validation│  │   │
//! │  │   │ MeterState│  │ RateConfig│  │ FareMeter │  │   rules   │  │   │
//! │  │   │ OptionId  │  │ RateDoc   │  │ Snapshot  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • DETERMINISTIC               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │ FinishedTrip                           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    taxi-db (Trip history)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (MeterState, LevelId, OptionId, TripRecord)
//! - [`money`] - Fare type, rounded only at presentation
//! - [`rates`] - Rate document parsing and the immutable RateConfig
//! - [`meter`] - The FareMeter state machine and live snapshots
//! - [`error`] - Domain error types
//! - [`validation`] - Input and rate validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use taxi_core::{FareMeter, LevelId, OptionId, RateConfig};
//!
//! let rates = RateConfig::default()
//!     .with_option(OptionId::parse("night").unwrap(), "Night", 1.25)
//!     .unwrap();
//! let mut meter = FareMeter::new(rates);
//! let t0 = Utc::now();
//!
//! meter.start(LevelId::DEFAULT, t0);
//! meter.toggle_state(t0);                                       // stopped
//! meter.toggle_option(&OptionId::parse("night").unwrap(), true, t0);
//! let outcome = meter.stop(t0 + Duration::seconds(8));
//!
//! // 8s × 0.02 €/s × 1.25
//! assert_eq!(outcome.fare().rounded(), 0.20);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod meter;
pub mod money;
pub mod rates;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ClockRegression, CoreError, CoreResult, ValidationError};
pub use meter::{
    effective_rate, Accrual, ActiveSurcharge, FareMeter, FinishedTrip, LiveSnapshot, LogLine,
    SnapshotMeta, StopOutcome, TripState,
};
pub use money::Fare;
pub use rates::{OptionRate, RateConfig, RateDocument};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Highest fare level accepted.
pub const MAX_LEVEL: u32 = 99;

/// Maximum length of an option identifier.
pub const MAX_OPTION_ID_LEN: usize = 32;

/// Maximum length of a customer name.
pub const MAX_CUSTOMER_NAME_LEN: usize = 100;

/// Customer name used when none is given.
pub const DEFAULT_CUSTOMER_NAME: &str = "Guest";
