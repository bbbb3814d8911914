//! # Commands Module
//!
//! Operations shared by the HTTP API and the interactive CLI.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! └── trip.rs     ◄─── start, toggle, snapshot, stop, history
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Front-end                                                              │
//! │  ─────────                                                              │
//! │  fetch('/api/toggle_option', { option: 'night', active: true })         │
//! │  or CLI choice "2"                                                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  commands::trip::toggle_option(&state, "night", true, Utc::now())       │
//! │         │                                                               │
//! │         ├── lock session, call FareMeter, unlock                        │
//! │         ├── log (INFO, or WARN on clock regression)                     │
//! │         ▼                                                               │
//! │  ToggleOptionResponse { status: "ok", applied: true }                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod trip;

pub use trip::{
    live_snapshot, start_trip, stop_trip, toggle_option, toggle_state, trip_history,
    HistoryQuery, LevelInput, StartTripRequest, StartTripResponse, StopTripResponse, ToggleOptionRequest,
    ToggleOptionResponse, ToggleStateResponse,
};
