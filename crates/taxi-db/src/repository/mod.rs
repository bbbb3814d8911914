//! # Repository Module
//!
//! Database repositories for the taximeter.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Command layer                                                         │
//! │       │  db.trips().record_trip(&trip)                                 │
//! │       ▼                                                                 │
//! │  TripRepository                                                        │
//! │  ├── record_trip(&self, trip)                                          │
//! │  ├── list_trips(&self)                                                 │
//! │  ├── recent_trips(&self, limit)                                        │
//! │  └── count(&self)                                                      │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite (trips table)                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod trip;
