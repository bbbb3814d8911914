//! # Trip Commands
//!
//! Start, steer, observe and finish a trip.
//!
//! ## Trip Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐  start_trip  ┌──────────┐  toggle_state  ┌──────────┐    │
//! │  │   Idle   │─────────────►│  Moving  │◄──────────────►│ Stopped  │    │
//! │  └──────────┘              └────┬─────┘                └────┬─────┘    │
//! │       ▲                         │ toggle_option (either state)│         │
//! │       │                         ▼                             ▼         │
//! │       └──────────────────── stop_trip ◄─────────────────────────        │
//! │                          (record_trip after the lock is released)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every command takes `now` from the caller; the meter never reads a clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::ApiError;
use crate::state::AppState;
use taxi_core::validation::{validate_customer_name, validate_level};
use taxi_core::{
    Accrual, LevelId, LiveSnapshot, MeterState, OptionId, StopOutcome, TripRecord,
    DEFAULT_CUSTOMER_NAME,
};
use taxi_db::NewTrip;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of `POST /api/start`. Both fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartTripRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub level: Option<LevelInput>,
}

/// A level as sent by a client: `2` or `"2"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LevelInput {
    Number(i64),
    Text(String),
}

impl LevelInput {
    /// The numeric level; range checks happen in [`start_trip`].
    pub fn to_level(&self) -> Result<i64, ApiError> {
        match self {
            LevelInput::Number(level) => Ok(*level),
            LevelInput::Text(raw) => raw.trim().parse().map_err(|_| {
                ApiError::validation(format!("level must be a whole number, got '{}'", raw))
            }),
        }
    }
}

/// Query of `GET /api/history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Newest `limit` trips only; all trips when absent.
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartTripResponse {
    pub status: &'static str,
    pub trip_id: String,
    pub customer: String,
    pub level: LevelId,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleStateResponse {
    pub status: &'static str,
    /// False when no trip was running.
    pub applied: bool,
    pub new_state: MeterState,
}

/// Body of `POST /api/toggle_option`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleOptionRequest {
    pub option: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleOptionResponse {
    pub status: &'static str,
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopTripResponse {
    /// Final fare rounded to cents; 0 when nothing was running.
    pub fare: f64,
    /// Whether a history record was written.
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip: Option<TripRecord>,
}

// =============================================================================
// Commands
// =============================================================================

/// Starts a new trip for `name` at `level`.
///
/// A blank or missing name rides as "Guest"; a missing level rides at 1.
/// Restarting over a running trip discards it without writing history.
pub fn start_trip(
    state: &AppState,
    name: Option<&str>,
    level: Option<i64>,
    now: DateTime<Utc>,
) -> Result<StartTripResponse, ApiError> {
    let customer = match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => validate_customer_name(name)?,
        None => DEFAULT_CUSTOMER_NAME.to_string(),
    };

    let level = match level {
        Some(raw) => {
            validate_level(raw)?;
            LevelId::try_from(raw as u32)?
        }
        None => LevelId::DEFAULT,
    };

    let (abandoned, trip_id) = state.session.with_session_mut(|session| {
        let abandoned = session.meter.start(level, now);
        session.customer = customer.clone();
        let trip_id = session
            .meter
            .trip()
            .map(|trip| trip.trip_id().to_string())
            .unwrap_or_default();
        (abandoned, trip_id)
    });

    if let Some(fare) = abandoned {
        warn!(fare = fare.rounded(), "Running trip abandoned by a new start");
    }
    info!(trip_id = %trip_id, customer = %customer, %level, "Trip started");

    Ok(StartTripResponse {
        status: "started",
        trip_id,
        customer,
        level,
    })
}

/// Flips the running trip between moving and stopped.
pub fn toggle_state(state: &AppState, now: DateTime<Utc>) -> ToggleStateResponse {
    let (accrual, new_state) = state
        .session
        .with_session_mut(|session| (session.meter.toggle_state(now), session.meter.state()));

    match accrual {
        Some(accrual) => {
            report_accrual(&accrual);
            info!(state = %new_state, "Meter state changed");
        }
        None => debug!("toggle_state ignored, no trip running"),
    }

    ToggleStateResponse {
        status: "ok",
        applied: accrual.is_some(),
        new_state,
    }
}

/// Turns a surcharge option on or off for the running trip.
pub fn toggle_option(
    state: &AppState,
    option: &str,
    active: bool,
    now: DateTime<Utc>,
) -> Result<ToggleOptionResponse, ApiError> {
    let option = OptionId::parse(option)?;

    let accrual = state
        .session
        .with_session_mut(|session| session.meter.toggle_option(&option, active, now));

    match accrual {
        Some(accrual) => {
            report_accrual(&accrual);
            info!(%option, active, "Surcharge option toggled");
        }
        None => debug!(%option, "toggle_option ignored, no trip running"),
    }

    Ok(ToggleOptionResponse {
        status: "ok",
        applied: accrual.is_some(),
    })
}

/// Current view of the meter.
pub fn live_snapshot(state: &AppState, now: DateTime<Utc>) -> LiveSnapshot {
    state
        .session
        .with_session(|session| session.meter.live_snapshot(now))
}

/// Finishes the running trip and records it.
///
/// Only a trip that was actually running is written to the history. A failed
/// write is logged and reported as `saved: false`; the fare is still returned.
pub async fn stop_trip(state: &AppState, now: DateTime<Utc>) -> StopTripResponse {
    let (outcome, customer) = state
        .session
        .with_session_mut(|session| (session.meter.stop(now), session.customer.clone()));

    let finished = match outcome {
        StopOutcome::Idle => {
            debug!("stop_trip ignored, no trip running");
            return StopTripResponse {
                fare: 0.0,
                saved: false,
                trip: None,
            };
        }
        StopOutcome::Finished(finished) => finished,
    };

    report_accrual(&finished.accrual);
    let fare = finished.fare.rounded();
    info!(trip_id = %finished.trip_id, customer = %customer, fare, "Trip finished");

    match state
        .db
        .trips()
        .record_trip(&NewTrip::from_finished(&finished, customer))
        .await
    {
        Ok(record) => StopTripResponse {
            fare,
            saved: true,
            trip: Some(record),
        },
        Err(e) => {
            error!(trip_id = %finished.trip_id, error = %e, "Failed to record trip");
            StopTripResponse {
                fare,
                saved: false,
                trip: None,
            }
        }
    }
}

/// Recorded trips, newest first. `limit` keeps only the newest ones.
pub async fn trip_history(
    state: &AppState,
    limit: Option<u32>,
) -> Result<Vec<TripRecord>, ApiError> {
    let repo = state.db.trips();
    let trips = match limit {
        Some(limit) => repo.recent_trips(limit).await?,
        None => repo.list_trips().await?,
    };
    debug!(count = trips.len(), ?limit, "trip_history");
    Ok(trips)
}

fn report_accrual(accrual: &Accrual) {
    if let Some(regression) = accrual.clock_regression {
        warn!(
            drift_ms = regression.drift_ms,
            segment_start = %regression.segment_start,
            "Clock went backwards, segment billed as zero"
        );
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
