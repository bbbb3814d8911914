//! # Fare Meter
//!
//! The fare-accumulation state machine.
//!
//! ## Trip Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fare Meter Lifecycle                             │
//! │                                                                         │
//! │           start(level, now)                                             │
//! │   IDLE ─────────────────────────► RUNNING (Moving, fare 0, no options)  │
//! │    ▲                                 │   ▲                              │
//! │    │                                 │   │ toggle_state(now)            │
//! │    │                                 │   │ toggle_option(id, on, now)   │
//! │    │                                 ▼   │                              │
//! │    │                              accrue(now) ──► flip / set option     │
//! │    │                                 │                                  │
//! │    │         stop(now)               │                                  │
//! │    └──────── accrue(now) ◄───────────┘                                  │
//! │              running = false                                            │
//! │                                                                         │
//! │  live_snapshot(now) is a pure read at any point.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Accrual
//! Every change to the billable rate goes through one private primitive:
//! ```text
//!   seconds = max(0, now − segment_start)
//!   accrued_fare += seconds × base[state] × level_mult × Π option_mult
//!   segment_start = now
//! ```
//! So each segment is billed exactly once, with the rate that was in force
//! while it was open.
//!
//! ## Example
//! ```rust
//! use chrono::{Duration, Utc};
//! use taxi_core::{FareMeter, LevelId, RateConfig};
//!
//! let mut meter = FareMeter::new(RateConfig::default());
//! let t0 = Utc::now();
//!
//! meter.start(LevelId::DEFAULT, t0);
//! meter.toggle_state(t0 + Duration::seconds(10)); // 10s moving
//! let outcome = meter.stop(t0 + Duration::seconds(15)); // 5s stopped
//!
//! assert_eq!(outcome.fare().rounded(), 0.60);
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ClockRegression;
use crate::money::{round_to, Fare, RATE_DECIMALS};
use crate::rates::RateConfig;
use crate::types::{LevelId, MeterState, OptionId, TripEvent};

// =============================================================================
// Effective Rate
// =============================================================================

/// Per-second rate for a state, level and set of active options.
///
/// Multipliers compose multiplicatively. Unknown levels and options are
/// neutral.
pub fn effective_rate<'a>(
    rates: &RateConfig,
    state: MeterState,
    level: LevelId,
    active_options: impl IntoIterator<Item = &'a OptionId>,
) -> f64 {
    active_options
        .into_iter()
        .fold(rates.base_rate(state) * rates.level_multiplier(level), |rate, id| {
            rate * rates.option_multiplier(id)
        })
}

fn elapsed_seconds(delta: TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}

// =============================================================================
// Accrual
// =============================================================================

/// The result of closing one billing segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accrual {
    /// Billed duration in seconds (never negative).
    pub seconds: f64,
    /// Effective rate the segment was billed at (€/second).
    pub rate: f64,
    /// Amount added to the trip fare.
    pub amount: Fare,
    /// Set when the clock went backwards; the segment was billed as zero.
    pub clock_regression: Option<ClockRegression>,
}

// =============================================================================
// Trip State
// =============================================================================

/// State of the current (or last) trip.
#[derive(Debug, Clone)]
pub struct TripState {
    trip_id: Uuid,
    running: bool,
    state: MeterState,
    level: LevelId,
    active_options: BTreeSet<OptionId>,
    accrued_fare: Fare,
    segment_start: DateTime<Utc>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    event_log: VecDeque<TripEvent>,
}

impl TripState {
    fn begin(level: LevelId, now: DateTime<Utc>) -> Self {
        let mut trip = TripState {
            trip_id: Uuid::new_v4(),
            running: true,
            state: MeterState::Moving,
            level,
            active_options: BTreeSet::new(),
            accrued_fare: Fare::zero(),
            segment_start: now,
            started_at: now,
            finished_at: None,
            event_log: VecDeque::new(),
        };
        trip.log(now, format!("Trip Started (Lv.{})", level));
        trip
    }

    /// Trip identifier.
    pub fn trip_id(&self) -> Uuid {
        self.trip_id
    }

    /// Whether the trip is still running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current physical state.
    pub fn state(&self) -> MeterState {
        self.state
    }

    /// Fare level, fixed at start.
    pub fn level(&self) -> LevelId {
        self.level
    }

    /// Surcharge options currently on.
    pub fn active_options(&self) -> &BTreeSet<OptionId> {
        &self.active_options
    }

    /// Fare of all closed segments (unrounded).
    pub fn accrued_fare(&self) -> Fare {
        self.accrued_fare
    }

    /// Start of the open segment.
    pub fn segment_start(&self) -> DateTime<Utc> {
        self.segment_start
    }

    /// When the trip started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the trip finished, if it has.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Event log, most recent first.
    pub fn event_log(&self) -> impl Iterator<Item = &TripEvent> {
        self.event_log.iter()
    }

    fn effective_rate(&self, rates: &RateConfig) -> f64 {
        effective_rate(rates, self.state, self.level, &self.active_options)
    }

    /// Fare including the open segment, without mutating anything.
    fn projected_fare(&self, rates: &RateConfig, now: DateTime<Utc>) -> Fare {
        if !self.running {
            return self.accrued_fare;
        }
        let seconds = elapsed_seconds(now - self.segment_start).max(0.0);
        self.accrued_fare + Fare::for_duration(seconds, self.effective_rate(rates))
    }

    /// Closes the open segment. The only place `accrued_fare` changes.
    ///
    /// On clock regression the segment is billed as zero and `segment_start`
    /// keeps the later instant, so no interval is ever billed twice.
    fn accrue(&mut self, rates: &RateConfig, now: DateTime<Utc>) -> Accrual {
        let rate = self.effective_rate(rates);
        let delta = now - self.segment_start;

        let (seconds, clock_regression) = if delta < TimeDelta::zero() {
            (0.0, Some(ClockRegression::new(self.segment_start, now)))
        } else {
            (elapsed_seconds(delta), None)
        };

        let amount = Fare::for_duration(seconds, rate);
        self.accrued_fare += amount;
        if clock_regression.is_none() {
            self.segment_start = now;
        }

        Accrual {
            seconds,
            rate,
            amount,
            clock_regression,
        }
    }

    fn log(&mut self, at: DateTime<Utc>, message: impl Into<String>) {
        self.event_log.push_front(TripEvent::new(at, message));
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// One event-log line as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct LogLine {
    /// `HH:MM:SS`
    pub time: String,
    pub msg: String,
}

/// An active surcharge, for display.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct ActiveSurcharge {
    pub id: OptionId,
    pub name: String,
    pub multiplier: f64,
}

impl ActiveSurcharge {
    /// Short label such as `Night x1.25`.
    pub fn label(&self) -> String {
        format!("{} x{}", self.name, self.multiplier)
    }
}

/// Display metadata attached to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct SnapshotMeta {
    pub level: LevelId,
    /// Level-adjusted moving rate (€/s, no surcharges, 3 decimals).
    pub move_rate: f64,
    /// Level-adjusted stopped rate (€/s, no surcharges, 3 decimals).
    pub stop_rate: f64,
    pub active_options: Vec<ActiveSurcharge>,
}

/// Live view of the meter, polled by front-ends.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct LiveSnapshot {
    /// Present once a trip has been started.
    pub trip_id: Option<String>,
    /// Projected fare rounded to cents.
    pub fare: f64,
    pub state: MeterState,
    pub is_running: bool,
    /// Most recent first.
    pub logs: Vec<LogLine>,
    pub meta: SnapshotMeta,
}

// =============================================================================
// Stop Outcome
// =============================================================================

/// A trip that `stop` just finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedTrip {
    pub trip_id: Uuid,
    pub level: LevelId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Final fare (unrounded; round with [`Fare::rounded`] for display).
    pub fare: Fare,
    /// Accrual of the last open segment.
    pub accrual: Accrual,
}

/// Result of [`FareMeter::stop`].
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// No trip was running; nothing changed.
    Idle,
    /// A running trip was finalized.
    Finished(FinishedTrip),
}

impl StopOutcome {
    /// Final fare, or zero when nothing was running.
    pub fn fare(&self) -> Fare {
        match self {
            StopOutcome::Idle => Fare::zero(),
            StopOutcome::Finished(trip) => trip.fare,
        }
    }

    /// The finished trip, if one was finalized.
    pub fn finished(&self) -> Option<&FinishedTrip> {
        match self {
            StopOutcome::Idle => None,
            StopOutcome::Finished(trip) => Some(trip),
        }
    }
}

// =============================================================================
// Fare Meter
// =============================================================================

/// Owns one trip at a time and keeps its fare consistent.
///
/// ## Invariants
/// - `accrued_fare` never decreases and grows once per closed segment
/// - While running, true fare = accrued + (now − segment_start) × rate
/// - The level is fixed for the trip's duration
///
/// Calls on an idle meter are silent no-ops. The meter has no interior
/// locking; a concurrent host must serialize calls.
#[derive(Debug, Clone)]
pub struct FareMeter {
    rates: RateConfig,
    trip: Option<TripState>,
}

impl FareMeter {
    /// Creates an idle meter.
    pub fn new(rates: RateConfig) -> Self {
        FareMeter { rates, trip: None }
    }

    /// The rate configuration.
    pub fn rates(&self) -> &RateConfig {
        &self.rates
    }

    /// The current or last trip.
    pub fn trip(&self) -> Option<&TripState> {
        self.trip.as_ref()
    }

    /// Whether a trip is running.
    pub fn is_running(&self) -> bool {
        self.trip.as_ref().is_some_and(TripState::is_running)
    }

    /// Current physical state (Stopped when no trip was ever started).
    pub fn state(&self) -> MeterState {
        self.trip
            .as_ref()
            .map(TripState::state)
            .unwrap_or(MeterState::Stopped)
    }

    /// Starts a new trip in the Moving state.
    ///
    /// Always succeeds. If a trip was still running it is discarded, and its
    /// fare up to `now` is returned so the host can report it.
    pub fn start(&mut self, level: LevelId, now: DateTime<Utc>) -> Option<Fare> {
        let abandoned = self
            .trip
            .as_ref()
            .filter(|trip| trip.running)
            .map(|trip| trip.projected_fare(&self.rates, now));

        self.trip = Some(TripState::begin(level, now));
        abandoned
    }

    /// Flips between Moving and Stopped. No-op when idle.
    pub fn toggle_state(&mut self, now: DateTime<Utc>) -> Option<Accrual> {
        let rates = &self.rates;
        let trip = self.trip.as_mut().filter(|trip| trip.running)?;

        let accrual = trip.accrue(rates, now);
        trip.state = trip.state.toggled();
        let message = trip.state.log_message();
        trip.log(now, message);

        Some(accrual)
    }

    /// Turns a surcharge option on or off. No-op when idle.
    ///
    /// Unknown options are accepted and billed as neutral.
    pub fn toggle_option(
        &mut self,
        option: &OptionId,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Option<Accrual> {
        let rates = &self.rates;
        let trip = self.trip.as_mut().filter(|trip| trip.running)?;

        let accrual = trip.accrue(rates, now);
        if is_active {
            trip.active_options.insert(option.clone());
        } else {
            trip.active_options.remove(option);
        }

        let status = if is_active { "ON" } else { "OFF" };
        let message = format!("{} {}", rates.option_name(option), status);
        trip.log(now, message);

        Some(accrual)
    }

    /// Finishes the running trip. Idle meters return [`StopOutcome::Idle`].
    pub fn stop(&mut self, now: DateTime<Utc>) -> StopOutcome {
        let rates = &self.rates;
        let Some(trip) = self.trip.as_mut().filter(|trip| trip.running) else {
            return StopOutcome::Idle;
        };

        let accrual = trip.accrue(rates, now);
        trip.running = false;
        trip.finished_at = Some(now);
        trip.log(now, "Trip Finished");

        StopOutcome::Finished(FinishedTrip {
            trip_id: trip.trip_id,
            level: trip.level,
            started_at: trip.started_at,
            finished_at: now,
            fare: trip.accrued_fare,
            accrual,
        })
    }

    /// Effective rate of the open segment, if a trip is running.
    pub fn current_rate(&self) -> Option<f64> {
        self.trip
            .as_ref()
            .filter(|trip| trip.running)
            .map(|trip| trip.effective_rate(&self.rates))
    }

    /// Unrounded projected fare at `now`.
    pub fn projected_fare(&self, now: DateTime<Utc>) -> Fare {
        self.trip
            .as_ref()
            .map(|trip| trip.projected_fare(&self.rates, now))
            .unwrap_or_default()
    }

    /// Pure read of the meter for display.
    pub fn live_snapshot(&self, now: DateTime<Utc>) -> LiveSnapshot {
        let level = self.trip.as_ref().map(TripState::level).unwrap_or_default();
        let level_multiplier = self.rates.level_multiplier(level);

        let active_options = self
            .trip
            .iter()
            .flat_map(|trip| trip.active_options.iter())
            .map(|id| ActiveSurcharge {
                id: id.clone(),
                name: self.rates.option_name(id).to_string(),
                multiplier: self.rates.option_multiplier(id),
            })
            .collect();

        let logs = self
            .trip
            .iter()
            .flat_map(|trip| trip.event_log.iter())
            .map(|event| LogLine {
                time: event.time_label(),
                msg: event.message.clone(),
            })
            .collect();

        LiveSnapshot {
            trip_id: self.trip.as_ref().map(|trip| trip.trip_id.to_string()),
            fare: self.projected_fare(now).rounded(),
            state: self.state(),
            is_running: self.is_running(),
            logs,
            meta: SnapshotMeta {
                level,
                move_rate: round_to(
                    self.rates.base_rate(MeterState::Moving) * level_multiplier,
                    RATE_DECIMALS,
                ),
                stop_rate: round_to(
                    self.rates.base_rate(MeterState::Stopped) * level_multiplier,
                    RATE_DECIMALS,
                ),
                active_options,
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const EPSILON: f64 = 1e-9;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn at(seconds: f64) -> DateTime<Utc> {
        t0() + Duration::microseconds((seconds * 1_000_000.0).round() as i64)
    }

    fn opt(id: &str) -> OptionId {
        OptionId::parse(id).unwrap()
    }

    fn level(n: u32) -> LevelId {
        LevelId::new(n).unwrap()
    }

    fn rates() -> RateConfig {
        RateConfig::new(0.05, 0.02)
            .unwrap()
            .with_level(level(2), 2.0)
            .unwrap()
            .with_option(opt("night"), "Night", 1.25)
            .unwrap()
            .with_option(opt("city"), "Out of City", 1.2)
            .unwrap()
            .with_option(opt("luggage"), "Luggage", 1.5)
            .unwrap()
    }

    fn messages(meter: &FareMeter) -> Vec<String> {
        meter
            .trip()
            .map(|trip| trip.event_log().map(|e| e.message.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_start_initializes_trip() {
        let mut meter = FareMeter::new(rates());
        assert!(meter.start(level(1), t0()).is_none());

        let trip = meter.trip().unwrap();
        assert!(trip.is_running());
        assert_eq!(trip.state(), MeterState::Moving);
        assert!(trip.accrued_fare().is_zero());
        assert!(trip.active_options().is_empty());
        assert_eq!(trip.segment_start(), t0());
        assert_eq!(messages(&meter), vec!["Trip Started (Lv.1)"]);
    }

    #[test]
    fn test_moving_then_stopped_scenario() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(1), at(0.0));
        meter.toggle_state(at(10.0));
        let outcome = meter.stop(at(15.0));

        // 10 × 0.05 + 5 × 0.02
        assert!((outcome.fare().amount() - 0.60).abs() < EPSILON);
        assert_eq!(outcome.fare().rounded(), 0.60);
        assert!(!meter.is_running());
        assert_eq!(
            messages(&meter),
            vec!["Trip Finished", "Taxi Stopped", "Trip Started (Lv.1)"]
        );
    }

    #[test]
    fn test_night_surcharge_while_stopped() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(1), at(0.0));
        meter.toggle_state(at(0.0));
        let fare_before = meter.trip().unwrap().accrued_fare();

        meter.toggle_option(&opt("night"), true, at(0.0));
        let outcome = meter.stop(at(8.0));

        let finished = outcome.finished().unwrap();
        // 8 × 0.02 × 1.25
        assert!((finished.accrual.amount.amount() - 0.20).abs() < EPSILON);
        assert!((finished.fare.amount() - fare_before.amount() - 0.20).abs() < EPSILON);
        assert_eq!(messages(&meter)[1], "Night ON");
    }

    #[test]
    fn test_multiplier_composition() {
        let config = rates();
        let options = [opt("city"), opt("luggage")];
        let rate = effective_rate(&config, MeterState::Moving, level(2), &options);
        // 0.05 × 2.0 × 1.2 × 1.5
        assert!((rate - 0.18).abs() < EPSILON);
    }

    #[test]
    fn test_unknown_option_is_neutral() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(1), at(0.0));
        meter.toggle_option(&opt("airport"), true, at(0.0));

        assert!((meter.current_rate().unwrap() - 0.05).abs() < EPSILON);
        assert_eq!(messages(&meter)[0], "airport ON");

        let snapshot = meter.live_snapshot(at(1.0));
        assert_eq!(snapshot.meta.active_options.len(), 1);
        assert_eq!(snapshot.meta.active_options[0].multiplier, 1.0);
    }

    #[test]
    fn test_option_off_restores_rate() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(1), at(0.0));
        meter.toggle_option(&opt("night"), true, at(4.0));
        meter.toggle_option(&opt("night"), false, at(8.0));
        let fare = meter.stop(at(12.0)).fare();

        // 4 × 0.05 + 4 × 0.0625 + 4 × 0.05
        assert!((fare.amount() - 0.65).abs() < EPSILON);
        assert_eq!(messages(&meter)[1], "Night OFF");
    }

    #[test]
    fn test_stop_when_idle() {
        let mut meter = FareMeter::new(rates());
        let outcome = meter.stop(t0());
        assert_eq!(outcome, StopOutcome::Idle);
        assert!(outcome.fare().is_zero());
        assert!(meter.trip().is_none());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(1), at(0.0));
        let first = meter.stop(at(10.0));
        let log_len = messages(&meter).len();

        let second = meter.stop(at(20.0));
        assert_eq!(second, StopOutcome::Idle);
        assert!(second.fare().is_zero());
        assert_eq!(messages(&meter).len(), log_len);

        // The finished trip keeps its fare
        assert_eq!(meter.trip().unwrap().accrued_fare(), first.fare());
        assert_eq!(meter.live_snapshot(at(30.0)).fare, 0.5);
    }

    #[test]
    fn test_toggles_when_idle_are_noops() {
        let mut meter = FareMeter::new(rates());
        assert!(meter.toggle_state(t0()).is_none());
        assert!(meter.toggle_option(&opt("night"), true, t0()).is_none());

        meter.start(level(1), at(0.0));
        meter.stop(at(5.0));
        let fare = meter.trip().unwrap().accrued_fare();

        assert!(meter.toggle_state(at(6.0)).is_none());
        assert!(meter.toggle_option(&opt("night"), true, at(7.0)).is_none());
        assert_eq!(meter.trip().unwrap().accrued_fare(), fare);
        assert_eq!(meter.trip().unwrap().state(), MeterState::Moving);
    }

    #[test]
    fn test_zero_length_segment() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(1), at(0.0));
        meter.toggle_state(at(3.0));

        let accrual = meter.toggle_state(at(3.0)).unwrap();
        assert_eq!(accrual.seconds, 0.0);
        assert!(accrual.amount.is_zero());
        assert_eq!(meter.state(), MeterState::Moving);
        assert!((meter.trip().unwrap().accrued_fare().amount() - 0.15).abs() < EPSILON);
    }

    #[test]
    fn test_snapshot_segment_completeness() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(2), at(0.0));
        meter.toggle_option(&opt("night"), true, at(2.0));

        let rate = meter.current_rate().unwrap();
        let f1 = meter.projected_fare(at(5.0)).amount();
        let f2 = meter.projected_fare(at(17.5)).amount();
        assert!((f2 - f1 - 12.5 * rate).abs() < EPSILON);
    }

    #[test]
    fn test_snapshot_is_pure() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(1), at(0.0));

        let before = meter.trip().unwrap().accrued_fare();
        let snapshot = meter.live_snapshot(at(10.0));
        assert_eq!(snapshot.fare, 0.5);
        assert_eq!(meter.trip().unwrap().accrued_fare(), before);
        assert_eq!(meter.trip().unwrap().segment_start(), at(0.0));
    }

    #[test]
    fn test_snapshot_contents() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(2), at(0.0));
        meter.toggle_option(&opt("night"), true, at(1.0));

        let snapshot = meter.live_snapshot(at(2.0));
        assert!(snapshot.is_running);
        assert_eq!(snapshot.state, MeterState::Moving);
        assert_eq!(snapshot.meta.level, level(2));
        assert_eq!(snapshot.meta.move_rate, 0.1);
        assert_eq!(snapshot.meta.stop_rate, 0.04);
        assert_eq!(snapshot.meta.active_options[0].label(), "Night x1.25");
        assert_eq!(snapshot.logs[0].msg, "Night ON");
        assert_eq!(snapshot.logs[0].time, "09:00:01");
        assert_eq!(snapshot.logs.len(), 2);
    }

    #[test]
    fn test_snapshot_before_any_trip() {
        let meter = FareMeter::new(rates());
        let snapshot = meter.live_snapshot(t0());
        assert_eq!(snapshot.fare, 0.0);
        assert!(!snapshot.is_running);
        assert!(snapshot.trip_id.is_none());
        assert!(snapshot.logs.is_empty());
        assert_eq!(snapshot.meta.level, LevelId::DEFAULT);
    }

    #[test]
    fn test_accrued_fare_is_monotonic() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(2), at(0.0));

        let mut last = Fare::zero();
        let mut now = 0.0;
        for step in 0..40 {
            now += (step % 7) as f64 * 0.37;
            match step % 4 {
                0 => {
                    meter.toggle_state(at(now));
                }
                1 => {
                    meter.toggle_option(&opt("night"), step % 8 == 1, at(now));
                }
                2 => {
                    meter.toggle_option(&opt("city"), step % 3 == 0, at(now));
                }
                _ => {
                    let projected = meter.projected_fare(at(now));
                    assert!(projected >= last);
                }
            }
            let accrued = meter.trip().unwrap().accrued_fare();
            assert!(accrued >= last);
            last = accrued;
        }
    }

    #[test]
    fn test_clock_regression_is_clamped() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(1), at(10.0));

        let accrual = meter.toggle_state(at(7.0)).unwrap();
        let regression = accrual.clock_regression.unwrap();
        assert_eq!(regression.drift_ms, 3000);
        assert!(accrual.amount.is_zero());
        assert!(meter.trip().unwrap().accrued_fare().is_zero());
        // The later instant is kept so nothing is billed twice
        assert_eq!(meter.trip().unwrap().segment_start(), at(10.0));
        assert_eq!(meter.state(), MeterState::Stopped);

        let fare = meter.stop(at(15.0)).fare();
        assert!((fare.amount() - 5.0 * 0.02).abs() < EPSILON);
    }

    #[test]
    fn test_snapshot_during_regression_never_negative() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(1), at(10.0));
        assert_eq!(meter.live_snapshot(at(5.0)).fare, 0.0);
    }

    #[test]
    fn test_restart_while_running_reports_abandoned_fare() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(1), at(0.0));
        let first_id = meter.trip().unwrap().trip_id();

        let abandoned = meter.start(level(2), at(10.0)).unwrap();
        assert!((abandoned.amount() - 0.5).abs() < EPSILON);

        let trip = meter.trip().unwrap();
        assert_ne!(trip.trip_id(), first_id);
        assert_eq!(trip.level(), level(2));
        assert!(trip.accrued_fare().is_zero());
        assert_eq!(messages(&meter), vec!["Trip Started (Lv.2)"]);
    }

    #[test]
    fn test_restart_after_stop_reports_nothing() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(1), at(0.0));
        meter.stop(at(1.0));
        assert!(meter.start(level(1), at(2.0)).is_none());
    }

    #[test]
    fn test_finished_trip_details() {
        let mut meter = FareMeter::new(rates());
        meter.start(level(2), at(0.0));
        let outcome = meter.stop(at(4.0));
        let finished = outcome.finished().unwrap();

        assert_eq!(finished.level, level(2));
        assert_eq!(finished.started_at, at(0.0));
        assert_eq!(finished.finished_at, at(4.0));
        assert!((finished.fare.amount() - 0.4).abs() < EPSILON);
        assert_eq!(meter.trip().unwrap().finished_at(), Some(at(4.0)));
    }
}
