//! # Session State
//!
//! The one meter session shared by every request.
//!
//! ## Thread Safety
//! The session is wrapped in a `Mutex` because:
//! 1. The web page polls `/api/update` while buttons post commands
//! 2. Each meter call must observe the effects of the one before it
//! 3. axum handlers run concurrently on the tokio pool
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request                 Command                  Session Change        │
//! │  ───────                 ───────                  ──────────────        │
//! │  POST /api/start ──────► start_trip() ──────────► meter.start()        │
//! │  POST /api/toggle_* ───► toggle_*() ────────────► meter.toggle_*()     │
//! │  GET  /api/update ─────► live_snapshot() ───────► (read only)          │
//! │  POST /api/stop ───────► stop_trip() ───────────► meter.stop()         │
//! │                                                                         │
//! │  The lock is never held across an `.await`.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use taxi_core::{FareMeter, RateConfig, DEFAULT_CUSTOMER_NAME};

/// The meter plus the customer riding in it.
#[derive(Debug)]
pub struct MeterSession {
    pub meter: FareMeter,
    pub customer: String,
}

impl MeterSession {
    /// Creates an idle session with the default customer name.
    pub fn new(rates: RateConfig) -> Self {
        MeterSession {
            meter: FareMeter::new(rates),
            customer: DEFAULT_CUSTOMER_NAME.to_string(),
        }
    }
}

/// Serializes access to the [`MeterSession`].
#[derive(Debug)]
pub struct SessionState {
    session: Mutex<MeterSession>,
}

impl SessionState {
    /// Creates session state around an idle meter.
    pub fn new(rates: RateConfig) -> Self {
        SessionState {
            session: Mutex::new(MeterSession::new(rates)),
        }
    }

    // A meter call never leaves a half-applied mutation behind, so a lock
    // poisoned by a panicking holder still guards a consistent session.
    fn lock(&self) -> MutexGuard<'_, MeterSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executes a function with read access to the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let snapshot = state.with_session(|s| s.meter.live_snapshot(Utc::now()));
    /// ```
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&MeterSession) -> R,
    {
        let session = self.lock();
        f(&session)
    }

    /// Executes a function with write access to the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// state.with_session_mut(|s| s.meter.toggle_state(Utc::now()));
    /// ```
    pub fn with_session_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut MeterSession) -> R,
    {
        let mut session = self.lock();
        f(&mut session)
    }
}
