//! # Money Module
//!
//! Provides the `Fare` type for monetary totals accrued by the meter.
//!
//! ## Why Not Integer Cents Here?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TIME-PROPORTIONAL FARES                                                │
//! │                                                                         │
//! │  A fare grows by (seconds × €/second) on every accrual:                │
//! │    0.347s × 0.05 €/s = 0.01735 €                                       │
//! │                                                                         │
//! │  Rounding each accrual to cents would lose or gain up to half a cent   │
//! │  per toggle. Instead the meter keeps full precision internally and     │
//! │  rounds ONLY when a value is presented (snapshot, stop, history).      │
//! │                                                                         │
//! │    accrue ──► accrue ──► accrue ──► rounded() ──► "€0.60"              │
//! │    (f64)      (f64)      (f64)      (2 decimals)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use taxi_core::money::Fare;
//!
//! let fare = Fare::from_amount(0.5) + Fare::from_amount(0.1);
//! assert_eq!(fare.rounded(), 0.6);
//! assert_eq!(fare.to_string(), "€0.60");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Number of decimal places used when a fare is presented.
pub const FARE_DECIMALS: i32 = 2;

/// Number of decimal places used when a per-second rate is presented.
pub const RATE_DECIMALS: i32 = 3;

/// Rounds `value` to `decimals` places (half away from zero).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// =============================================================================
// Fare Type
// =============================================================================

/// A non-negative monetary amount in the major currency unit (euros).
///
/// ## Design Decisions
/// - **f64, unrounded**: accrual stays exact to floating-point precision
/// - **No Sub**: a fare only ever grows during a trip
/// - **Presentation rounding**: [`Fare::rounded`] and `Display` round to cents
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
pub struct Fare(f64);

impl Fare {
    /// Creates a fare from an amount in euros.
    ///
    /// Negative or non-finite amounts are clamped to zero.
    #[inline]
    pub fn from_amount(amount: f64) -> Self {
        if amount.is_finite() && amount > 0.0 {
            Fare(amount)
        } else {
            Fare(0.0)
        }
    }

    /// Returns zero fare.
    #[inline]
    pub const fn zero() -> Self {
        Fare(0.0)
    }

    /// Checks if the fare is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Returns the unrounded amount.
    #[inline]
    pub const fn amount(&self) -> f64 {
        self.0
    }

    /// Returns the amount rounded to cents, for presentation.
    ///
    /// ## Example
    /// ```rust
    /// use taxi_core::money::Fare;
    ///
    /// assert_eq!(Fare::from_amount(0.18499).rounded(), 0.18);
    /// assert_eq!(Fare::from_amount(0.185001).rounded(), 0.19);
    /// ```
    #[inline]
    pub fn rounded(&self) -> f64 {
        round_to(self.0, FARE_DECIMALS)
    }

    /// Returns the fare accrued over `seconds` at `rate_per_second`.
    #[inline]
    pub fn for_duration(seconds: f64, rate_per_second: f64) -> Self {
        Fare::from_amount(seconds * rate_per_second)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the fare rounded to cents with a euro sign.
impl fmt::Display for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "€{:.2}", self.rounded())
    }
}

impl Add for Fare {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Fare(self.0 + other.0)
    }
}

impl AddAssign for Fare {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
