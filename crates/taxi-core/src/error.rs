//! # Error Types
//!
//! Domain-specific error types for taxi-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  taxi-core errors (this file)                                          │
//! │  ├── CoreError        - Rate configuration / identifier failures       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ClockRegression  - Anomaly surfaced by accrual (never raised)     │
//! │                                                                         │
//! │  taxi-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP API errors (in app)                                              │
//! │  └── ApiError         - What the client sees (serialized)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, key, value)
//! 3. The meter itself never returns an error for ordinary misuse

use chrono::{DateTime, Utc};
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
///
/// These only arise while building configuration or parsing identifiers.
/// Once a [`crate::FareMeter`] exists, none of its operations fail.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The rate document could not be parsed or holds an invalid value.
    ///
    /// ## When This Occurs
    /// - The document is not valid JSON
    /// - A base rate is negative, a level multiplier is not positive,
    ///   or an option multiplier is below 1.0
    ///
    /// The application substitutes default rates when it sees this.
    #[error("Invalid rate configuration: {reason}")]
    InvalidRateConfig { reason: String },

    /// An identifier (level or option) is malformed.
    #[error("Invalid {kind} identifier '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidRateConfig error.
    pub fn rate_config(reason: impl Into<String>) -> Self {
        CoreError::InvalidRateConfig {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before a trip command reaches the meter.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Clock Regression
// =============================================================================

/// The clock went backwards between the start of a segment and an accrual.
///
/// The accrual clamps the elapsed time to zero, so the fare never shrinks.
/// This value is handed back to the caller so the host can log it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Clock regression: segment started at {segment_start}, accrued at {now} ({drift_ms}ms backwards)")]
pub struct ClockRegression {
    /// Start of the open segment.
    pub segment_start: DateTime<Utc>,
    /// The (earlier) instant passed to the accrual.
    pub now: DateTime<Utc>,
    /// How far backwards the clock moved, in milliseconds.
    pub drift_ms: i64,
}

impl ClockRegression {
    pub(crate) fn new(segment_start: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        ClockRegression {
            segment_start,
            now,
            drift_ms: (segment_start - now).num_milliseconds(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidIdentifier {
            kind: "option",
            value: "night shift!".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid option identifier 'night shift!'");

        let err = CoreError::rate_config("base rate for stopped is negative");
        assert_eq!(
            err.to_string(),
            "Invalid rate configuration: base rate for stopped is negative"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::OutOfRange {
            field: "level".to_string(),
            min: 1,
            max: 99,
        };
        assert_eq!(err.to_string(), "level must be between 1 and 99");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_clock_regression_drift() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 10).unwrap();
        let now = start - Duration::milliseconds(1500);
        let regression = ClockRegression::new(start, now);
        assert_eq!(regression.drift_ms, 1500);
        assert!(regression.to_string().contains("1500ms backwards"));
    }
}
