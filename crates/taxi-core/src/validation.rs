//! # Validation Module
//!
//! Input validation utilities for the taximeter.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front-end (HTTP body / CLI prompt)                           │
//! │  ├── Deserialization (types, missing fields)                           │
//! │  └── Defaults ("Guest" customer, level 1)                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Customer names, levels                                            │
//! │  └── Rate values while a rate document is loaded                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL / UNIQUE constraints on trip history                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use taxi_core::validation::{validate_customer_name, validate_level};
//!
//! assert_eq!(validate_customer_name("  Ana ").unwrap(), "Ana");
//! assert!(validate_level(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_CUSTOMER_NAME_LEN, MAX_LEVEL};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer name and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 100 characters
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_CUSTOMER_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_CUSTOMER_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates the display name of a surcharge option.
pub fn validate_option_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "option name".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a fare level.
///
/// ## Rules
/// - Between 1 and 99
pub fn validate_level(level: i64) -> ValidationResult<()> {
    if level < 1 || level > MAX_LEVEL as i64 {
        return Err(ValidationError::OutOfRange {
            field: "level".to_string(),
            min: 1,
            max: MAX_LEVEL as i64,
        });
    }

    Ok(())
}

/// Validates a base rate (currency per second).
///
/// ## Rules
/// - Finite and non-negative; zero is allowed (free waiting time)
pub fn validate_base_rate(field: &str, rate: f64) -> ValidationResult<()> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("must be a non-negative number, got {}", rate),
        });
    }

    Ok(())
}

/// Validates a level multiplier.
///
/// ## Rules
/// - Finite and strictly positive
pub fn validate_level_multiplier(field: &str, multiplier: f64) -> ValidationResult<()> {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("must be a positive number, got {}", multiplier),
        });
    }

    Ok(())
}

/// Validates a surcharge multiplier.
///
/// ## Rules
/// - Finite and at least 1.0 (a surcharge never lowers the fare)
pub fn validate_option_multiplier(field: &str, multiplier: f64) -> ValidationResult<()> {
    if !multiplier.is_finite() || multiplier < 1.0 {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("must be a number >= 1.0, got {}", multiplier),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_customer_name() {
        assert_eq!(validate_customer_name("Guest").unwrap(), "Guest");
        assert_eq!(validate_customer_name("  María  ").unwrap(), "María");

        assert!(validate_customer_name("").is_err());
        assert!(validate_customer_name("   ").is_err());
        assert!(validate_customer_name(&"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_level() {
        assert!(validate_level(1).is_ok());
        assert!(validate_level(99).is_ok());

        assert!(validate_level(0).is_err());
        assert!(validate_level(-2).is_err());
        assert!(validate_level(100).is_err());
    }

    #[test]
    fn test_validate_rates() {
        assert!(validate_base_rate("moving", 0.05).is_ok());
        assert!(validate_base_rate("stopped", 0.0).is_ok());
        assert!(validate_base_rate("stopped", -0.01).is_err());
        assert!(validate_base_rate("stopped", f64::NAN).is_err());

        assert!(validate_level_multiplier("level 2", 2.0).is_ok());
        assert!(validate_level_multiplier("level 2", 0.0).is_err());

        assert!(validate_option_multiplier("night", 1.25).is_ok());
        assert!(validate_option_multiplier("night", 1.0).is_ok());
        assert!(validate_option_multiplier("night", 0.9).is_err());
    }

    #[test]
    fn test_validate_option_name() {
        assert!(validate_option_name("Night").is_ok());
        assert!(validate_option_name(" ").is_err());
    }
}
