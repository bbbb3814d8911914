//! # Domain Types
//!
//! Core domain types used throughout the taximeter.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   MeterState    │   │    LevelId      │   │    OptionId     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Moving  ("1")  │   │  1, 2, 3 ...    │   │  "night"        │       │
//! │  │  Stopped ("2")  │   │  (fare level)   │   │  "out-of-city"  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   TripEvent     │   │   TripRecord    │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  at             │   │  id, date       │                             │
//! │  │  message        │   │  name, fare     │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifiers are parsed once, at the boundary, so the meter never compares
//! raw strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::{MAX_LEVEL, MAX_OPTION_ID_LEN};

// =============================================================================
// Meter State
// =============================================================================

/// The physical state of the taxi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MeterState {
    /// The taxi is driving; billed at the moving rate.
    Moving,
    /// The taxi is waiting; billed at the stopped rate.
    Stopped,
}

impl MeterState {
    /// Returns the other state.
    #[inline]
    pub const fn toggled(self) -> Self {
        match self {
            MeterState::Moving => MeterState::Stopped,
            MeterState::Stopped => MeterState::Moving,
        }
    }

    /// Resolves a rate-document key (`"1"` moving, `"2"` stopped).
    pub fn from_document_key(key: &str) -> Option<Self> {
        match key.trim() {
            "1" => Some(MeterState::Moving),
            "2" => Some(MeterState::Stopped),
            _ => None,
        }
    }

    /// Event-log message written when the taxi enters this state.
    pub const fn log_message(self) -> &'static str {
        match self {
            MeterState::Moving => "Taxi Moving",
            MeterState::Stopped => "Taxi Stopped",
        }
    }
}

impl fmt::Display for MeterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeterState::Moving => write!(f, "moving"),
            MeterState::Stopped => write!(f, "stopped"),
        }
    }
}

// =============================================================================
// Level Identifier
// =============================================================================

/// A fare level. Level 1 is the default and is neutral unless configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(try_from = "u32", into = "u32")]
pub struct LevelId(u32);

impl LevelId {
    /// The default fare level.
    pub const DEFAULT: LevelId = LevelId(1);

    /// Creates a level, checking it lies in `1..=MAX_LEVEL`.
    pub fn new(level: u32) -> CoreResult<Self> {
        if (1..=MAX_LEVEL).contains(&level) {
            Ok(LevelId(level))
        } else {
            Err(CoreError::InvalidIdentifier {
                kind: "level",
                value: level.to_string(),
            })
        }
    }

    /// Returns the numeric level.
    #[inline]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl Default for LevelId {
    fn default() -> Self {
        LevelId::DEFAULT
    }
}

impl FromStr for LevelId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = s.trim().parse::<u32>().map_err(|_| CoreError::InvalidIdentifier {
            kind: "level",
            value: s.to_string(),
        })?;
        LevelId::new(level)
    }
}

impl TryFrom<u32> for LevelId {
    type Error = CoreError;

    fn try_from(level: u32) -> Result<Self, Self::Error> {
        LevelId::new(level)
    }
}

impl From<LevelId> for u32 {
    fn from(level: LevelId) -> Self {
        level.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Option Identifier
// =============================================================================

/// Identifier of a surcharge option (e.g. `night`, `out-of-city`).
///
/// ## Rules
/// - 1 to 32 characters after trimming
/// - ASCII letters, digits, hyphens and underscores only
/// - Stored lowercase, so `Night` and `night` are the same option
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(try_from = "String", into = "String")]
pub struct OptionId(String);

impl OptionId {
    /// Parses and normalizes an option identifier.
    ///
    /// ## Example
    /// ```rust
    /// use taxi_core::OptionId;
    ///
    /// assert_eq!(OptionId::parse(" Night ").unwrap().as_str(), "night");
    /// assert!(OptionId::parse("").is_err());
    /// assert!(OptionId::parse("night shift").is_err());
    /// ```
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= MAX_OPTION_ID_LEN
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid {
            return Err(CoreError::InvalidIdentifier {
                kind: "option",
                value: raw.to_string(),
            });
        }

        Ok(OptionId(trimmed.to_ascii_lowercase()))
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OptionId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionId::parse(s)
    }
}

impl TryFrom<String> for OptionId {
    type Error = CoreError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        OptionId::parse(&raw)
    }
}

impl From<OptionId> for String {
    fn from(id: OptionId) -> Self {
        id.0
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Trip Event
// =============================================================================

/// A human-readable entry in a trip's event log (display only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TripEvent {
    /// When the event happened.
    #[ts(as = "String")]
    pub at: DateTime<Utc>,

    /// Message shown to the user (e.g. "Taxi Stopped").
    pub message: String,
}

impl TripEvent {
    /// Creates a new event.
    pub fn new(at: DateTime<Utc>, message: impl Into<String>) -> Self {
        TripEvent {
            at,
            message: message.into(),
        }
    }

    /// Wall-clock time of the event as `HH:MM:SS`.
    pub fn time_label(&self) -> String {
        self.at.format("%H:%M:%S").to_string()
    }
}

// =============================================================================
// Trip Record
// =============================================================================

/// Format of [`TripRecord::date`].
pub const TRIP_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A finished trip as stored in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TripRecord {
    /// Trip identifier (UUID v4).
    pub id: String,

    /// When the trip finished, formatted with [`TRIP_DATE_FORMAT`].
    pub date: String,

    /// Customer name.
    pub name: String,

    /// Final fare rounded to cents.
    pub fare: f64,

    /// Fare level the trip was billed at.
    pub level: u32,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meter_state_toggle_and_keys() {
        assert_eq!(MeterState::Moving.toggled(), MeterState::Stopped);
        assert_eq!(MeterState::Stopped.toggled(), MeterState::Moving);
        assert_eq!(MeterState::from_document_key("1"), Some(MeterState::Moving));
        assert_eq!(MeterState::from_document_key("2"), Some(MeterState::Stopped));
        assert_eq!(MeterState::from_document_key("3"), None);
    }

    #[test]
    fn test_meter_state_serialization() {
        assert_eq!(serde_json::to_string(&MeterState::Moving).unwrap(), "\"moving\"");
        let parsed: MeterState = serde_json::from_str("\"stopped\"").unwrap();
        assert_eq!(parsed, MeterState::Stopped);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("2".parse::<LevelId>().unwrap().get(), 2);
        assert_eq!(" 1 ".parse::<LevelId>().unwrap(), LevelId::DEFAULT);
        assert!("0".parse::<LevelId>().is_err());
        assert!("abc".parse::<LevelId>().is_err());
        assert!(LevelId::new(MAX_LEVEL + 1).is_err());
    }

    #[test]
    fn test_level_deserialization_is_validated() {
        let level: LevelId = serde_json::from_str("3").unwrap();
        assert_eq!(level.get(), 3);
        assert!(serde_json::from_str::<LevelId>("0").is_err());
    }

    #[test]
    fn test_option_id_rules() {
        assert_eq!(OptionId::parse("out-of-city").unwrap().as_str(), "out-of-city");
        assert_eq!(OptionId::parse("NIGHT").unwrap().as_str(), "night");
        assert!(OptionId::parse("   ").is_err());
        assert!(OptionId::parse("a".repeat(MAX_OPTION_ID_LEN + 1).as_str()).is_err());
        assert!(OptionId::parse("night!").is_err());
    }

    #[test]
    fn test_trip_event_time_label() {
        use chrono::TimeZone;
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 3, 9).unwrap();
        assert_eq!(TripEvent::new(at, "Taxi Moving").time_label(), "08:03:09");
    }
}
