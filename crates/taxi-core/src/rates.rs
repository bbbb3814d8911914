//! # Rate Configuration
//!
//! Immutable fare rates consumed by [`crate::FareMeter`].
//!
//! ## Rate Document Format
//! Rates are authored as a JSON document. Every section is optional:
//! ```json
//! {
//!   "base_rates": { "1": 0.05, "2": 0.02 },
//!   "levels":     { "1": 1.0, "2": 1.5 },
//!   "options": {
//!     "night":       { "name": "Night",       "multiplier": 1.25 },
//!     "out-of-city": { "name": "Out of City", "multiplier": 1.2 }
//!   }
//! }
//! ```
//!
//! ## Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RateDocument (strings, as authored)                                    │
//! │       │                                                                 │
//! │       │  RateConfig::from_document                                      │
//! │       │  • "1"/"2"  → MeterState::Moving / Stopped                      │
//! │       │  • "2"      → LevelId(2)                                        │
//! │       │  • "night"  → OptionId("night")                                 │
//! │       │  • missing state rates / level 1 → defaults                     │
//! │       │  • every value validated                                        │
//! │       ▼                                                                 │
//! │  RateConfig (typed, immutable)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  FareMeter::new(config)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups for identifiers that are not configured are neutral: an unknown
//! level or option multiplies by `1.0`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::types::{LevelId, MeterState, OptionId};
use crate::validation::{
    validate_base_rate, validate_level_multiplier, validate_option_multiplier,
    validate_option_name,
};

/// Default moving rate (€/second).
pub const DEFAULT_MOVING_RATE: f64 = 0.05;

/// Default stopped rate (€/second).
pub const DEFAULT_STOPPED_RATE: f64 = 0.02;

/// Multiplier used for anything not configured.
pub const NEUTRAL_MULTIPLIER: f64 = 1.0;

// =============================================================================
// Rate Document (as authored)
// =============================================================================

/// The rate document exactly as it appears on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateDocument {
    /// Base rate per state key (`"1"` moving, `"2"` stopped).
    #[serde(default)]
    pub base_rates: BTreeMap<String, f64>,

    /// Level multipliers keyed by level number.
    #[serde(default)]
    pub levels: BTreeMap<String, f64>,

    /// Surcharge options keyed by option id.
    #[serde(default)]
    pub options: BTreeMap<String, OptionDocument>,
}

/// A surcharge option as authored. The name defaults to the option id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDocument {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "neutral_multiplier")]
    pub multiplier: f64,
}

fn neutral_multiplier() -> f64 {
    NEUTRAL_MULTIPLIER
}

// =============================================================================
// Rate Config (resolved)
// =============================================================================

/// A configured surcharge option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionRate {
    /// Display name (e.g. "Night").
    pub name: String,
    /// Multiplier applied while the option is active (>= 1.0).
    pub multiplier: f64,
}

/// Validated, immutable rate configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RateConfig {
    moving_rate: f64,
    stopped_rate: f64,
    level_multipliers: BTreeMap<LevelId, f64>,
    options: BTreeMap<OptionId, OptionRate>,
}

impl Default for RateConfig {
    /// Moving 0.05 €/s, stopped 0.02 €/s, level 1 at 1.0, no options.
    fn default() -> Self {
        let mut level_multipliers = BTreeMap::new();
        level_multipliers.insert(LevelId::DEFAULT, NEUTRAL_MULTIPLIER);

        RateConfig {
            moving_rate: DEFAULT_MOVING_RATE,
            stopped_rate: DEFAULT_STOPPED_RATE,
            level_multipliers,
            options: BTreeMap::new(),
        }
    }
}

impl RateConfig {
    /// Creates a configuration with the given base rates and level 1 at 1.0.
    pub fn new(moving_rate: f64, stopped_rate: f64) -> CoreResult<Self> {
        validate_base_rate("base rate (moving)", moving_rate)?;
        validate_base_rate("base rate (stopped)", stopped_rate)?;

        Ok(RateConfig {
            moving_rate,
            stopped_rate,
            ..RateConfig::default()
        })
    }

    /// Adds or replaces a level multiplier.
    pub fn with_level(mut self, level: LevelId, multiplier: f64) -> CoreResult<Self> {
        validate_level_multiplier(&format!("level {}", level), multiplier)?;
        self.level_multipliers.insert(level, multiplier);
        Ok(self)
    }

    /// Adds or replaces a surcharge option.
    pub fn with_option(
        mut self,
        id: OptionId,
        name: impl Into<String>,
        multiplier: f64,
    ) -> CoreResult<Self> {
        let name = name.into();
        validate_option_name(&name)?;
        validate_option_multiplier(&format!("option {}", id), multiplier)?;
        self.options.insert(
            id,
            OptionRate {
                name: name.trim().to_string(),
                multiplier,
            },
        );
        Ok(self)
    }

    /// Parses and validates a JSON rate document.
    ///
    /// ## Example
    /// ```rust
    /// use taxi_core::{MeterState, RateConfig};
    ///
    /// let config = RateConfig::from_json_str(r#"{ "base_rates": { "1": 0.08 } }"#).unwrap();
    /// assert_eq!(config.base_rate(MeterState::Moving), 0.08);
    /// assert_eq!(config.base_rate(MeterState::Stopped), 0.02); // defaulted
    /// ```
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let document: RateDocument = serde_json::from_str(json)
            .map_err(|e| CoreError::rate_config(format!("malformed JSON: {}", e)))?;
        RateConfig::from_document(&document)
    }

    /// Resolves an authored document into a validated configuration.
    ///
    /// Missing state rates and a missing level 1 fall back to the defaults.
    /// Unknown state keys and malformed identifiers are rejected.
    pub fn from_document(document: &RateDocument) -> CoreResult<Self> {
        let mut moving_rate = DEFAULT_MOVING_RATE;
        let mut stopped_rate = DEFAULT_STOPPED_RATE;

        for (key, rate) in &document.base_rates {
            match MeterState::from_document_key(key) {
                Some(MeterState::Moving) => moving_rate = *rate,
                Some(MeterState::Stopped) => stopped_rate = *rate,
                None => {
                    return Err(CoreError::rate_config(format!(
                        "unknown base rate key '{}' (expected \"1\" or \"2\")",
                        key
                    )))
                }
            }
        }

        let mut config = RateConfig::new(moving_rate, stopped_rate)?;

        for (key, multiplier) in &document.levels {
            let level: LevelId = key.parse()?;
            config = config.with_level(level, *multiplier)?;
        }

        for (key, option) in &document.options {
            let id = OptionId::parse(key)?;
            let name = option.name.clone().unwrap_or_else(|| key.clone());
            config = config.with_option(id, name, option.multiplier)?;
        }

        Ok(config)
    }

    /// Base rate (€/second) for a state.
    #[inline]
    pub fn base_rate(&self, state: MeterState) -> f64 {
        match state {
            MeterState::Moving => self.moving_rate,
            MeterState::Stopped => self.stopped_rate,
        }
    }

    /// Multiplier for a level; unknown levels are neutral.
    pub fn level_multiplier(&self, level: LevelId) -> f64 {
        self.level_multipliers
            .get(&level)
            .copied()
            .unwrap_or(NEUTRAL_MULTIPLIER)
    }

    /// Returns the configured option, if any.
    pub fn option(&self, id: &OptionId) -> Option<&OptionRate> {
        self.options.get(id)
    }

    /// Multiplier for an option; unknown options are neutral.
    pub fn option_multiplier(&self, id: &OptionId) -> f64 {
        self.option(id)
            .map(|opt| opt.multiplier)
            .unwrap_or(NEUTRAL_MULTIPLIER)
    }

    /// Display name for an option; unknown options show their id.
    pub fn option_name<'a>(&'a self, id: &'a OptionId) -> &'a str {
        self.option(id).map(|opt| opt.name.as_str()).unwrap_or(id.as_str())
    }

    /// Iterates over configured options in id order.
    pub fn options(&self) -> impl Iterator<Item = (&OptionId, &OptionRate)> {
        self.options.iter()
    }

    /// Iterates over configured levels in ascending order.
    pub fn levels(&self) -> impl Iterator<Item = (LevelId, f64)> + '_ {
        self.level_multipliers.iter().map(|(level, mult)| (*level, *mult))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
