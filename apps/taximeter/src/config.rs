//! # Application Configuration
//!
//! Resolves where the taximeter keeps its files and where it listens.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags
//! 2. Environment variables (`TAXIMETER_*`)
//! 3. Defaults (platform data directory, `127.0.0.1:5000`)
//!
//! The rate file is loaded separately by [`load_rates`], which never fails:
//! any problem with the file falls back to the built-in rates.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use taxi_core::RateConfig;
use tracing::{info, warn};

/// Default HTTP port.
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Default bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

const RATES_FILE: &str = "rates.json";
const DB_FILE: &str = "trips.db";
const LOG_FILE: &str = "taximeter.log";

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Cannot create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Values given on the command line. `None` leaves the lower-priority source in effect.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub rates_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub http_port: Option<u16>,
}

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding the database, rate file and log file.
    pub data_dir: PathBuf,

    /// Rate document path. Default: `<data_dir>/rates.json`
    pub rates_path: PathBuf,

    /// History database path. Default: `<data_dir>/trips.db`
    pub db_path: PathBuf,

    /// HTTP bind address. Default: `127.0.0.1`
    pub bind_addr: String,

    /// HTTP port. Default: 5000
    pub http_port: u16,
}

impl AppConfig {
    /// Loads configuration from the process environment, then applies `overrides`.
    pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve(|key| env::var(key).ok(), overrides)
    }

    /// Resolves configuration from an arbitrary variable lookup.
    ///
    /// ## Environment Variables
    /// - `TAXIMETER_DATA_DIR`
    /// - `TAXIMETER_RATES_PATH`
    /// - `TAXIMETER_DB_PATH`
    /// - `TAXIMETER_BIND_ADDR`
    /// - `TAXIMETER_HTTP_PORT`
    pub fn resolve<F>(lookup: F, overrides: ConfigOverrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = match overrides
            .data_dir
            .or_else(|| lookup("TAXIMETER_DATA_DIR").map(PathBuf::from))
        {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        let rates_path = overrides
            .rates_path
            .or_else(|| lookup("TAXIMETER_RATES_PATH").map(PathBuf::from))
            .unwrap_or_else(|| data_dir.join(RATES_FILE));

        let db_path = overrides
            .db_path
            .or_else(|| lookup("TAXIMETER_DB_PATH").map(PathBuf::from))
            .unwrap_or_else(|| data_dir.join(DB_FILE));

        let bind_addr = overrides
            .bind_addr
            .or_else(|| lookup("TAXIMETER_BIND_ADDR"))
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let http_port = match overrides.http_port {
            Some(port) => port,
            None => match lookup("TAXIMETER_HTTP_PORT") {
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "TAXIMETER_HTTP_PORT".to_string(),
                    value: raw,
                })?,
                None => DEFAULT_HTTP_PORT,
            },
        };

        Ok(AppConfig {
            data_dir,
            rates_path,
            db_path,
            bind_addr,
            http_port,
        })
    }

    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.http_port)
    }

    /// Path of the append-only log file.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    /// Creates the data directory if it doesn't exist.
    pub fn ensure_data_dir(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_dir).map_err(|source| ConfigError::DataDir {
            path: self.data_dir.clone(),
            source,
        })
    }
}

/// Platform data directory.
///
/// - **macOS**: `~/Library/Application Support/com.taximeter.taximeter`
/// - **Windows**: `%APPDATA%\taximeter\taximeter\data`
/// - **Linux**: `~/.local/share/taximeter`
fn default_data_dir() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("com", "taximeter", "taximeter")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| ConfigError::MissingRequired("TAXIMETER_DATA_DIR".to_string()))
}

/// Loads the rate document at `path`, falling back to the built-in rates.
///
/// A missing file is normal (INFO). An unreadable, malformed or invalid file
/// is reported at WARN and ignored as a whole.
pub fn load_rates(path: &Path) -> RateConfig {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No rate file, using default rates");
            return RateConfig::default();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read rate file, using default rates");
            return RateConfig::default();
        }
    };

    match RateConfig::from_json_str(&raw) {
        Ok(rates) => {
            info!(
                path = %path.display(),
                options = rates.options().count(),
                levels = rates.levels().count(),
                "Rates loaded"
            );
            rates
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Invalid rate file, using default rates");
            RateConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use taxi_core::{MeterState, OptionId};

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("taximeter-{}-{}", tag, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_paths_derive_from_data_dir() {
        let config = AppConfig::resolve(
            lookup_from(&[("TAXIMETER_DATA_DIR", "/srv/taxi")]),
            ConfigOverrides::default(),
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/taxi"));
        assert_eq!(config.rates_path, PathBuf::from("/srv/taxi/rates.json"));
        assert_eq!(config.db_path, PathBuf::from("/srv/taxi/trips.db"));
        assert_eq!(config.log_path(), PathBuf::from("/srv/taxi/taximeter.log"));
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = AppConfig::resolve(
            lookup_from(&[
                ("TAXIMETER_DATA_DIR", "/srv/taxi"),
                ("TAXIMETER_DB_PATH", "/var/lib/trips.db"),
                ("TAXIMETER_BIND_ADDR", "0.0.0.0"),
                ("TAXIMETER_HTTP_PORT", "8080"),
            ]),
            ConfigOverrides::default(),
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/trips.db"));
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_flags_override_env() {
        let overrides = ConfigOverrides {
            data_dir: Some(PathBuf::from("/tmp/flag")),
            http_port: Some(9000),
            ..Default::default()
        };
        let config = AppConfig::resolve(
            lookup_from(&[
                ("TAXIMETER_DATA_DIR", "/srv/taxi"),
                ("TAXIMETER_HTTP_PORT", "8080"),
            ]),
            overrides,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/flag"));
        assert_eq!(config.rates_path, PathBuf::from("/tmp/flag/rates.json"));
        assert_eq!(config.http_port, 9000);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = AppConfig::resolve(
            lookup_from(&[
                ("TAXIMETER_DATA_DIR", "/srv/taxi"),
                ("TAXIMETER_HTTP_PORT", "eighty"),
            ]),
            ConfigOverrides::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "TAXIMETER_HTTP_PORT"));
    }

    #[test]
    fn test_missing_rate_file_uses_defaults() {
        let dir = temp_dir("missing");
        let rates = load_rates(&dir.join("rates.json"));
        assert_eq!(rates, RateConfig::default());
    }

    #[test]
    fn test_malformed_rate_file_uses_defaults() {
        let dir = temp_dir("malformed");
        let path = dir.join("rates.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_rates(&path), RateConfig::default());
    }

    #[test]
    fn test_invalid_rate_values_use_defaults() {
        let dir = temp_dir("invalid");
        let path = dir.join("rates.json");
        std::fs::write(&path, r#"{"base_rates": {"1": -0.5}}"#).unwrap();

        assert_eq!(load_rates(&path), RateConfig::default());
    }

    #[test]
    fn test_valid_rate_file_loaded() {
        let dir = temp_dir("valid");
        let path = dir.join("rates.json");
        std::fs::write(
            &path,
            r#"{
                "base_rates": {"1": 0.10, "2": 0.04},
                "levels": {"1": 1.0, "2": 1.5},
                "options": {"night": {"name": "Night", "multiplier": 1.25}}
            }"#,
        )
        .unwrap();

        let rates = load_rates(&path);
        assert_eq!(rates.base_rate(MeterState::Moving), 0.10);
        assert_eq!(rates.option_multiplier(&OptionId::parse("night").unwrap()), 1.25);
    }

    #[test]
    fn test_ensure_data_dir_creates_directory() {
        let dir = temp_dir("ensure").join("nested");
        let config = AppConfig::resolve(
            lookup_from(&[]),
            ConfigOverrides {
                data_dir: Some(dir.clone()),
                ..Default::default()
            },
        )
        .unwrap();

        config.ensure_data_dir().unwrap();
        assert!(dir.is_dir());
    }
}
