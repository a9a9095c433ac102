use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use xema_core::{ResolverSettings, StationRef};

pub const DEFAULT_CONFIG_PATH: &str = "xema.toml";
pub const DEFAULT_BASE_URL: &str = "https://www.meteo.cat/observacions/xema/dades";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    pub max_attempts: u32,
    pub step_minutes: i64,
    pub publication_lag_minutes: i64,
    pub yesterday_cap: usize,
    pub attempt_delay_ms: u64,
    pub request_delay_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            step_minutes: 30,
            publication_lag_minutes: 20,
            yesterday_cap: 4,
            attempt_delay_ms: 500,
            request_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DailyConfig {
    pub enabled: bool,
    /// UTC time of day used to query the daily summary, `HH:MM`
    pub query_time: String,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            query_time: "09:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub daily: DailyConfig,
    #[serde(default)]
    pub stations: Vec<StationRef>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("No stations configured")]
    NoStations,
    #[error("Station {0} is listed more than once")]
    DuplicateStation(String),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl AppConfig {
    /// Load configuration from the XEMA_CONFIG path (default `xema.toml`)
    ///
    /// Unlike runtime knobs, the station list has no default: a missing file
    /// is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("XEMA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_path(path)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        s.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stations.is_empty() {
            return Err(ConfigError::NoStations);
        }

        let mut seen = HashSet::new();
        for station in &self.stations {
            if station.code.trim().is_empty() {
                return Err(invalid("stations.code", "empty station code"));
            }
            if !seen.insert(station.code.as_str()) {
                return Err(ConfigError::DuplicateStation(station.code.clone()));
            }
        }

        if self.source.base_url.trim().is_empty() {
            return Err(invalid("source.base_url", "empty URL"));
        }
        if self.source.timeout_secs == 0 {
            return Err(invalid("source.timeout_secs", "must be positive"));
        }
        if self.resolver.step_minutes <= 0 {
            return Err(invalid("resolver.step_minutes", "must be positive"));
        }
        if self.resolver.publication_lag_minutes < 0 {
            return Err(invalid("resolver.publication_lag_minutes", "must not be negative"));
        }
        parse_query_time(&self.daily.query_time)?;
        Ok(())
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        let r = &self.resolver;
        ResolverSettings {
            max_attempts: r.max_attempts,
            step: Duration::minutes(r.step_minutes),
            publication_lag: Duration::minutes(r.publication_lag_minutes),
            yesterday_cap: r.yesterday_cap,
            attempt_delay: std::time::Duration::from_millis(r.attempt_delay_ms),
            request_delay: std::time::Duration::from_millis(r.request_delay_ms),
        }
    }

    /// Daily summary query time (09:00 when unparseable)
    pub fn daily_query_time(&self) -> NaiveTime {
        parse_query_time(&self.daily.query_time)
            .unwrap_or_else(|_| NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN))
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.source.timeout_secs)
    }
}

impl FromStr for AppConfig {
    type Err = ConfigError;

    /// Parse and validate a TOML document
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cfg = toml::from_str::<AppConfig>(s)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

fn parse_query_time(text: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M")
        .map_err(|e| invalid("daily.query_time", &e.to_string()))
}
