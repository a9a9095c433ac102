//! Core data types for station observations

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A station as listed in the configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StationRef {
    /// Short source code (e.g. "XJ")
    pub code: String,

    /// Raw identifier used by the source listing (e.g. "GIRONA_XJ")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Human readable name shown on the banners
    #[serde(default)]
    pub display_name: String,
}

impl StationRef {
    pub fn new(code: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            display_name: display_name.into(),
        }
    }

    /// Display name, falling back to the station code
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.code
        } else {
            &self.display_name
        }
    }
}

/// A single queried instant for one station
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationWindow {
    pub station_code: String,
    pub utc_instant: DateTime<Utc>,
}

impl ObservationWindow {
    /// Build a window, truncating the instant to minute precision
    pub fn new(station_code: impl Into<String>, utc_instant: DateTime<Utc>) -> Self {
        let utc_instant = utc_instant
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(utc_instant);
        Self {
            station_code: station_code.into(),
            utc_instant,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.utc_instant.date_naive()
    }

    /// `YYYY-MM-DD`
    pub fn date_string(&self) -> String {
        self.utc_instant.format("%Y-%m-%d").to_string()
    }

    /// `HH:MM`
    pub fn time_string(&self) -> String {
        self.utc_instant.format("%H:%M").to_string()
    }

    /// Value of the `dia` query parameter, `YYYY-MM-DDTHH:MMZ`
    pub fn query_value(&self) -> String {
        format!("{}T{}Z", self.date_string(), self.time_string())
    }
}

/// One parsed table row as returned by a source adapter
///
/// `readings` keeps the column order of the source table; each name is the
/// normalized header text found at the same position as the value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    pub period_label: String,
    pub readings: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(period_label: impl Into<String>) -> Self {
        Self {
            period_label: period_label.into(),
            readings: Vec::new(),
        }
    }

    pub fn reading(mut self, name: impl Into<String>, raw: impl Into<String>) -> Self {
        self.readings.push((name.into(), raw.into()));
        self
    }
}

/// A row that passed validation, with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedRecord {
    pub station_code: String,
    pub station_name: String,
    pub query_date: NaiveDate,
    pub query_time: String,
    pub source_url: Option<String>,
    pub extraction_timestamp: DateTime<Utc>,
    pub is_yesterday: bool,
    /// Period label exactly as published (UTC)
    pub period_utc: String,
    /// Cleaned readings, in source column order
    pub readings: Vec<(String, String)>,
}

impl ValidatedRecord {
    pub fn reading(&self, name: &str) -> Option<&str> {
        self.readings
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Result of the backward search for one station
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    Found(ValidatedRecord),
    NotFound { attempts: u32 },
}

impl ResolutionOutcome {
    pub fn record(&self) -> Option<&ValidatedRecord> {
        match self {
            ResolutionOutcome::Found(record) => Some(record),
            ResolutionOutcome::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ResolutionOutcome::Found(_))
    }
}

/// Everything resolved for one station in one run
#[derive(Debug, Clone, PartialEq)]
pub struct StationResolution {
    pub station: StationRef,
    pub today: ResolutionOutcome,
    /// Most recent period first
    pub yesterday: Vec<ValidatedRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_truncates_to_minute() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 31, 6, 30, 42).unwrap();
        let window = ObservationWindow::new("XJ", instant);

        assert_eq!(window.date_string(), "2026-01-31");
        assert_eq!(window.time_string(), "06:30");
        assert_eq!(window.query_value(), "2026-01-31T06:30Z");
        assert_eq!(window.utc_instant.second(), 0);
    }

    #[test]
    fn test_station_label_fallback() {
        let named = StationRef::new("XJ", "Girona");
        assert_eq!(named.label(), "Girona");

        let bare = StationRef::new("XJ", "  ");
        assert_eq!(bare.label(), "XJ");
    }

    #[test]
    fn test_station_deserializes_without_optional_fields() {
        let json = r#"{"code":"D5"}"#;
        let station: StationRef = serde_json::from_str(json).unwrap();
        assert_eq!(station.code, "D5");
        assert_eq!(station.name, None);
        assert_eq!(station.label(), "D5");
    }
}
