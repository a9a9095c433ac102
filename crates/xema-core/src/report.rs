//! Output records handed to sinks and renderers

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Per-station status carried on every output record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Ok,
    NotFound,
    /// Not completed before the run deadline: never started, or interrupted
    NotAttempted,
}

/// One record as written by the sinks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub station_code: String,
    pub station_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_time: Option<String>,
    pub period_label: String,
    pub local_date: String,
    pub local_interval: String,
    pub zone_name: String,
    pub is_yesterday: bool,
    pub extraction_timestamp: DateTime<Utc>,
    pub status: RecordStatus,
    /// Attempts made before giving up (`not_found` only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub daily_summary_pending: bool,
    /// Non-empty readings with their unit, keyed by reading name
    pub readings: BTreeMap<String, String>,
}

impl OutputRecord {
    /// Record with identity fields only, for stations without data
    pub fn bare(
        station_code: impl Into<String>,
        station_name: impl Into<String>,
        status: RecordStatus,
        extraction_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            station_code: station_code.into(),
            station_name: station_name.into(),
            query_date: None,
            query_time: None,
            period_label: String::new(),
            local_date: String::new(),
            local_interval: String::new(),
            zone_name: String::new(),
            is_yesterday: false,
            extraction_timestamp,
            status,
            attempts: None,
            source_url: None,
            daily_summary_pending: false,
            readings: BTreeMap::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == RecordStatus::Ok
    }
}

/// Daily summary of one station
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub station_code: String,
    pub station_name: String,
    pub date: NaiveDate,
    pub values: BTreeMap<String, String>,
    pub source_url: Option<String>,
    pub extraction_timestamp: DateTime<Utc>,
}

impl DailySummary {
    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| v.is_empty())
    }
}

/// Resolver constants in force for a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSettings {
    pub max_attempts: u32,
    pub step_minutes: i64,
    pub publication_lag_minutes: i64,
    pub yesterday_cap: usize,
}

/// Found/not-found counts of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub stations: usize,
    pub found_today: usize,
    pub not_found: usize,
    pub not_attempted: usize,
    pub yesterday_records: usize,
    pub daily_summaries: usize,
}

impl RunSummary {
    pub fn tally(stations: usize, records: &[OutputRecord], daily: &[DailySummary]) -> Self {
        let mut summary = RunSummary {
            stations,
            daily_summaries: daily.len(),
            ..Default::default()
        };
        for record in records {
            match (record.status, record.is_yesterday) {
                (RecordStatus::Ok, false) => summary.found_today += 1,
                (RecordStatus::Ok, true) => summary.yesterday_records += 1,
                (RecordStatus::NotFound, _) => summary.not_found += 1,
                (RecordStatus::NotAttempted, _) => summary.not_attempted += 1,
            }
        }
        summary
    }
}

/// Everything a run produced, written once by the coordinator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub settings: RunSettings,
    pub summary: RunSummary,
    pub records: Vec<OutputRecord>,
    pub daily_summaries: Vec<DailySummary>,
}

impl RunReport {
    pub fn new(
        generated_at: DateTime<Utc>,
        settings: RunSettings,
        stations: usize,
        records: Vec<OutputRecord>,
        daily_summaries: Vec<DailySummary>,
    ) -> Self {
        let summary = RunSummary::tally(stations, &records, &daily_summaries);
        Self {
            generated_at,
            settings,
            summary,
            records,
            daily_summaries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&RecordStatus::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
        let json = serde_json::to_string(&RecordStatus::Ok).unwrap();
        assert_eq!(json, "\"ok\"");
    }

    #[test]
    fn test_summary_tally() {
        let at = Utc.with_ymd_and_hms(2026, 1, 31, 7, 0, 0).unwrap();
        let today = OutputRecord::bare("XJ", "Girona", RecordStatus::Ok, at);
        let mut yesterday = OutputRecord::bare("XJ", "Girona", RecordStatus::Ok, at);
        yesterday.is_yesterday = true;
        let missing = OutputRecord::bare("D5", "Fabra", RecordStatus::NotFound, at);
        let skipped = OutputRecord::bare("YT", "Bonabé", RecordStatus::NotAttempted, at);

        let summary = RunSummary::tally(3, &[today, yesterday, missing, skipped], &[]);
        assert_eq!(summary.stations, 3);
        assert_eq!(summary.found_today, 1);
        assert_eq!(summary.yesterday_records, 1);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.not_attempted, 1);
    }

    #[test]
    fn test_bare_record_omits_optional_fields() {
        let at = Utc.with_ymd_and_hms(2026, 1, 31, 7, 0, 0).unwrap();
        let record = OutputRecord::bare("D5", "Fabra", RecordStatus::NotFound, at);
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("attempts").is_none());
        assert!(value.get("query_date").is_none());
        assert_eq!(value["status"], "not_found");
        assert_eq!(value["readings"], serde_json::json!({}));
    }
}
