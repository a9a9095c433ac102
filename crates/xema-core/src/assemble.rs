//! Record assembly
//!
//! Turns resolver outcomes into [`OutputRecord`]s: local period labels, the
//! day-change flag and unit-suffixed readings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::report::{OutputRecord, RecordStatus};
use crate::timezone::{day_change_pending, to_local_interval, Zone};
use crate::types::{ResolutionOutcome, StationRef, StationResolution, ValidatedRecord};
use crate::units::with_unit;

/// Assemble the today record of a station
///
/// `fallback_available` is true when the station's daily summary was fetched;
/// it silences the daily-summary warning. `NotFound` still yields a record, with identity
/// fields and the number of attempts made.
pub fn assemble(
    station: &StationRef,
    outcome: &ResolutionOutcome,
    fallback_available: bool,
    extracted_at: DateTime<Utc>,
) -> OutputRecord {
    match outcome {
        ResolutionOutcome::Found(record) => from_validated(record, fallback_available),
        ResolutionOutcome::NotFound { attempts } => {
            let mut out = OutputRecord::bare(
                station.code.as_str(),
                station.label(),
                RecordStatus::NotFound,
                extracted_at,
            );
            out.attempts = Some(*attempts);
            out
        }
    }
}

/// Assemble every record of one station: today first, then yesterday
///
/// `daily_available` tells whether a daily summary exists for the station.
/// Yesterday's period records do not count as fallback data.
pub fn assemble_station(
    resolution: &StationResolution,
    daily_available: bool,
    extracted_at: DateTime<Utc>,
) -> Vec<OutputRecord> {
    let mut records = Vec::with_capacity(1 + resolution.yesterday.len());
    records.push(assemble(
        &resolution.station,
        &resolution.today,
        daily_available,
        extracted_at,
    ));
    records.extend(
        resolution
            .yesterday
            .iter()
            .map(|record| from_validated(record, daily_available)),
    );
    records
}

/// Record a renderer shows for one station
///
/// The `ok` today record wins; otherwise the most recent `ok` yesterday record.
pub fn select_display(records: &[OutputRecord]) -> Option<&OutputRecord> {
    records
        .iter()
        .find(|r| r.is_ok() && !r.is_yesterday)
        .or_else(|| records.iter().find(|r| r.is_ok() && r.is_yesterday))
}

fn from_validated(record: &ValidatedRecord, fallback_available: bool) -> OutputRecord {
    let local = to_local_interval(record.query_date, &record.period_utc);
    let zone = Zone::from_abbreviation(&local.zone);
    let zone_name = match zone {
        Some(Zone::Standard) => "standard",
        Some(Zone::Daylight) => "daylight",
        None => "utc",
    };

    let readings: BTreeMap<String, String> = record
        .readings
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| (name.clone(), with_unit(name, value)))
        .collect();

    OutputRecord {
        station_code: record.station_code.clone(),
        station_name: record.station_name.clone(),
        query_date: Some(record.query_date),
        query_time: Some(record.query_time.clone()),
        period_label: record.period_utc.clone(),
        local_date: local.local_date,
        local_interval: local.interval,
        zone_name: zone_name.to_string(),
        is_yesterday: record.is_yesterday,
        extraction_timestamp: record.extraction_timestamp,
        status: RecordStatus::Ok,
        attempts: None,
        source_url: record.source_url.clone(),
        daily_summary_pending: !record.is_yesterday
            && day_change_pending(&record.period_utc, zone, fallback_available),
        readings,
    }
}
