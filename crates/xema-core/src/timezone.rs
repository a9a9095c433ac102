//! Civil time for the source's fixed zone
//!
//! The source publishes in UTC. Banners show CET/CEST, switching at 02:00 on
//! the last Sunday of March and of October. The switch dates are computed per
//! year; no tz database is involved.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::validate::is_period_label;

/// Zone shown when a period label cannot be converted
pub const FALLBACK_ZONE: &str = "UTC";

/// The two offset regimes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Standard,
    Daylight,
}

impl Zone {
    pub fn utc_offset_hours(self) -> i64 {
        match self {
            Zone::Standard => 1,
            Zone::Daylight => 2,
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Zone::Standard => "CET",
            Zone::Daylight => "CEST",
        }
    }

    pub fn from_abbreviation(abbr: &str) -> Option<Self> {
        match abbr {
            "CET" => Some(Zone::Standard),
            "CEST" => Some(Zone::Daylight),
            _ => None,
        }
    }

    /// First UTC hour at which a period already belongs to the next local day
    pub fn day_change_hour_utc(self) -> u32 {
        match self {
            Zone::Standard => 22,
            Zone::Daylight => 21,
        }
    }
}

/// Civil time for one UTC instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTimeLabel {
    pub zone: Zone,
    pub utc_offset_hours: i64,
    pub local: NaiveDateTime,
}

impl LocalTimeLabel {
    pub fn zone_name(&self) -> &'static str {
        match self.zone {
            Zone::Standard => "standard",
            Zone::Daylight => "daylight",
        }
    }

    /// `DD/MM/YYYY`
    pub fn local_date_string(&self) -> String {
        self.local.format("%d/%m/%Y").to_string()
    }

    /// `HH:MM`
    pub fn local_time_string(&self) -> String {
        self.local.format("%H:%M").to_string()
    }
}

/// A period label converted to civil time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalInterval {
    /// `DD/MM/YYYY`
    pub local_date: String,
    /// `HH:MM-HH:MM CET`, or the raw label when it could not be parsed
    pub interval: String,
    /// `CET`, `CEST` or `UTC`
    pub zone: String,
}

/// Last Sunday of the given month
pub fn last_sunday(year: i32, month: u32) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last_day = first_of_next.pred_opt()?;
    let back = last_day.weekday().num_days_from_sunday();
    Some(last_day - Duration::days(i64::from(back)))
}

/// Daylight period of a year as `[start, end)` in UTC wall time
pub fn daylight_window(year: i32) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let switch = NaiveTime::from_hms_opt(2, 0, 0)?;
    let start = last_sunday(year, 3)?.and_time(switch);
    let end = last_sunday(year, 10)?.and_time(switch);
    Some((start, end))
}

/// Zone in force at a UTC instant
pub fn zone_at(instant: NaiveDateTime) -> Zone {
    match daylight_window(instant.year()) {
        Some((start, end)) if start <= instant && instant < end => Zone::Daylight,
        _ => Zone::Standard,
    }
}

/// Classify a UTC instant into its civil time label
pub fn classify(instant: DateTime<Utc>) -> LocalTimeLabel {
    let naive = instant.naive_utc();
    let zone = zone_at(naive);
    let utc_offset_hours = zone.utc_offset_hours();
    LocalTimeLabel {
        zone,
        utc_offset_hours,
        local: naive + Duration::hours(utc_offset_hours),
    }
}

/// Split an `HH:MM - HH:MM` label (hyphen or en dash) into its two times
pub fn parse_period(label: &str) -> Option<(NaiveTime, NaiveTime)> {
    if !is_period_label(label) {
        return None;
    }
    let (start, end) = label.split_once(['-', '–'])?;
    let start = NaiveTime::parse_from_str(start.trim(), "%H:%M").ok()?;
    let end = NaiveTime::parse_from_str(end.trim(), "%H:%M").ok()?;
    Some((start, end))
}

/// Convert a UTC date plus period label into local date and interval
///
/// The zone is decided at the period start. A period ending at or before its
/// start (e.g. `23:30 - 00:00`) ends on the following day. Labels that do not
/// parse come back unchanged with zone `UTC`.
pub fn to_local_interval(date_utc: NaiveDate, period_label: &str) -> LocalInterval {
    let Some((start, end)) = parse_period(period_label) else {
        return LocalInterval {
            local_date: date_utc.format("%d/%m/%Y").to_string(),
            interval: period_label.to_string(),
            zone: FALLBACK_ZONE.to_string(),
        };
    };

    let start_utc = date_utc.and_time(start);
    let mut end_utc = date_utc.and_time(end);
    if end_utc <= start_utc {
        end_utc += Duration::days(1);
    }

    let zone = zone_at(start_utc);
    let offset = Duration::hours(zone.utc_offset_hours());
    let local_start = start_utc + offset;
    let local_end = end_utc + offset;

    LocalInterval {
        local_date: local_start.format("%d/%m/%Y").to_string(),
        interval: format!(
            "{}-{} {}",
            local_start.format("%H:%M"),
            local_end.format("%H:%M"),
            zone.abbreviation()
        ),
        zone: zone.abbreviation().to_string(),
    }
}

/// Whether banners should warn that the daily summary is not out yet
///
/// Fires only without fallback data and once the period starts at or after the
/// zone's late-evening UTC threshold. Unparseable labels never warn.
pub fn day_change_pending(period_label: &str, zone: Option<Zone>, fallback_available: bool) -> bool {
    if fallback_available {
        return false;
    }
    let (Some(zone), Some((start, _))) = (zone, parse_period(period_label)) else {
        return false;
    };
    start.hour() >= zone.day_change_hour_utc()
}

/// Local calendar date of a UTC instant
pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    classify(instant).local.date()
}
