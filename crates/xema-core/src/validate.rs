//! Row validation and value cleaning
//!
//! Source cells carry decimal commas, stray whitespace and a handful of
//! placeholder tokens for missing data. Everything here is pure.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::types::{ObservationWindow, RawRow, StationRef, ValidatedRecord};

/// Tokens the source prints instead of a value
const PLACEHOLDERS: &[&str] = &["(s/d)", "s/d", "-", "n/d", "n/a", "no data"];

const MAX_KEY_LEN: usize = 50;

fn period_regex() -> &'static Regex {
    static PERIOD: OnceLock<Regex> = OnceLock::new();
    PERIOD.get_or_init(|| {
        Regex::new(r"\d{1,2}:\d{2}\s*[-–]\s*\d{1,2}:\d{2}").expect("period pattern is valid")
    })
}

/// Whether a cell looks like an `HH:MM - HH:MM` interval label
pub fn is_period_label(text: &str) -> bool {
    period_regex().is_match(text)
}

/// Whether a cleaned value is one of the known placeholders
pub fn is_placeholder(text: &str) -> bool {
    let lowered = text.to_lowercase();
    PLACEHOLDERS.iter().any(|p| *p == lowered)
}

/// Clean a raw cell value
///
/// Trims, collapses whitespace runs, turns the decimal comma into a dot and
/// maps placeholders to the empty string. `clean(clean(x)) == clean(x)`.
pub fn clean(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let dotted = collapsed.replace(',', ".");
    if dotted.is_empty() || is_placeholder(&dotted) {
        String::new()
    } else {
        dotted
    }
}

/// A row is valid when at least one reading survives cleaning
pub fn is_valid(row: &RawRow) -> bool {
    row.readings.iter().any(|(_, raw)| !clean(raw).is_empty())
}

/// Turn header text into a reading key
///
/// `TM (°C)` becomes `TM_grausC`, `VVM (10 m) (km/h)` becomes `VVM_10_m_km_h`.
pub fn normalize_header(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "UNKNOWN".to_string();
    }

    let mut key = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        match ch {
            ' ' => key.push('_'),
            '(' | ')' | '.' | ',' => {}
            '/' => key.push('_'),
            '°' | 'º' => key.push_str("graus"),
            '%' => key.push_str("perc"),
            '&' => key.push('i'),
            other => key.push(other),
        }
    }

    if key.is_empty() {
        return "UNKNOWN".to_string();
    }
    if key.starts_with(|c: char| c.is_ascii_digit()) {
        key.insert_str(0, "VAR_");
    }
    key.chars().take(MAX_KEY_LEN).collect()
}

/// Build a [`ValidatedRecord`] from a raw row, or `None` when the row is empty
pub fn validate_row(
    row: &RawRow,
    station: &StationRef,
    window: &ObservationWindow,
    source_url: Option<String>,
    extracted_at: DateTime<Utc>,
    is_yesterday: bool,
) -> Option<ValidatedRecord> {
    if !is_valid(row) {
        return None;
    }

    let readings = row
        .readings
        .iter()
        .map(|(name, raw)| (name.clone(), clean(raw)))
        .collect();

    Some(ValidatedRecord {
        station_code: station.code.clone(),
        station_name: station.label().to_string(),
        query_date: window.date(),
        query_time: window.time_string(),
        source_url,
        extraction_timestamp: extracted_at,
        is_yesterday,
        period_utc: row.period_label.trim().to_string(),
        readings,
    })
}
