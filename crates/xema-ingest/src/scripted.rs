//! In-memory source serving canned rows

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::time::{sleep, Duration};
use xema_core::{
    DailySummary, DailySummarySource, ObservationWindow, PeriodSource, RawRow, StationRef,
};

/// Source answering from a table keyed by station code and instant
///
/// Unknown windows yield no rows. Every fetch is logged so callers can check
/// which anchors were queried and in what order.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    periods: HashMap<(String, DateTime<Utc>), Vec<RawRow>>,
    daily: HashMap<String, BTreeMap<String, String>>,
    latency: Option<Duration>,
    station_latency: HashMap<String, Duration>,
    calls: Mutex<Vec<ObservationWindow>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, station_code: &str, instant: DateTime<Utc>, rows: Vec<RawRow>) -> Self {
        let window = ObservationWindow::new(station_code, instant);
        self.periods
            .insert((window.station_code, window.utc_instant), rows);
        self
    }

    pub fn with_daily(mut self, station_code: &str, values: BTreeMap<String, String>) -> Self {
        self.daily.insert(station_code.to_string(), values);
        self
    }

    /// Delay every period fetch, to exercise deadlines
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Delay period fetches for one station, overriding [`Self::with_latency`]
    pub fn with_station_latency(mut self, station_code: &str, latency: Duration) -> Self {
        self.station_latency.insert(station_code.to_string(), latency);
        self
    }

    /// Windows fetched so far, in call order
    pub fn calls(&self) -> Vec<ObservationWindow> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_for(&self, station_code: &str) -> Vec<DateTime<Utc>> {
        self.calls()
            .into_iter()
            .filter(|w| w.station_code == station_code)
            .map(|w| w.utc_instant)
            .collect()
    }
}

#[async_trait::async_trait]
impl PeriodSource for ScriptedSource {
    async fn fetch(&self, window: &ObservationWindow) -> Vec<RawRow> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(window.clone());
        }
        let latency = self
            .station_latency
            .get(&window.station_code)
            .copied()
            .or(self.latency);
        if let Some(latency) = latency {
            sleep(latency).await;
        }
        self.periods
            .get(&(window.station_code.clone(), window.utc_instant))
            .cloned()
            .unwrap_or_default()
    }

    fn describe(&self, window: &ObservationWindow) -> Option<String> {
        Some(format!("scripted:{}@{}", window.station_code, window.query_value()))
    }
}

#[async_trait::async_trait]
impl DailySummarySource for ScriptedSource {
    async fn fetch_daily(
        &self,
        station: &StationRef,
        date: NaiveDate,
        extracted_at: DateTime<Utc>,
    ) -> Option<DailySummary> {
        let values = self.daily.get(&station.code)?.clone();
        Some(DailySummary {
            station_code: station.code.clone(),
            station_name: station.label().to_string(),
            date,
            values,
            source_url: None,
            extraction_timestamp: extracted_at,
        })
    }
}
