use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use crate::report::{DailySummary, RunReport};
use crate::types::{ObservationWindow, RawRow, StationRef};

/// Periodic table source
///
/// Returns rows most recent first. Failures come back as an empty vector; a
/// failed fetch is a "no data" signal, never an error for the caller.
#[async_trait::async_trait]
pub trait PeriodSource: Send + Sync {
    async fn fetch(&self, window: &ObservationWindow) -> Vec<RawRow>;

    /// URL a fetch for `window` would hit, recorded as provenance
    fn describe(&self, _window: &ObservationWindow) -> Option<String> {
        None
    }
}

/// Daily summary source
///
/// `extracted_at` is stamped on the summary; callers take it from their
/// [`Clock`].
#[async_trait::async_trait]
pub trait DailySummarySource: Send + Sync {
    async fn fetch_daily(
        &self,
        station: &StationRef,
        date: NaiveDate,
        extracted_at: DateTime<Utc>,
    ) -> Option<DailySummary>;
}

/// Suspension between adapter calls
#[async_trait::async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    async fn emit(&mut self, report: &RunReport) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(any(test, feature = "test-util"))]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Pacer that records requested delays without sleeping
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait::async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, delay: Duration) {
        if let Ok(mut pauses) = self.pauses.lock() {
            pauses.push(delay);
        }
    }
}
