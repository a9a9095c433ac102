//! One run over every configured station

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};
use xema_core::{
    assemble_station, local_date, Clock, DailySummary, DailySummarySource, OutputRecord, Pacer,
    PeriodSource, RecordStatus, ResolverSettings, RunReport, StationRef, StationResolution,
};
use xema_resolve::Resolver;

/// What one worker produced for one station
struct StationWork {
    resolution: StationResolution,
    daily: Option<DailySummary>,
}

/// State of a station slot once every worker has stopped
enum Slot {
    /// Never started before the deadline
    Pending,
    /// Started, then interrupted by the deadline
    CutOff,
    Done(StationWork),
}

/// Resolves all stations with a bounded number of workers
///
/// Workers pull the next station from a shared queue and handle it to the
/// end, pausing `request_delay` between their own stations, so source load
/// grows with the worker count and never beyond it. A slow station only
/// holds up the worker that took it.
pub struct Scheduler {
    source: Arc<dyn PeriodSource>,
    daily: Option<Arc<dyn DailySummarySource>>,
    pacer: Arc<dyn Pacer>,
    clock: Arc<dyn Clock>,
    stations: Vec<StationRef>,
    settings: ResolverSettings,
    workers: usize,
    deadline: Option<Duration>,
}

impl Scheduler {
    pub fn new(
        source: Arc<dyn PeriodSource>,
        pacer: Arc<dyn Pacer>,
        clock: Arc<dyn Clock>,
        stations: Vec<StationRef>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            source,
            daily: None,
            pacer,
            clock,
            stations,
            settings,
            workers: 1,
            deadline: None,
        }
    }

    pub fn with_daily(mut self, daily: Arc<dyn DailySummarySource>) -> Self {
        self.daily = Some(daily);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Resolve every station once and gather the results into one report
    ///
    /// Stations not completed before the deadline are reported
    /// `not_attempted`, whether they were never started or interrupted.
    pub async fn run_once(&self) -> RunReport {
        let started = self.clock.now();
        let deadline = self.deadline.map(|d| Instant::now() + d);
        info!(
            stations = self.stations.len(),
            workers = self.workers,
            deadline_secs = self.deadline.map(|d| d.as_secs()),
            "run started"
        );

        let queue = AtomicUsize::new(0);
        let queue = &queue;
        let workers = self.workers.min(self.stations.len()).max(1);
        let done: Vec<(usize, Slot)> = futures::stream::iter(0..workers)
            .map(move |_| self.run_worker(queue, deadline))
            .buffer_unordered(workers)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect();

        let mut slots: Vec<Slot> = self.stations.iter().map(|_| Slot::Pending).collect();
        for (index, slot) in done {
            slots[index] = slot;
        }

        let finished = self.clock.now();
        let mut records: Vec<OutputRecord> = Vec::new();
        let mut daily = Vec::new();
        for (station, slot) in self.stations.iter().zip(slots) {
            match slot {
                Slot::Done(work) => {
                    records.extend(assemble_station(
                        &work.resolution,
                        work.daily.is_some(),
                        finished,
                    ));
                    daily.extend(work.daily);
                }
                Slot::CutOff => records.push(not_attempted(station, finished)),
                Slot::Pending => {
                    warn!(station = %station.code, "run deadline reached, station not attempted");
                    records.push(not_attempted(station, finished));
                }
            }
        }

        let report = RunReport::new(
            started,
            self.settings.run_settings(),
            self.stations.len(),
            records,
            daily,
        );
        let summary = &report.summary;
        info!(
            stations = summary.stations,
            found_today = summary.found_today,
            not_found = summary.not_found,
            not_attempted = summary.not_attempted,
            yesterday_records = summary.yesterday_records,
            daily_summaries = summary.daily_summaries,
            "run finished"
        );
        report
    }

    /// Take stations off the shared queue until it is empty or the deadline passes
    async fn run_worker(&self, queue: &AtomicUsize, deadline: Option<Instant>) -> Vec<(usize, Slot)> {
        let resolver = Resolver::new(
            self.source.as_ref(),
            self.pacer.as_ref(),
            self.clock.as_ref(),
            &self.settings,
        );
        let mut out = Vec::new();

        loop {
            let index = queue.fetch_add(1, Ordering::Relaxed);
            let Some(station) = self.stations.get(index) else {
                break;
            };
            if !out.is_empty() {
                self.pacer.pause(self.settings.request_delay).await;
            }

            let Some(deadline) = deadline else {
                out.push((index, Slot::Done(self.resolve(&resolver, station).await)));
                continue;
            };
            // a claimed station left behind stays pending
            if Instant::now() >= deadline {
                break;
            }
            match timeout_at(deadline, self.resolve(&resolver, station)).await {
                Ok(work) => out.push((index, Slot::Done(work))),
                Err(_) => {
                    warn!(
                        station = %station.code,
                        "run deadline reached mid-resolution, station interrupted"
                    );
                    out.push((index, Slot::CutOff));
                    break;
                }
            }
        }
        out
    }

    async fn resolve(&self, resolver: &Resolver<'_>, station: &StationRef) -> StationWork {
        let resolution = resolver.station(station).await;

        let daily = match &self.daily {
            Some(source) => {
                self.pacer.pause(self.settings.request_delay).await;
                let now = self.clock.now();
                source.fetch_daily(station, local_date(now), now).await
            }
            None => None,
        };

        StationWork { resolution, daily }
    }
}

fn not_attempted(station: &StationRef, at: DateTime<Utc>) -> OutputRecord {
    OutputRecord::bare(
        station.code.as_str(),
        station.label(),
        RecordStatus::NotAttempted,
        at,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::BTreeMap;
    use xema_core::{FixedClock, RawRow, RecordingPacer};
    use xema_ingest::ScriptedSource;
    use xema_resolve::TokioPacer;

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, h, m, 0).unwrap()
    }

    fn stations(codes: &[&str]) -> Vec<StationRef> {
        codes.iter().map(|c| StationRef::new(*c, format!("Estació {c}"))).collect()
    }

    fn quiet_settings() -> ResolverSettings {
        ResolverSettings {
            attempt_delay: Duration::ZERO,
            request_delay: Duration::from_secs(1),
            ..ResolverSettings::default()
        }
    }

    #[tokio::test]
    async fn test_run_reports_every_station() {
        let source = Arc::new(
            ScriptedSource::new()
                .with_rows(
                    "XJ",
                    utc(31, 6, 30),
                    vec![RawRow::new("06:30 - 07:00").reading("TM", "5,2")],
                )
                .with_rows(
                    "XJ",
                    utc(30, 0, 0),
                    vec![RawRow::new("23:30 - 00:00").reading("TM", "3,0")],
                )
                .with_daily(
                    "XJ",
                    BTreeMap::from([("TEMPERATURA_MITJANA_DIA".to_string(), "4.1 °C".to_string())]),
                ),
        );
        let scheduler = Scheduler::new(
            source.clone(),
            Arc::new(RecordingPacer::new()),
            Arc::new(FixedClock(utc(31, 7, 0))),
            stations(&["XJ", "D5"]),
            quiet_settings(),
        )
        .with_daily(source.clone())
        .with_workers(2);

        let report = scheduler.run_once().await;

        assert_eq!(report.summary.stations, 2);
        assert_eq!(report.summary.found_today, 1);
        assert_eq!(report.summary.yesterday_records, 1);
        assert_eq!(report.summary.not_found, 1);
        assert_eq!(report.summary.daily_summaries, 1);

        let codes: Vec<_> = report
            .records
            .iter()
            .map(|r| (r.station_code.as_str(), r.status))
            .collect();
        assert_eq!(
            codes,
            [
                ("XJ", RecordStatus::Ok),
                ("XJ", RecordStatus::Ok),
                ("D5", RecordStatus::NotFound)
            ]
        );
        assert_eq!(report.records[2].attempts, Some(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_delay_is_per_worker() {
        // equal latency keeps every worker busy with the same share
        let codes = ["A1", "A2", "A3", "A4"];
        let settings = ResolverSettings {
            max_attempts: 1,
            ..quiet_settings()
        };

        for (workers, expected) in [(1, 3), (2, 2), (4, 0)] {
            let pacer = Arc::new(RecordingPacer::new());
            let scheduler = Scheduler::new(
                Arc::new(ScriptedSource::new().with_latency(Duration::from_secs(1))),
                pacer.clone(),
                Arc::new(FixedClock(utc(31, 7, 0))),
                stations(&codes),
                settings.clone(),
            )
            .with_workers(workers);

            scheduler.run_once().await;

            let between_stations = pacer
                .pauses()
                .into_iter()
                .filter(|d| *d == settings.request_delay)
                .count();
            assert_eq!(between_stations, expected, "workers = {workers}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_station_does_not_hold_back_others() {
        let source = Arc::new(
            ScriptedSource::new()
                .with_latency(Duration::from_secs(1))
                .with_station_latency("SLOW", Duration::from_secs(100)),
        );
        let settings = ResolverSettings {
            max_attempts: 1,
            attempt_delay: Duration::ZERO,
            request_delay: Duration::ZERO,
            ..ResolverSettings::default()
        };
        let scheduler = Scheduler::new(
            source.clone(),
            Arc::new(TokioPacer),
            Arc::new(FixedClock(utc(31, 7, 0))),
            stations(&["SLOW", "A1", "A2", "A3"]),
            settings,
        )
        .with_workers(2)
        .with_deadline(Some(Duration::from_secs(50)));

        let report = scheduler.run_once().await;

        let statuses: Vec<_> = report
            .records
            .iter()
            .map(|r| (r.station_code.as_str(), r.status))
            .collect();
        assert_eq!(
            statuses,
            [
                ("SLOW", RecordStatus::NotAttempted),
                ("A1", RecordStatus::NotFound),
                ("A2", RecordStatus::NotFound),
                ("A3", RecordStatus::NotFound)
            ]
        );
        assert_eq!(source.calls_for("SLOW").len(), 1);
    }

    #[tokio::test]
    async fn test_daily_summary_clears_day_change_flag() {
        let late = || vec![RawRow::new("22:30 - 23:00").reading("TM", "5,2")];
        let yesterday = || vec![RawRow::new("23:30 - 00:00").reading("TM", "3,0")];
        let source = Arc::new(
            ScriptedSource::new()
                .with_rows("XJ", utc(31, 22, 30), late())
                .with_rows("XJ", utc(31, 0, 0), yesterday())
                .with_rows("YK", utc(31, 22, 30), late())
                .with_rows("YK", utc(31, 0, 0), yesterday())
                .with_daily(
                    "XJ",
                    BTreeMap::from([("TEMPERATURA_MITJANA_DIA".to_string(), "4.1 °C".to_string())]),
                ),
        );
        let clock = FixedClock(utc(31, 23, 10));
        let scheduler = Scheduler::new(
            source.clone(),
            Arc::new(RecordingPacer::new()),
            Arc::new(clock),
            stations(&["XJ", "YK"]),
            quiet_settings(),
        )
        .with_daily(source.clone());

        let report = scheduler.run_once().await;

        let today: Vec<_> = report
            .records
            .iter()
            .filter(|r| r.is_ok() && !r.is_yesterday)
            .map(|r| (r.station_code.as_str(), r.daily_summary_pending))
            .collect();
        assert_eq!(today, [("XJ", false), ("YK", true)]);
        assert_eq!(report.summary.yesterday_records, 2);
        assert_eq!(report.daily_summaries[0].extraction_timestamp, clock.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_marks_remaining_stations() {
        // each station costs two 5s fetches: one today attempt, one yesterday
        let source = Arc::new(ScriptedSource::new().with_latency(Duration::from_secs(5)));
        let settings = ResolverSettings {
            max_attempts: 1,
            attempt_delay: Duration::ZERO,
            request_delay: Duration::ZERO,
            ..ResolverSettings::default()
        };
        let scheduler = Scheduler::new(
            source.clone(),
            Arc::new(TokioPacer),
            Arc::new(FixedClock(utc(31, 7, 0))),
            stations(&["A1", "A2", "A3"]),
            settings,
        )
        .with_deadline(Some(Duration::from_secs(15)));

        let report = scheduler.run_once().await;

        let statuses: Vec<_> = report.records.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            [
                RecordStatus::NotFound,
                RecordStatus::NotAttempted,
                RecordStatus::NotAttempted
            ]
        );
        assert_eq!(report.summary.not_attempted, 2);
        // A2 was interrupted mid-resolution, A3 never started
        assert!(!source.calls_for("A2").is_empty());
        assert!(source.calls_for("A3").is_empty());
    }

    #[tokio::test]
    async fn test_empty_station_list() {
        let scheduler = Scheduler::new(
            Arc::new(ScriptedSource::new()),
            Arc::new(RecordingPacer::new()),
            Arc::new(FixedClock(utc(31, 7, 0))),
            Vec::new(),
            quiet_settings(),
        );
        let report = scheduler.run_once().await;
        assert!(report.records.is_empty());
        assert_eq!(report.summary.stations, 0);
    }
}
