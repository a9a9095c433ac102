//! Per-station resolution driving a [`PeriodSource`]

use std::time::Duration;

use tracing::{debug, info, instrument};
use xema_core::{
    validate_row, Clock, ObservationWindow, Pacer, PeriodSource, ResolutionOutcome, ResolverSettings,
    StationRef, StationResolution, ValidatedRecord,
};

use crate::anchor::yesterday_anchor;
use crate::today::{SearchState, TodaySearch};

/// Pacer backed by `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait::async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Resolves today and yesterday data for stations, one at a time
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    source: &'a dyn PeriodSource,
    pacer: &'a dyn Pacer,
    clock: &'a dyn Clock,
    settings: &'a ResolverSettings,
}

impl<'a> Resolver<'a> {
    pub fn new(
        source: &'a dyn PeriodSource,
        pacer: &'a dyn Pacer,
        clock: &'a dyn Clock,
        settings: &'a ResolverSettings,
    ) -> Self {
        Self {
            source,
            pacer,
            clock,
            settings,
        }
    }

    /// Walk back from the initial anchor until a valid row turns up
    #[instrument(skip(self, station), fields(station = %station.code))]
    pub async fn today(&self, station: &StationRef) -> ResolutionOutcome {
        let search = TodaySearch::new(station, self.settings);
        let mut state = search.start(self.clock.now());

        loop {
            let (attempt, anchor) = match state {
                SearchState::Searching { attempt, anchor } => (attempt, anchor),
                SearchState::Found {
                    attempt,
                    anchor,
                    record,
                } => {
                    info!(%anchor, attempt, period = %record.period_utc, "today period found");
                    return ResolutionOutcome::Found(record);
                }
                SearchState::Exhausted { attempts } => {
                    info!(attempts, "no valid period within the search budget");
                    return ResolutionOutcome::NotFound { attempts };
                }
            };

            if attempt > 1 {
                self.pacer.pause(self.settings.attempt_delay).await;
            }

            let window = search.window(anchor);
            let rows = self.source.fetch(&window).await;
            debug!(%anchor, attempt, rows = rows.len(), "today attempt");

            state = search.advance(
                SearchState::Searching { attempt, anchor },
                &rows,
                self.source.describe(&window),
                self.clock.now(),
            );
        }
    }

    /// Collect up to `yesterday_cap` valid rows from a single fetch
    #[instrument(skip(self, station), fields(station = %station.code))]
    pub async fn yesterday(&self, station: &StationRef) -> Vec<ValidatedRecord> {
        let anchor = yesterday_anchor(self.clock.now());
        let window = ObservationWindow::new(station.code.as_str(), anchor);
        let rows = self.source.fetch(&window).await;
        let source_url = self.source.describe(&window);
        let extracted_at = self.clock.now();

        let records: Vec<_> = rows
            .iter()
            .filter_map(|row| validate_row(row, station, &window, source_url.clone(), extracted_at, true))
            .take(self.settings.yesterday_cap)
            .collect();
        debug!(%anchor, rows = rows.len(), kept = records.len(), "yesterday collected");
        records
    }

    /// Resolve both paths for one station
    pub async fn station(&self, station: &StationRef) -> StationResolution {
        let today = self.today(station).await;
        self.pacer.pause(self.settings.attempt_delay).await;
        let yesterday = self.yesterday(station).await;

        StationResolution {
            station: station.clone(),
            today,
            yesterday,
        }
    }
}
