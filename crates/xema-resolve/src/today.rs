//! Today path as an explicit state machine
//!
//! [`TodaySearch::advance`] is pure: the caller fetches rows for the current
//! anchor and feeds them back in. Fetching, pacing and clocks live in
//! [`crate::Resolver`].

use chrono::{DateTime, Utc};
use xema_core::{validate_row, ObservationWindow, RawRow, ResolverSettings, StationRef, ValidatedRecord};

use crate::anchor::initial_anchor;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    /// `attempt` is 1-based and names the fetch about to happen at `anchor`
    Searching { attempt: u32, anchor: DateTime<Utc> },
    Found {
        attempt: u32,
        anchor: DateTime<Utc>,
        record: ValidatedRecord,
    },
    Exhausted { attempts: u32 },
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchState::Searching { .. })
    }
}

/// Backward search for one station
#[derive(Debug, Clone)]
pub struct TodaySearch<'a> {
    station: &'a StationRef,
    settings: &'a ResolverSettings,
}

impl<'a> TodaySearch<'a> {
    pub fn new(station: &'a StationRef, settings: &'a ResolverSettings) -> Self {
        Self { station, settings }
    }

    pub fn start(&self, now: DateTime<Utc>) -> SearchState {
        if self.settings.max_attempts == 0 {
            return SearchState::Exhausted { attempts: 0 };
        }
        SearchState::Searching {
            attempt: 1,
            anchor: initial_anchor(now, self.settings.publication_lag, self.settings.step),
        }
    }

    pub fn window(&self, anchor: DateTime<Utc>) -> ObservationWindow {
        ObservationWindow::new(self.station.code.as_str(), anchor)
    }

    /// Feed the rows fetched at the current anchor
    ///
    /// The first valid row wins. Without one, the search steps back by one
    /// step, or stops once `max_attempts` fetches have been made. Terminal
    /// states are returned unchanged.
    pub fn advance(
        &self,
        state: SearchState,
        rows: &[RawRow],
        source_url: Option<String>,
        extracted_at: DateTime<Utc>,
    ) -> SearchState {
        let SearchState::Searching { attempt, anchor } = state else {
            return state;
        };

        let window = self.window(anchor);
        let found = rows.iter().find_map(|row| {
            validate_row(row, self.station, &window, source_url.clone(), extracted_at, false)
        });

        match found {
            Some(record) => SearchState::Found {
                attempt,
                anchor,
                record,
            },
            None if attempt >= self.settings.max_attempts => SearchState::Exhausted { attempts: attempt },
            None => SearchState::Searching {
                attempt: attempt + 1,
                anchor: anchor - self.settings.step,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 31, h, m, 0).unwrap()
    }

    #[test]
    fn test_start() {
        let station = StationRef::new("XJ", "Girona");
        let settings = ResolverSettings::default();
        let search = TodaySearch::new(&station, &settings);

        assert_eq!(
            search.start(utc(7, 0)),
            SearchState::Searching {
                attempt: 1,
                anchor: utc(6, 30)
            }
        );

        let none = ResolverSettings {
            max_attempts: 0,
            ..ResolverSettings::default()
        };
        let search = TodaySearch::new(&station, &none);
        assert_eq!(search.start(utc(7, 0)), SearchState::Exhausted { attempts: 0 });
    }

    #[test]
    fn test_empty_rows_step_back_then_exhaust() {
        let station = StationRef::new("XJ", "Girona");
        let settings = ResolverSettings {
            max_attempts: 2,
            ..ResolverSettings::default()
        };
        let search = TodaySearch::new(&station, &settings);

        let state = search.start(utc(7, 0));
        let state = search.advance(state, &[], None, utc(7, 0));
        assert_eq!(
            state,
            SearchState::Searching {
                attempt: 2,
                anchor: utc(6, 0)
            }
        );

        let state = search.advance(state, &[], None, utc(7, 0));
        assert_eq!(state, SearchState::Exhausted { attempts: 2 });
        assert!(state.is_terminal());

        // terminal states absorb further input
        let rows = [RawRow::new("06:00 - 06:30").reading("TM", "1")];
        assert_eq!(search.advance(state.clone(), &rows, None, utc(7, 0)), state);
    }

    #[test]
    fn test_first_valid_row_wins() {
        let station = StationRef::new("XJ", "Girona");
        let settings = ResolverSettings::default();
        let search = TodaySearch::new(&station, &settings);

        let rows = [
            RawRow::new("06:30 - 07:00").reading("TM", "(s/d)"),
            RawRow::new("06:00 - 06:30").reading("TM", "5,2"),
            RawRow::new("05:30 - 06:00").reading("TM", "4,9"),
        ];
        let state = search.advance(search.start(utc(7, 0)), &rows, None, utc(7, 0));
        let SearchState::Found { attempt, anchor, record } = state else {
            panic!("expected Found, got {state:?}");
        };
        assert_eq!(attempt, 1);
        assert_eq!(anchor, utc(6, 30));
        assert_eq!(record.period_utc, "06:00 - 06:30");
    }
}
