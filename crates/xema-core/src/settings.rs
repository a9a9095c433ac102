//! Resolver tuning

use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::report::RunSettings;

/// Constants driving the backward search and the yesterday fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Adapter calls allowed for the today path
    pub max_attempts: u32,
    /// Distance between two consecutive anchors
    pub step: Duration,
    /// Typical delay before the source publishes a period
    pub publication_lag: Duration,
    /// Maximum yesterday records kept per station
    pub yesterday_cap: usize,
    /// Pause between two today attempts
    pub attempt_delay: StdDuration,
    /// Pause a worker takes between two stations
    pub request_delay: StdDuration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            step: Duration::minutes(30),
            publication_lag: Duration::minutes(20),
            yesterday_cap: 4,
            attempt_delay: StdDuration::from_millis(500),
            request_delay: StdDuration::from_secs(1),
        }
    }
}

impl ResolverSettings {
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            max_attempts: self.max_attempts,
            step_minutes: self.step.num_minutes(),
            publication_lag_minutes: self.publication_lag.num_minutes(),
            yesterday_cap: self.yesterday_cap,
        }
    }
}
