//! Anchor instants for the two resolution paths

use chrono::{DateTime, Duration, NaiveTime, Utc};
use xema_core::local_date;

/// First instant queried by the today path
///
/// `now - lag`, floored to a step boundary. When the floored instant is still
/// less than one step before `now`, the source cannot have published it yet
/// and the anchor moves back one more step.
pub fn initial_anchor(now: DateTime<Utc>, lag: Duration, step: Duration) -> DateTime<Utc> {
    let shifted = now - lag;
    let step_secs = step.num_seconds();
    if step_secs <= 0 {
        return shifted;
    }

    let secs = shifted.timestamp();
    let floored = DateTime::from_timestamp(secs - secs.rem_euclid(step_secs), 0).unwrap_or(shifted);
    if now - floored < step {
        floored - step
    } else {
        floored
    }
}

/// Instant queried by the yesterday path: the previous local day at 00:00 UTC
pub fn yesterday_anchor(now: DateTime<Utc>) -> DateTime<Utc> {
    let yesterday = local_date(now) - Duration::days(1);
    yesterday.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, h, m, 0).unwrap()
    }

    #[test]
    fn test_initial_anchor_with_lag() {
        let lag = Duration::minutes(20);
        let step = Duration::minutes(30);
        assert_eq!(initial_anchor(utc(31, 7, 0), lag, step), utc(31, 6, 30));
        assert_eq!(initial_anchor(utc(31, 7, 19), lag, step), utc(31, 6, 30));
        assert_eq!(initial_anchor(utc(31, 7, 29), lag, step), utc(31, 6, 30));
        assert_eq!(initial_anchor(utc(31, 7, 50), lag, step), utc(31, 7, 0));
    }

    #[test]
    fn test_initial_anchor_steps_back_when_too_recent() {
        let step = Duration::minutes(30);
        assert_eq!(initial_anchor(utc(31, 7, 10), Duration::zero(), step), utc(31, 6, 30));
        assert_eq!(initial_anchor(utc(31, 7, 30), Duration::zero(), step), utc(31, 7, 0));
    }

    #[test]
    fn test_initial_anchor_crosses_midnight() {
        let anchor = initial_anchor(utc(31, 0, 10), Duration::minutes(20), Duration::minutes(30));
        assert_eq!(anchor, utc(30, 23, 30));
    }

    #[test]
    fn test_yesterday_anchor_uses_local_date() {
        assert_eq!(yesterday_anchor(utc(31, 7, 0)), utc(30, 0, 0));
        // 23:30 UTC is already the next local day in winter
        assert_eq!(yesterday_anchor(utc(30, 23, 30)), utc(30, 0, 0));
    }
}
