//! Time-relative flag defaults.
//!
//! Captured once at startup so every handler in a run agrees on "now".

use chrono::{DateTime, Duration, Utc};
use hzn_data::liquidations::TimeWindow;

const DAY_SECS: i64 = 86_400;

/// Defaults derived from a single clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaults {
    now: DateTime<Utc>,
}

impl Defaults {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Unix seconds 24 hours before now.
    pub fn day_ago(&self) -> i64 {
        (self.now - Duration::hours(24)).timestamp()
    }

    /// Deadline range for flagged accounts: 27 days back to 3 days ahead.
    pub fn flagged_window(&self) -> TimeWindow {
        let now = self.now.timestamp();
        TimeWindow::new(now - 27 * DAY_SECS, now + 3 * DAY_SECS)
    }

    /// The last 30 days up to now.
    pub fn recent_window(&self) -> TimeWindow {
        let now = self.now.timestamp();
        TimeWindow::new(now - 30 * DAY_SECS, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> Defaults {
        Defaults::at(Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_day_ago() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        assert_eq!(fixed().day_ago(), expected.timestamp());
    }

    #[test]
    fn test_liquidation_windows() {
        let d = fixed();
        let now = d.now().timestamp();

        let flagged = d.flagged_window();
        assert_eq!(flagged.min, Some(now - 27 * 86_400));
        assert_eq!(flagged.max, Some(now + 3 * 86_400));

        let recent = d.recent_window();
        assert_eq!(recent.min, Some(now - 30 * 86_400));
        assert_eq!(recent.max, Some(now));
    }
}
