//! Query window for Cost Explorer requests
//!
//! Cost Explorer keeps revising the most recent days, so the exporter asks for
//! one full day that ended two days ago.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Date format Cost Explorer expects in `TimePeriod`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Lag applied to `now` before picking the end date
const FINALIZATION_LAG_HOURS: i64 = 48;

/// A one-day `[start, end)` interval at day granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl QueryWindow {
    /// Window ending two days before `now`, starting one day earlier
    pub fn ending_before(now: DateTime<Utc>) -> Self {
        let end_at = now - Duration::hours(FINALIZATION_LAG_HOURS);
        let start_at = end_at - Duration::hours(24);
        Self {
            start: start_at.date_naive(),
            end: end_at.date_naive(),
        }
    }

    /// Window for the current wall-clock time
    pub fn current() -> Self {
        Self::ending_before(Utc::now())
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl std::fmt::Display for QueryWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start_str(), self.end_str())
    }
}
