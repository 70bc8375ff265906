//! Reporting window selection

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reporting window selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    Week,
    Month,
    Quarter,
}

impl TimeRange {
    /// Resolve a raw `range` parameter; anything unrecognised falls back to a week
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("quarter") => TimeRange::Quarter,
            Some("month") => TimeRange::Month,
            _ => TimeRange::Week,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            TimeRange::Week => 7,
            TimeRange::Month => 30,
            TimeRange::Quarter => 90,
        }
    }

    /// Instant the event fetch is filtered from (`now - days`)
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }

    /// Calendar days covered by the activity series, oldest first, ending today
    pub fn calendar_days(&self, now: DateTime<Utc>) -> Vec<NaiveDate> {
        trailing_days(now.date_naive(), self.days())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Quarter => "quarter",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `count` contiguous dates ending at `today`, ascending
pub(crate) fn trailing_days(today: NaiveDate, count: i64) -> Vec<NaiveDate> {
    (0..count)
        .rev()
        .map(|offset| today - Duration::days(offset))
        .collect()
}
