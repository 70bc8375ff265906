//! Day-bucketed activity: the range-sized daily series and the fixed
//! 90-day heatmap
//!
//! Buckets are keyed by UTC calendar date. Records that fall outside the
//! window simply miss every bucket and are dropped.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;

use super::metrics::EVENT_MINUTES;
use super::range::{trailing_days, TimeRange};
use crate::models::{AnalyticsEvent, TutoringSession};

/// Heatmap length in days, independent of the selected range
pub const HEATMAP_DAYS: i64 = 90;

/// One day of the activity chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    #[serde(skip)]
    pub date: NaiveDate,
    pub name: String,
    pub study_minutes: i64,
    pub sessions: u32,
    pub xp_earned: i64,
}

/// One heatmap cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapDay {
    /// "YYYY-MM-DD"
    pub date: String,
    pub count: u32,
}

/// Short weekday for week views, month/day otherwise
fn day_label(date: NaiveDate, day_count: i64) -> String {
    if day_count <= 7 {
        date.format("%a").to_string()
    } else {
        date.format("%b %-d").to_string()
    }
}

/// Build the daily activity series for the selected range
///
/// One bucket per day in `[today - days + 1, today]`, oldest first.
/// Sessions contribute minutes, a session count and XP; each event adds the
/// flat engagement credit.
pub fn compute_activity(
    sessions: &[TutoringSession],
    events: &[AnalyticsEvent],
    range: TimeRange,
    now: DateTime<Utc>,
) -> Vec<DailyActivity> {
    let day_count = range.days();
    let mut buckets: Vec<DailyActivity> = range
        .calendar_days(now)
        .into_iter()
        .map(|date| DailyActivity {
            date,
            name: day_label(date, day_count),
            study_minutes: 0,
            sessions: 0,
            xp_earned: 0,
        })
        .collect();

    let index: HashMap<NaiveDate, usize> = buckets
        .iter()
        .enumerate()
        .map(|(i, b)| (b.date, i))
        .collect();

    for session in sessions {
        if let Some(&i) = index.get(&session.created_at.date_naive()) {
            let bucket = &mut buckets[i];
            bucket.study_minutes += session.minutes();
            bucket.sessions += 1;
            bucket.xp_earned += session.xp_earned.max(0);
        }
    }

    for event in events {
        if let Some(&i) = index.get(&event.created_at.date_naive()) {
            buckets[i].study_minutes += EVENT_MINUTES;
        }
    }

    buckets
}

/// Build the 90-day activity heatmap ending today
///
/// Every session and every event counts once on its day.
pub fn compute_heatmap(
    sessions: &[TutoringSession],
    events: &[AnalyticsEvent],
    now: DateTime<Utc>,
) -> Vec<HeatmapDay> {
    let days = trailing_days(now.date_naive(), HEATMAP_DAYS);
    let mut counts = vec![0u32; days.len()];
    let index: HashMap<NaiveDate, usize> =
        days.iter().enumerate().map(|(i, d)| (*d, i)).collect();

    let timestamps = sessions
        .iter()
        .map(|s| s.created_at)
        .chain(events.iter().map(|e| e.created_at));

    for ts in timestamps {
        if let Some(&i) = index.get(&ts.date_naive()) {
            counts[i] += 1;
        }
    }

    days.into_iter()
        .zip(counts)
        .map(|(date, count)| HeatmapDay {
            date: date.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}
