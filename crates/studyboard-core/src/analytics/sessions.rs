//! Session-level series: weekly performance and most studied topics

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

use super::metrics::round1;
use crate::models::TutoringSession;

/// Only the newest sessions feed the weekly chart
pub const RECENT_SESSION_LIMIT: usize = 50;
pub const MAX_WEEKS: usize = 8;
pub const MAX_TOPICS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySessionStats {
    /// Week start formatted as "Mon D"
    pub week: String,
    pub sessions: u32,
    pub xp: i64,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: u32,
}

/// Sunday that starts the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

#[derive(Default)]
struct WeekBucket {
    sessions: u32,
    xp: i64,
    ratings: Vec<f64>,
}

/// Weekly performance over the 50 newest sessions
///
/// `sessions` must be ordered newest first. Weeks are sorted by their
/// "Mon D" label as plain strings, so "Dec 28" sorts before "Jan 4" and
/// "Oct 12" before "Oct 5". The last eight weeks in that order are kept.
pub fn compute_weekly_sessions(sessions: &[TutoringSession]) -> Vec<WeeklySessionStats> {
    let mut order: Vec<NaiveDate> = Vec::new();
    let mut weeks: HashMap<NaiveDate, WeekBucket> = HashMap::new();

    for session in sessions.iter().take(RECENT_SESSION_LIMIT) {
        let start = week_start(session.created_at.date_naive());
        let bucket = weeks.entry(start).or_insert_with(|| {
            order.push(start);
            WeekBucket::default()
        });
        bucket.sessions += 1;
        bucket.xp += session.xp_earned.max(0);
        if let Some(rating) = session.quality_rating {
            bucket.ratings.push(rating);
        }
    }

    let mut stats: Vec<WeeklySessionStats> = order
        .into_iter()
        .filter_map(|start| {
            let bucket = weeks.remove(&start)?;
            let avg_rating = if bucket.ratings.is_empty() {
                0.0
            } else {
                round1(bucket.ratings.iter().sum::<f64>() / bucket.ratings.len() as f64)
            };
            Some(WeeklySessionStats {
                week: start.format("%b %-d").to_string(),
                sessions: bucket.sessions,
                xp: bucket.xp,
                avg_rating,
            })
        })
        .collect();

    stats.sort_by(|a, b| a.week.cmp(&b.week));
    let skip = stats.len().saturating_sub(MAX_WEEKS);
    stats.split_off(skip)
}

/// Most frequent raw topic strings, top five
///
/// Topics are counted verbatim, without the category folding used for
/// mastery. Sessions without a topic are ignored.
pub fn compute_top_topics(sessions: &[TutoringSession]) -> Vec<TopicCount> {
    let mut topics: Vec<TopicCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for session in sessions {
        if session.topic.is_empty() {
            continue;
        }
        match index.get(session.topic.as_str()) {
            Some(&i) => topics[i].count += 1,
            None => {
                index.insert(session.topic.as_str(), topics.len());
                topics.push(TopicCount {
                    topic: session.topic.clone(),
                    count: 1,
                });
            }
        }
    }

    topics.sort_by(|a, b| b.count.cmp(&a.count));
    topics.truncate(MAX_TOPICS);
    topics
}
