//! Learner analytics for the dashboard
//!
//! Turns one user's raw records into the derived metrics, chart series and
//! insight lines shown on the analytics page. Everything here is a pure
//! function of the records, the selected range and `now`; fetching lives in
//! [`crate::source`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::levels::LevelCurve;
use crate::models::UserRecords;

pub mod achievements;
pub mod activity;
pub mod courses;
pub mod insights;
pub mod mastery;
pub mod metrics;
pub mod range;
pub mod sessions;

#[cfg(test)]
mod tests;

pub use achievements::{recent_achievements, RecentAchievement};
pub use activity::{compute_activity, compute_heatmap, DailyActivity, HeatmapDay};
pub use courses::{compute_course_progress, CourseSlice};
pub use insights::{generate_insights, InsightContext, InsightRule, INSIGHT_RULES};
pub use mastery::{categorize, compute_subject_mastery, SubjectMastery};
pub use metrics::{FocusScore, Stats};
pub use range::TimeRange;
pub use sessions::{compute_top_topics, compute_weekly_sessions, TopicCount, WeeklySessionStats};

/// Complete analytics payload for one user and range
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub stats: Stats,
    pub activity_data: Vec<DailyActivity>,
    pub course_progress_data: Vec<CourseSlice>,
    pub subject_mastery_data: Vec<SubjectMastery>,
    pub streak_heatmap: Vec<HeatmapDay>,
    pub session_stats: Vec<WeeklySessionStats>,
    pub top_topics: Vec<TopicCount>,
    pub ai_insights: Vec<String>,
    pub recent_achievements: Vec<RecentAchievement>,
}

impl AnalyticsReport {
    /// Compute the report from already-fetched records (sync function)
    ///
    /// Scalars first, then the day/week buckets, then the composite pieces
    /// (mastery, insights) that read from both.
    pub fn compute(
        records: &UserRecords,
        range: TimeRange,
        now: DateTime<Utc>,
        curve: &dyn LevelCurve,
    ) -> Self {
        let stats = Stats::compute(records, curve);

        let activity_data = compute_activity(&records.sessions, &records.events, range, now);
        let streak_heatmap = compute_heatmap(&records.sessions, &records.events, now);
        let session_stats = compute_weekly_sessions(&records.sessions);
        let top_topics = compute_top_topics(&records.sessions);

        let course_progress_data = compute_course_progress(&records.courses);
        let subject_mastery_data = compute_subject_mastery(&records.sessions, &records.courses);

        let ctx = InsightContext {
            current_streak: stats.current_streak,
            best_day: InsightContext::best_day(&activity_data),
            recent_rating: InsightContext::recent_rating(&records.sessions),
            top_topic: top_topics.first().cloned(),
            level: stats.level,
            level_title: stats.level_title.clone(),
            total_xp: stats.total_xp,
            focus_score: stats.focus_score,
            total_cards: stats.total_cards,
        };
        let ai_insights = generate_insights(&ctx);

        tracing::debug!(
            range = %range,
            sessions = records.sessions.len(),
            events = records.events.len(),
            focus_score = stats.focus_score,
            insights = ai_insights.len(),
            "Analytics computed"
        );

        Self {
            stats,
            activity_data,
            course_progress_data,
            subject_mastery_data,
            streak_heatmap,
            session_stats,
            top_topics,
            ai_insights,
            recent_achievements: recent_achievements(&records.achievements),
        }
    }
}
