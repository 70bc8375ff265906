//! Scalar metrics: ratings, study time, completion and the focus score

use serde::Serialize;

use crate::levels::{LevelCurve, XpProgress};
use crate::models::{AnalyticsEvent, TutoringSession, UserRecords};

/// Flat engagement credit per analytics event, in minutes
pub const EVENT_MINUTES: i64 = 2;

/// Cap for each focus-score factor
pub const FACTOR_CAP: f64 = 25.0;
/// Streak length that earns the full streak factor
pub const STREAK_TARGET_DAYS: f64 = 7.0;
/// Maximum session rating
pub const MAX_RATING: f64 = 5.0;
/// Session count that earns the full activity factor
pub const SESSION_TARGET: f64 = 10.0;
/// Completion factor when there are no assignments to judge
pub const NEUTRAL_COMPLETION: f64 = 12.5;

/// Round to one decimal place
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Mean quality rating over rated sessions, one decimal, 0 when none are rated
pub fn average_rating(sessions: &[TutoringSession]) -> f64 {
    let ratings: Vec<f64> = sessions.iter().filter_map(|s| s.quality_rating).collect();
    if ratings.is_empty() {
        return 0.0;
    }
    round1(ratings.iter().sum::<f64>() / ratings.len() as f64)
}

/// Session minutes plus the flat per-event credit
pub fn total_study_minutes(sessions: &[TutoringSession], events: &[AnalyticsEvent]) -> i64 {
    let seconds: i64 = sessions.iter().map(|s| s.duration_seconds.max(0)).sum();
    let session_minutes = (seconds as f64 / 60.0).round() as i64;
    session_minutes + events.len() as i64 * EVENT_MINUTES
}

/// Rounded completion percentage, 0 when there are no assignments
pub fn assignment_completion(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as u32
}

/// Heuristic 0-100 composite of streak, rating, completion and activity
///
/// Not a validated measure. The constants are the reproducible contract:
/// streak saturates at 7 days, rating is out of 5, activity saturates at 10
/// sessions and a user without assignments gets a neutral 12.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FocusScore {
    pub streak_factor: f64,
    pub rating_factor: f64,
    pub completion_factor: f64,
    pub activity_factor: f64,
}

impl FocusScore {
    pub fn compute(
        current_streak: i64,
        avg_rating: f64,
        completed_assignments: usize,
        total_assignments: usize,
        total_sessions: usize,
    ) -> Self {
        let streak_factor = (current_streak.max(0) as f64 / STREAK_TARGET_DAYS).min(1.0) * FACTOR_CAP;
        let rating_factor = (avg_rating / MAX_RATING).clamp(0.0, 1.0) * FACTOR_CAP;
        let completion_factor = if total_assignments > 0 {
            (completed_assignments as f64 / total_assignments as f64).min(1.0) * FACTOR_CAP
        } else {
            NEUTRAL_COMPLETION
        };
        let activity_factor = (total_sessions as f64 / SESSION_TARGET).min(1.0) * FACTOR_CAP;

        Self {
            streak_factor,
            rating_factor,
            completion_factor,
            activity_factor,
        }
    }

    /// Sum of the four factors, rounded to the nearest integer
    pub fn score(&self) -> u32 {
        (self.streak_factor + self.rating_factor + self.completion_factor + self.activity_factor)
            .round() as u32
    }
}

/// Headline numbers for the dashboard cards
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub display_name: Option<String>,
    #[serde(rename = "totalXP")]
    pub total_xp: i64,
    pub level: u32,
    pub level_title: String,
    pub xp_progress: XpProgress,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub total_sessions: usize,
    pub total_study_minutes: i64,
    pub avg_session_rating: f64,
    pub total_courses: usize,
    pub completed_courses: usize,
    pub in_progress_courses: usize,
    pub total_flashcard_sets: usize,
    pub total_cards: usize,
    pub total_resources: usize,
    pub ai_generated_resources: usize,
    pub total_assignments: usize,
    pub completed_assignments: usize,
    pub assignment_completion: u32,
    pub total_achievements: usize,
    pub focus_score: u32,
}

impl Stats {
    pub fn compute(records: &UserRecords, curve: &dyn LevelCurve) -> Self {
        let total_xp = records.total_xp();
        let level = curve.level(total_xp);

        let avg_session_rating = average_rating(&records.sessions);
        let completed_assignments = records
            .assignments
            .iter()
            .filter(|a| a.is_completed())
            .count();
        let total_assignments = records.assignments.len();

        let focus = FocusScore::compute(
            records.current_streak(),
            avg_session_rating,
            completed_assignments,
            total_assignments,
            records.sessions.len(),
        );

        Self {
            display_name: records.profile.as_ref().and_then(|p| p.display_name.clone()),
            total_xp,
            level,
            level_title: curve.title(level).to_string(),
            xp_progress: curve.progress_to_next(total_xp),
            current_streak: records.current_streak(),
            longest_streak: records.longest_streak(),
            total_sessions: records.sessions.len(),
            total_study_minutes: total_study_minutes(&records.sessions, &records.events),
            avg_session_rating,
            total_courses: records.courses.len(),
            completed_courses: records
                .courses
                .iter()
                .filter(|c| c.status.is_completed())
                .count(),
            in_progress_courses: records
                .courses
                .iter()
                .filter(|c| c.status.is_in_progress())
                .count(),
            total_flashcard_sets: records.flashcard_sets.len(),
            total_cards: records.total_cards(),
            total_resources: records.resources.len(),
            ai_generated_resources: records.resources.iter().filter(|r| r.ai_generated).count(),
            total_assignments,
            completed_assignments,
            assignment_completion: assignment_completion(completed_assignments, total_assignments),
            total_achievements: records.achievements.len(),
            focus_score: focus.score(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_score_neutral_default() {
        let focus = FocusScore::compute(0, 0.0, 0, 0, 0);
        assert_eq!(focus.completion_factor, 12.5);
        assert_eq!(focus.score(), 13);
    }

    #[test]
    fn test_focus_score_saturates() {
        let focus = FocusScore::compute(30, 5.0, 4, 4, 50);
        assert_eq!(focus.streak_factor, 25.0);
        assert_eq!(focus.rating_factor, 25.0);
        assert_eq!(focus.completion_factor, 25.0);
        assert_eq!(focus.activity_factor, 25.0);
        assert_eq!(focus.score(), 100);
    }

    #[test]
    fn test_focus_score_partial() {
        // 3/7*25 = 10.71, 4/5*25 = 20, 1/2*25 = 12.5, 5/10*25 = 12.5
        let focus = FocusScore::compute(3, 4.0, 1, 2, 5);
        assert_eq!(focus.score(), 56);
    }

    #[test]
    fn test_assignment_completion() {
        assert_eq!(assignment_completion(0, 0), 0);
        assert_eq!(assignment_completion(1, 3), 33);
        assert_eq!(assignment_completion(2, 3), 67);
        assert_eq!(assignment_completion(3, 3), 100);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(4.333), 4.3);
        assert_eq!(round1(4.25), 4.3);
        assert_eq!(round1(0.0), 0.0);
    }
}
