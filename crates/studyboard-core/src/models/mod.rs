//! Data models for studyboard
//!
//! Rows arrive already filtered to one user. Every model is read-only here.

pub mod learning;
pub mod user;

pub use learning::{
    AnalyticsEvent, Assignment, Course, CourseStatus, FlashcardSet, StudyResource,
    TutoringSession,
};
pub use user::{AchievementDefinition, AchievementUnlock, Profile, Streak, UserId};

use serde::{Deserialize, Deserializer};

/// Deserialize an explicit `null` as the type's default
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Every record set the analytics pipeline reads for one user
///
/// `sessions` is ordered newest first and `achievements` holds the most
/// recent unlocks, newest first.
#[derive(Debug, Clone, Default)]
pub struct UserRecords {
    pub profile: Option<Profile>,
    pub streak: Option<Streak>,
    pub achievements: Vec<AchievementUnlock>,
    pub courses: Vec<Course>,
    pub sessions: Vec<TutoringSession>,
    pub flashcard_sets: Vec<FlashcardSet>,
    pub resources: Vec<StudyResource>,
    pub assignments: Vec<Assignment>,
    pub events: Vec<AnalyticsEvent>,
}

impl UserRecords {
    pub fn total_xp(&self) -> i64 {
        self.profile.as_ref().map_or(0, |p| p.total_xp.max(0))
    }

    pub fn current_streak(&self) -> i64 {
        self.streak.map_or(0, |s| s.current_streak.max(0))
    }

    pub fn longest_streak(&self) -> i64 {
        self.streak.map_or(0, |s| s.longest_streak.max(0))
    }

    pub fn total_cards(&self) -> usize {
        self.flashcard_sets.iter().map(FlashcardSet::card_count).sum()
    }
}
