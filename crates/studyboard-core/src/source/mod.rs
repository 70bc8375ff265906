//! Data sources for learner records
//!
//! A source answers nine independent per-user reads. They are issued
//! together and joined before any analytics runs; the first failure aborts
//! the whole fetch and no partial records are ever returned.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::analytics::TimeRange;
use crate::error::SourceError;
use crate::models::{
    AchievementUnlock, AnalyticsEvent, Assignment, Course, FlashcardSet, Profile, Streak,
    StudyResource, TutoringSession, UserId, UserRecords,
};

pub mod memory;
pub mod postgrest;
pub mod sqlite;

pub use memory::MemorySource;
pub use postgrest::PostgrestSource;
pub use sqlite::SqliteSource;

/// How many unlocks the dashboard shows
pub const RECENT_ACHIEVEMENTS: usize = 6;

/// Table names shared by the relational backends
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const STREAKS: &str = "user_streaks";
    pub const USER_ACHIEVEMENTS: &str = "user_achievements";
    pub const ACHIEVEMENTS: &str = "achievements";
    pub const COURSES: &str = "courses";
    pub const SESSIONS: &str = "tutoring_sessions";
    pub const FLASHCARD_SETS: &str = "flashcard_sets";
    pub const RESOURCES: &str = "study_resources";
    pub const ASSIGNMENTS: &str = "assignments";
    pub const EVENTS: &str = "analytics_events";
    pub const API_TOKENS: &str = "api_tokens";
}

/// Read-only, per-user access to the record store
///
/// Every read is already scoped to `user`.
#[async_trait]
pub trait StudySource: Send + Sync {
    /// Short backend name for health output and logs
    fn kind(&self) -> &'static str;

    async fn profile(&self, user: &UserId) -> Result<Option<Profile>, SourceError>;

    async fn streak(&self, user: &UserId) -> Result<Option<Streak>, SourceError>;

    /// Most recent unlocks first, at most `limit`
    async fn achievements(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<AchievementUnlock>, SourceError>;

    async fn courses(&self, user: &UserId) -> Result<Vec<Course>, SourceError>;

    /// Newest first
    async fn sessions(&self, user: &UserId) -> Result<Vec<TutoringSession>, SourceError>;

    async fn flashcard_sets(&self, user: &UserId) -> Result<Vec<FlashcardSet>, SourceError>;

    async fn resources(&self, user: &UserId) -> Result<Vec<StudyResource>, SourceError>;

    async fn assignments(&self, user: &UserId) -> Result<Vec<Assignment>, SourceError>;

    /// Events created at or after `since`
    async fn events(
        &self,
        user: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<AnalyticsEvent>, SourceError>;
}

/// Resolves a bearer token to the authenticated user
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when the token does not identify anyone
    async fn resolve_user(&self, token: &str) -> Result<Option<UserId>, SourceError>;
}

/// Fetch every record set for `user` concurrently
///
/// The event read is limited to the range window; everything else is
/// unbounded apart from the achievement limit.
pub async fn fetch_user_records(
    source: &dyn StudySource,
    user: &UserId,
    range: TimeRange,
    now: DateTime<Utc>,
) -> Result<UserRecords, SourceError> {
    let since = range.window_start(now);

    let (
        profile,
        streak,
        achievements,
        courses,
        sessions,
        flashcard_sets,
        resources,
        assignments,
        events,
    ) = tokio::try_join!(
        source.profile(user),
        source.streak(user),
        source.achievements(user, RECENT_ACHIEVEMENTS),
        source.courses(user),
        source.sessions(user),
        source.flashcard_sets(user),
        source.resources(user),
        source.assignments(user),
        source.events(user, since),
    )?;

    tracing::debug!(
        user = %user,
        backend = source.kind(),
        sessions = sessions.len(),
        courses = courses.len(),
        events = events.len(),
        "Fetched user records"
    );

    Ok(UserRecords {
        profile,
        streak,
        achievements,
        courses,
        sessions,
        flashcard_sets,
        resources,
        assignments,
        events,
    })
}
