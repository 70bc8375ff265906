//! In-process record store
//!
//! Backs `serve --demo`, the benches and most tests. Records live in a
//! `DashMap` keyed by user so concurrent reads never contend on one lock.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use super::{tables, IdentityProvider, StudySource};
use crate::error::SourceError;
use crate::models::{
    AchievementDefinition, AchievementUnlock, AnalyticsEvent, Assignment, Course, CourseStatus,
    FlashcardSet, Profile, Streak, StudyResource, TutoringSession, UserId, UserRecords,
};

/// Token accepted by the seeded demo store
pub const DEMO_TOKEN: &str = "demo-token";
/// User owning the seeded demo records
pub const DEMO_USER: &str = "demo-user";

/// Fixture-backed [`StudySource`] and [`IdentityProvider`]
#[derive(Default)]
pub struct MemorySource {
    users: DashMap<UserId, UserRecords>,
    tokens: DashMap<String, UserId>,
    /// Table name -> forced failure message
    failures: DashMap<&'static str, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every record held for `user`
    pub fn insert_records(&self, user: UserId, records: UserRecords) {
        self.users.insert(user, records);
    }

    pub fn insert_token(&self, token: impl Into<String>, user: UserId) {
        self.tokens.insert(token.into(), user);
    }

    /// Make every read of `table` fail with `message`
    pub fn fail_table(&self, table: &'static str, message: impl Into<String>) {
        self.failures.insert(table, message.into());
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Store seeded with one active learner, reachable with [`DEMO_TOKEN`]
    pub fn demo(now: DateTime<Utc>) -> Self {
        let source = Self::new();
        let user = UserId::from(DEMO_USER);
        source.insert_records(user.clone(), demo_records(now));
        source.insert_token(DEMO_TOKEN, user);
        source
    }

    fn check(&self, table: &'static str) -> Result<(), SourceError> {
        match self.failures.get(table) {
            Some(message) => Err(SourceError::Status {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Run `f` against the user's records, or return the empty value
    fn read<T: Default>(
        &self,
        table: &'static str,
        user: &UserId,
        f: impl FnOnce(&UserRecords) -> T,
    ) -> Result<T, SourceError> {
        self.check(table)?;
        Ok(self.users.get(user).map(|r| f(r.value())).unwrap_or_default())
    }
}

#[async_trait]
impl StudySource for MemorySource {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn profile(&self, user: &UserId) -> Result<Option<Profile>, SourceError> {
        self.read(tables::PROFILES, user, |r| r.profile.clone())
    }

    async fn streak(&self, user: &UserId) -> Result<Option<Streak>, SourceError> {
        self.read(tables::STREAKS, user, |r| r.streak)
    }

    async fn achievements(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<AchievementUnlock>, SourceError> {
        self.read(tables::USER_ACHIEVEMENTS, user, |r| {
            let mut unlocks = r.achievements.clone();
            unlocks.sort_by(|a, b| b.unlocked_at.cmp(&a.unlocked_at));
            unlocks.truncate(limit);
            unlocks
        })
    }

    async fn courses(&self, user: &UserId) -> Result<Vec<Course>, SourceError> {
        self.read(tables::COURSES, user, |r| r.courses.clone())
    }

    async fn sessions(&self, user: &UserId) -> Result<Vec<TutoringSession>, SourceError> {
        self.read(tables::SESSIONS, user, |r| {
            let mut sessions = r.sessions.clone();
            sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            sessions
        })
    }

    async fn flashcard_sets(&self, user: &UserId) -> Result<Vec<FlashcardSet>, SourceError> {
        self.read(tables::FLASHCARD_SETS, user, |r| r.flashcard_sets.clone())
    }

    async fn resources(&self, user: &UserId) -> Result<Vec<StudyResource>, SourceError> {
        self.read(tables::RESOURCES, user, |r| r.resources.clone())
    }

    async fn assignments(&self, user: &UserId) -> Result<Vec<Assignment>, SourceError> {
        self.read(tables::ASSIGNMENTS, user, |r| r.assignments.clone())
    }

    async fn events(
        &self,
        user: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<AnalyticsEvent>, SourceError> {
        self.read(tables::EVENTS, user, |r| {
            r.events
                .iter()
                .filter(|e| e.created_at >= since)
                .cloned()
                .collect()
        })
    }
}

#[async_trait]
impl IdentityProvider for MemorySource {
    async fn resolve_user(&self, token: &str) -> Result<Option<UserId>, SourceError> {
        self.check(tables::API_TOKENS)?;
        Ok(self.tokens.get(token).map(|u| u.value().clone()))
    }
}

const DEMO_TOPICS: &[(&str, &str)] = &[
    ("Linear equations", "math"),
    ("Rust ownership and borrowing", "coding"),
    ("Photosynthesis", "science"),
    ("The French Revolution", "history"),
    ("Spanish past tense", "language"),
    ("Derivatives and limits", "math"),
    ("Marketing funnels", "business"),
];

/// Three weeks of plausible study history ending at `now`
pub fn demo_records(now: DateTime<Utc>) -> UserRecords {
    let sessions: Vec<TutoringSession> = (0..18i64)
        .map(|i| {
            let (topic, kind) = DEMO_TOPICS[i as usize % DEMO_TOPICS.len()];
            let created_at = now - Duration::hours(i * 27 + 2);
            let duration_seconds = 900 + (i % 5) * 420;
            TutoringSession {
                id: format!("demo-session-{i}"),
                topic: topic.to_string(),
                session_type: Some(kind.to_string()),
                duration_seconds,
                quality_rating: (i % 4 != 3).then(|| 3.0 + (i % 3) as f64),
                xp_earned: 20 + (i % 4) * 10,
                feedback: None,
                created_at,
                ended_at: Some(created_at + Duration::seconds(duration_seconds)),
            }
        })
        .collect();

    let courses = [
        ("Algebra I", CourseStatus::Completed),
        ("Intro to Python programming", CourseStatus::Ready),
        ("World History", CourseStatus::Processing),
        ("Biology basics", CourseStatus::Other("draft".to_string())),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (title, status))| Course {
        id: format!("demo-course-{i}"),
        title: title.to_string(),
        status,
        course_type: Some("pdf".to_string()),
        created_at: now - Duration::days(30 - i as i64 * 5),
    })
    .collect();

    let flashcard_sets = (0..3)
        .map(|i| FlashcardSet {
            id: format!("demo-set-{i}"),
            title: format!("Review deck {}", i + 1),
            cards: (0..12)
                .map(|n| serde_json::json!({ "front": format!("Q{n}"), "back": format!("A{n}") }))
                .collect(),
            created_at: now - Duration::days(i * 4),
        })
        .collect();

    let resources = (0..5)
        .map(|i| StudyResource {
            id: format!("demo-resource-{i}"),
            title: format!("Study notes {}", i + 1),
            resource_type: Some("notes".to_string()),
            ai_generated: i % 2 == 0,
            created_at: now - Duration::days(i * 3),
        })
        .collect();

    let assignments = (0..6)
        .map(|i| Assignment {
            id: format!("demo-assignment-{i}"),
            status: if i < 4 { "completed" } else { "pending" }.to_string(),
            due_date: Some(now + Duration::days(i - 3)),
        })
        .collect();

    let events = (0..25)
        .map(|i| AnalyticsEvent {
            event_type: "flashcard_review".to_string(),
            course_id: None,
            event_data: serde_json::Value::Null,
            created_at: now - Duration::hours(i * 19 + 1),
        })
        .collect();

    let achievements = [
        ("First Steps", "Complete your first tutoring session", "👣", 25),
        ("Week Warrior", "Study seven days in a row", "⚔️", 100),
        ("Card Shark", "Create 30 flashcards", "🃏", 50),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (title, description, icon, xp))| AchievementUnlock {
        unlocked_at: now - Duration::days(i as i64 * 6 + 1),
        achievement: Some(AchievementDefinition {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            icon: Some(icon.to_string()),
            xp_reward: Some(xp),
        }),
    })
    .collect();

    UserRecords {
        profile: Some(Profile {
            id: DEMO_USER.to_string(),
            total_xp: 2_750,
            display_name: Some("Demo Learner".to_string()),
        }),
        streak: Some(Streak {
            current_streak: 8,
            longest_streak: 14,
        }),
        achievements,
        courses,
        sessions,
        flashcard_sets,
        resources,
        assignments,
        events,
    }
}
