//! SQLite record store
//!
//! Schema:
//! - one table per record kind, mirroring the hosted tables, keyed by `user_id`
//! - `achievements` holds definitions; `user_achievements` joins them to users
//! - `api_tokens` maps bearer tokens to users for local deployments
//!
//! Timestamps are RFC 3339 text and JSON columns (`cards`, `event_data`) are
//! text. Each read opens its own read-only connection on the blocking pool, so
//! the nine reads of one request run independently.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};

use super::{IdentityProvider, StudySource};
use crate::error::SourceError;
use crate::models::{
    AchievementDefinition, AchievementUnlock, AnalyticsEvent, Assignment, Course, CourseStatus,
    FlashcardSet, Profile, Streak, StudyResource, TutoringSession, UserId, UserRecords,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    total_xp INTEGER,
    display_name TEXT
);

CREATE TABLE IF NOT EXISTS user_streaks (
    user_id TEXT PRIMARY KEY,
    current_streak INTEGER,
    longest_streak INTEGER
);

CREATE TABLE IF NOT EXISTS achievements (
    id TEXT PRIMARY KEY,
    title TEXT,
    description TEXT,
    icon TEXT,
    xp_reward INTEGER
);

CREATE TABLE IF NOT EXISTS user_achievements (
    user_id TEXT NOT NULL,
    achievement_id TEXT,
    unlocked_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS courses (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT,
    status TEXT,
    type TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tutoring_sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    topic TEXT,
    session_type TEXT,
    duration_seconds INTEGER,
    quality_rating REAL,
    xp_earned INTEGER,
    feedback TEXT,
    created_at TEXT NOT NULL,
    ended_at TEXT
);

CREATE TABLE IF NOT EXISTS flashcard_sets (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT,
    cards TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS study_resources (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT,
    resource_type TEXT,
    ai_generated INTEGER,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assignments (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    status TEXT,
    due_date TEXT
);

CREATE TABLE IF NOT EXISTS analytics_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    event_type TEXT,
    course_id TEXT,
    event_data TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS api_tokens (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_user ON tutoring_sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_events_user ON analytics_events(user_id);
CREATE INDEX IF NOT EXISTS idx_unlocks_user ON user_achievements(user_id);
"#;

/// Local database file holding learner records
pub struct SqliteSource {
    path: PathBuf,
}

impl SqliteSource {
    /// Point at an existing database; nothing is opened until the first read
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the file if needed and make sure every table exists
    pub fn init(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let source = Self::open(path);
        let conn = Connection::open(&source.path)?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = %source.path.display(), "SQLite schema ready");
        Ok(source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a full record set for `user`, plus an optional bearer token
    ///
    /// Used to bootstrap local and demo databases; the analytics path never
    /// writes.
    pub fn seed(
        &self,
        user: &UserId,
        records: &UserRecords,
        token: Option<&str>,
    ) -> Result<(), SourceError> {
        let mut conn = Connection::open(&self.path)?;
        let tx = conn.transaction()?;

        if let Some(p) = &records.profile {
            tx.execute(
                "INSERT OR REPLACE INTO profiles (id, total_xp, display_name) VALUES (?1, ?2, ?3)",
                params![user, p.total_xp, p.display_name],
            )?;
        }
        if let Some(s) = &records.streak {
            tx.execute(
                "INSERT OR REPLACE INTO user_streaks (user_id, current_streak, longest_streak)
                 VALUES (?1, ?2, ?3)",
                params![user, s.current_streak, s.longest_streak],
            )?;
        }
        for (i, unlock) in records.achievements.iter().enumerate() {
            let achievement_id = match &unlock.achievement {
                Some(def) => {
                    let id = format!("{}-achievement-{}", user, i);
                    tx.execute(
                        "INSERT OR REPLACE INTO achievements (id, title, description, icon, xp_reward)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![id, def.title, def.description, def.icon, def.xp_reward],
                    )?;
                    Some(id)
                }
                None => None,
            };
            tx.execute(
                "INSERT INTO user_achievements (user_id, achievement_id, unlocked_at) VALUES (?1, ?2, ?3)",
                params![user, achievement_id, format_ts(unlock.unlocked_at)],
            )?;
        }
        for c in &records.courses {
            tx.execute(
                "INSERT OR REPLACE INTO courses (id, user_id, title, status, type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    c.id,
                    user,
                    c.title,
                    c.status.as_str(),
                    c.course_type,
                    format_ts(c.created_at)
                ],
            )?;
        }
        for s in &records.sessions {
            tx.execute(
                "INSERT OR REPLACE INTO tutoring_sessions (id, user_id, topic, session_type,
                     duration_seconds, quality_rating, xp_earned, feedback, created_at, ended_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    s.id,
                    user,
                    s.topic,
                    s.session_type,
                    s.duration_seconds,
                    s.quality_rating,
                    s.xp_earned,
                    s.feedback,
                    format_ts(s.created_at),
                    s.ended_at.map(format_ts)
                ],
            )?;
        }
        for f in &records.flashcard_sets {
            tx.execute(
                "INSERT OR REPLACE INTO flashcard_sets (id, user_id, title, cards, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    f.id,
                    user,
                    f.title,
                    serde_json::Value::Array(f.cards.clone()).to_string(),
                    format_ts(f.created_at)
                ],
            )?;
        }
        for r in &records.resources {
            tx.execute(
                "INSERT OR REPLACE INTO study_resources (id, user_id, title, resource_type,
                     ai_generated, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    r.id,
                    user,
                    r.title,
                    r.resource_type,
                    r.ai_generated,
                    format_ts(r.created_at)
                ],
            )?;
        }
        for a in &records.assignments {
            tx.execute(
                "INSERT OR REPLACE INTO assignments (id, user_id, status, due_date)
                 VALUES (?1, ?2, ?3, ?4)",
                params![a.id, user, a.status, a.due_date.map(format_ts)],
            )?;
        }
        for e in &records.events {
            tx.execute(
                "INSERT INTO analytics_events (user_id, event_type, course_id, event_data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user,
                    e.event_type,
                    e.course_id,
                    e.event_data.to_string(),
                    format_ts(e.created_at)
                ],
            )?;
        }
        if let Some(token) = token {
            tx.execute(
                "INSERT OR REPLACE INTO api_tokens (token, user_id) VALUES (?1, ?2)",
                params![token, user],
            )?;
        }

        tx.commit()?;
        tracing::debug!(user = %user, sessions = records.sessions.len(), "Seeded SQLite records");
        Ok(())
    }

    /// Run `f` on a fresh read-only connection in the blocking pool
    async fn read<T, F>(&self, f: F) -> Result<T, SourceError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        let rows = tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(
                &path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            f(&conn)
        })
        .await??;
        Ok(rows)
    }

    /// Collect every row of a single-parameter query
    async fn query_all<T, M>(
        &self,
        sql: &'static str,
        user: &UserId,
        map: M,
    ) -> Result<Vec<T>, SourceError>
    where
        M: Fn(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let user = user.clone();
        self.read(move |conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params![user], |row| map(row))?;
            rows.collect()
        })
        .await
    }
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_ts(idx, &raw)
}

fn opt_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|r| parse_ts(idx, &r)).transpose()
}

/// Nullable column read as its default
fn or_default<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: rusqlite::types::FromSql + Default,
{
    Ok(row.get::<_, Option<T>>(idx)?.unwrap_or_default())
}

fn json_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<serde_json::Value> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e)),
        None => Ok(serde_json::Value::Null),
    }
}

fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        title: or_default(row, 1)?,
        status: CourseStatus::from(or_default::<String>(row, 2)?),
        course_type: row.get(3)?,
        created_at: timestamp(row, 4)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<TutoringSession> {
    Ok(TutoringSession {
        id: row.get(0)?,
        topic: or_default(row, 1)?,
        session_type: row.get(2)?,
        duration_seconds: or_default(row, 3)?,
        quality_rating: row.get(4)?,
        xp_earned: or_default(row, 5)?,
        feedback: row.get(6)?,
        created_at: timestamp(row, 7)?,
        ended_at: opt_timestamp(row, 8)?,
    })
}

fn flashcard_set_from_row(row: &Row<'_>) -> rusqlite::Result<FlashcardSet> {
    let cards = match json_column(row, 2)? {
        serde_json::Value::Array(cards) => cards,
        _ => Vec::new(),
    };
    Ok(FlashcardSet {
        id: row.get(0)?,
        title: or_default(row, 1)?,
        cards,
        created_at: timestamp(row, 3)?,
    })
}

fn resource_from_row(row: &Row<'_>) -> rusqlite::Result<StudyResource> {
    Ok(StudyResource {
        id: row.get(0)?,
        title: or_default(row, 1)?,
        resource_type: row.get(2)?,
        ai_generated: or_default(row, 3)?,
        created_at: timestamp(row, 4)?,
    })
}

fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: row.get(0)?,
        status: or_default(row, 1)?,
        due_date: opt_timestamp(row, 2)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<AnalyticsEvent> {
    Ok(AnalyticsEvent {
        event_type: or_default(row, 0)?,
        course_id: row.get(1)?,
        event_data: json_column(row, 2)?,
        created_at: timestamp(row, 3)?,
    })
}

fn unlock_from_row(row: &Row<'_>) -> rusqlite::Result<AchievementUnlock> {
    let definition_id: Option<String> = row.get(1)?;
    let achievement = match definition_id {
        Some(_) => Some(AchievementDefinition {
            title: row.get(2)?,
            description: row.get(3)?,
            icon: row.get(4)?,
            xp_reward: row.get(5)?,
        }),
        None => None,
    };
    Ok(AchievementUnlock {
        unlocked_at: timestamp(row, 0)?,
        achievement,
    })
}

#[async_trait]
impl StudySource for SqliteSource {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    async fn profile(&self, user: &UserId) -> Result<Option<Profile>, SourceError> {
        let user = user.clone();
        self.read(move |conn| {
            conn.query_row(
                "SELECT id, total_xp, display_name FROM profiles WHERE id = ?1",
                params![user],
                |row| {
                    Ok(Profile {
                        id: row.get(0)?,
                        total_xp: or_default(row, 1)?,
                        display_name: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
    }

    async fn streak(&self, user: &UserId) -> Result<Option<Streak>, SourceError> {
        let user = user.clone();
        self.read(move |conn| {
            conn.query_row(
                "SELECT current_streak, longest_streak FROM user_streaks WHERE user_id = ?1",
                params![user],
                |row| {
                    Ok(Streak {
                        current_streak: or_default(row, 0)?,
                        longest_streak: or_default(row, 1)?,
                    })
                },
            )
            .optional()
        })
        .await
    }

    async fn achievements(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<AchievementUnlock>, SourceError> {
        let user = user.clone();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.read(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT ua.unlocked_at, a.id, a.title, a.description, a.icon, a.xp_reward
                 FROM user_achievements ua
                 LEFT JOIN achievements a ON a.id = ua.achievement_id
                 WHERE ua.user_id = ?1
                 ORDER BY julianday(ua.unlocked_at) DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![user, limit], unlock_from_row)?;
            rows.collect()
        })
        .await
    }

    async fn courses(&self, user: &UserId) -> Result<Vec<Course>, SourceError> {
        self.query_all(
            "SELECT id, title, status, type, created_at FROM courses WHERE user_id = ?1",
            user,
            course_from_row,
        )
        .await
    }

    async fn sessions(&self, user: &UserId) -> Result<Vec<TutoringSession>, SourceError> {
        self.query_all(
            "SELECT id, topic, session_type, duration_seconds, quality_rating, xp_earned,
                    feedback, created_at, ended_at
             FROM tutoring_sessions
             WHERE user_id = ?1
             ORDER BY julianday(created_at) DESC",
            user,
            session_from_row,
        )
        .await
    }

    async fn flashcard_sets(&self, user: &UserId) -> Result<Vec<FlashcardSet>, SourceError> {
        self.query_all(
            "SELECT id, title, cards, created_at FROM flashcard_sets WHERE user_id = ?1",
            user,
            flashcard_set_from_row,
        )
        .await
    }

    async fn resources(&self, user: &UserId) -> Result<Vec<StudyResource>, SourceError> {
        self.query_all(
            "SELECT id, title, resource_type, ai_generated, created_at
             FROM study_resources WHERE user_id = ?1",
            user,
            resource_from_row,
        )
        .await
    }

    async fn assignments(&self, user: &UserId) -> Result<Vec<Assignment>, SourceError> {
        self.query_all(
            "SELECT id, status, due_date FROM assignments WHERE user_id = ?1",
            user,
            assignment_from_row,
        )
        .await
    }

    async fn events(
        &self,
        user: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<AnalyticsEvent>, SourceError> {
        let user = user.clone();
        let since = format_ts(since);
        self.read(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT event_type, course_id, event_data, created_at
                 FROM analytics_events
                 WHERE user_id = ?1 AND julianday(created_at) >= julianday(?2)
                 ORDER BY julianday(created_at) ASC",
            )?;
            let rows = stmt.query_map(params![user, since], event_from_row)?;
            rows.collect()
        })
        .await
    }
}

#[async_trait]
impl IdentityProvider for SqliteSource {
    async fn resolve_user(&self, token: &str) -> Result<Option<UserId>, SourceError> {
        let token = token.to_string();
        self.read(move |conn| {
            conn.query_row(
                "SELECT user_id FROM api_tokens WHERE token = ?1",
                params![token],
                |row| row.get::<_, UserId>(0),
            )
            .optional()
        })
        .await
    }
}
