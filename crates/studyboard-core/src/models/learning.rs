//! Learning records: courses, tutoring sessions, flashcards, resources,
//! assignments and raw analytics events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::null_default;

/// Course lifecycle status
///
/// `processing` and `ready` both count as in progress on the dashboard;
/// anything else is treated as not started.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CourseStatus {
    Completed,
    Processing,
    Ready,
    Other(String),
}

impl CourseStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CourseStatus::Completed => "completed",
            CourseStatus::Processing => "processing",
            CourseStatus::Ready => "ready",
            CourseStatus::Other(s) => s,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, CourseStatus::Completed)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, CourseStatus::Processing | CourseStatus::Ready)
    }
}

impl Default for CourseStatus {
    fn default() -> Self {
        CourseStatus::Other(String::new())
    }
}

impl From<String> for CourseStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "completed" => CourseStatus::Completed,
            "processing" => CourseStatus::Processing,
            "ready" => CourseStatus::Ready,
            _ => CourseStatus::Other(s),
        }
    }
}

impl From<CourseStatus> for String {
    fn from(status: CourseStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub status: CourseStatus,
    #[serde(default, rename = "type", alias = "course_type")]
    pub course_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One AI tutoring session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutoringSession {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub topic: String,
    #[serde(default)]
    pub session_type: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub duration_seconds: i64,
    /// 1-5 when the learner rated the session
    #[serde(default)]
    pub quality_rating: Option<f64>,
    #[serde(default, deserialize_with = "null_default")]
    pub xp_earned: i64,
    #[serde(default)]
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl TutoringSession {
    /// Whole minutes studied, rounded to the nearest minute
    pub fn minutes(&self) -> i64 {
        (self.duration_seconds.max(0) as f64 / 60.0).round() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardSet {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub cards: Vec<Value>,
    pub created_at: DateTime<Utc>,
}

impl FlashcardSet {
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyResource {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub ai_generated: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub status: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

/// Timestamped engagement event, only used for coarse activity estimates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    #[serde(default, deserialize_with = "null_default")]
    pub event_type: String,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub event_data: Value,
    pub created_at: DateTime<Utc>,
}
