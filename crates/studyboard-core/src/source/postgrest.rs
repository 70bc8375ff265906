//! PostgREST (Supabase-style) record store
//!
//! Every read is a `GET {url}/rest/v1/{table}` filtered to one user. The
//! service key goes out as both the `apikey` header and the bearer token;
//! identity lookups send the caller's own token to `/auth/v1/user` instead.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{tables, IdentityProvider, StudySource};
use crate::config::BackendConfig;
use crate::error::{CoreError, SourceError};
use crate::models::{
    AchievementUnlock, AnalyticsEvent, Assignment, Course, FlashcardSet, Profile, Streak,
    StudyResource, TutoringSession, UserId,
};

const ACHIEVEMENT_SELECT: &str =
    "unlocked_at,achievement:achievements(title,description,icon,xp_reward)";

/// Query string as `(key, value)` pairs
type Query = Vec<(&'static str, String)>;

/// REST client for the hosted record store
pub struct PostgrestSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PostgrestSource {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> crate::Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(CoreError::InvalidConfig {
                message: "backend.url is empty".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key).map_err(|e| CoreError::InvalidConfig {
                message: format!("invalid api_key: {}", e),
            })?,
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| CoreError::InvalidConfig {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// Build from `[backend]`; url and key must be present
    pub fn from_config(config: &BackendConfig) -> crate::Result<Self> {
        let url = config.url.as_deref().unwrap_or_default();
        let key = config.api_key.as_deref().unwrap_or_default();
        Self::new(url, key, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Run one table read and decode the row array
    async fn select<T: DeserializeOwned>(
        &self,
        table: &'static str,
        query: Query,
    ) -> Result<Vec<T>, SourceError> {
        let response = self
            .client
            .get(self.table_url(table))
            .bearer_auth(&self.api_key)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(table, status = status.as_u16(), "Table read failed");
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| SourceError::decode(table, e.to_string()))
    }

    /// Read at most one row
    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &'static str,
        mut query: Query,
    ) -> Result<Option<T>, SourceError> {
        query.push(("limit", "1".to_string()));
        Ok(self.select(table, query).await?.into_iter().next())
    }
}

/// `eq.` filter value
fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// `gte.` filter on an RFC 3339 UTC timestamp
fn gte(ts: DateTime<Utc>) -> String {
    format!("gte.{}", ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn owned_by(user: &UserId, select: &str) -> Query {
    vec![
        ("select", select.to_string()),
        ("user_id", eq(user.as_str())),
    ]
}

/// Map a non-2xx response to `SourceError::Status`
///
/// PostgREST and GoTrue put the human-readable text in `message`, `msg` or
/// `error_description`; anything else passes the raw body through.
fn status_error(status: StatusCode, body: &str) -> SourceError {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(key).and_then(|m| m.as_str()).map(str::to_string))
        });

    let message = from_json.unwrap_or_else(|| body.trim().to_string());
    let message = if message.is_empty() {
        format!("HTTP {}", status)
    } else {
        message
    };

    SourceError::Status {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl StudySource for PostgrestSource {
    fn kind(&self) -> &'static str {
        "postgrest"
    }

    async fn profile(&self, user: &UserId) -> Result<Option<Profile>, SourceError> {
        self.select_one(
            tables::PROFILES,
            vec![
                ("select", "id,total_xp,display_name".to_string()),
                ("id", eq(user.as_str())),
            ],
        )
        .await
    }

    async fn streak(&self, user: &UserId) -> Result<Option<Streak>, SourceError> {
        self.select_one(
            tables::STREAKS,
            owned_by(user, "current_streak,longest_streak"),
        )
        .await
    }

    async fn achievements(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<AchievementUnlock>, SourceError> {
        let mut query = owned_by(user, ACHIEVEMENT_SELECT);
        query.push(("order", "unlocked_at.desc".to_string()));
        query.push(("limit", limit.to_string()));
        self.select(tables::USER_ACHIEVEMENTS, query).await
    }

    async fn courses(&self, user: &UserId) -> Result<Vec<Course>, SourceError> {
        self.select(
            tables::COURSES,
            owned_by(user, "id,title,status,type,created_at"),
        )
        .await
    }

    async fn sessions(&self, user: &UserId) -> Result<Vec<TutoringSession>, SourceError> {
        let mut query = owned_by(
            user,
            "id,topic,session_type,duration_seconds,quality_rating,xp_earned,feedback,created_at,ended_at",
        );
        query.push(("order", "created_at.desc".to_string()));
        self.select(tables::SESSIONS, query).await
    }

    async fn flashcard_sets(&self, user: &UserId) -> Result<Vec<FlashcardSet>, SourceError> {
        self.select(
            tables::FLASHCARD_SETS,
            owned_by(user, "id,title,cards,created_at"),
        )
        .await
    }

    async fn resources(&self, user: &UserId) -> Result<Vec<StudyResource>, SourceError> {
        self.select(
            tables::RESOURCES,
            owned_by(user, "id,title,resource_type,ai_generated,created_at"),
        )
        .await
    }

    async fn assignments(&self, user: &UserId) -> Result<Vec<Assignment>, SourceError> {
        self.select(tables::ASSIGNMENTS, owned_by(user, "id,status,due_date"))
            .await
    }

    async fn events(
        &self,
        user: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<AnalyticsEvent>, SourceError> {
        let mut query = owned_by(user, "event_type,course_id,event_data,created_at");
        query.push(("created_at", gte(since)));
        query.push(("order", "created_at.asc".to_string()));
        self.select(tables::EVENTS, query).await
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

#[async_trait]
impl IdentityProvider for PostgrestSource {
    async fn resolve_user(&self, token: &str) -> Result<Option<UserId>, SourceError> {
        if token.is_empty() {
            return Ok(None);
        }

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::debug!(status = status.as_u16(), "Token rejected by auth service");
            return Ok(None);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let user: AuthUser =
            serde_json::from_str(&body).map_err(|e| SourceError::decode("auth user", e.to_string()))?;
        Ok(Some(UserId::from(user.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filters() {
        assert_eq!(eq("u-1"), "eq.u-1");
        let ts = Utc.with_ymd_and_hms(2026, 10, 9, 14, 30, 0).unwrap();
        assert_eq!(gte(ts), "gte.2026-10-09T14:30:00.000Z");
    }

    #[test]
    fn test_owned_by_scopes_to_user() {
        let query = owned_by(&UserId::from("u-1"), "id,status");
        assert_eq!(
            query,
            vec![
                ("select", "id,status".to_string()),
                ("user_id", "eq.u-1".to_string()),
            ]
        );
    }

    #[test]
    fn test_status_error_prefers_json_message() {
        let err = status_error(
            StatusCode::NOT_FOUND,
            r#"{"code":"42P01","message":"relation \"public.courses\" does not exist"}"#,
        );
        assert_eq!(err.to_string(), "relation \"public.courses\" does not exist");
        assert!(matches!(err, SourceError::Status { status: 404, .. }));
    }

    #[test]
    fn test_status_error_falls_back_to_body() {
        let err = status_error(StatusCode::BAD_GATEWAY, "  upstream timeout \n");
        assert_eq!(err.to_string(), "upstream timeout");

        let err = status_error(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(err.to_string(), "HTTP 503 Service Unavailable");
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let source =
            PostgrestSource::new("https://project.supabase.co/", "key", Duration::from_secs(5))
                .unwrap();
        assert_eq!(source.base_url(), "https://project.supabase.co");
        assert_eq!(
            source.table_url(tables::SESSIONS),
            "https://project.supabase.co/rest/v1/tutoring_sessions"
        );
    }

    #[test]
    fn test_new_rejects_empty_url() {
        let result = PostgrestSource::new("", "key", Duration::from_secs(5));
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_empty_token_resolves_to_nobody() {
        let source =
            PostgrestSource::new("http://127.0.0.1:9", "key", Duration::from_secs(1)).unwrap();
        assert_eq!(source.resolve_user("").await.unwrap(), None);
    }
}
