//! Web router using Axum

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::{routing::get, Json, Router};
use studyboard_core::{AnalyticsReport, AnalyticsService, TimeRange};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

/// Create the web router
pub fn create_router(service: AnalyticsService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/analytics", get(analytics_handler))
        .route("/api/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// First value of `key`; repeated keys keep the earliest
fn first_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Token from `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

async fn analytics_handler(
    State(service): State<AnalyticsService>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let user = service
        .authenticate(token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let range = TimeRange::parse(first_param(&params, "range"));
    tracing::debug!(user = %user, range = %range, "Serving analytics");

    let report = service.report(&user, range).await?;
    Ok(Json(report))
}

async fn health_handler(State(service): State<AnalyticsService>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "backend": service.backend_kind(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer  abc ")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_first_param_wins() {
        let params = vec![
            ("range".to_string(), "month".to_string()),
            ("range".to_string(), "quarter".to_string()),
        ];
        assert_eq!(first_param(&params, "range"), Some("month"));
        assert_eq!(first_param(&params, "user"), None);
    }
}
