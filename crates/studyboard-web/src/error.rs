//! API error responses
//!
//! Every failure is rendered as `{"error": "<message>"}`. Backend failures
//! keep their original message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use studyboard_core::SourceError;

#[derive(Debug)]
pub enum AppError {
    /// Missing, malformed or unknown bearer token
    Unauthorized,
    /// Fetch or identity backend failure
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Unauthorized => "Unauthorized",
            AppError::Internal(message) => message,
        }
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        tracing::error!(error = %err, "Analytics request failed");
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message() }));
        (self.status(), body).into_response()
    }
}
