//! Error types for studyboard-core
//!
//! Fetch and identity failures are never recovered here: they abort the
//! whole analytics request and are reported with their original message.
//! Data-shape anomalies (nulls, missing joins) are absorbed by the models
//! with defaults and never show up as errors.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience result alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Failure while talking to a data source or identity provider
#[derive(Error, Debug)]
pub enum SourceError {
    // ===================
    // Transport Errors
    // ===================
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: u16, message: String },

    // ===================
    // Decode Errors
    // ===================
    #[error("Failed to decode {table} rows: {message}")]
    Decode { table: String, message: String },

    // ===================
    // Storage Errors
    // ===================
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Background read failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl SourceError {
    pub fn decode(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            table: table.into(),
            message: message.into(),
        }
    }
}

/// Core error type for studyboard operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // IO Errors
    // ===================
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration in {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        message: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ===================
    // Source Errors
    // ===================
    #[error(transparent)]
    Source(#[from] SourceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_passes_message_through() {
        let err = SourceError::Status {
            status: 503,
            message: "upstream unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "upstream unavailable");

        let core: CoreError = err.into();
        assert_eq!(core.to_string(), "upstream unavailable");
    }

    #[test]
    fn test_decode_error_names_table() {
        let err = SourceError::decode("tutoring_sessions", "missing field `id`");
        assert_eq!(
            err.to_string(),
            "Failed to decode tutoring_sessions rows: missing field `id`"
        );
    }
}
