//! studyboard-core - Core library for studyboard
//!
//! Provides the learner record models, the XP/level curve, the analytics
//! pipeline behind the dashboard, and the data sources it reads from.

pub mod analytics;
pub mod config;
pub mod error;
pub mod levels;
pub mod models;
pub mod service;
pub mod source;

pub use analytics::{AnalyticsReport, TimeRange};
pub use config::{BackendKind, Config};
pub use error::{CoreError, Result, SourceError};
pub use levels::{LevelCurve, QuadraticCurve, XpProgress};
pub use models::{UserId, UserRecords};
pub use service::AnalyticsService;
pub use source::{
    fetch_user_records, IdentityProvider, MemorySource, PostgrestSource, SqliteSource, StudySource,
};
