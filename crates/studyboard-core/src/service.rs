//! Request-level entry point: authenticate, fetch, compute
//!
//! The web handler and the `report` command both go through
//! [`AnalyticsService`], so they share one backend and one level curve.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::analytics::{AnalyticsReport, TimeRange};
use crate::config::{BackendKind, Config};
use crate::error::{Result, SourceError};
use crate::levels::{LevelCurve, QuadraticCurve};
use crate::models::UserId;
use crate::source::{
    fetch_user_records, IdentityProvider, MemorySource, PostgrestSource, SqliteSource,
    StudySource,
};

/// Shared handle over a record store, its identity provider and the curve
#[derive(Clone)]
pub struct AnalyticsService {
    source: Arc<dyn StudySource>,
    identity: Arc<dyn IdentityProvider>,
    curve: Arc<dyn LevelCurve>,
}

impl AnalyticsService {
    pub fn new(source: Arc<dyn StudySource>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            source,
            identity,
            curve: Arc::new(QuadraticCurve::default()),
        }
    }

    /// Use one backend for both records and identity
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: StudySource + IdentityProvider + 'static,
    {
        let backend = Arc::new(backend);
        Self::new(backend.clone(), backend)
    }

    pub fn with_curve(mut self, curve: Arc<dyn LevelCurve>) -> Self {
        self.curve = curve;
        self
    }

    /// Build the backend selected in `[backend]`
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let service = match config.backend.kind {
            BackendKind::Postgrest => {
                Self::from_backend(PostgrestSource::from_config(&config.backend)?)
            }
            BackendKind::Sqlite => {
                let path = &config.backend.sqlite_path;
                if !path.exists() {
                    tracing::warn!(path = %path.display(), "SQLite database not found, reads will fail");
                }
                Self::from_backend(SqliteSource::open(path.clone()))
            }
            BackendKind::Memory => Self::from_backend(MemorySource::demo(Utc::now())),
        };

        tracing::info!(backend = service.backend_kind(), "Analytics backend ready");
        Ok(service)
    }

    pub fn backend_kind(&self) -> &'static str {
        self.source.kind()
    }

    /// Resolve a bearer token; `Ok(None)` means unauthenticated
    pub async fn authenticate(&self, token: &str) -> std::result::Result<Option<UserId>, SourceError> {
        self.identity.resolve_user(token).await
    }

    pub async fn report(
        &self,
        user: &UserId,
        range: TimeRange,
    ) -> std::result::Result<AnalyticsReport, SourceError> {
        self.report_at(user, range, Utc::now()).await
    }

    /// Fetch and compute against an explicit `now`
    pub async fn report_at(
        &self,
        user: &UserId,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> std::result::Result<AnalyticsReport, SourceError> {
        let records = fetch_user_records(self.source.as_ref(), user, range, now).await?;
        Ok(AnalyticsReport::compute(
            &records,
            range,
            now,
            self.curve.as_ref(),
        ))
    }
}
