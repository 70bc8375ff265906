//! Configuration loading
//!
//! Configuration is read from `~/.config/studyboard/config.toml` unless a
//! path is given explicitly. Every section is optional; a missing file yields
//! the defaults. Secrets can come from the environment instead of the file:
//!
//! - `STUDYBOARD_API_KEY` overrides `backend.api_key`
//! - `STUDYBOARD_BACKEND_URL` overrides `backend.url`

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "STUDYBOARD_API_KEY";
pub const BACKEND_URL_ENV: &str = "STUDYBOARD_BACKEND_URL";

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3333
}

/// Which record store to read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Postgrest,
    Sqlite,
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Postgrest => "postgrest",
            BackendKind::Sqlite => "sqlite",
            BackendKind::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Project URL for the REST backend (e.g. `https://project.supabase.co`)
    #[serde(default)]
    pub url: Option<String>,

    /// Service key for the REST backend (can also use env var)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Database file for the SQLite backend
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,

    /// Per-request timeout for the REST backend
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            url: None,
            api_key: None,
            sqlite_path: default_sqlite_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("studyboard.db")
}

fn default_timeout_secs() -> u64 {
    15
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// `~/.config/studyboard/config.toml`, when a config dir exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("studyboard").join("config.toml"))
    }

    /// Load from `path` (or the default path), then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => {
                tracing::debug!("No config directory, using defaults");
                return Ok(Self::with_env(Self::default()));
            }
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::with_env(Self::default()));
        }

        let content = std::fs::read_to_string(&path).map_err(|source| CoreError::FileRead {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&content, &path)?;

        tracing::debug!(path = %path.display(), backend = %config.backend.kind, "Config loaded");
        Ok(Self::with_env(config))
    }

    /// Parse TOML content; `path` only labels errors
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            message: source.message().to_string(),
            source,
        })
    }

    fn with_env(mut config: Self) -> Self {
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply secret overrides from `lookup` (the process env in production)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.backend.api_key = Some(key);
        }
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.is_empty()) {
            self.backend.url = Some(url);
        }
    }

    /// Check that the selected backend has what it needs
    pub fn validate(&self) -> Result<()> {
        if self.backend.kind == BackendKind::Postgrest {
            if self.backend.url.as_deref().is_none_or(str::is_empty) {
                return Err(CoreError::InvalidConfig {
                    message: format!("backend.url is required (or set {BACKEND_URL_ENV})"),
                });
            }
            if self.backend.api_key.as_deref().is_none_or(str::is_empty) {
                return Err(CoreError::InvalidConfig {
                    message: format!("backend.api_key is required (or set {API_KEY_ENV})"),
                });
            }
        }
        if self.backend.timeout_secs == 0 {
            return Err(CoreError::InvalidConfig {
                message: "backend.timeout_secs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Listener address from `[server]`
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| CoreError::InvalidConfig {
                message: format!(
                    "invalid server address {}:{}: {}",
                    self.server.host, self.server.port, e
                ),
            })
    }
}
