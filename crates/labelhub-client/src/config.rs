//! Configuration management for the LabelHub client
//!
//! Layering, lowest to highest precedence:
//! 1. built-in defaults
//! 2. TOML file at `$LABELHUB_CONFIG` or `<config_dir>/labelhub/config.toml`
//! 3. `LABELHUB_*` environment variables

use crate::auth::{LocalStorage, NoToken, StaticToken, StoredToken, TokenSource, ACCESS_TOKEN_KEY};
use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Client Configuration Constants
// ============================================================================

/// Default API origin when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Cached data younger than this is served without a request.
pub const DEFAULT_STALE_TIME_SECS: u64 = 30;

/// Unobserved cache entries idle longer than this are evicted.
pub const DEFAULT_GC_TIME_SECS: u64 = 300;

/// Polling period for training-session detail.
pub const DEFAULT_TRAINING_POLL_INTERVAL_MS: u64 = 3000;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API origin, e.g. `https://api.labelhub.example`
    pub api_url: String,

    /// Token store file; defaults to `<data_dir>/labelhub/storage.json`
    pub token_store: Option<PathBuf>,

    /// Key the bearer token is stored under
    pub token_key: String,

    pub stale_time_secs: u64,

    pub gc_time_secs: u64,

    pub training_poll_interval_ms: u64,

    /// Optional bound on each request; unset means requests may wait indefinitely
    pub request_timeout_secs: Option<u64>,

    /// Token from `LABELHUB_TOKEN`, takes precedence over the token store
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_store: None,
            token_key: ACCESS_TOKEN_KEY.to_string(),
            stale_time_secs: DEFAULT_STALE_TIME_SECS,
            gc_time_secs: DEFAULT_GC_TIME_SECS,
            training_poll_interval_ms: DEFAULT_TRAINING_POLL_INTERVAL_MS,
            request_timeout_secs: None,
            token: None,
        }
    }
}

impl Config {
    /// Load defaults, then the config file if present, then the environment
    pub fn load() -> Result<Self> {
        let config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        config.merge_env()
    }

    /// `$LABELHUB_CONFIG`, else `<config_dir>/labelhub/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("LABELHUB_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("labelhub").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        debug!(path = %path.display(), "Loaded config file");
        config.validate()
    }

    /// Override fields with whichever `LABELHUB_*` variables are set
    pub fn merge_env(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var("LABELHUB_API_URL") {
            self.api_url = url;
        }
        if let Ok(path) = std::env::var("LABELHUB_TOKEN_STORE") {
            self.token_store = Some(PathBuf::from(path));
        }
        if let Ok(token) = std::env::var("LABELHUB_TOKEN") {
            self.token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(secs) = env_number("LABELHUB_STALE_TIME_SECS")? {
            self.stale_time_secs = secs;
        }
        if let Some(secs) = env_number("LABELHUB_REQUEST_TIMEOUT_SECS")? {
            self.request_timeout_secs = Some(secs);
        }
        if let Some(ms) = env_number("LABELHUB_TRAINING_POLL_INTERVAL_MS")? {
            self.training_poll_interval_ms = ms;
        }
        self.validate()
    }

    /// Reject settings that cannot drive a timer
    fn validate(self) -> Result<Self> {
        if self.training_poll_interval_ms == 0 {
            return Err(ClientError::config("training_poll_interval_ms must be greater than 0"));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ClientError::config("request_timeout_secs must be greater than 0"));
        }
        Ok(self)
    }

    /// Root origin every request path is appended to
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_secs(self.gc_time_secs)
    }

    pub fn training_poll_interval(&self) -> Duration {
        Duration::from_millis(self.training_poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn token_store_path(&self) -> Option<PathBuf> {
        self.token_store.clone().or_else(LocalStorage::default_path)
    }

    /// Token accessor to inject into the API client
    pub fn token_source(&self) -> Arc<dyn TokenSource> {
        if let Some(ref token) = self.token {
            return Arc::new(StaticToken::new(token.clone()));
        }

        match self.token_store_path() {
            Some(path) => Arc::new(StoredToken::new(LocalStorage::new(path), self.token_key.clone())),
            None => Arc::new(NoToken),
        }
    }
}

fn env_number(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ClientError::config(format!("{} must be a whole number, got '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}
