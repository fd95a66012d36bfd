//! Bearer token lookup
//!
//! Token acquisition happens elsewhere; the web login flow writes the store.
//! This layer only reads: the
//! [`TokenSource`] injected into [`crate::api::ApiClient`] is consulted
//! synchronously right before every request.

use crate::error::{ClientError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key the access token is stored under
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Read-only source of the current bearer token
pub trait TokenSource: Send + Sync {
    /// Current token, or `None` to send the request unauthenticated
    fn token(&self) -> Option<String>;
}

/// Never authenticates
#[derive(Debug, Default, Clone, Copy)]
pub struct NoToken;

impl TokenSource for NoToken {
    fn token(&self) -> Option<String> {
        None
    }
}

/// Fixed token, e.g. from `LABELHUB_TOKEN` or a test
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Persistent key-value storage backed by a JSON object file
///
/// The file is re-read on every lookup so a token written by another process
/// is picked up by the next request.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/labelhub/storage.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("labelhub").join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a string value; a missing file or key is `Ok(None)`
    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let items: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| {
                ClientError::token_store(format!("{} is not a JSON object: {}", self.path.display(), e))
            })?;

        Ok(match items.get(key) {
            Some(serde_json::Value::String(value)) if !value.is_empty() => Some(value.clone()),
            _ => None,
        })
    }
}

/// Token read from [`LocalStorage`] under a fixed key
#[derive(Debug, Clone)]
pub struct StoredToken {
    storage: LocalStorage,
    key: String,
}

impl StoredToken {
    pub fn new(storage: LocalStorage, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }
}

impl TokenSource for StoredToken {
    fn token(&self) -> Option<String> {
        match self.storage.get_item(&self.key) {
            Ok(token) => {
                if token.is_none() {
                    debug!(key = %self.key, path = %self.storage.path().display(), "No stored token");
                }
                token
            },
            Err(e) => {
                warn!(error = %e, "Token store unreadable, sending request without credentials");
                None
            },
        }
    }
}
