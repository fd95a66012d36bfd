//! Query and mutation hooks
//!
//! [`Hooks`] binds an [`ApiClient`] to a [`QueryCache`] and hands out one
//! [`Query`] per read operation and one [`Mutation`] per write. Each
//! resource family lives in its own module as an `impl Hooks` block.
//!
//! Queries whose required id is empty or whitespace are disabled: they never
//! reach the network and report `is_loading = false` with no data.

pub mod keys;

mod annotations;
mod api_keys;
mod billing;
mod jobs;
mod models;
mod projects;
mod training;
mod validation;

pub use annotations::AnnotationChange;
pub use jobs::JobChange;

use crate::api::{ApiClient, ApiError};
use crate::cache::{CacheEffects, Mutation, Query, QueryCache, QueryKey, QueryOptions};
use crate::config::{Config, DEFAULT_STALE_TIME_SECS, DEFAULT_TRAINING_POLL_INTERVAL_MS};
use crate::error::Result;
use std::future::Future;
use std::time::Duration;

#[derive(Clone)]
pub struct Hooks {
    client: ApiClient,
    cache: QueryCache,
    stale_time: Duration,
    training_poll_interval: Duration,
}

impl Hooks {
    /// Hooks over a fresh cache with default timings
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            cache: QueryCache::new(),
            stale_time: Duration::from_secs(DEFAULT_STALE_TIME_SECS),
            training_poll_interval: Duration::from_millis(DEFAULT_TRAINING_POLL_INTERVAL_MS),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            client: ApiClient::from_config(config)?,
            cache: QueryCache::with_gc_time(config.gc_time()),
            stale_time: config.stale_time(),
            training_poll_interval: config.training_poll_interval(),
        })
    }

    /// Share an existing cache, e.g. between several hook sets
    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_training_poll_interval(mut self, interval: Duration) -> Self {
        self.training_poll_interval = interval;
        self
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn options(&self) -> QueryOptions {
        QueryOptions::new(self.stale_time)
    }

    /// Query with no required parameters
    fn query<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Query<T>
    where
        T: Send + Sync + 'static,
        F: Fn(ApiClient) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, ApiError>> + Send + 'static,
    {
        let client = self.client.clone();
        Query::new(self.cache.clone(), key, self.options(), move || fetch(client.clone()))
    }

    /// Query that stays disabled until `ids` are all non-blank
    fn query_with<T, F, Fut>(&self, key: QueryKey, ids: &[&str], fetch: F) -> Query<T>
    where
        T: Send + Sync + 'static,
        F: Fn(ApiClient) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, ApiError>> + Send + 'static,
    {
        let enabled = ids.iter().all(|id| !id.trim().is_empty());
        let client = self.client.clone();
        Query::new(
            self.cache.clone(),
            key,
            self.options().enabled(enabled),
            move || fetch(client.clone()),
        )
    }

    fn mutation<P, R, F, Fut, E>(&self, name: &'static str, run: F, effects: E) -> Mutation<P, R>
    where
        P: Clone + Send + 'static,
        R: Send + 'static,
        F: Fn(ApiClient, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<R, ApiError>> + Send + 'static,
        E: Fn(&P, &R) -> CacheEffects + Send + Sync + 'static,
    {
        let client = self.client.clone();
        Mutation::new(
            name,
            self.cache.clone(),
            move |payload| run(client.clone(), payload),
            effects,
        )
    }
}
