//! Query handles
//!
//! A [`Query`] binds a cache key to the fetch function that fills it, plus the
//! options that control when the network is used.

use crate::api::ApiError;
use crate::cache::key::QueryKey;
use crate::cache::observer::QueryObserver;
use crate::cache::store::{CacheSnapshot, QueryCache};
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// A disabled query never touches the network
    pub enabled: bool,
    pub stale_time: Duration,
    /// Observers refetch on this period regardless of staleness
    pub refetch_interval: Option<Duration>,
}

impl QueryOptions {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            enabled: true,
            stale_time,
            refetch_interval: None,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Poll on `interval`; a zero interval disables polling
    pub fn refetch_interval(mut self, interval: Duration) -> Self {
        self.refetch_interval = Some(interval).filter(|period| !period.is_zero());
        self
    }
}

/// What a consumer renders from
pub struct QueryState<T> {
    /// Last successful value; kept while a refetch runs or after a failed one
    pub data: Option<Arc<T>>,
    pub error: Option<ApiError>,
    /// Fetching with nothing to show yet
    pub is_loading: bool,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub updated_at: Option<Instant>,
}

// Manual impls so `T` need not be Clone
impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            is_loading: self.is_loading,
            is_fetching: self.is_fetching,
            is_stale: self.is_stale,
            updated_at: self.updated_at,
        }
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            is_fetching: false,
            is_stale: true,
            updated_at: None,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for QueryState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryState")
            .field("data", &self.data)
            .field("error", &self.error)
            .field("is_loading", &self.is_loading)
            .field("is_fetching", &self.is_fetching)
            .field("is_stale", &self.is_stale)
            .finish()
    }
}

impl<T: Send + Sync + 'static> QueryState<T> {
    fn from_snapshot(snapshot: &CacheSnapshot, stale_time: Duration) -> Self {
        let data = snapshot
            .value
            .clone()
            .and_then(|value| value.downcast::<T>().ok());

        Self {
            is_loading: snapshot.is_fetching && data.is_none(),
            is_fetching: snapshot.is_fetching,
            is_stale: snapshot.is_stale(stale_time),
            error: snapshot.error.clone(),
            updated_at: snapshot.updated_at,
            data,
        }
    }
}

impl<T> QueryState<T> {
    /// The error if the last fetch failed, else whatever data there is
    pub fn into_result(self) -> Result<Option<Arc<T>>, ApiError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.data),
        }
    }
}

/// A cached, de-duplicated read
pub struct Query<T> {
    cache: QueryCache,
    key: QueryKey,
    options: QueryOptions,
    fetcher: Fetcher<T>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            key: self.key.clone(),
            options: self.options,
            fetcher: self.fetcher.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> Query<T> {
    pub fn new<F, Fut>(cache: QueryCache, key: QueryKey, options: QueryOptions, fetcher: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Self {
            cache,
            key,
            options,
            fetcher: Arc::new(move || fetcher().boxed()),
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn is_enabled(&self) -> bool {
        self.options.enabled
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.options.enabled = enabled;
        self
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.options.stale_time = stale_time;
        self
    }

    pub fn refetch_interval(mut self, interval: Duration) -> Self {
        self.options = self.options.refetch_interval(interval);
        self
    }

    /// Current state without any network activity
    pub fn state(&self) -> QueryState<T> {
        self.cache
            .snapshot(&self.key)
            .map(|snapshot| QueryState::from_snapshot(&snapshot, self.options.stale_time))
            .unwrap_or_default()
    }

    /// Read through the staleness window
    pub async fn fetch(&self) -> QueryState<T> {
        if !self.options.enabled {
            debug!(key = %self.key, "Query disabled, skipping fetch");
            return self.state();
        }

        let fetcher = self.fetcher.clone();
        let result = self
            .cache
            .fetch(&self.key, self.options.stale_time, move || fetcher())
            .await;
        self.settled(result)
    }

    /// Fetch regardless of staleness, still sharing any in-flight request
    pub async fn refetch(&self) -> QueryState<T> {
        if !self.options.enabled {
            debug!(key = %self.key, "Query disabled, skipping refetch");
            return self.state();
        }

        let fetcher = self.fetcher.clone();
        let result = self.cache.refetch(&self.key, move || fetcher()).await;
        self.settled(result)
    }

    /// Start an observer task that keeps a published state up to date
    pub fn observe(&self) -> QueryObserver<T> {
        QueryObserver::spawn(self.clone())
    }

    fn settled(&self, result: Result<Arc<T>, ApiError>) -> QueryState<T> {
        let mut state = self.state();
        match result {
            Ok(data) => {
                state.is_loading = false;
                state.error = None;
                state.data = Some(data);
            },
            Err(err) => {
                state.is_loading = false;
                state.error = Some(err);
            },
        }
        state
    }
}
