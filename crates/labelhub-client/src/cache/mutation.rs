//! Mutation handles
//!
//! A [`Mutation`] performs one write call and, only when it succeeds, applies
//! the [`CacheEffects`] computed from the payload and result. A failed write
//! leaves the cache untouched.

use crate::api::ApiError;
use crate::cache::key::QueryKey;
use crate::cache::store::QueryCache;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Cache changes a successful write implies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheEffects {
    /// Keys marked stale; their data stays readable until refetched
    pub invalidate: Vec<QueryKey>,
    /// Keys evicted outright
    pub remove: Vec<QueryKey>,
}

impl CacheEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(mut self, key: QueryKey) -> Self {
        self.invalidate.push(key);
        self
    }

    pub fn remove(mut self, key: QueryKey) -> Self {
        self.remove.push(key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.invalidate.is_empty() && self.remove.is_empty()
    }
}

type Runner<P, R> = Arc<dyn Fn(P) -> BoxFuture<'static, Result<R, ApiError>> + Send + Sync>;
type Effects<P, R> = Arc<dyn Fn(&P, &R) -> CacheEffects + Send + Sync>;

#[derive(Default)]
struct Status {
    pending: usize,
    error: Option<ApiError>,
}

/// A write with cache side effects
pub struct Mutation<P, R> {
    name: &'static str,
    cache: QueryCache,
    runner: Runner<P, R>,
    effects: Effects<P, R>,
    status: Arc<Mutex<Status>>,
}

impl<P, R> Clone for Mutation<P, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            cache: self.cache.clone(),
            runner: self.runner.clone(),
            effects: self.effects.clone(),
            status: self.status.clone(),
        }
    }
}

/// Counts a call as pending until dropped, including on cancellation
struct PendingGuard<'a>(&'a Mutex<Status>);

impl<'a> PendingGuard<'a> {
    fn enter(status: &'a Mutex<Status>) -> Self {
        lock(status).pending += 1;
        Self(status)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut status = lock(self.0);
        status.pending = status.pending.saturating_sub(1);
    }
}

fn lock(status: &Mutex<Status>) -> MutexGuard<'_, Status> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<P, R> Mutation<P, R>
where
    P: Clone + Send + 'static,
    R: Send + 'static,
{
    pub fn new<F, Fut, E>(name: &'static str, cache: QueryCache, runner: F, effects: E) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ApiError>> + Send + 'static,
        E: Fn(&P, &R) -> CacheEffects + Send + Sync + 'static,
    {
        Self {
            name,
            cache,
            runner: Arc::new(move |payload| runner(payload).boxed()),
            effects: Arc::new(effects),
            status: Arc::new(Mutex::new(Status::default())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Perform the write, then apply its cache effects if it succeeded
    pub async fn mutate(&self, payload: P) -> Result<R, ApiError> {
        let _pending = PendingGuard::enter(&self.status);

        match (self.runner)(payload.clone()).await {
            Ok(result) => {
                let effects = (self.effects)(&payload, &result);
                debug!(
                    mutation = self.name,
                    invalidate = effects.invalidate.len(),
                    remove = effects.remove.len(),
                    "Mutation succeeded, applying cache effects"
                );
                self.cache.apply(&effects);
                lock(&self.status).error = None;
                Ok(result)
            },
            Err(err) => {
                warn!(mutation = self.name, error = %err, "Mutation failed");
                lock(&self.status).error = Some(err.clone());
                Err(err)
            },
        }
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.status).pending > 0
    }

    /// Error from the most recent call, if it failed
    pub fn error(&self) -> Option<ApiError> {
        lock(&self.status).error.clone()
    }

    pub fn reset(&self) {
        lock(&self.status).error = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::time::Duration;

    async fn seed(cache: &QueryCache, key: &QueryKey) {
        cache
            .fetch(key, Duration::from_secs(30), || async { Ok::<_, ApiError>(1u32) })
            .await
            .unwrap();
    }

    fn delete_job(cache: &QueryCache, fail: bool) -> Mutation<String, ()> {
        Mutation::new(
            "delete_job",
            cache.clone(),
            move |_job_id: String| async move {
                if fail {
                    Err(ApiError::RequestFailed {
                        status: 403,
                        message: "Failed to delete job".to_string(),
                    })
                } else {
                    Ok(())
                }
            },
            |job_id, _| {
                CacheEffects::new()
                    .invalidate(QueryKey::from(["project-jobs", "proj-1"]))
                    .remove(QueryKey::new("job").with(job_id.as_str()))
            },
        )
    }

    #[tokio::test]
    async fn test_success_applies_effects() {
        let cache = QueryCache::new();
        let list = QueryKey::from(["project-jobs", "proj-1"]);
        let job = QueryKey::from(["job", "job-9"]);
        let other = QueryKey::from(["job", "job-1"]);
        for key in [&list, &job, &other] {
            seed(&cache, key).await;
        }

        let mutation = delete_job(&cache, false);
        mutation.mutate("job-9".to_string()).await.unwrap();

        assert_eq!(cache.invalidated_keys(), BTreeSet::from([list.clone()]));
        assert!(!cache.contains(&job));
        assert!(cache.contains(&other));
        assert!(!mutation.is_pending());
        assert!(mutation.error().is_none());
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_untouched() {
        let cache = QueryCache::new();
        let list = QueryKey::from(["project-jobs", "proj-1"]);
        let job = QueryKey::from(["job", "job-9"]);
        seed(&cache, &list).await;
        seed(&cache, &job).await;

        let mutation = delete_job(&cache, true);
        let err = mutation.mutate("job-9".to_string()).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to delete job");
        assert!(cache.invalidated_keys().is_empty());
        assert!(cache.contains(&job));
        assert_eq!(mutation.error(), Some(err));

        mutation.reset();
        assert!(mutation.error().is_none());
    }

    #[tokio::test]
    async fn test_pending_while_in_flight() {
        let cache = QueryCache::new();
        let (release, gate) = tokio::sync::oneshot::channel::<()>();
        let gate = Arc::new(Mutex::new(Some(gate)));

        let mutation: Mutation<(), ()> = Mutation::new(
            "slow",
            cache.clone(),
            move |_| {
                let gate = gate.lock().unwrap().take();
                async move {
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    Ok(())
                }
            },
            |_, _| CacheEffects::new(),
        );

        let call = mutation.mutate(());
        let check = async {
            tokio::task::yield_now().await;
            assert!(mutation.is_pending());
            let _ = release.send(());
        };

        let (result, ()) = tokio::join!(call, check);
        result.unwrap();
        assert!(!mutation.is_pending());
    }
}
