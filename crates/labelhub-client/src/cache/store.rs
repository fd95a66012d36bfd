//! In-memory query cache
//!
//! Maps each [`QueryKey`] to its last value, when it was fetched, whether it has
//! been invalidated, the last error and the request currently in flight.
//!
//! - A read inside the staleness window is served from memory.
//! - Concurrent reads of one key share a single in-flight request.
//! - Invalidation marks an entry stale but keeps its value readable.
//! - Entries nobody observes are evicted once idle longer than the GC time.
//!
//! Requests run on their own task, so one finishes and settles even when every
//! caller waiting on it has gone away.
//!
//! The map lock is never held across an await.

use crate::api::ApiError;
use crate::cache::key::QueryKey;
use crate::cache::mutation::CacheEffects;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default idle time before an unobserved entry is evicted
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

const EVENT_CAPACITY: usize = 256;

/// Type-erased cached value
pub type CachedValue = Arc<dyn Any + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, Result<CachedValue, ApiError>>>;

/// Change notifications published to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A fetch stored a new value
    Updated(QueryKey),
    /// A fetch failed; any previous value is kept
    Failed(QueryKey),
    /// The entry was marked stale and should be refetched by its observers
    Invalidated(QueryKey),
    /// The entry was evicted
    Removed(QueryKey),
    Cleared,
}

/// Read-only view of one entry
#[derive(Clone)]
pub struct CacheSnapshot {
    pub value: Option<CachedValue>,
    pub updated_at: Option<Instant>,
    pub error: Option<ApiError>,
    pub is_fetching: bool,
    pub is_invalidated: bool,
}

impl CacheSnapshot {
    /// Stale when invalidated, never fetched, or older than `stale_time`
    pub fn is_stale(&self, stale_time: Duration) -> bool {
        match self.updated_at {
            Some(at) => self.is_invalidated || at.elapsed() > stale_time,
            None => true,
        }
    }
}

struct InFlight {
    id: u64,
    fetch: SharedFetch,
}

struct Entry {
    value: Option<CachedValue>,
    updated_at: Option<Instant>,
    error: Option<ApiError>,
    invalidated: bool,
    in_flight: Option<InFlight>,
    last_accessed: Instant,
}

impl Entry {
    fn new(now: Instant) -> Self {
        Self {
            value: None,
            updated_at: None,
            error: None,
            invalidated: false,
            in_flight: None,
            last_accessed: now,
        }
    }

    fn fresh_value(&self, now: Instant, stale_time: Duration) -> Option<CachedValue> {
        let updated_at = self.updated_at?;
        if self.invalidated || now.duration_since(updated_at) > stale_time {
            return None;
        }
        self.value.clone()
    }

    fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            value: self.value.clone(),
            updated_at: self.updated_at,
            error: self.error.clone(),
            is_fetching: self.in_flight.is_some(),
            is_invalidated: self.invalidated,
        }
    }
}

#[derive(Default)]
struct Store {
    entries: HashMap<QueryKey, Entry>,
    /// Live observer count per key; observed keys are never evicted
    observers: HashMap<QueryKey, usize>,
}

struct Inner {
    store: Mutex<Store>,
    events: broadcast::Sender<CacheEvent>,
    next_fetch_id: AtomicU64,
    gc_time: Duration,
}

/// How a read treats existing data
#[derive(Debug, Clone, Copy)]
enum Freshness {
    /// Serve cached data younger than the window
    Within(Duration),
    /// Always go to the network (still de-duplicated)
    Force,
}

/// Shared query cache service
///
/// Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_gc_time(DEFAULT_GC_TIME)
    }

    pub fn with_gc_time(gc_time: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store: Mutex::new(Store::default()),
                events,
                next_fetch_id: AtomicU64::new(1),
                gc_time,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.inner.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: CacheEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    /// Subscribe to cache change events
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    /// Read through the cache
    ///
    /// Returns the cached value if it is younger than `stale_time` and not
    /// invalidated; otherwise joins the in-flight request for `key`, or starts
    /// one with `fetcher`.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, stale_time: Duration, fetcher: F) -> Result<Arc<T>, ApiError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.read(key, Freshness::Within(stale_time), fetcher).await
    }

    /// Fetch regardless of staleness; still joins a request already in flight
    pub async fn refetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<Arc<T>, ApiError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.read(key, Freshness::Force, fetcher).await
    }

    async fn read<T, F, Fut>(&self, key: &QueryKey, freshness: Freshness, fetcher: F) -> Result<Arc<T>, ApiError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.evict_idle();

        let fetch = {
            let mut store = self.lock();
            let now = Instant::now();
            let entry = store
                .entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(now));
            entry.last_accessed = now;

            let cached = match freshness {
                Freshness::Within(stale_time) => entry.fresh_value(now, stale_time),
                Freshness::Force => None,
            };

            if let Some(value) = cached {
                debug!(key = %key, "Cache hit");
                return downcast(key, value);
            }

            match entry.in_flight.as_ref().map(|in_flight| in_flight.fetch.clone()) {
                Some(fetch) => {
                    debug!(key = %key, "Joining in-flight request");
                    fetch
                },
                None => {
                    let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %key, fetch_id = id, "Cache miss, fetching");
                    let fetch = self.start(key.clone(), id, fetcher());
                    entry.in_flight = Some(InFlight {
                        id,
                        fetch: fetch.clone(),
                    });
                    fetch
                },
            }
        };

        let value = fetch.await?;
        downcast(key, value)
    }

    /// Spawn a request that records its own outcome; waiters share the handle
    fn start<T, Fut>(&self, key: QueryKey, id: u64, request: Fut) -> SharedFetch
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let cache: Weak<Inner> = Arc::downgrade(&self.inner);
        let task_key = key.clone();

        let task = tokio::spawn(async move {
            let result = request.await.map(|value| Arc::new(value) as CachedValue);
            if let Some(inner) = cache.upgrade() {
                QueryCache { inner }.settle(&task_key, id, &result);
            }
            result
        });

        async move {
            task.await.unwrap_or_else(|e| {
                warn!(key = %key, fetch_id = id, error = %e, "Request task did not complete");
                Err(ApiError::Network(format!("request for {} did not complete: {}", key, e)))
            })
        }
        .boxed()
        .shared()
    }

    /// Store a finished fetch, unless the entry moved on while it was in flight
    fn settle(&self, key: &QueryKey, id: u64, result: &Result<CachedValue, ApiError>) {
        let event = {
            let mut store = self.lock();
            let Some(entry) = store.entries.get_mut(key) else {
                debug!(key = %key, fetch_id = id, "Entry removed while in flight, result ignored");
                return;
            };

            if entry.in_flight.as_ref().map(|f| f.id) != Some(id) {
                debug!(key = %key, fetch_id = id, "Superseded fetch, result ignored");
                return;
            }

            entry.in_flight = None;
            match result {
                Ok(value) => {
                    entry.value = Some(value.clone());
                    entry.updated_at = Some(Instant::now());
                    entry.error = None;
                    entry.invalidated = false;
                    CacheEvent::Updated(key.clone())
                },
                Err(err) => {
                    debug!(key = %key, error = %err, "Fetch failed, keeping previous value");
                    entry.error = Some(err.clone());
                    CacheEvent::Failed(key.clone())
                },
            }
        };

        self.publish(event);
    }

    /// Typed cached value, fresh or stale
    pub fn get<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let value = self.lock().entries.get(key)?.value.clone()?;
        value.downcast::<T>().ok()
    }

    pub fn snapshot(&self, key: &QueryKey) -> Option<CacheSnapshot> {
        self.lock().entries.get(key).map(Entry::snapshot)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> BTreeSet<QueryKey> {
        self.lock().entries.keys().cloned().collect()
    }

    /// Keys currently marked stale by invalidation
    pub fn invalidated_keys(&self) -> BTreeSet<QueryKey> {
        self.lock()
            .entries
            .iter()
            .filter(|(_, entry)| entry.invalidated)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Mark an entry stale so its next read refetches
    ///
    /// The value stays readable. A request already in flight is detached: its
    /// result is ignored, since it may predate the change that caused the
    /// invalidation. Returns whether the key was cached.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let found = {
            let mut store = self.lock();
            match store.entries.get_mut(key) {
                Some(entry) => {
                    entry.invalidated = true;
                    entry.in_flight = None;
                    true
                },
                None => false,
            }
        };

        if found {
            debug!(key = %key, "Invalidated");
            self.publish(CacheEvent::Invalidated(key.clone()));
        }
        found
    }

    /// Evict an entry entirely. Returns whether the key was cached.
    pub fn remove(&self, key: &QueryKey) -> bool {
        let removed = self.lock().entries.remove(key).is_some();
        if removed {
            debug!(key = %key, "Removed");
            self.publish(CacheEvent::Removed(key.clone()));
        }
        removed
    }

    /// Apply a successful mutation's effects: invalidations first, then removals
    pub fn apply(&self, effects: &CacheEffects) {
        for key in &effects.invalidate {
            self.invalidate(key);
        }
        for key in &effects.remove {
            self.remove(key);
        }
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
        self.publish(CacheEvent::Cleared);
    }

    /// Evict unobserved, idle entries with no request in flight
    pub fn evict_idle(&self) -> usize {
        let gc_time = self.inner.gc_time;
        let now = Instant::now();

        let evicted: Vec<QueryKey> = {
            let mut store = self.lock();
            let Store {
                ref mut entries,
                ref observers,
            } = *store;

            let expired: Vec<QueryKey> = entries
                .iter()
                .filter(|(key, entry)| {
                    entry.in_flight.is_none()
                        && !observers.contains_key(*key)
                        && now.duration_since(entry.last_accessed) > gc_time
                })
                .map(|(key, _)| key.clone())
                .collect();

            for key in &expired {
                entries.remove(key);
            }
            expired
        };

        for key in &evicted {
            debug!(key = %key, "Evicted idle entry");
            self.publish(CacheEvent::Removed(key.clone()));
        }
        evicted.len()
    }

    /// Register an observer for `key`; observed entries are exempt from eviction
    pub(crate) fn attach(&self, key: &QueryKey) {
        *self.lock().observers.entry(key.clone()).or_insert(0) += 1;
    }

    pub(crate) fn detach(&self, key: &QueryKey) {
        let mut store = self.lock();
        let remaining = match store.observers.get_mut(key) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            },
            None => return,
        };

        if remaining == 0 {
            store.observers.remove(key);
            // Idle time counts from the last observer leaving
            if let Some(entry) = store.entries.get_mut(key) {
                entry.last_accessed = Instant::now();
            }
        }
    }

    pub fn observer_count(&self, key: &QueryKey) -> usize {
        self.lock().observers.get(key).copied().unwrap_or(0)
    }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, value: CachedValue) -> Result<Arc<T>, ApiError> {
    value
        .downcast::<T>()
        .map_err(|_| ApiError::CacheType(key.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    /// Fetcher that counts calls and returns `value`
    fn counting<T: Clone + Send + 'static>(
        calls: &Arc<AtomicUsize>,
        value: T,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<T, ApiError>> {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(value) }.boxed()
        }
    }

    const WINDOW: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_second_read_within_window_is_served_from_cache() {
        let cache = QueryCache::new();
        let key = QueryKey::from(["model", "42"]);
        let calls = counter();

        let first = cache.fetch(&key, WINDOW, counting(&calls, 1u32)).await.unwrap();
        let second = cache.fetch(&key, WINDOW, counting(&calls, 2u32)).await.unwrap();

        assert_eq!((*first, *second), (1, 1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_after_window_refetches() {
        let cache = QueryCache::new();
        let key = QueryKey::from(["model", "42"]);
        let calls = counter();

        cache.fetch(&key, WINDOW, counting(&calls, 1u32)).await.unwrap();
        tokio::time::advance(WINDOW + Duration::from_millis(1)).await;
        let value = cache.fetch(&key, WINDOW, counting(&calls, 2u32)).await.unwrap();

        assert_eq!(*value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_request() {
        let cache = QueryCache::new();
        let key = QueryKey::from(["project-jobs", "proj-1"]);
        let calls = counter();
        let (release, gate) = tokio::sync::oneshot::channel::<()>();

        let slow = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let _ = gate.await;
                    Ok(vec!["job-1".to_string()])
                }
                .boxed()
            }
        };

        let first = cache.fetch(&key, WINDOW, slow);
        let second = cache.fetch(&key, WINDOW, counting(&calls, vec!["other".to_string()]));
        let releaser = async {
            tokio::task::yield_now().await;
            let _ = release.send(());
        };

        let (a, b, ()) = tokio::join!(first, second, releaser);
        assert_eq!(*a.unwrap(), vec!["job-1".to_string()]);
        assert_eq!(*b.unwrap(), vec!["job-1".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_keeps_previous_value() {
        let cache = QueryCache::new();
        let key = QueryKey::from(["job", "job-9"]);
        let calls = counter();

        cache.fetch(&key, WINDOW, counting(&calls, "v1".to_string())).await.unwrap();
        cache.invalidate(&key);

        let err = cache
            .fetch(&key, WINDOW, || async { Err::<String, _>(ApiError::Network("refused".into())) })
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Network("refused".into()));

        let snapshot = cache.snapshot(&key).unwrap();
        assert!(snapshot.error.is_some());
        assert_eq!(cache.get::<String>(&key).as_deref().map(String::as_str), Some("v1"));
    }

    #[tokio::test]
    async fn test_invalidate_keeps_value_and_forces_refetch() {
        let cache = QueryCache::new();
        let key = QueryKey::from(["project-jobs", "proj-1"]);
        let calls = counter();

        cache.fetch(&key, WINDOW, counting(&calls, 1u32)).await.unwrap();
        assert!(cache.invalidate(&key));

        assert_eq!(cache.invalidated_keys(), BTreeSet::from([key.clone()]));
        assert_eq!(cache.get::<u32>(&key).map(|v| *v), Some(1));
        assert!(cache.snapshot(&key).unwrap().is_stale(WINDOW));

        let value = cache.fetch(&key, WINDOW, counting(&calls, 2u32)).await.unwrap();
        assert_eq!(*value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.invalidated_keys().is_empty());
    }

    #[tokio::test]
    async fn test_invalidating_unknown_key_is_a_no_op() {
        let cache = QueryCache::new();
        assert!(!cache.invalidate(&QueryKey::from(["job", "nope"])));
        assert!(cache.invalidated_keys().is_empty());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_result_for_removed_entry_is_ignored() {
        let cache = QueryCache::new();
        let key = QueryKey::from(["job", "job-9"]);
        let (release, gate) = tokio::sync::oneshot::channel::<()>();

        let fetch = cache.fetch(&key, WINDOW, move || async move {
            let _ = gate.await;
            Ok(9u32)
        });
        let remover = async {
            tokio::task::yield_now().await;
            assert!(cache.remove(&key));
            let _ = release.send(());
        };

        let (value, ()) = tokio::join!(fetch, remover);
        assert_eq!(*value.unwrap(), 9);
        assert!(!cache.contains(&key));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_reported() {
        let cache = QueryCache::new();
        let key = QueryKey::from(["model", "42"]);
        let calls = counter();

        cache.fetch(&key, WINDOW, counting(&calls, 1u32)).await.unwrap();
        let err = cache
            .fetch(&key, WINDOW, counting(&calls, "x".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::CacheType(_)));
    }

    #[tokio::test]
    async fn test_apply_effects_and_events() {
        let cache = QueryCache::new();
        let list = QueryKey::from(["project-jobs", "proj-1"]);
        let job = QueryKey::from(["job", "job-9"]);
        let calls = counter();

        cache.fetch(&list, WINDOW, counting(&calls, 1u32)).await.unwrap();
        cache.fetch(&job, WINDOW, counting(&calls, 2u32)).await.unwrap();

        let mut events = cache.subscribe();
        cache.apply(&CacheEffects::new().invalidate(list.clone()).remove(job.clone()));

        assert_eq!(events.recv().await.unwrap(), CacheEvent::Invalidated(list.clone()));
        assert_eq!(events.recv().await.unwrap(), CacheEvent::Removed(job.clone()));
        assert_eq!(cache.keys(), BTreeSet::from([list]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_request_still_settles_and_is_evicted() {
        let cache = QueryCache::new();
        let key = QueryKey::from(["training-session", "s1"]);

        let waited = tokio::time::timeout(
            Duration::from_secs(1),
            cache.fetch(&key, WINDOW, || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(7u32)
            }),
        )
        .await;
        assert!(waited.is_err());
        assert!(cache.snapshot(&key).unwrap().is_fetching);

        // The request keeps running with nobody waiting on it
        tokio::time::sleep(Duration::from_secs(10)).await;
        let snapshot = cache.snapshot(&key).unwrap();
        assert!(!snapshot.is_fetching);
        assert_eq!(cache.get::<u32>(&key).map(|v| *v), Some(7));

        tokio::time::sleep(DEFAULT_GC_TIME).await;
        assert_eq!(cache.evict_idle(), 1);
        assert!(!cache.contains(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_entries_are_evicted_unless_observed() {
        let cache = QueryCache::with_gc_time(Duration::from_secs(60));
        let idle = QueryKey::from(["compute-profiles"]);
        let watched = QueryKey::from(["training-session", "s1"]);
        let calls = counter();

        cache.fetch(&idle, WINDOW, counting(&calls, 1u32)).await.unwrap();
        cache.fetch(&watched, WINDOW, counting(&calls, 2u32)).await.unwrap();
        cache.attach(&watched);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.evict_idle(), 1);
        assert!(!cache.contains(&idle));
        assert!(cache.contains(&watched));

        cache.detach(&watched);
        assert_eq!(cache.observer_count(&watched), 0);
        assert_eq!(cache.evict_idle(), 0);
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.evict_idle(), 1);
        assert!(cache.is_empty());
    }
}
