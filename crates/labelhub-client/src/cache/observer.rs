//! Query observers
//!
//! An observer owns a background task that keeps a [`QueryState`] published on
//! a `watch` channel. The task fetches once on start, refetches on every tick
//! of the query's `refetch_interval` and whenever its key is invalidated, and
//! republishes when another handle updates or evicts the entry.
//!
//! Dropping the observer stops the task.

use crate::cache::key::QueryKey;
use crate::cache::query::{Query, QueryState};
use crate::cache::store::{CacheEvent, QueryCache};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace};

pub struct QueryObserver<T> {
    state: watch::Receiver<QueryState<T>>,
    task: JoinHandle<()>,
    cache: QueryCache,
    key: QueryKey,
}

impl<T: Send + Sync + 'static> QueryObserver<T> {
    pub(crate) fn spawn(query: Query<T>) -> Self {
        let cache = query.cache().clone();
        let key = query.key().clone();
        cache.attach(&key);

        let (tx, state) = watch::channel(query.state());
        // Subscribe before the task starts so no event is missed
        let events = cache.subscribe();
        let task = tokio::spawn(run(query, tx, events));

        Self {
            state,
            task,
            cache,
            key,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Latest published state
    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    /// Wait for the next published state. Returns `false` once the task has
    /// stopped, which happens immediately for a disabled query.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }

    /// Independent receiver of the published state
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.clone()
    }
}

impl<T> Drop for QueryObserver<T> {
    fn drop(&mut self) {
        self.task.abort();
        self.cache.detach(&self.key);
    }
}

async fn run<T: Send + Sync + 'static>(
    query: Query<T>,
    tx: watch::Sender<QueryState<T>>,
    mut events: broadcast::Receiver<CacheEvent>,
) {
    if !query.is_enabled() {
        debug!(key = %query.key(), "Observer for disabled query, not polling");
        return;
    }

    tx.send_replace(query.fetch().await);

    let period = query.options().refetch_interval.filter(|period| !period.is_zero());
    let mut ticker = period.map(|period| {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    loop {
        tokio::select! {
            _ = tick(&mut ticker) => {
                trace!(key = %query.key(), "Polling");
                tx.send_replace(query.refetch().await);
            }
            event = events.recv() => match event {
                Ok(CacheEvent::Invalidated(ref key)) if key == query.key() => {
                    debug!(key = %key, "Observed key invalidated, refetching");
                    tx.send_replace(query.fetch().await);
                },
                Ok(CacheEvent::Updated(ref key) | CacheEvent::Failed(ref key) | CacheEvent::Removed(ref key))
                    if key == query.key() =>
                {
                    tx.send_replace(query.state());
                },
                Ok(CacheEvent::Cleared) => {
                    tx.send_replace(query.state());
                },
                Ok(_) => {},
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(key = %query.key(), skipped, "Observer lagged behind cache events");
                    tx.send_replace(query.fetch().await);
                },
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        if tx.is_closed() {
            break;
        }
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        },
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::cache::query::QueryOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn counting_query(cache: &QueryCache, calls: &Arc<AtomicUsize>, options: QueryOptions) -> Query<usize> {
        let calls = calls.clone();
        Query::new(
            cache.clone(),
            QueryKey::from(["training-session", "s1"]),
            options,
            move || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok::<_, ApiError>(n) }
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let options = QueryOptions::new(Duration::from_secs(30)).refetch_interval(Duration::from_millis(3000));
        let mut observer = counting_query(&cache, &calls, options).observe();

        assert!(observer.changed().await);
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(observer.state().data.as_deref(), Some(&1));

        tokio::time::advance(Duration::from_millis(2999)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(observer.state().data.as_deref(), Some(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_observer_keeps_running_without_polling() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut options = QueryOptions::new(Duration::from_secs(30));
        options.refetch_interval = Some(Duration::ZERO);
        let observer = counting_query(&cache, &calls, options).observe();

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!observer.task.is_finished());

        cache.invalidate(observer.key());
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(observer.state().data.as_deref(), Some(&2));
    }

    #[tokio::test]
    async fn test_refetches_when_key_invalidated() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let observer = counting_query(&cache, &calls, QueryOptions::new(Duration::from_secs(30))).observe();

        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.invalidate(observer.key());
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let state = observer.state();
        assert_eq!(state.data.as_deref(), Some(&2));
        assert!(!state.is_stale);
    }

    #[tokio::test]
    async fn test_disabled_query_observer_stops() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let options = QueryOptions::new(Duration::from_secs(30)).enabled(false);
        let mut observer = counting_query(&cache, &calls, options).observe();

        assert!(!observer.changed().await);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(observer.state().data.is_none());
        assert!(!observer.state().is_loading);
    }

    #[tokio::test]
    async fn test_drop_detaches() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let observer = counting_query(&cache, &calls, QueryOptions::new(Duration::from_secs(30))).observe();
        let key = observer.key().clone();

        assert_eq!(cache.observer_count(&key), 1);
        drop(observer);
        assert_eq!(cache.observer_count(&key), 0);
    }
}
