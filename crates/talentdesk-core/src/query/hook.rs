//! Consuming side of the query cache.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::cache::{QueryCache, QueryStatus};
use super::key::QueryKey;
use crate::Result;

type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;
type Fetcher<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

/// What a view renders for one query.
#[derive(Debug)]
pub struct QueryState<T> {
    /// Last successful data, possibly stale.
    pub data: Option<Arc<T>>,
    /// Inline error text of the last failure.
    pub error: Option<String>,
    /// Status of the entry; `None` before the first fetch completes.
    pub status: Option<QueryStatus>,
}

impl<T> QueryState<T> {
    /// Whether nothing has been loaded yet.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }
}

/// A cached query bound to a key and a fetch function.
///
/// `refresh` fetches whenever the query is enabled and its entry is not in
/// the `Success` state, so a failed query retries on every refresh until it
/// succeeds or is disabled.
pub struct Query<T> {
    cache: QueryCache,
    key: QueryKey,
    action: String,
    fetcher: Fetcher<T>,
    enabled: bool,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            key: self.key.clone(),
            action: self.action.clone(),
            fetcher: Arc::clone(&self.fetcher),
            enabled: self.enabled,
        }
    }
}

impl<T> std::fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("key", &self.key)
            .field("action", &self.action)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl<T: Send + Sync + 'static> Query<T> {
    /// Creates a query. `action` names what the query does ("load inbox") and
    /// is used to phrase error messages.
    pub fn new<F, Fut>(cache: QueryCache, key: QueryKey, action: impl Into<String>, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            cache,
            key,
            action: action.into(),
            fetcher: Arc::new(move || Box::pin(fetch()) as FetchFuture<T>),
            enabled: true,
        }
    }

    /// Enables or disables automatic fetching.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Cache key of this query.
    #[must_use]
    pub const fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Current cached state, without fetching.
    #[must_use]
    pub fn state(&self) -> QueryState<T> {
        self.cache.snapshot::<T>(&self.key).map_or(
            QueryState {
                data: None,
                error: None,
                status: None,
            },
            |entry| QueryState {
                data: entry.data,
                error: entry.error,
                status: Some(entry.status),
            },
        )
    }

    /// Fetches unless the query is disabled or already successful, then
    /// returns the cached state. Failures are recorded, not returned.
    pub async fn refresh(&self) -> QueryState<T> {
        if self.enabled && self.cache.status(&self.key) != Some(QueryStatus::Success) {
            // The failure is already recorded in the cache entry.
            let _ = self.refetch().await;
        }
        self.state()
    }

    /// Fetches unconditionally.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after recording its user-facing message under
    /// this query's key.
    pub async fn refetch(&self) -> Result<Arc<T>> {
        let ticket = self.cache.begin_fetch(&self.key);
        match (self.fetcher)().await {
            Ok(data) => {
                let data = Arc::new(data);
                self.cache.complete_fetch(ticket, data.clone());
                Ok(data)
            }
            Err(error) => {
                let message = error.user_message(&self.action);
                debug!(key = %self.key, %error, "query failed");
                self.cache.fail_fetch(ticket, message);
                Err(error)
            }
        }
    }

    /// Refetches every `every` in the background until the handle drops.
    ///
    /// The first refetch happens one interval from now. Failures are logged
    /// and recorded, never propagated.
    #[must_use]
    pub fn spawn_polling(&self, every: Duration) -> PollHandle {
        let query = self.clone();
        let every = every.max(MIN_POLL_INTERVAL);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(error) = query.refetch().await {
                    warn!(key = %query.key, %error, "background refetch failed");
                }
            }
        });
        PollHandle { task }
    }
}

const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Background poll started by [`Query::spawn_polling`]; aborted on drop.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stops polling.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::Error;

    fn failing() -> Error {
        Error::Api(talentdesk_api::Error::Api {
            status: 500,
            message: None,
        })
    }

    fn counting_query(cache: &QueryCache, calls: &Arc<AtomicUsize>, fail: bool) -> Query<usize> {
        let calls = Arc::clone(calls);
        Query::new(
            cache.clone(),
            QueryKey::from_parts(&["count"]),
            "load count",
            move || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { if fail { Err(failing()) } else { Ok(n) } }
            },
        )
    }

    #[tokio::test]
    async fn test_refresh_skips_successful_query() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let query = counting_query(&cache, &calls, false);

        assert!(query.state().is_loading());
        assert_eq!(query.refresh().await.data.as_deref(), Some(&1));
        assert_eq!(query.refresh().await.data.as_deref(), Some(&1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(*query.refetch().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failed_query_records_error_and_retries() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let query = counting_query(&cache, &calls, true);

        let state = query.refresh().await;
        assert_eq!(state.error.as_deref(), Some("Unable to load count"));
        assert_eq!(state.status, Some(QueryStatus::Error));
        assert!(state.data.is_none());

        query.refresh().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_disabled_query_never_fetches() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let query = counting_query(&cache, &calls, false).enabled(false);

        assert!(query.refresh().await.is_loading());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_refetches_until_dropped() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let query = counting_query(&cache, &calls, false);

        let handle = query.spawn_polling(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(query.state().data.as_deref(), Some(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_failures_are_swallowed() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let query = counting_query(&cache, &calls, true);

        let _handle = query.spawn_polling(Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(query.state().error.as_deref(), Some("Unable to load count"));
    }
}
