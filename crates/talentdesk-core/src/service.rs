//! Inbox service.
//!
//! Ties the backend client to the query cache and the classification cache,
//! and answers the questions a front-end asks: what does a tab contain, which
//! threads are being classified, what smart threads exist.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use talentdesk_api::{
    ApiClient, ClassificationResult, DealThread, InboundItem, Platform, SmartCategories,
    UnifiedInbox,
};
use tracing::{debug, info};

use crate::classification::{ClassificationCache, ClassificationWatcher};
use crate::config::InboxConfig;
use crate::query::{PollHandle, Query, QueryCache, QueryKey, QueryState};
use crate::view::{self, InboxFilters, InboxTab, TabView};
use crate::{Error, Result};

/// Cache key of the unified inbox.
#[must_use]
pub fn inbox_key() -> QueryKey {
    QueryKey::from_parts(&["inbox", "unified"])
}

/// Cache key of the smart category buckets.
#[must_use]
pub fn categories_key() -> QueryKey {
    QueryKey::from_parts(&["inbox", "categories"])
}

/// Cache key of the deal thread list.
#[must_use]
pub fn threads_key() -> QueryKey {
    QueryKey::from_parts(&["threads"])
}

/// Front-end facing inbox operations.
///
/// Must be used from within a Tokio runtime; classification watchers and
/// polls run as spawned tasks and stop when the service is dropped.
#[derive(Debug)]
pub struct InboxService {
    client: Arc<ApiClient>,
    queries: QueryCache,
    classifications: ClassificationCache,
    config: InboxConfig,
    watchers: Mutex<HashMap<String, ClassificationWatcher>>,
}

impl InboxService {
    /// Creates a service with empty caches.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the config is invalid.
    pub fn new(client: ApiClient, config: InboxConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: Arc::new(client),
            queries: QueryCache::new(),
            classifications: ClassificationCache::new(),
            config,
            watchers: Mutex::new(HashMap::new()),
        })
    }

    /// Backend client.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Shared query cache.
    #[must_use]
    pub const fn queries(&self) -> &QueryCache {
        &self.queries
    }

    /// Shared classification cache.
    #[must_use]
    pub const fn classifications(&self) -> &ClassificationCache {
        &self.classifications
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &InboxConfig {
        &self.config
    }

    fn watchers(&self) -> MutexGuard<'_, HashMap<String, ClassificationWatcher>> {
        self.watchers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Query for the unified inbox.
    #[must_use]
    pub fn inbox_query(&self) -> Query<UnifiedInbox> {
        let client = Arc::clone(&self.client);
        Query::new(self.queries.clone(), inbox_key(), "load inbox", move || {
            let client = Arc::clone(&client);
            async move { client.unified_inbox().await.map_err(Error::from) }
        })
    }

    /// Query for the smart category buckets.
    #[must_use]
    pub fn categories_query(&self) -> Query<SmartCategories> {
        let client = Arc::clone(&self.client);
        Query::new(self.queries.clone(), categories_key(), "load categories", move || {
            let client = Arc::clone(&client);
            async move { client.inbox_categories().await.map_err(Error::from) }
        })
    }

    /// Query for the deal thread list.
    #[must_use]
    pub fn threads_query(&self) -> Query<Vec<DealThread>> {
        let client = Arc::clone(&self.client);
        Query::new(self.queries.clone(), threads_key(), "load smart threads", move || {
            let client = Arc::clone(&client);
            async move { client.list_threads().await.map_err(Error::from) }
        })
    }

    /// Fetches the unified inbox and starts classifying its email items.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; its message is also recorded in the cache.
    pub async fn load_inbox(&self) -> Result<Arc<UnifiedInbox>> {
        let inbox = self.inbox_query().refetch().await?;
        let started = self.watch_classifications(&inbox.inbox);
        info!(items = inbox.inbox.len(), watchers_started = started, "inbox loaded");
        Ok(inbox)
    }

    /// Fetches the smart category buckets.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; its message is also recorded in the cache.
    pub async fn load_categories(&self) -> Result<Arc<SmartCategories>> {
        self.categories_query().refetch().await
    }

    /// Keeps one classification watcher per email item in `items`.
    ///
    /// Watchers for items no longer present are dropped. Returns the number of
    /// watchers started.
    pub fn watch_classifications(&self, items: &[InboundItem]) -> usize {
        let wanted: Vec<&str> = items
            .iter()
            .filter(|item| item.platform == Platform::Email && !item.id.trim().is_empty())
            .map(|item| item.id.as_str())
            .collect();

        let mut watchers = self.watchers();
        watchers.retain(|id, _| wanted.contains(&id.as_str()));

        let mut started = 0;
        for id in wanted {
            if watchers.contains_key(id) {
                continue;
            }
            let watcher = ClassificationWatcher::spawn(
                self.classifications.clone(),
                Arc::clone(&self.client),
                id,
                self.config.classification_refresh,
            );
            watchers.insert(id.to_string(), watcher);
            started += 1;
        }
        debug!(watching = watchers.len(), started, "classification watchers updated");
        started
    }

    /// Thread ids currently being classified, sorted.
    #[must_use]
    pub fn watched_threads(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.watchers().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Stops every classification watcher.
    pub fn unwatch_all(&self) {
        self.watchers().clear();
    }

    /// Cached state of the unified inbox.
    #[must_use]
    pub fn inbox_state(&self) -> QueryState<UnifiedInbox> {
        self.inbox_query().state()
    }

    /// Cached state of the smart category buckets.
    #[must_use]
    pub fn categories_state(&self) -> QueryState<SmartCategories> {
        self.categories_query().state()
    }

    /// Contents of `tab` from what is cached right now.
    #[must_use]
    pub fn view(&self, tab: InboxTab, filters: &InboxFilters) -> TabView {
        let inbox = self
            .queries
            .get_query_data::<UnifiedInbox>(&inbox_key())
            .unwrap_or_default();
        let categories = self.queries.get_query_data::<SmartCategories>(&categories_key());
        view::compose(
            tab,
            &inbox,
            categories.as_deref(),
            filters,
            &self.classifications.results(),
        )
    }

    /// Marks an item read in the cached inbox.
    ///
    /// Returns `false` if the inbox is not loaded or has no such item.
    pub fn mark_read(&self, item_id: &str) -> bool {
        let present = self
            .queries
            .get_query_data::<UnifiedInbox>(&inbox_key())
            .is_some_and(|inbox| inbox.inbox.iter().any(|item| item.id == item_id));
        if !present {
            return false;
        }
        self.queries
            .update_query_data::<UnifiedInbox, _>(&inbox_key(), |inbox| {
                let mut inbox = inbox.clone();
                for item in inbox.inbox.iter_mut().filter(|item| item.id == item_id) {
                    item.unread = false;
                }
                inbox
            })
    }

    /// Classifies one thread now.
    ///
    /// The outcome is cached only while the thread is watched; otherwise it is
    /// just returned.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidThreadId` for an empty id, or the classifier
    /// error, whose message is also recorded for a watched thread.
    pub async fn classify_now(&self, thread_id: &str) -> Result<ClassificationResult> {
        self.classifications
            .classify(self.client.as_ref(), thread_id)
            .await
    }

    /// Lists deal threads.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; its message is also recorded in the cache.
    pub async fn list_threads(&self) -> Result<Arc<Vec<DealThread>>> {
        self.threads_query().refetch().await
    }

    /// Rebuilds deal threads from ingested email, then lists them again.
    ///
    /// # Errors
    ///
    /// Returns an error if the rebuild or the following list fails.
    pub async fn rebuild_threads(&self) -> Result<Arc<Vec<DealThread>>> {
        self.client.rebuild_threads().await?;
        self.queries.invalidate_queries(&threads_key());
        info!("deal threads rebuilt");
        self.list_threads().await
    }

    /// Fetches one deal thread with its emails.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidThreadId` for an empty id, or the fetch error.
    pub async fn get_thread(&self, thread_id: &str) -> Result<DealThread> {
        if thread_id.trim().is_empty() {
            return Err(Error::InvalidThreadId(thread_id.to_string()));
        }
        Ok(self.client.get_thread(thread_id).await?)
    }

    /// Starts background inbox refetching if configured.
    #[must_use]
    pub fn spawn_inbox_polling(&self) -> Option<PollHandle> {
        self.config
            .inbox_refetch
            .map(|every| self.inbox_query().spawn_polling(every))
    }
}

/// Thread with id `selected`, or the first thread.
#[must_use]
pub fn select_thread<'a>(threads: &'a [DealThread], selected: Option<&str>) -> Option<&'a DealThread> {
    selected
        .and_then(|id| threads.iter().find(|t| t.id == id))
        .or_else(|| threads.first())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn thread(id: &str) -> DealThread {
        serde_json::from_value(serde_json::json!({ "id": id })).unwrap()
    }

    #[test]
    fn test_select_thread_defaults_to_first() {
        let threads = vec![thread("a"), thread("b")];
        assert_eq!(select_thread(&threads, None).unwrap().id, "a");
        assert_eq!(select_thread(&threads, Some("b")).unwrap().id, "b");
        assert_eq!(select_thread(&threads, Some("zzz")).unwrap().id, "a");
        assert!(select_thread(&[], Some("a")).is_none());
    }

    #[test]
    fn test_keys_are_distinct() {
        assert_ne!(inbox_key(), categories_key());
        assert!(inbox_key().starts_with(&QueryKey::from_parts(&["inbox"])));
        assert!(!threads_key().starts_with(&QueryKey::from_parts(&["inbox"])));
    }

    #[tokio::test]
    async fn test_mark_read_updates_cached_inbox() {
        let service = InboxService::new(ApiClient::new("http://localhost:1").unwrap(), InboxConfig::default()).unwrap();
        assert!(!service.mark_read("a"));

        let mut item = InboundItem::new("a");
        item.unread = true;
        service.queries().set_query_data(
            &inbox_key(),
            UnifiedInbox {
                inbox: vec![item],
                ..UnifiedInbox::default()
            },
        );

        assert!(service.mark_read("a"));
        assert!(!service.mark_read("missing"));
        let inbox = service.inbox_state().data.unwrap();
        assert!(!inbox.inbox[0].unread);
    }
}
