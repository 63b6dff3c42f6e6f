//! Shared query cache with per-key subscriptions.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use super::key::QueryKey;

type Data = Arc<dyn Any + Send + Sync>;

/// Outcome of the last write to a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// The entry holds data from a successful fetch.
    Success,
    /// The last fetch failed; `data`, if any, is stale.
    Error,
}

impl QueryStatus {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Typed snapshot of one cache entry.
#[derive(Debug)]
pub struct CacheEntry<T> {
    /// Key the entry is stored under.
    pub key: QueryKey,
    /// Last successful data.
    pub data: Option<Arc<T>>,
    /// Message of the last failure, cleared by the next success.
    pub error: Option<String>,
    /// Status of the last write.
    pub status: QueryStatus,
    /// Time of the last write.
    pub updated_at: DateTime<Utc>,
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            data: self.data.clone(),
            error: self.error.clone(),
            status: self.status,
            updated_at: self.updated_at,
        }
    }
}

/// What happened to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    /// New data was stored.
    Updated,
    /// An error was recorded.
    Errored,
    /// The entry was removed.
    Invalidated,
}

/// Notification delivered to the subscribers of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    /// Key that changed.
    pub key: QueryKey,
    /// Kind of change.
    pub kind: CacheEventKind,
}

/// Reservation for one fetch of a key.
///
/// Tickets are numbered per key; completing a ticket older than the last
/// applied write is a no-op. Dropping a ticket releases its reservation, so
/// a failed or cancelled fetch leaves nothing behind.
#[derive(Debug)]
pub(crate) struct FetchTicket {
    key: QueryKey,
    seq: u64,
    state: Weak<Mutex<State>>,
}

impl Drop for FetchTicket {
    fn drop(&mut self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        state.release(&self.key);
    }
}

struct StoredEntry {
    data: Option<Data>,
    error: Option<String>,
    status: QueryStatus,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Slot {
    entry: Option<StoredEntry>,
    issued: u64,
    applied: u64,
    pending: usize,
    subscribers: Vec<(u64, UnboundedSender<CacheEvent>)>,
}

impl Slot {
    fn is_idle(&self) -> bool {
        self.entry.is_none() && self.subscribers.is_empty() && self.pending == 0
    }

    fn next_seq(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn notify(&mut self, key: &QueryKey, kind: CacheEventKind) {
        let event = CacheEvent {
            key: key.clone(),
            kind,
        };
        self.subscribers
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }
}

#[derive(Default)]
struct State {
    slots: HashMap<QueryKey, Slot>,
    next_subscriber: u64,
}

impl State {
    /// Ends one outstanding fetch of `key`, pruning the slot if idle.
    fn release(&mut self, key: &QueryKey) {
        let Some(slot) = self.slots.get_mut(key) else {
            return;
        };
        slot.pending = slot.pending.saturating_sub(1);
        if slot.is_idle() {
            self.slots.remove(key);
        }
    }
}

/// Process-local cache of fetch results, shared by cloning.
///
/// Every mutation notifies only the subscribers of the affected key. Writes
/// are sequenced per key so a slow fetch never overwrites the result of a
/// newer one.
#[derive(Clone, Default)]
pub struct QueryCache {
    state: Arc<Mutex<State>>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl QueryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of keys that currently hold an entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock()
            .slots
            .values()
            .filter(|slot| slot.entry.is_some())
            .count()
    }

    /// Whether no key holds an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the entry under `key`.
    ///
    /// Returns `None` when the key has no entry. Data stored under a different
    /// type reads as `None` in the snapshot.
    #[must_use]
    pub fn snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<CacheEntry<T>> {
        let state = self.lock();
        let entry = state.slots.get(key)?.entry.as_ref()?;
        Some(CacheEntry {
            key: key.clone(),
            data: entry.data.clone().and_then(|d| d.downcast::<T>().ok()),
            error: entry.error.clone(),
            status: entry.status,
            updated_at: entry.updated_at,
        })
    }

    /// Data under `key`, if present and of type `T`.
    #[must_use]
    pub fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        self.snapshot::<T>(key).and_then(|entry| entry.data)
    }

    /// Status of the entry under `key`.
    #[must_use]
    pub fn status(&self, key: &QueryKey) -> Option<QueryStatus> {
        let state = self.lock();
        state
            .slots
            .get(key)
            .and_then(|slot| slot.entry.as_ref())
            .map(|entry| entry.status)
    }

    /// Runs `fetch` and stores its result under `key`.
    ///
    /// On success the data replaces the entry, the error is cleared and the
    /// key's subscribers are notified. If a newer write was applied while
    /// `fetch` was pending, the result is returned but not stored.
    ///
    /// # Errors
    ///
    /// Returns the error of `fetch` unchanged; nothing is recorded.
    pub async fn fetch_query<T, E, F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let ticket = self.begin_fetch(key);
        let data = Arc::new(fetch().await?);
        self.complete_fetch(ticket, data.clone());
        Ok(data)
    }

    /// Stores `data` under `key` as the newest write.
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey, data: T) {
        let ticket = self.begin_fetch(key);
        self.complete_fetch(ticket, Arc::new(data));
    }

    /// Replaces the data under `key` with `update(current)`.
    ///
    /// Returns `false`, leaving the cache untouched, when the key holds no
    /// data of type `T`.
    pub fn update_query_data<T, F>(&self, key: &QueryKey, update: F) -> bool
    where
        T: Send + Sync + 'static,
        F: FnOnce(&T) -> T,
    {
        let mut state = self.lock();
        let Some(slot) = state.slots.get_mut(key) else {
            return false;
        };
        let Some(current) = slot
            .entry
            .as_ref()
            .and_then(|entry| entry.data.clone())
            .and_then(|d| d.downcast::<T>().ok())
        else {
            return false;
        };

        let seq = slot.next_seq();
        slot.applied = seq;
        if let Some(entry) = slot.entry.as_mut() {
            entry.data = Some(Arc::new(update(&current)));
            entry.updated_at = Utc::now();
        }
        slot.notify(key, CacheEventKind::Updated);
        true
    }

    /// Records a failure under `key`, keeping previous data as stale data.
    pub fn set_query_error(&self, key: &QueryKey, message: impl Into<String>) {
        let ticket = self.begin_fetch(key);
        self.fail_fetch(ticket, message);
    }

    /// Removes every entry whose key starts with `prefix`.
    ///
    /// Fetches that started before the call are discarded when they complete.
    /// Returns the number of entries removed.
    pub fn invalidate_queries(&self, prefix: &QueryKey) -> usize {
        let mut state = self.lock();
        let mut removed = 0;
        for (key, slot) in state.slots.iter_mut().filter(|(k, _)| k.starts_with(prefix)) {
            slot.applied = slot.issued;
            if slot.entry.take().is_some() {
                removed += 1;
                slot.notify(key, CacheEventKind::Invalidated);
            }
        }
        state.slots.retain(|_, slot| !slot.is_idle());
        debug!(prefix = %prefix, removed, "queries invalidated");
        removed
    }

    /// Subscribes to changes of `key`.
    ///
    /// Every mutation after this call is delivered, in order. Dropping the
    /// subscription unsubscribes.
    #[must_use]
    pub fn subscribe(&self, key: &QueryKey) -> QuerySubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.lock();
        state.next_subscriber += 1;
        let id = state.next_subscriber;
        state
            .slots
            .entry(key.clone())
            .or_default()
            .subscribers
            .push((id, sender));
        QuerySubscription {
            id,
            key: key.clone(),
            receiver,
            state: Arc::downgrade(&self.state),
        }
    }

    /// Number of live subscriptions to `key`.
    #[must_use]
    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.lock()
            .slots
            .get(key)
            .map_or(0, |slot| slot.subscribers.len())
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.lock().slots.len()
    }

    pub(crate) fn begin_fetch(&self, key: &QueryKey) -> FetchTicket {
        let mut state = self.lock();
        let slot = state.slots.entry(key.clone()).or_default();
        slot.pending += 1;
        let seq = slot.next_seq();
        trace!(key = %key, seq, "fetch started");
        FetchTicket {
            key: key.clone(),
            seq,
            state: Arc::downgrade(&self.state),
        }
    }

    /// Applies a successful fetch. Returns `false` if the ticket was stale.
    pub(crate) fn complete_fetch(&self, ticket: FetchTicket, data: Data) -> bool {
        self.apply(ticket, CacheEventKind::Updated, |entry| {
            entry.data = Some(data);
            entry.error = None;
            entry.status = QueryStatus::Success;
        })
    }

    /// Applies a failed fetch. Returns `false` if the ticket was stale.
    pub(crate) fn fail_fetch(&self, ticket: FetchTicket, message: impl Into<String>) -> bool {
        let message = message.into();
        self.apply(ticket, CacheEventKind::Errored, |entry| {
            entry.error = Some(message);
            entry.status = QueryStatus::Error;
        })
    }

    // The ticket is released when it drops, after the lock below is gone.
    fn apply(&self, ticket: FetchTicket, kind: CacheEventKind, write: impl FnOnce(&mut StoredEntry)) -> bool {
        let mut state = self.lock();
        let Some(slot) = state.slots.get_mut(&ticket.key) else {
            return false;
        };
        if ticket.seq <= slot.applied {
            debug!(key = %ticket.key, seq = ticket.seq, applied = slot.applied, "discarding stale fetch result");
            return false;
        }

        slot.applied = ticket.seq;
        let entry = slot.entry.get_or_insert_with(|| StoredEntry {
            data: None,
            error: None,
            status: QueryStatus::Success,
            updated_at: Utc::now(),
        });
        write(entry);
        entry.updated_at = Utc::now();
        slot.notify(&ticket.key, kind);
        true
    }
}

/// Receiving end of [`QueryCache::subscribe`].
#[derive(Debug)]
pub struct QuerySubscription {
    id: u64,
    key: QueryKey,
    receiver: UnboundedReceiver<CacheEvent>,
    state: Weak<Mutex<State>>,
}

impl QuerySubscription {
    /// Key this subscription listens to.
    #[must_use]
    pub const fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Waits for the next event. Returns `None` once the cache is gone.
    pub async fn next(&mut self) -> Option<CacheEvent> {
        self.receiver.recv().await
    }

    /// Next already-delivered event, if any.
    pub fn try_next(&mut self) -> Option<CacheEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for QuerySubscription {
    fn drop(&mut self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = state.slots.get_mut(&self.key) {
            slot.subscribers.retain(|(id, _)| *id != self.id);
            if slot.is_idle() {
                state.slots.remove(&self.key);
            }
        }
    }
}
