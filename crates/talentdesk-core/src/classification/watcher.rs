//! Background refresh of one thread's classification.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::cache::ClassificationCache;
use super::classifier::ThreadClassifier;

/// Default interval between classification refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(45);

const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// A mounted view of one thread.
///
/// Classifies the thread immediately, then again on every interval tick,
/// one request at a time. Dropping the watcher stops the timer and releases
/// the thread's cache slot.
#[derive(Debug)]
pub struct ClassificationWatcher {
    thread_id: String,
    cache: ClassificationCache,
    trigger: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ClassificationWatcher {
    /// Mounts a view of `thread_id` and starts refreshing it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<C>(cache: ClassificationCache, classifier: Arc<C>, thread_id: impl Into<String>, every: Duration) -> Self
    where
        C: ThreadClassifier + 'static,
    {
        let thread_id = thread_id.into();
        let every = every.max(MIN_REFRESH_INTERVAL);
        let trigger = Arc::new(Notify::new());
        cache.mount(&thread_id);
        debug!(thread_id = %thread_id, every_secs = every.as_secs(), "classification watcher started");

        let task = {
            let cache = cache.clone();
            let trigger = Arc::clone(&trigger);
            let thread_id = thread_id.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        () = trigger.notified() => {}
                    }
                    cache.refresh(classifier.as_ref(), &thread_id).await;
                }
            })
        };

        Self {
            thread_id,
            cache,
            trigger,
            task,
        }
    }

    /// Thread this watcher refreshes.
    #[must_use]
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Requests a refresh without waiting for the next tick.
    ///
    /// Requests made while a refresh is running collapse into one.
    pub fn refresh_now(&self) {
        self.trigger.notify_one();
    }
}

impl Drop for ClassificationWatcher {
    fn drop(&mut self) {
        self.task.abort();
        self.cache.unmount(&self.thread_id);
        debug!(thread_id = %self.thread_id, "classification watcher stopped");
    }
}
