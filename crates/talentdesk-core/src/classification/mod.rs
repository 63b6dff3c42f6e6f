//! AI classification of threads.
//!
//! Results live in a [`ClassificationCache`] shared by every view. Each
//! mounted view holds a [`ClassificationWatcher`] that keeps its thread fresh
//! on a timer; the cache drops a thread's result once its last watcher is
//! gone.

mod cache;
mod classifier;
#[cfg(test)]
pub(crate) mod testing;
mod watcher;

pub use cache::{ANALYSING_LABEL, ClassificationCache, ClassificationState, category_label};
pub use classifier::ThreadClassifier;
pub use watcher::{ClassificationWatcher, DEFAULT_REFRESH_INTERVAL};
