//! Per-thread classification cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use talentdesk_api::ClassificationResult;
use tracing::{debug, warn};

use super::classifier::ThreadClassifier;
use crate::category::ThreadCategory;
use crate::ranking::Classifications;
use crate::{Error, Result};

/// Label shown while a thread has no classification yet.
pub const ANALYSING_LABEL: &str = "Analysing…";

const CLASSIFY_ACTION: &str = "classify thread";

/// Row label for an optional classification.
///
/// [`ANALYSING_LABEL`] without a result, otherwise the category's display
/// name; labels outside the known categories read as "General".
#[must_use]
pub fn category_label(result: Option<&ClassificationResult>) -> &'static str {
    result.map_or(ANALYSING_LABEL, |result| {
        ThreadCategory::parse(&result.category)
            .unwrap_or(ThreadCategory::Other)
            .display_name()
    })
}

/// What a thread row shows about its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationState {
    /// Last successful result, possibly stale.
    pub result: Option<ClassificationResult>,
    /// Inline error text of the last failed attempt.
    pub error: Option<String>,
    /// Time of the last successful result.
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Slot {
    result: Option<ClassificationResult>,
    error: Option<String>,
    updated_at: Option<DateTime<Utc>>,
    issued: u64,
    applied: u64,
    mounted: usize,
}

impl Slot {
    fn state(&self) -> ClassificationState {
        ClassificationState {
            result: self.result.clone(),
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Classification results keyed by thread id, shared by cloning.
///
/// A failed attempt records its error next to the previous result instead of
/// replacing it. Attempts are numbered per thread and an attempt that finishes
/// after a newer one has been applied is dropped.
#[derive(Debug, Clone, Default)]
pub struct ClassificationCache {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl ClassificationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current result for a thread.
    #[must_use]
    pub fn get(&self, thread_id: &str) -> Option<ClassificationResult> {
        self.lock().get(thread_id).and_then(|slot| slot.result.clone())
    }

    /// Result and last error for a thread, if it has a slot.
    #[must_use]
    pub fn state(&self, thread_id: &str) -> Option<ClassificationState> {
        self.lock().get(thread_id).map(Slot::state)
    }

    /// All current results, for ranking.
    #[must_use]
    pub fn results(&self) -> Classifications {
        self.lock()
            .iter()
            .filter_map(|(id, slot)| slot.result.clone().map(|r| (id.clone(), r)))
            .collect()
    }

    /// Category label for a thread row, see [`category_label`].
    #[must_use]
    pub fn display_label(&self, thread_id: &str) -> String {
        category_label(self.get(thread_id).as_ref()).to_string()
    }

    /// Classifies a thread once and stores the result while the thread is
    /// mounted.
    ///
    /// A thread with no live view is classified and the result returned, but
    /// nothing is cached for it.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidThreadId` for an empty id without making a
    /// request. Any classifier error is recorded as inline text under a
    /// mounted id, keeping the previous result, and then returned.
    pub async fn classify<C>(&self, classifier: &C, thread_id: &str) -> Result<ClassificationResult>
    where
        C: ThreadClassifier,
    {
        if thread_id.trim().is_empty() {
            return Err(Error::InvalidThreadId(thread_id.to_string()));
        }

        let seq = self.begin(thread_id);
        if seq.is_none() {
            debug!(thread_id, "thread not mounted, result will not be cached");
        }
        match classifier.classify(thread_id).await {
            Ok(result) => {
                debug!(thread_id, category = %result.category, confidence = result.confidence, "thread classified");
                if let Some(seq) = seq {
                    self.apply(thread_id, seq, |slot| {
                        slot.result = Some(result.clone());
                        slot.error = None;
                        slot.updated_at = Some(Utc::now());
                    });
                }
                Ok(result)
            }
            Err(error) => {
                if let Some(seq) = seq {
                    let message = error.user_message(CLASSIFY_ACTION);
                    self.apply(thread_id, seq, |slot| slot.error = Some(message));
                }
                Err(error)
            }
        }
    }

    /// Like [`classify`](Self::classify), but failures are logged and
    /// swallowed.
    pub async fn refresh<C>(&self, classifier: &C, thread_id: &str)
    where
        C: ThreadClassifier,
    {
        if let Err(error) = self.classify(classifier, thread_id).await {
            warn!(thread_id, %error, "classification refresh failed");
        }
    }

    /// Registers a view of a thread.
    pub fn mount(&self, thread_id: &str) {
        self.lock().entry(thread_id.to_string()).or_default().mounted += 1;
    }

    /// Unregisters a view of a thread; the last one discards the result.
    pub fn unmount(&self, thread_id: &str) {
        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(thread_id) else {
            return;
        };
        slot.mounted = slot.mounted.saturating_sub(1);
        if slot.mounted == 0 {
            slots.remove(thread_id);
            debug!(thread_id, "classification discarded");
        }
    }

    /// Number of live views of a thread.
    #[must_use]
    pub fn mount_count(&self, thread_id: &str) -> usize {
        self.lock().get(thread_id).map_or(0, |slot| slot.mounted)
    }

    /// Numbers a new attempt, or `None` when the thread is not mounted.
    fn begin(&self, thread_id: &str) -> Option<u64> {
        let mut slots = self.lock();
        let slot = slots.get_mut(thread_id)?;
        slot.issued += 1;
        Some(slot.issued)
    }

    /// Number of threads with a slot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no thread has a slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn apply(&self, thread_id: &str, seq: u64, write: impl FnOnce(&mut Slot)) -> bool {
        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(thread_id) else {
            debug!(thread_id, "classification arrived after its slot was discarded");
            return false;
        };
        if seq <= slot.applied {
            debug!(thread_id, seq, applied = slot.applied, "discarding stale classification");
            return false;
        }
        slot.applied = seq;
        write(slot);
        true
    }
}
