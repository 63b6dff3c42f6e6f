//! Scripted classifier for unit tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicUsize, Ordering};

use talentdesk_api::ClassificationResult;

use super::ThreadClassifier;
use crate::{Error, Result};

/// Replays queued answers in order, then fails.
pub(crate) struct ScriptedClassifier {
    answers: Mutex<VecDeque<Result<ClassificationResult>>>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub(crate) fn new(answers: impl IntoIterator<Item = Result<ClassificationResult>>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn server_error(message: &str) -> Error {
        Error::Api(talentdesk_api::Error::Api {
            status: 503,
            message: Some(message.to_string()),
        })
    }

    pub(crate) fn network_error() -> Error {
        Error::Api(talentdesk_api::Error::Api {
            status: 502,
            message: None,
        })
    }
}

impl ThreadClassifier for ScriptedClassifier {
    fn classify(&self, _thread_id: &str) -> impl Future<Output = Result<ClassificationResult>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(Self::network_error()));
        async move { answer }
    }
}
