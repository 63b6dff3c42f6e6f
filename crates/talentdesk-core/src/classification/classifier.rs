//! Source of thread classifications.

use std::future::Future;

use talentdesk_api::{ApiClient, ClassificationResult};

use crate::Result;

/// Something that can classify a thread by id.
pub trait ThreadClassifier: Send + Sync {
    /// Classifies one thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the classification could not be obtained.
    fn classify(&self, thread_id: &str) -> impl Future<Output = Result<ClassificationResult>> + Send;
}

impl ThreadClassifier for ApiClient {
    async fn classify(&self, thread_id: &str) -> Result<ClassificationResult> {
        Ok(self.classify_thread(thread_id).await?)
    }
}
