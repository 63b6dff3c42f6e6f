//! Async HTTP client for the inbox backend.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, ErrorBody, Result};
use crate::types::{
    CategoriesEnvelope, ClassificationPayload, ClassificationResult, DealThread, SmartCategories,
    ThreadEnvelope, ThreadListEnvelope, UnifiedInbox,
};

const CLASSIFY_THREAD_PATH: &str = "ai/classify-thread";
const UNIFIED_INBOX_PATH: &str = "inbox/unified";
const INBOX_CATEGORIES_PATH: &str = "api/inbox/categories";
const THREADS_PATH: &str = "threads";
const THREADS_REBUILD_PATH: &str = "threads/rebuild";

/// Client for the backend REST/JSON contract.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http_client: Client,
}

impl ApiClient {
    /// Creates a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base(base_url.as_ref())?,
            http_client: Client::new(),
        })
    }

    /// Creates a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base(base_url.as_ref())?,
            http_client: Client::builder().timeout(timeout).build()?,
        })
    }

    /// Base URL every path is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Asks the AI service to classify a thread.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for an empty id, `Error::Api` for a non-2xx
    /// response, and `Error::InvalidResponse` if the answer has no category.
    pub async fn classify_thread(&self, thread_id: &str) -> Result<ClassificationResult> {
        if thread_id.trim().is_empty() {
            return Err(Error::InvalidInput("thread id must not be empty".into()));
        }

        debug!(thread_id, "classifying thread");
        let response = self
            .http_client
            .post(self.endpoint(CLASSIFY_THREAD_PATH)?)
            .json(&json!({ "threadId": thread_id }))
            .send()
            .await?;
        let response = check_status(response).await?;

        let body = response.bytes().await?;
        let payload: ClassificationPayload = serde_json::from_slice(&body)?;
        payload.into_result()
    }

    /// Fetches the unified, cross-channel inbox.
    ///
    /// A malformed body yields an empty inbox.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn unified_inbox(&self) -> Result<UnifiedInbox> {
        let response = self
            .http_client
            .get(self.endpoint(UNIFIED_INBOX_PATH)?)
            .send()
            .await?;
        let inbox: UnifiedInbox = json_or_default(check_status(response).await?, "unified inbox").await?;
        debug!(items = inbox.inbox.len(), "unified inbox loaded");
        Ok(inbox)
    }

    /// Fetches the server-computed smart category buckets.
    ///
    /// A malformed body yields empty buckets.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn inbox_categories(&self) -> Result<SmartCategories> {
        let response = self
            .http_client
            .get(self.endpoint(INBOX_CATEGORIES_PATH)?)
            .send()
            .await?;
        let envelope: CategoriesEnvelope =
            json_or_default(check_status(response).await?, "inbox categories").await?;
        Ok(envelope.data)
    }

    /// Asks the backend to regroup ingested email into deal threads.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn rebuild_threads(&self) -> Result<()> {
        let response = self
            .http_client
            .post(self.endpoint(THREADS_REBUILD_PATH)?)
            .send()
            .await?;
        check_status(response).await?;
        debug!("deal threads rebuilt");
        Ok(())
    }

    /// Lists reconstructed deal threads.
    ///
    /// A malformed body yields no threads.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn list_threads(&self) -> Result<Vec<DealThread>> {
        let response = self
            .http_client
            .get(self.endpoint(THREADS_PATH)?)
            .send()
            .await?;
        let envelope: ThreadListEnvelope =
            json_or_default(check_status(response).await?, "thread list").await?;
        Ok(envelope.threads)
    }

    /// Fetches one deal thread.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for an empty id, and an error on transport
    /// failure, non-2xx response or undecodable body.
    pub async fn get_thread(&self, thread_id: &str) -> Result<DealThread> {
        if thread_id.trim().is_empty() {
            return Err(Error::InvalidInput("thread id must not be empty".into()));
        }

        let mut url = self.endpoint(THREADS_PATH)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidInput(format!("cannot append to {}", self.base_url)))?
            .pop_if_empty()
            .push(thread_id);

        let response = self.http_client.get(url).send().await?;
        let body = check_status(response).await?.bytes().await?;
        let envelope: ThreadEnvelope = serde_json::from_slice(&body)?;
        Ok(envelope.into_thread())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

/// Parses a base URL and makes sure relative joins keep its last segment.
fn normalize_base(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidInput(format!("{raw} cannot be used as a base URL")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Maps a non-2xx response to `Error::Api`.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    let error = ErrorBody::parse(&body).into_error(status.as_u16());
    warn!(status = status.as_u16(), error = %error, "backend request failed");
    Err(error)
}

/// Decodes a JSON body, substituting the empty default when it is malformed.
async fn json_or_default<T>(response: Response, what: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let body = response.bytes().await?;
    match serde_json::from_slice(&body) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("Malformed {what} response, using empty default: {e}");
            Ok(T::default())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = ApiClient::new("http://localhost:5001/api").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:5001/api/");
        assert_eq!(
            client.endpoint("/inbox/unified").unwrap().as_str(),
            "http://localhost:5001/api/inbox/unified"
        );
    }

    #[test]
    fn test_root_base_url() {
        let client = ApiClient::new("http://localhost:5001").unwrap();
        assert_eq!(
            client.endpoint(INBOX_CATEGORIES_PATH).unwrap().as_str(),
            "http://localhost:5001/api/inbox/categories"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(ApiClient::new("not a url"), Err(Error::Url(_))));
        assert!(matches!(
            ApiClient::new("mailto:ops@example.com"),
            Err(Error::InvalidInput(_))
        ));
    }
}
