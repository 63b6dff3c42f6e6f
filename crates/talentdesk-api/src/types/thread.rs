//! Smart deal threads reconstructed by the backend.

use serde::{Deserialize, Serialize};

/// Brand a deal thread is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandRef {
    /// Brand identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Brand name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Email grouped into a deal thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadEmail {
    /// Email identifier.
    #[serde(with = "super::opaque_id")]
    pub id: String,
    /// Subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Body snippet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Time the email was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<String>,
}

/// Deal timeline grouping repeated brand emails into one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealThread {
    /// Thread identifier.
    #[serde(with = "super::opaque_id")]
    pub id: String,
    /// Normalized subject shared by the grouped emails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_root: Option<String>,
    /// Deal stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Thread status, shown when there is no stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Linked brand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<BrandRef>,
    /// Brand contact address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_email: Option<String>,
    /// Emails in the thread.
    #[serde(default)]
    pub emails: Vec<ThreadEmail>,
}

impl DealThread {
    /// Short label: `subject · stage`.
    #[must_use]
    pub fn label(&self) -> String {
        let subject = self
            .subject_root
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("Untitled");
        match self.stage.as_deref().or(self.status.as_deref()) {
            Some(stage) => format!("{subject} · {stage}"),
            None => subject.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ThreadListEnvelope {
    #[serde(default)]
    pub(crate) threads: Vec<DealThread>,
}

/// `GET /threads/:id` answers either `{thread: {...}}` or the bare thread.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ThreadEnvelope {
    Wrapped { thread: DealThread },
    Bare(DealThread),
}

impl ThreadEnvelope {
    pub(crate) fn into_thread(self) -> DealThread {
        match self {
            Self::Wrapped { thread } | Self::Bare(thread) => thread,
        }
    }
}
