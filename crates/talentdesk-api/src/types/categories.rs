//! Server-driven smart category buckets.

use serde::{Deserialize, Serialize};

/// One of the fixed smart-category buckets computed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmartBucket {
    /// Incoming deal offers.
    Deals,
    /// Ongoing negotiations.
    Negotiations,
    /// Gifting and PR packages.
    Gifting,
    /// Event invitations.
    Invites,
    /// Messages from VIP contacts.
    Vip,
    /// Urgent messages.
    Urgent,
    /// Spam.
    Spam,
}

impl SmartBucket {
    /// All buckets in display order.
    pub const ALL: [Self; 7] = [
        Self::Deals,
        Self::Negotiations,
        Self::Gifting,
        Self::Invites,
        Self::Vip,
        Self::Urgent,
        Self::Spam,
    ];

    /// Wire key of this bucket.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deals => "deals",
            Self::Negotiations => "negotiations",
            Self::Gifting => "gifting",
            Self::Invites => "invites",
            Self::Vip => "vip",
            Self::Urgent => "urgent",
            Self::Spam => "spam",
        }
    }

    /// Human-readable heading.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Deals => "Deal Offers",
            Self::Negotiations => "Negotiations",
            Self::Gifting => "Gifting & PR",
            Self::Invites => "Event Invites",
            Self::Vip => "VIP Contacts",
            Self::Urgent => "Urgent",
            Self::Spam => "Spam",
        }
    }
}

/// Summary of a message inside a smart bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryItem {
    /// Message identifier.
    #[serde(with = "super::opaque_id")]
    pub id: String,
    /// Sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Alternate sender field used by some channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Preview text, used when there is no subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// AI summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    /// Whether the message is unread.
    #[serde(default)]
    pub unread: bool,
}

impl CategoryItem {
    /// Sender line for display.
    #[must_use]
    pub fn sender_display(&self) -> &str {
        self.from
            .as_deref()
            .or(self.sender.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown sender")
    }

    /// Subject line for display.
    #[must_use]
    pub fn subject_display(&self) -> &str {
        self.subject
            .as_deref()
            .or(self.preview.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("No subject")
    }
}

/// Response body of `GET /api/inbox/categories`, unwrapped from `data`.
///
/// Buckets missing from the response are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartCategories {
    /// Deal offers.
    #[serde(default)]
    pub deals: Vec<CategoryItem>,
    /// Negotiations.
    #[serde(default)]
    pub negotiations: Vec<CategoryItem>,
    /// Gifting and PR.
    #[serde(default)]
    pub gifting: Vec<CategoryItem>,
    /// Event invites.
    #[serde(default)]
    pub invites: Vec<CategoryItem>,
    /// VIP contacts.
    #[serde(default)]
    pub vip: Vec<CategoryItem>,
    /// Urgent.
    #[serde(default)]
    pub urgent: Vec<CategoryItem>,
    /// Spam.
    #[serde(default)]
    pub spam: Vec<CategoryItem>,
}

impl SmartCategories {
    /// Items in one bucket.
    #[must_use]
    pub fn bucket(&self, bucket: SmartBucket) -> &[CategoryItem] {
        match bucket {
            SmartBucket::Deals => &self.deals,
            SmartBucket::Negotiations => &self.negotiations,
            SmartBucket::Gifting => &self.gifting,
            SmartBucket::Invites => &self.invites,
            SmartBucket::Vip => &self.vip,
            SmartBucket::Urgent => &self.urgent,
            SmartBucket::Spam => &self.spam,
        }
    }

    /// Non-empty buckets in display order.
    pub fn non_empty(&self) -> impl Iterator<Item = (SmartBucket, &[CategoryItem])> {
        SmartBucket::ALL
            .into_iter()
            .map(|b| (b, self.bucket(b)))
            .filter(|(_, items)| !items.is_empty())
    }

    /// Returns true if no bucket has any item.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.non_empty().next().is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CategoriesEnvelope {
    #[serde(default)]
    pub(crate) data: SmartCategories,
}
