//! Composition of the inbox tabs.
//!
//! The priority, awaiting-reply and all tabs are built from the unified inbox:
//! filter, rank, then render each item as an [`InboxRow`]. The smart tab is a
//! preview of the server's category buckets and never touches the ranking.

use talentdesk_api::{
    CategoryItem, ClassificationResult, InboundItem, Platform, PriorityTotals, SmartBucket,
    SmartCategories, UnifiedInbox,
};

use crate::category::{CategoryFilter, ChannelFilter, ai_badge};
use crate::classification::category_label;
use crate::ranking::{self, Classifications};

/// Characters of the body shown under the subject.
pub const SNIPPET_LEN: usize = 140;

/// Items shown per smart bucket before "+N more".
pub const SMART_PREVIEW_LEN: usize = 5;

/// Inbox tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InboxTab {
    /// Ranked inbox with priority totals.
    #[default]
    Priority,
    /// Messages the user sent that have not been opened.
    AwaitingReply,
    /// Server-side category buckets.
    SmartCategories,
    /// Ranked inbox without totals.
    All,
}

impl InboxTab {
    /// All tabs, in display order.
    pub const ALL: [Self; 4] = [Self::Priority, Self::AwaitingReply, Self::SmartCategories, Self::All];

    /// Parse a tab id.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "priority" => Some(Self::Priority),
            "awaiting" => Some(Self::AwaitingReply),
            "smart" => Some(Self::SmartCategories),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Tab id.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::AwaitingReply => "awaiting",
            Self::SmartCategories => "smart",
            Self::All => "all",
        }
    }

    /// Tab title.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Priority => "Priority",
            Self::AwaitingReply => "Awaiting Reply",
            Self::SmartCategories => "Smart Categories",
            Self::All => "All Inbound",
        }
    }
}

/// Channel and category filters. Both must pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InboxFilters {
    /// Channel filter.
    pub channel: ChannelFilter,
    /// Category filter.
    pub category: CategoryFilter,
}

impl InboxFilters {
    /// Whether `item` passes both filters.
    #[must_use]
    pub fn matches(&self, item: &InboundItem, classifications: &Classifications) -> bool {
        self.channel.matches(item)
            && self
                .category
                .matches(ranking::resolve_category(item, classifications))
    }

    /// Items that pass both filters, in their original order.
    #[must_use]
    pub fn apply(&self, items: &[InboundItem], classifications: &Classifications) -> Vec<InboundItem> {
        items
            .iter()
            .filter(|item| self.matches(item, classifications))
            .cloned()
            .collect()
    }
}

/// Server-side triage shown under a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triage {
    /// `aiCategory`, or "untriaged".
    pub category: String,
    /// `aiUrgency`.
    pub urgency: Option<String>,
    /// `aiSummary`.
    pub summary: Option<String>,
    /// `aiRecommendedAction`.
    pub recommended_action: Option<String>,
}

impl Triage {
    /// Whether the urgency is "high".
    #[must_use]
    pub fn is_urgent(&self) -> bool {
        self.urgency.as_deref() == Some("high")
    }
}

/// One rendered inbox item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxRow {
    /// Item id.
    pub id: String,
    /// Source channel.
    pub platform: Platform,
    /// Sender, or "Unknown sender".
    pub sender: String,
    /// Subject, or "(No subject)".
    pub subject: String,
    /// First characters of the body.
    pub snippet: String,
    /// Raw date string.
    pub date: Option<String>,
    /// Unread flag.
    pub unread: bool,
    /// AI badge text.
    pub badge: Option<String>,
    /// Classification label, "Analysing…" until classified.
    pub label: &'static str,
    /// Server triage, when the item has a category or summary.
    pub triage: Option<Triage>,
}

impl InboxRow {
    /// Renders one item.
    #[must_use]
    pub fn new(item: &InboundItem, classification: Option<&ClassificationResult>) -> Self {
        let parsed = &item.parsed;
        let triage = (item.ai_summary.is_some() || item.ai_category.is_some()).then(|| Triage {
            category: item
                .ai_category
                .clone()
                .unwrap_or_else(|| "untriaged".to_string()),
            urgency: item.ai_urgency.clone(),
            summary: item.ai_summary.clone(),
            recommended_action: item.ai_recommended_action.clone(),
        });

        Self {
            id: item.id.clone(),
            platform: item.platform,
            sender: non_blank(parsed.from.as_deref()).unwrap_or("Unknown sender").to_string(),
            subject: non_blank(parsed.subject.as_deref()).unwrap_or("(No subject)").to_string(),
            snippet: snippet(parsed.body.as_deref().unwrap_or_default()),
            date: parsed.date.clone(),
            unread: item.unread,
            badge: ai_badge(item, classification),
            label: category_label(classification),
            triage,
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// First [`SNIPPET_LEN`] characters of `body`.
#[must_use]
pub fn snippet(body: &str) -> String {
    body.chars().take(SNIPPET_LEN).collect()
}

/// Items the user sent that the recipient has not opened.
#[must_use]
pub fn awaiting_reply(items: &[InboundItem]) -> Vec<InboundItem> {
    items
        .iter()
        .filter(|item| item.is_awaiting_reply())
        .cloned()
        .collect()
}

/// Filters, ranks and renders `items`.
#[must_use]
pub fn ranked_rows(items: &[InboundItem], filters: &InboxFilters, classifications: &Classifications) -> Vec<InboxRow> {
    ranking::rank(filters.apply(items, classifications), classifications)
        .iter()
        .map(|item| InboxRow::new(item, classifications.get(&item.id)))
        .collect()
}

/// Preview of one smart bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartBucketView {
    /// Bucket.
    pub bucket: SmartBucket,
    /// Items in the bucket.
    pub total: usize,
    /// Leading items.
    pub preview: Vec<CategoryItem>,
    /// Items not shown.
    pub remaining: usize,
}

impl SmartBucketView {
    /// "+N more items" footer, if anything is hidden.
    #[must_use]
    pub fn more_label(&self) -> Option<String> {
        (self.remaining > 0).then(|| format!("+{} more items", self.remaining))
    }
}

/// Non-empty smart buckets, each truncated to `limit` items.
#[must_use]
pub fn smart_preview(categories: &SmartCategories, limit: usize) -> Vec<SmartBucketView> {
    categories
        .non_empty()
        .map(|(bucket, items)| SmartBucketView {
            bucket,
            total: items.len(),
            preview: items.iter().take(limit).cloned().collect(),
            remaining: items.len().saturating_sub(limit),
        })
        .collect()
}

/// Contents of one tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabView {
    /// Ranked rows; totals only on the priority tab.
    Ranked {
        /// Rows in display order.
        rows: Vec<InboxRow>,
        /// Server priority totals.
        totals: Option<PriorityTotals>,
    },
    /// Smart bucket previews; empty while categories are not loaded.
    Smart(Vec<SmartBucketView>),
}

/// Builds the contents of `tab`.
#[must_use]
pub fn compose(
    tab: InboxTab,
    inbox: &UnifiedInbox,
    categories: Option<&SmartCategories>,
    filters: &InboxFilters,
    classifications: &Classifications,
) -> TabView {
    match tab {
        InboxTab::Priority => TabView::Ranked {
            rows: ranked_rows(&inbox.inbox, filters, classifications),
            totals: Some(inbox.totals),
        },
        InboxTab::AwaitingReply => TabView::Ranked {
            rows: ranked_rows(&awaiting_reply(&inbox.inbox), filters, classifications),
            totals: None,
        },
        InboxTab::All => TabView::Ranked {
            rows: ranked_rows(&inbox.inbox, filters, classifications),
            totals: None,
        },
        InboxTab::SmartCategories => {
            TabView::Smart(categories.map_or_else(Vec::new, |c| smart_preview(c, SMART_PREVIEW_LEN)))
        }
    }
}
