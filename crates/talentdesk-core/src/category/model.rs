//! Thread category data models.

use talentdesk_api::{ClassificationResult, InboundItem, Platform};

/// AI-assigned category of a thread.
///
/// Closed set; labels the classifier produces outside this set are treated
/// as unclassified rather than mapped to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadCategory {
    /// Paid brand deal.
    Deal,
    /// Event invitation.
    Event,
    /// Press / PR request.
    Pr,
    /// Gifting or product seeding.
    Gifting,
    /// Anything else worth reading.
    Other,
    /// Unsolicited bulk mail.
    Spam,
    /// Suspected scam.
    Scam,
}

impl ThreadCategory {
    /// All categories, highest priority first.
    pub const ALL: [Self; 7] = [
        Self::Deal,
        Self::Event,
        Self::Pr,
        Self::Gifting,
        Self::Other,
        Self::Spam,
        Self::Scam,
    ];

    /// Weight used to rank inbox items. Unclassified items weigh 0.
    #[must_use]
    pub const fn weight(&self) -> u8 {
        match self {
            Self::Deal => 100,
            Self::Event => 90,
            Self::Pr => 80,
            Self::Gifting => 70,
            Self::Other => 50,
            Self::Spam => 20,
            Self::Scam => 10,
        }
    }

    /// Parse a classifier label. Case and surrounding whitespace are ignored.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "deal" => Some(Self::Deal),
            "event" => Some(Self::Event),
            "pr" => Some(Self::Pr),
            "gifting" => Some(Self::Gifting),
            "other" => Some(Self::Other),
            "spam" => Some(Self::Spam),
            "scam" => Some(Self::Scam),
            _ => None,
        }
    }

    /// Classifier label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deal => "Deal",
            Self::Event => "Event",
            Self::Pr => "PR",
            Self::Gifting => "Gifting",
            Self::Other => "Other",
            Self::Spam => "Spam",
            Self::Scam => "Scam",
        }
    }

    /// Human-readable badge label.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Deal => "Deal Opportunity",
            Self::Event => "Event Invite",
            Self::Pr => "PR Request",
            Self::Gifting => "Gifting",
            Self::Other => "General",
            Self::Spam => "Spam",
            Self::Scam => "Possible Scam",
        }
    }

    /// Weight of an optional label; unknown or missing labels weigh 0.
    #[must_use]
    pub fn weight_of(label: Option<&str>) -> u8 {
        label.and_then(Self::parse).map_or(0, |c| c.weight())
    }
}

/// Category selection in the inbox filter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// No filtering.
    #[default]
    All,
    /// Only deals.
    Deals,
    /// Only events.
    Events,
    /// Only gifting.
    Gifting,
    /// Only PR.
    Pr,
    /// Only scams.
    Scam,
    /// Only spam.
    Spam,
    /// Everything else, including unclassified items.
    Other,
}

impl CategoryFilter {
    /// Parse from the filter-bar representation. Unknown values mean `All`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "deals" | "deal" => Self::Deals,
            "events" | "event" => Self::Events,
            "gifting" => Self::Gifting,
            "pr" => Self::Pr,
            "scam" => Self::Scam,
            "spam" => Self::Spam,
            "other" => Self::Other,
            _ => Self::All,
        }
    }

    /// Filter-bar representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Deals => "deals",
            Self::Events => "events",
            Self::Gifting => "gifting",
            Self::Pr => "pr",
            Self::Scam => "scam",
            Self::Spam => "spam",
            Self::Other => "other",
        }
    }

    /// Whether an item with the given category passes this filter.
    #[must_use]
    pub fn matches(&self, category: Option<ThreadCategory>) -> bool {
        let category = category.unwrap_or(ThreadCategory::Other);
        match self {
            Self::All => true,
            Self::Deals => category == ThreadCategory::Deal,
            Self::Events => category == ThreadCategory::Event,
            Self::Gifting => category == ThreadCategory::Gifting,
            Self::Pr => category == ThreadCategory::Pr,
            Self::Scam => category == ThreadCategory::Scam,
            Self::Spam => category == ThreadCategory::Spam,
            Self::Other => category == ThreadCategory::Other,
        }
    }
}

/// Channel selection in the inbox filter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelFilter {
    /// Every channel.
    #[default]
    All,
    /// A single channel.
    Only(Platform),
}

impl ChannelFilter {
    /// Parse from the filter-bar representation. Unknown values mean `All`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        Platform::parse(s).map_or(Self::All, Self::Only)
    }

    /// Whether an item passes this filter.
    #[must_use]
    pub fn matches(&self, item: &InboundItem) -> bool {
        match self {
            Self::All => true,
            Self::Only(platform) => item.platform == *platform,
        }
    }
}

/// Badge text summarizing the AI triage of an item, if any.
///
/// The server-side category takes precedence over the client classification.
#[must_use]
pub fn ai_badge(item: &InboundItem, classification: Option<&ClassificationResult>) -> Option<String> {
    let category = item
        .ai_category
        .as_deref()
        .or_else(|| classification.map(|c| c.category.as_str()))
        .unwrap_or_default()
        .to_lowercase();

    if category.contains("deal") || category == "pr" {
        Some("AI: Deal Opportunity".to_string())
    } else if category.contains("gift") {
        Some("AI: Gift Offer".to_string())
    } else if category.contains("invite") || category.contains("event") {
        Some("AI: Event Invite".to_string())
    } else if item.ai_urgency.as_deref() == Some("low") {
        Some("AI: Low Priority".to_string())
    } else if category.is_empty() {
        None
    } else {
        Some(format!("AI: {category}"))
    }
}

impl std::str::FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl std::fmt::Display for ThreadCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
