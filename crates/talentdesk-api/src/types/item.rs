//! Unified inbox items.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use super::null_as_default;

/// Channel an inbound message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Email (Gmail ingestion). Items without a platform are email.
    #[default]
    Email,
    /// Instagram direct messages.
    Instagram,
    /// WhatsApp messages.
    Whatsapp,
    /// TikTok messages.
    Tiktok,
    /// Any channel this client does not know about yet.
    #[serde(other)]
    Other,
}

impl Platform {
    /// All known channels, in display order.
    pub const ALL: [Self; 4] = [Self::Email, Self::Instagram, Self::Whatsapp, Self::Tiktok];

    /// Parse from the wire/command-line representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "email" => Some(Self::Email),
            "instagram" => Some(Self::Instagram),
            "whatsapp" => Some(Self::Whatsapp),
            "tiktok" => Some(Self::Tiktok),
            _ => None,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Instagram => "instagram",
            Self::Whatsapp => "whatsapp",
            Self::Tiktok => "tiktok",
            Self::Other => "other",
        }
    }

    /// Human-readable display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Instagram => "Instagram",
            Self::Whatsapp => "WhatsApp",
            Self::Tiktok => "TikTok",
            Self::Other => "Other",
        }
    }
}

/// Parsed envelope of an inbound message, independent of its channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEnvelope {
    /// Sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Subject line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Message date as sent by the ingester (RFC 3339 or RFC 2822).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Plain text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Whether the current user sent this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_sent_by_user: Option<bool>,
    /// Whether the recipient has opened this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_opened_by_recipient: Option<bool>,
}

impl ParsedEnvelope {
    /// Message time in milliseconds since the Unix epoch.
    ///
    /// Missing or unparsable dates count as the epoch, so they sort oldest.
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.date.as_deref().map_or(0, parse_date_millis)
    }
}

fn parse_date_millis(raw: &str) -> i64 {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.timestamp_millis();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.timestamp_millis();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.and_utc().timestamp_millis();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return dt.and_utc().timestamp_millis();
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(0, |dt| dt.and_utc().timestamp_millis())
}

/// One normalized inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundItem {
    /// Identifier, stable per source channel.
    #[serde(with = "super::opaque_id")]
    pub id: String,
    /// Source channel.
    #[serde(default, deserialize_with = "null_as_default")]
    pub platform: Platform,
    /// Channel-independent envelope.
    #[serde(default, deserialize_with = "null_as_default")]
    pub parsed: ParsedEnvelope,
    /// Whether the message is unread.
    #[serde(default, deserialize_with = "null_as_default")]
    pub unread: bool,
    /// Server-side AI category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_category: Option<String>,
    /// Server-side AI urgency (`high`, `medium`, `low`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_urgency: Option<String>,
    /// Server-side AI summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    /// Server-side AI recommended action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_recommended_action: Option<String>,
}

impl InboundItem {
    /// Creates a minimal email item.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            platform: Platform::Email,
            parsed: ParsedEnvelope::default(),
            unread: false,
            ai_category: None,
            ai_urgency: None,
            ai_summary: None,
            ai_recommended_action: None,
        }
    }

    /// Message time in milliseconds since the Unix epoch (0 when unknown).
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.parsed.timestamp_millis()
    }

    /// Returns true if the current user sent this and the recipient has not opened it.
    #[must_use]
    pub fn is_awaiting_reply(&self) -> bool {
        self.parsed.was_sent_by_user == Some(true)
            && self.parsed.was_opened_by_recipient == Some(false)
    }
}

/// Server-computed priority counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityTotals {
    /// High-priority items.
    #[serde(default, deserialize_with = "null_as_default")]
    pub high: u32,
    /// Medium-priority items.
    #[serde(default, deserialize_with = "null_as_default")]
    pub medium: u32,
    /// Low-priority items.
    #[serde(default, deserialize_with = "null_as_default")]
    pub low: u32,
}

impl PriorityTotals {
    /// Sum of all buckets.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.high + self.medium + self.low
    }
}

/// Response of `GET /inbox/unified`.
///
/// Items that cannot be read, or that have a blank id, are skipped so one bad
/// row never hides the rest of the inbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedInbox {
    /// Inbound items across all channels.
    #[serde(default, deserialize_with = "usable_items")]
    pub inbox: Vec<InboundItem>,
    /// Priority counts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub totals: PriorityTotals,
}

fn usable_items<'de, D>(deserializer: D) -> Result<Vec<InboundItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<serde_json::Value> = null_as_default(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| match InboundItem::deserialize(value) {
            Ok(item) if !item.id.trim().is_empty() => Some(item),
            Ok(_) => {
                warn!("Skipping inbox item without an id");
                None
            }
            Err(e) => {
                warn!("Skipping malformed inbox item: {e}");
                None
            }
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_item_defaults_to_email() {
        let item: InboundItem = serde_json::from_str(r#"{"id":"m1"}"#).unwrap();
        assert_eq!(item.platform, Platform::Email);
        assert!(!item.unread);
        assert_eq!(item.timestamp_millis(), 0);
    }

    #[test]
    fn test_null_fields_fall_back_to_defaults() {
        let json = r#"{"id":"m1","platform":null,"parsed":null,"unread":null,"aiCategory":null}"#;
        let item: InboundItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.platform, Platform::Email);
        assert_eq!(item.parsed, ParsedEnvelope::default());
        assert!(!item.unread);
        assert!(item.ai_category.is_none());
    }

    #[test]
    fn test_unusable_items_are_skipped() {
        let json = r#"{
            "inbox": [
                {"id": "good", "platform": "email", "unread": true},
                {"id": "nulls", "platform": null, "parsed": null},
                {"platform": "email"},
                {"id": null},
                {"id": "  "},
                {"id": "bad-date", "parsed": {"date": 17}},
                "not an item"
            ],
            "totals": {"high": null, "medium": 2}
        }"#;
        let inbox: UnifiedInbox = serde_json::from_str(json).unwrap();
        let ids: Vec<&str> = inbox.inbox.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["good", "nulls"]);
        assert_eq!(inbox.totals, PriorityTotals { high: 0, medium: 2, low: 0 });
    }

    #[test]
    fn test_null_inbox_and_totals() {
        let inbox: UnifiedInbox = serde_json::from_str(r#"{"inbox":null,"totals":null}"#).unwrap();
        assert_eq!(inbox, UnifiedInbox::default());
    }

    #[test]
    fn test_numeric_id_is_accepted() {
        let item: InboundItem = serde_json::from_str(r#"{"id":42,"platform":"tiktok"}"#).unwrap();
        assert_eq!(item.id, "42");
        assert_eq!(item.platform, Platform::Tiktok);
    }

    #[test]
    fn test_unknown_platform_maps_to_other() {
        let item: InboundItem = serde_json::from_str(r#"{"id":"x","platform":"sms"}"#).unwrap();
        assert_eq!(item.platform, Platform::Other);
    }

    #[test]
    fn test_camel_case_fields() {
        let json = r#"{
            "id": "m2",
            "unread": true,
            "aiCategory": "Deal",
            "aiUrgency": "high",
            "parsed": {
                "from": "brand@example.com",
                "subject": "Campaign",
                "date": "2024-03-01T10:00:00Z",
                "wasSentByUser": true,
                "wasOpenedByRecipient": false
            }
        }"#;
        let item: InboundItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.ai_category.as_deref(), Some("Deal"));
        assert!(item.is_awaiting_reply());
        assert_eq!(item.timestamp_millis(), 1_709_287_200_000);
    }

    #[test]
    fn test_date_formats() {
        let rfc2822 = ParsedEnvelope {
            date: Some("Fri, 01 Mar 2024 10:00:00 +0000".into()),
            ..ParsedEnvelope::default()
        };
        assert_eq!(rfc2822.timestamp_millis(), 1_709_287_200_000);

        let date_only = ParsedEnvelope {
            date: Some("2024-03-01".into()),
            ..ParsedEnvelope::default()
        };
        assert_eq!(date_only.timestamp_millis(), 1_709_251_200_000);

        let garbage = ParsedEnvelope {
            date: Some("next tuesday".into()),
            ..ParsedEnvelope::default()
        };
        assert_eq!(garbage.timestamp_millis(), 0);
    }

    #[test]
    fn test_awaiting_reply_requires_both_flags() {
        let mut item = InboundItem::new("a");
        assert!(!item.is_awaiting_reply());
        item.parsed.was_sent_by_user = Some(true);
        assert!(!item.is_awaiting_reply());
        item.parsed.was_opened_by_recipient = Some(true);
        assert!(!item.is_awaiting_reply());
        item.parsed.was_opened_by_recipient = Some(false);
        assert!(item.is_awaiting_reply());
    }

    #[test]
    fn test_unified_inbox_missing_fields() {
        let inbox: UnifiedInbox = serde_json::from_str("{}").unwrap();
        assert!(inbox.inbox.is_empty());
        assert_eq!(inbox.totals.total(), 0);
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!(Platform::parse("WhatsApp"), Some(Platform::Whatsapp));
        assert_eq!(Platform::parse("fax"), None);
        for platform in Platform::ALL {
            assert_eq!(Platform::parse(platform.as_str()), Some(platform));
        }
    }
}
