//! Plain-text rendering of inbox views.

use std::fmt::Write;

use chrono::{DateTime, Local};
use talentdesk_api::{ClassificationResult, DealThread, PriorityTotals};
use talentdesk_core::{InboxRow, InboxTab, SmartBucketView, TabView};

/// Renders a tab with its title and an optional inline error.
pub fn tab(tab: InboxTab, view: &TabView, error: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", tab.display_name());
    if let Some(error) = error {
        let _ = writeln!(out, "! {error}");
    }

    match view {
        TabView::Ranked { rows, totals } => {
            if let Some(totals) = totals {
                out.push_str(&priority_summary(totals));
            }
            if rows.is_empty() {
                out.push_str("No messages found.\n");
            }
            for row in rows {
                out.push_str(&inbox_row(row));
            }
        }
        TabView::Smart(buckets) => {
            if buckets.is_empty() {
                out.push_str(
                    "No categorized items yet. AI categorization runs automatically as messages arrive.\n",
                );
            }
            for bucket in buckets {
                out.push_str(&smart_bucket(bucket));
            }
        }
    }
    out
}

fn priority_summary(totals: &PriorityTotals) -> String {
    format!(
        "High: {}  Medium: {}  Low: {}\n\n",
        totals.high, totals.medium, totals.low
    )
}

fn inbox_row(row: &InboxRow) -> String {
    let mut out = String::new();
    let marker = if row.unread { "*" } else { " " };
    let _ = write!(out, "{marker} [{}] [{}]", row.platform.display_name(), row.label);
    if let Some(badge) = &row.badge {
        let _ = write!(out, " [{badge}]");
    }
    if let Some(date) = row.date.as_deref().and_then(local_date) {
        let _ = write!(out, "  {date}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", row.sender);
    let _ = writeln!(out, "  {}", row.subject);
    if !row.snippet.is_empty() {
        let _ = writeln!(out, "  {}", row.snippet);
    }
    if let Some(triage) = &row.triage {
        let urgency = triage.urgency.as_deref().unwrap_or_default();
        let flag = if triage.is_urgent() { "!" } else { "" };
        let _ = writeln!(out, "  > {} {urgency}{flag}", triage.category.to_uppercase());
        if let Some(summary) = &triage.summary {
            let _ = writeln!(out, "  > {summary}");
        }
        if let Some(action) = &triage.recommended_action {
            let _ = writeln!(out, "  > Recommended action: {action}");
        }
    }
    out.push('\n');
    out
}

fn local_date(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .ok()
        .map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
}

fn smart_bucket(view: &SmartBucketView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({} items)", view.bucket.display_name(), view.total);
    for item in &view.preview {
        let unread = if item.unread { "*" } else { " " };
        let _ = writeln!(out, " {unread} {} | {}", item.sender_display(), item.subject_display());
        if let Some(summary) = &item.ai_summary {
            let _ = writeln!(out, "     {summary}");
        }
    }
    if let Some(more) = view.more_label() {
        let _ = writeln!(out, "   {more}");
    }
    out.push('\n');
    out
}

/// Renders the deal thread list, marking the selected thread.
pub fn threads(threads: &[DealThread], selected: Option<&DealThread>) -> String {
    if threads.is_empty() {
        return "No deal threads yet. Rebuild to generate from ingested email.\n".to_string();
    }
    let mut out = String::new();
    for thread in threads {
        let marker = if selected.is_some_and(|s| s.id == thread.id) { ">" } else { " " };
        let _ = writeln!(out, "{marker} {}  {}", thread.id, thread.label());
    }
    if let Some(thread) = selected {
        out.push('\n');
        out.push_str(&thread_detail(thread));
    }
    out
}

/// Renders one deal thread with its emails.
pub fn thread_detail(thread: &DealThread) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", thread.label());
    if let Some(brand) = &thread.brand {
        let _ = writeln!(out, "Brand: {}", brand.name.as_deref().unwrap_or("Unknown"));
    }
    if let Some(email) = &thread.brand_email {
        let _ = writeln!(out, "Contact: {email}");
    }
    if thread.emails.is_empty() {
        out.push_str("No emails in this thread.\n");
    }
    for email in &thread.emails {
        let when = email.received_at.as_deref().and_then(local_date).unwrap_or_default();
        let _ = writeln!(out, "- {} {when}", email.subject.as_deref().unwrap_or("(No subject)"));
        if let Some(snippet) = &email.snippet {
            let _ = writeln!(out, "  {snippet}");
        }
    }
    out
}

/// Renders a classification result.
pub fn classification(thread_id: &str, result: &ClassificationResult) -> String {
    let mut out = format!(
        "{thread_id}: {} ({}% confidence)\n",
        result.category, result.confidence
    );
    for reason in &result.reasons {
        let _ = writeln!(out, "  - {reason}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use talentdesk_api::{CategoryItem, InboundItem, SmartBucket};

    #[test]
    fn test_empty_ranked_tab() {
        let view = TabView::Ranked {
            rows: Vec::new(),
            totals: None,
        };
        let out = tab(InboxTab::All, &view, Some("Unable to load inbox"));
        assert!(out.starts_with("== All Inbound ==\n! Unable to load inbox\n"));
        assert!(out.contains("No messages found."));
    }

    #[test]
    fn test_row_shows_label_and_badge() {
        let mut item = InboundItem::new("1");
        item.unread = true;
        item.ai_category = Some("Deal".into());
        item.parsed.subject = Some("Summer campaign".into());
        let view = TabView::Ranked {
            rows: vec![InboxRow::new(&item, None)],
            totals: Some(PriorityTotals {
                high: 1,
                medium: 0,
                low: 0,
            }),
        };

        let out = tab(InboxTab::Priority, &view, None);
        assert!(out.contains("High: 1  Medium: 0  Low: 0"));
        assert!(out.contains("* [Email] [Analysing…] [AI: Deal Opportunity]"));
        assert!(out.contains("Summer campaign"));
        assert!(out.contains("> DEAL"));
    }

    #[test]
    fn test_smart_bucket_footer() {
        let view = SmartBucketView {
            bucket: SmartBucket::Gifting,
            total: 6,
            preview: vec![CategoryItem::default()],
            remaining: 5,
        };
        let out = tab(InboxTab::SmartCategories, &TabView::Smart(vec![view]), None);
        assert!(out.contains("Gifting & PR (6 items)"));
        assert!(out.contains("Unknown sender | No subject"));
        assert!(out.contains("+5 more items"));
    }

    #[test]
    fn test_classification() {
        let result = ClassificationResult::new("Deal", 91).with_reason("Budget mentioned");
        assert_eq!(
            classification("abc", &result),
            "abc: Deal (91% confidence)\n  - Budget mentioned\n"
        );
    }
}
