//! Priority ordering of inbox items.
//!
//! Items are ordered by category weight, then unread before read, then newest
//! first, then by id. The last step makes the order total over distinct items,
//! so ranking is independent of the input order.

use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

use talentdesk_api::{ClassificationResult, InboundItem};

use crate::category::ThreadCategory;

/// Client-side classifications keyed by thread id.
pub type Classifications = HashMap<String, ClassificationResult>;

/// Category label of an item: the client classification when present,
/// otherwise the server-side `aiCategory`.
#[must_use]
pub fn category_label<'a>(item: &'a InboundItem, classifications: &'a Classifications) -> Option<&'a str> {
    classifications
        .get(&item.id)
        .map(|c| c.category.as_str())
        .or(item.ai_category.as_deref())
}

/// Resolved category of an item, `None` when unclassified or unknown.
#[must_use]
pub fn resolve_category(item: &InboundItem, classifications: &Classifications) -> Option<ThreadCategory> {
    category_label(item, classifications).and_then(ThreadCategory::parse)
}

/// Sort key; smaller sorts first.
type PriorityKey = (Reverse<u8>, Reverse<bool>, Reverse<i64>, String);

fn priority_key(item: &InboundItem, classifications: &Classifications) -> PriorityKey {
    (
        Reverse(ThreadCategory::weight_of(category_label(item, classifications))),
        Reverse(item.unread),
        Reverse(item.timestamp_millis()),
        item.id.clone(),
    )
}

/// Compares two items by display priority. `Less` means `a` is shown first.
#[must_use]
pub fn compare(a: &InboundItem, b: &InboundItem, classifications: &Classifications) -> Ordering {
    priority_key(a, classifications).cmp(&priority_key(b, classifications))
}

/// Returns the items in display order.
#[must_use]
pub fn rank(mut items: Vec<InboundItem>, classifications: &Classifications) -> Vec<InboundItem> {
    items.sort_by_cached_key(|item| priority_key(item, classifications));
    items
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const T: i64 = 1_700_000_000_000;

    fn item(id: &str, category: Option<&str>, unread: bool, millis: Option<i64>) -> InboundItem {
        let mut item = InboundItem::new(id);
        item.ai_category = category.map(ToString::to_string);
        item.unread = unread;
        item.parsed.date = millis.map(|ms| {
            chrono::DateTime::from_timestamp_millis(ms)
                .unwrap()
                .to_rfc3339()
        });
        item
    }

    fn ids(items: &[InboundItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_category_dominates() {
        let items = vec![
            item("1", Some("Deal"), false, Some(T)),
            item("2", Some("Spam"), true, Some(T + 1_000)),
            item("3", Some("Event"), true, Some(T - 1_000)),
        ];
        let ranked = rank(items, &Classifications::new());
        assert_eq!(ids(&ranked), vec!["1", "3", "2"]);
    }

    #[test]
    fn test_unread_beats_newer() {
        let items = vec![
            item("read", Some("Deal"), false, Some(T + 10_000)),
            item("unread", Some("Deal"), true, Some(T)),
        ];
        let ranked = rank(items, &Classifications::new());
        assert_eq!(ids(&ranked), vec!["unread", "read"]);
    }

    #[test]
    fn test_newer_first_within_tier() {
        let items = vec![
            item("old", Some("PR"), true, Some(T)),
            item("new", Some("PR"), true, Some(T + 1)),
            item("undated", Some("PR"), true, None),
        ];
        let ranked = rank(items, &Classifications::new());
        assert_eq!(ids(&ranked), vec!["new", "old", "undated"]);
    }

    #[test]
    fn test_unknown_category_ranks_below_scam() {
        let items = vec![
            item("unknown", Some("unknown"), true, Some(T + 5)),
            item("scam", Some("Scam"), false, Some(T)),
            item("unclassified", None, true, Some(T + 9)),
        ];
        let ranked = rank(items, &Classifications::new());
        assert_eq!(ranked[0].id, "scam");
    }

    #[test]
    fn test_client_classification_overrides_server_category() {
        let items = vec![
            item("a", Some("Spam"), false, Some(T)),
            item("b", Some("Deal"), false, Some(T)),
        ];
        let mut classifications = Classifications::new();
        classifications.insert("a".into(), ClassificationResult::new("Deal", 90));
        classifications.insert("b".into(), ClassificationResult::new("Scam", 90));
        let ranked = rank(items, &classifications);
        assert_eq!(ids(&ranked), vec!["a", "b"]);
        assert_eq!(
            resolve_category(&ranked[1], &classifications),
            Some(ThreadCategory::Scam)
        );
    }

    #[test]
    fn test_empty_and_single() {
        assert!(rank(Vec::new(), &Classifications::new()).is_empty());
        let single = vec![item("only", None, false, None)];
        assert_eq!(rank(single.clone(), &Classifications::new()), single);
    }

    #[test]
    fn test_full_tie_falls_back_to_id() {
        let a = item("a", Some("Other"), true, Some(T));
        let b = item("b", Some("Other"), true, Some(T));
        assert_eq!(compare(&a, &b, &Classifications::new()), Ordering::Less);
        assert_eq!(compare(&b, &a, &Classifications::new()), Ordering::Greater);
        assert_eq!(compare(&a, &a, &Classifications::new()), Ordering::Equal);
    }

    fn arb_item() -> impl Strategy<Value = InboundItem> {
        let categories = prop::option::of(prop::sample::select(vec![
            "Deal", "Event", "PR", "Gifting", "Other", "Spam", "Scam", "unknown",
        ]));
        (
            "[a-z0-9]{1,4}",
            categories,
            any::<bool>(),
            prop::option::of(0i64..4_000_000_000_000),
        )
            .prop_map(|(id, category, unread, millis)| item(&id, category, unread, millis))
    }

    proptest! {
        #[test]
        fn prop_rank_is_idempotent(items in prop::collection::vec(arb_item(), 0..40)) {
            let classifications = Classifications::new();
            let once = rank(items, &classifications);
            let twice = rank(once.clone(), &classifications);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_rank_ignores_input_order(items in prop::collection::vec(arb_item(), 0..40)) {
            // Distinct ids, so no two items are fully tied.
            let items: Vec<InboundItem> = items
                .into_iter()
                .enumerate()
                .map(|(i, mut item)| {
                    item.id = format!("{i}-{}", item.id);
                    item
                })
                .collect();
            let classifications = Classifications::new();
            let mut reversed = items.clone();
            reversed.reverse();
            prop_assert_eq!(rank(items, &classifications), rank(reversed, &classifications));
        }

        #[test]
        fn prop_ranked_output_is_sorted(items in prop::collection::vec(arb_item(), 0..40)) {
            let classifications = Classifications::new();
            let ranked = rank(items, &classifications);
            for pair in ranked.windows(2) {
                prop_assert_ne!(compare(&pair[0], &pair[1], &classifications), Ordering::Greater);
            }
        }

        #[test]
        fn prop_equal_tier_newer_first(
            a in arb_item(),
            older in 0i64..1_000_000,
            newer in 1_000_001i64..2_000_000,
        ) {
            let classifications = Classifications::new();
            let newer_item = item("x", a.ai_category.as_deref(), a.unread, Some(T + newer));
            let older_item = item("y", a.ai_category.as_deref(), a.unread, Some(T + older));
            prop_assert_eq!(compare(&newer_item, &older_item, &classifications), Ordering::Less);
            prop_assert_eq!(compare(&older_item, &newer_item, &classifications), Ordering::Greater);
        }
    }
}
