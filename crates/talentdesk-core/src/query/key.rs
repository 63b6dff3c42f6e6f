//! Stable query keys.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::Result;

/// Cache slot address: a key tuple serialized as stable JSON.
///
/// Tuples and slices serialize as JSON arrays in order, and object keys are
/// sorted, so logically equal keys always map to the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    /// Builds a key from any serializable tuple, e.g. `("inbox", "unified")`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parts cannot be represented as JSON.
    pub fn new<K: Serialize + ?Sized>(parts: &K) -> Result<Self> {
        let value = canonicalize(serde_json::to_value(parts)?);
        Ok(Self(value.to_string()))
    }

    /// Builds a key from string parts; never fails.
    #[must_use]
    pub fn from_parts(parts: &[&str]) -> Self {
        Self(Value::from(parts.to_vec()).to_string())
    }

    /// The serialized key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `prefix` equals this key or names its leading tuple elements.
    ///
    /// `["inbox"]` is a prefix of `["inbox","unified"]` but not of
    /// `["inboxes"]`.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        if self == prefix {
            return true;
        }
        let Some(head) = prefix.0.strip_suffix(']') else {
            return false;
        };
        if head == "[" {
            return self.0.starts_with('[');
        }
        self.0
            .strip_prefix(head)
            .is_some_and(|rest| rest.starts_with(','))
    }
}

/// Rebuilds objects with their keys in sorted order, at every depth.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_tuple_key_is_stable() {
        let a = QueryKey::new(&("a", 1)).unwrap();
        let b = QueryKey::new(&("a", 1)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), r#"["a",1]"#);
    }

    #[test]
    fn test_order_matters() {
        assert_ne!(
            QueryKey::new(&("a", "b")).unwrap(),
            QueryKey::new(&("b", "a")).unwrap()
        );
    }

    #[test]
    fn test_object_keys_are_sorted() {
        let mut first = HashMap::new();
        first.insert("page", 2);
        first.insert("limit", 50);
        let mut second = HashMap::new();
        second.insert("limit", 50);
        second.insert("page", 2);
        assert_eq!(
            QueryKey::new(&("threads", &first)).unwrap(),
            QueryKey::new(&("threads", &second)).unwrap()
        );
    }

    #[test]
    fn test_prefix_matching() {
        let key = QueryKey::from_parts(&["inbox", "unified"]);
        assert!(key.starts_with(&key));
        assert!(key.starts_with(&QueryKey::from_parts(&["inbox"])));
        assert!(key.starts_with(&QueryKey::from_parts(&[])));
        assert!(!key.starts_with(&QueryKey::from_parts(&["inb"])));
        assert!(!key.starts_with(&QueryKey::from_parts(&["inbox", "unified", "x"])));
        assert!(!QueryKey::from_parts(&["inboxes"]).starts_with(&QueryKey::from_parts(&["inbox"])));
    }

    #[test]
    fn test_from_parts_matches_new() {
        assert_eq!(
            QueryKey::from_parts(&["inbox", "unified"]),
            QueryKey::new(&["inbox", "unified"]).unwrap()
        );
    }
}
