//! Shared query cache.
//!
//! This module provides:
//! - **Keys**: ordered tuples serialized as stable JSON, one cache slot per
//!   distinct serialization
//! - **Cache**: the last data or error per key, with per-key subscriptions
//!   and per-key write sequencing
//! - **Queries**: a fetch function bound to a key that refreshes itself until
//!   it succeeds, with optional background polling
//!
//! # Example
//!
//! ```ignore
//! use talentdesk_core::query::{Query, QueryCache, QueryKey};
//!
//! let cache = QueryCache::new();
//! let key = QueryKey::from_parts(&["inbox", "unified"]);
//! let mut updates = cache.subscribe(&key);
//!
//! let query = Query::new(cache.clone(), key, "load inbox", move || {
//!     let client = client.clone();
//!     async move { Ok(client.unified_inbox().await?) }
//! });
//! let state = query.refresh().await;
//! assert!(updates.try_next().is_some());
//! ```

mod cache;
mod hook;
mod key;

pub use cache::{CacheEntry, CacheEvent, CacheEventKind, QueryCache, QueryStatus, QuerySubscription};
pub use hook::{PollHandle, Query, QueryState};
pub use key::QueryKey;
