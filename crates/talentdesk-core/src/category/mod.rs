//! Thread categories and inbox filters.
//!
//! This module provides:
//! - **Thread categories**: the closed set of labels the AI classifier assigns,
//!   each with a fixed priority weight
//! - **Filters**: independent channel and category filters for the inbox tabs
//! - **Badges**: short AI triage labels shown next to each item
//!
//! # Example
//!
//! ```ignore
//! use talentdesk_core::category::{CategoryFilter, ThreadCategory};
//!
//! let category = ThreadCategory::parse("Deal");
//! assert_eq!(category.map(|c| c.weight()), Some(100));
//! assert!(CategoryFilter::Deals.matches(category));
//! ```

mod model;

pub use model::{CategoryFilter, ChannelFilter, ThreadCategory, ai_badge};
