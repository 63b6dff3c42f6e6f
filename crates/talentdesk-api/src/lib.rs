//! # talentdesk-api
//!
//! Typed async client for the `TalentDesk` inbox backend.
//!
//! This crate provides:
//! - Wire types for the unified inbox, AI thread classification, smart
//!   category buckets and reconstructed deal threads
//! - [`ApiClient`], a `reqwest` client for the REST/JSON contract
//! - An error type that renders backend failures as inline UI text
//!
//! ## Quick Start
//!
//! ```ignore
//! use talentdesk_api::ApiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new("http://localhost:5001")?;
//!
//!     let inbox = client.unified_inbox().await?;
//!     println!("{} items, {} high priority", inbox.inbox.len(), inbox.totals.high);
//!
//!     let classification = client.classify_thread(&inbox.inbox[0].id).await?;
//!     println!("{} ({}%)", classification.category, classification.confidence);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod types;

pub use client::ApiClient;
pub use error::{Error, Result};
pub use types::{
    BrandRef, CategoryItem, ClassificationResult, DealThread, InboundItem, ParsedEnvelope,
    Platform, PriorityTotals, SmartBucket, SmartCategories, ThreadEmail, UnifiedInbox,
};
