//! # talentdesk-core
//!
//! Priority inbox pipeline for the `TalentDesk` CRM.
//!
//! This crate provides:
//! - **Ranking** - deterministic priority order over inbound messages
//! - **Classification cache** - per-thread AI classifications kept fresh by
//!   watchers while a thread is on screen
//! - **Query cache** - shared fetch results with per-key subscriptions and
//!   sequenced writes
//! - **Inbox views** - priority, awaiting-reply, smart-category and all tabs
//! - **Inbox service** - the above wired to the backend client

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod category;
pub mod classification;
mod config;
mod error;
pub mod query;
pub mod ranking;
pub mod service;
pub mod view;

pub use category::{CategoryFilter, ChannelFilter, ThreadCategory, ai_badge};
pub use classification::{
    ANALYSING_LABEL, ClassificationCache, ClassificationState, ClassificationWatcher,
    ThreadClassifier,
};
pub use config::{DEFAULT_INBOX_REFETCH, InboxConfig};
pub use error::{Error, Result};
pub use query::{Query, QueryCache, QueryKey, QueryState, QueryStatus};
pub use ranking::{Classifications, rank};
pub use service::{InboxService, select_thread};
pub use view::{InboxFilters, InboxRow, InboxTab, SmartBucketView, TabView, Triage};
