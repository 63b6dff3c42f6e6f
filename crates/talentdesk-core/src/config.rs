//! Timing configuration for the inbox pipeline.

use std::time::Duration;

use crate::classification::DEFAULT_REFRESH_INTERVAL;
use crate::{Error, Result};

/// Default interval between background refetches of the unified inbox.
pub const DEFAULT_INBOX_REFETCH: Duration = Duration::from_secs(60);

/// Refresh intervals used by [`InboxService`](crate::InboxService).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboxConfig {
    /// Interval between classification refreshes of a watched thread.
    pub classification_refresh: Duration,
    /// Interval between background inbox refetches; `None` disables polling.
    pub inbox_refetch: Option<Duration>,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            classification_refresh: DEFAULT_REFRESH_INTERVAL,
            inbox_refetch: Some(DEFAULT_INBOX_REFETCH),
        }
    }
}

impl InboxConfig {
    /// Builds a config from whole seconds; `0` disables inbox polling.
    #[must_use]
    pub const fn from_secs(classification_refresh_secs: u64, inbox_refetch_secs: u64) -> Self {
        Self {
            classification_refresh: Duration::from_secs(classification_refresh_secs),
            inbox_refetch: if inbox_refetch_secs == 0 {
                None
            } else {
                Some(Duration::from_secs(inbox_refetch_secs))
            },
        }
    }

    /// Checks that every interval is at least one second.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the offending interval.
    pub fn validate(&self) -> Result<()> {
        if self.classification_refresh < Duration::from_secs(1) {
            return Err(Error::Config(
                "classification refresh interval must be at least 1 second".into(),
            ));
        }
        if self.inbox_refetch.is_some_and(|d| d < Duration::from_secs(1)) {
            return Err(Error::Config(
                "inbox refetch interval must be at least 1 second".into(),
            ));
        }
        Ok(())
    }
}
