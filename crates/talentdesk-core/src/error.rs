//! Error types for the inbox pipeline.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] talentdesk_api::Error),

    /// A thread identifier was empty.
    #[error("Invalid thread id: {0:?}")]
    InvalidThreadId(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Renders the error as inline text for the panel that triggered `action`.
    #[must_use]
    pub fn user_message(&self, action: &str) -> String {
        match self {
            Self::Api(e) => e.user_message(action),
            Self::InvalidThreadId(_) => "A thread id is required".to_string(),
            Self::Serde(_) | Self::Config(_) => format!("Unable to {action}"),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
