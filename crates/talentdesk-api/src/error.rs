//! Error types for backend API operations.

use serde::Deserialize;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// API error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure (connection refused, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with a non-2xx status.
    #[error("API error (HTTP {status}): {}", .message.as_deref().unwrap_or("request failed"))]
    Api {
        /// HTTP status code.
        status: u16,
        /// `message` or `error` field of the response body, if any.
        message: Option<String>,
    },

    /// The response was well-formed JSON but missing required fields.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A request argument was rejected before anything was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Returns true if the request never produced an HTTP response.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// Renders the error as inline text for the panel that triggered `action`.
    ///
    /// Server-provided messages are surfaced verbatim; everything else
    /// collapses to "Unable to {action}".
    #[must_use]
    pub fn user_message(&self, action: &str) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::InvalidInput(reason) => reason.clone(),
            _ => format!("Unable to {action}"),
        }
    }
}

/// Error payload returned by the backend on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    /// Parses an error body leniently; anything unparsable yields no message.
    pub(crate) fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// Converts to an [`Error::Api`], preferring `message` over `error`.
    pub(crate) fn into_error(self, status: u16) -> Error {
        Error::Api {
            status,
            message: self.message.or(self.error),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_prefers_message() {
        let body = ErrorBody::parse(br#"{"message":"Thread not found","error":"NOT_FOUND"}"#);
        let err = body.into_error(404);
        assert_eq!(err.user_message("load thread"), "Thread not found");
    }

    #[test]
    fn test_error_body_falls_back_to_error_field() {
        let body = ErrorBody::parse(br#"{"error":"Rate limited"}"#);
        let err = body.into_error(429);
        assert_eq!(err.user_message("classify thread"), "Rate limited");
    }

    #[test]
    fn test_unparsable_body_uses_generic_message() {
        let body = ErrorBody::parse(b"<html>502 Bad Gateway</html>");
        let err = body.into_error(502);
        assert!(matches!(err, Error::Api { status: 502, message: None }));
        assert_eq!(err.user_message("load inbox"), "Unable to load inbox");
        assert_eq!(err.to_string(), "API error (HTTP 502): request failed");
    }

    #[test]
    fn test_blank_message_uses_generic_message() {
        let err = Error::Api {
            status: 500,
            message: Some("  ".into()),
        };
        assert_eq!(err.user_message("load inbox"), "Unable to load inbox");
    }

    #[test]
    fn test_invalid_response_is_generic() {
        let err = Error::InvalidResponse("missing category".into());
        assert!(!err.is_network());
        assert_eq!(err.user_message("classify thread"), "Unable to classify thread");
    }
}
