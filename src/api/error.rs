//! API client error types

use thiserror::Error;

use super::types::ErrorResponse;

/// Errors surfaced by `ApiClient` calls
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected locally before any request was sent
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The server answered with a non-success status
    #[error("Server returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// No response was received (DNS, connect, timeout, reset)
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Success status, but the body was absent or did not match the expected shape
    #[error("Failed to decode response (HTTP {status}): {source}")]
    Decode {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// Endpoint URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } | ApiError::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body when a response was received
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            ApiError::Http { body, .. } | ApiError::Decode { body, .. } => Some(body),
            _ => None,
        }
    }

    /// True when no response was received at all
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Transport(e) if e.is_timeout())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Http { status: 401, .. })
    }

    /// The server's `error`/`detail` text, if the body carries the error envelope
    pub fn server_message(&self) -> Option<String> {
        let body = match self {
            ApiError::Http { body, .. } => body,
            _ => return None,
        };

        serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|envelope| envelope.message().map(str::to_string))
    }
}
