// User-friendly error messages
//
// Turns API and setup failures into actionable text for the terminal.

use anyhow::{Context, Result};
use std::fmt;

use crate::api::ApiError;

/// Wrap an error with user-friendly context
pub trait UserFriendlyError {
    /// Add user-friendly context with a suggestion
    fn user_context_with_suggestion(self, problem: &str, suggestion: &str) -> Self;
}

impl<T> UserFriendlyError for Result<T> {
    fn user_context_with_suggestion(self, problem: &str, suggestion: &str) -> Self {
        self.with_context(|| wrap_error_with_suggestion(problem, suggestion))
    }
}

/// One-line description of an API failure, suitable for a notification
pub fn describe(error: &ApiError) -> String {
    match error {
        ApiError::Validation(msg) => msg.clone(),
        ApiError::Http { status, .. } => match error.server_message() {
            Some(message) => message,
            None => format!("Server returned HTTP {}", status),
        },
        ApiError::Transport(e) => format!("Error: {}", e),
        ApiError::Decode { .. } => "Unexpected response from server".to_string(),
        ApiError::InvalidUrl(msg) => format!("Invalid server address: {}", msg),
    }
}

/// What the user can do about an API failure, if anything useful applies
pub fn suggestion_for(error: &ApiError) -> Option<String> {
    match error {
        ApiError::Http { status: 401, .. } | ApiError::Http { status: 403, .. } => Some(
            "Your session may have expired. Sign in again:\n   \
             \x1b[36mspontime login --email <email>\x1b[0m"
                .to_string(),
        ),
        ApiError::Transport(e) if e.is_timeout() => Some(
            "The server did not answer in time. Raise timeout_seconds in \
             ~/.spontime/config.toml or try again later."
                .to_string(),
        ),
        ApiError::Transport(_) | ApiError::InvalidUrl(_) => Some(
            "Check the server address:\n   \
             \x1b[36mcat ~/.spontime/config.toml\x1b[0m\n   \
             or set \x1b[36mSPONTIME_API_BASE_URL\x1b[0m"
                .to_string(),
        ),
        ApiError::Decode { .. } => Some(
            "The server answered with something other than the expected JSON. \
             Make sure api_base_url points at the API root (usually ending in /api/)."
                .to_string(),
        ),
        _ => None,
    }
}

/// Format a session file error with helpful suggestions
pub fn session_file_error(path: &str, error: &str) -> String {
    format!(
        "Could not access the session file {}\n\n\
        \x1b[1;33mError:\x1b[0m {}\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Check file permissions:\n\
           \x1b[36mls -la {}\x1b[0m\n\n\
        2. Remove the file and sign in again:\n\
           \x1b[36mrm {}\x1b[0m\n\
           \x1b[36mspontime login --email <email>\x1b[0m",
        path, error, path, path
    )
}

/// Wrap a generic error with suggestions
pub fn wrap_error_with_suggestion(error: impl fmt::Display, suggestion: &str) -> String {
    format!(
        "{}\n\n\
        \x1b[1;33mSuggestion:\x1b[0m {}",
        error, suggestion
    )
}
