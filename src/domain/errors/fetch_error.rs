//! History fetch error types.

use thiserror::Error;

/// Errors surfaced by the message history port.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum FetchError {
    #[error("network error while fetching messages: {message}")]
    Network { message: String },

    #[error("API rejected the request with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("failed to decode response: {message}")]
    Decode { message: String },

    #[error("unexpected fetch error: {message}")]
    Unexpected { message: String },
}

impl FetchError {
    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an API error.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns whether a retry is worthwhile.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::RateLimited { .. } | Self::Api { status: 500..=599, .. }
        )
    }
}
