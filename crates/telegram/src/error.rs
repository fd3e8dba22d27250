//! Error types for Telegram channel delivery.
//!
//! Provides typed errors for configuration, API communication, and
//! diagnostic-file handling.

use thiserror::Error;

/// Errors that can occur when delivering to a Telegram channel.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Client configuration is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The API answered with a non-success status.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error message from the API.
        message: String,
    },

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Diagnostic file I/O failed.
    #[error("diagnostic file error: {0}")]
    Diagnostic(#[from] std::io::Error),
}

impl TelegramError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// True when the failure is a per-chunk delivery failure that the
    /// send loop recovers from with a truncated retry.
    #[must_use]
    pub fn is_chunk_failure(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// True when the messaging endpoint could not be reached at all, in
    /// which case no further chunks are attempted.
    #[must_use]
    pub fn is_connectivity_failure(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type alias for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;
