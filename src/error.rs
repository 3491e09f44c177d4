//! Error types for the Telegram client
//!
//! Provides strongly-typed errors that fail fast with clear messages.

use thiserror::Error;

/// Result type alias for Telegram operations
pub type Result<T> = std::result::Result<T, TelegramError>;

/// Telegram client error types
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Telegram client is not initialized
    #[error("Telegram client not initialized - call start() first")]
    ClientNotInitialized,

    /// Telegram client is already running
    #[error("Telegram client is already running")]
    AlreadyRunning,

    /// Failed to connect to Telegram
    #[error("Failed to connect to Telegram: {0}")]
    ConnectionFailed(String),

    /// Teloxide library error
    #[error("Telegram API error: {0}")]
    ApiError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Missing required setting
    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An action with the same name is already registered
    #[error("Action already registered: {0}")]
    DuplicateAction(String),

    /// A poll command was rejected
    #[error(transparent)]
    InvalidPoll(#[from] PollError),

    /// The runtime failed to compose conversational state
    #[error("Failed to compose state: {0}")]
    StateComposition(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TelegramError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TelegramError::ConnectionFailed(_) | TelegramError::ApiError(_)
        )
    }
}

impl From<serde_json::Error> for TelegramError {
    fn from(err: serde_json::Error) -> Self {
        TelegramError::SerializationError(err.to_string())
    }
}

/// Reasons a poll command is rejected.
///
/// The `Display` output is shown to the chat user verbatim after the
/// `Failed to create poll:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// Fewer than three lines (command, question, at least one option).
    #[error("Invalid poll format. Please use format:\n/poll\nYour question\nOption 1\nOption 2\n[Option 3...]")]
    InvalidFormat,

    /// Empty question, an empty option, or an option count outside 2..=10.
    #[error("Poll must have a question and between 2-10 options.")]
    InvalidContent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelegramError::MissingSetting("TELEGRAM_BOT_TOKEN".to_string());
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));

        let err = TelegramError::StateComposition("database offline".to_string());
        assert_eq!(err.to_string(), "Failed to compose state: database offline");
    }

    #[test]
    fn test_error_retryable() {
        assert!(TelegramError::ConnectionFailed("reset".to_string()).is_retryable());
        assert!(!TelegramError::ClientNotInitialized.is_retryable());
        assert!(!TelegramError::DuplicateAction("CREATE_POLL".to_string()).is_retryable());
    }

    #[test]
    fn test_invalid_poll_is_transparent() {
        let err: TelegramError = PollError::InvalidContent.into();
        assert_eq!(err.to_string(), PollError::InvalidContent.to_string());
    }

    #[test]
    fn test_poll_error_messages() {
        assert!(PollError::InvalidFormat.to_string().starts_with("Invalid poll format."));
        assert!(PollError::InvalidFormat.to_string().contains("/poll\nYour question"));
        assert_eq!(
            PollError::InvalidContent.to_string(),
            "Poll must have a question and between 2-10 options."
        );
    }
}
