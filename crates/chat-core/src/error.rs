//! Error Types

use thiserror::Error;

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

/// Chat error types
#[derive(Error, Debug)]
pub enum ChatError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not configured
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Chat not found in the caller's session
    #[error("Chat not found: {0}")]
    ChatNotFound(String),

    /// Daily message quota exhausted
    #[error("Daily limit reached ({used}/{limit})")]
    QuotaExceeded { used: u32, limit: u32 },

    /// Image generation requested by a tier that may not use it
    #[error("Image generation requires the pro plan")]
    ImageNotAllowed,

    /// Empty or otherwise unusable input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChatError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(_) | Self::ProviderUnavailable(_) => {
                "Sorry, I'm having a technical problem right now. Please try again later.".into()
            }
            Self::ChatNotFound(_) => "That conversation no longer exists.".into(),
            Self::QuotaExceeded { limit, .. } => format!(
                "You've used all {limit} messages for today. Upgrade to Pro for unlimited messages."
            ),
            Self::ImageNotAllowed => "Image generation is available on the Pro plan.".into(),
            Self::InvalidInput(msg) => msg.clone(),
            Self::Config(_) => "The assistant is not configured on this server.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_hide_internals() {
        let err = ChatError::ProviderUnavailable("connection refused at 10.0.0.5".into());
        assert!(!err.user_message().contains("10.0.0.5"));

        let err = ChatError::Config("OPENAI_API_KEY not set".into());
        assert!(!err.user_message().contains("OPENAI_API_KEY"));

        let err = ChatError::QuotaExceeded { used: 20, limit: 20 };
        assert!(err.user_message().contains("20 messages"));

        let err = ChatError::InvalidInput("Message cannot be empty".into());
        assert_eq!(err.user_message(), "Message cannot be empty");
    }
}
