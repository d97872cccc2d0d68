//! Account Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, AccountError>;

/// Identity, session and user-record errors
#[derive(Error, Debug)]
pub enum AccountError {
    /// No user record for this id
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Sign-up with an email that already has an identity
    #[error("Email already registered: {0}")]
    EmailTaken(String),

    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Malformed email address
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password below the minimum length
    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    /// Bearer token missing, unknown or revoked
    #[error("Session invalid")]
    SessionInvalid,

    /// Password hashing failure
    #[error("Hash error: {0}")]
    Hash(String),
}

impl AccountError {
    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::UserNotFound(_) => "Account not found.",
            Self::EmailTaken(_) => "This email address is already in use.",
            Self::InvalidCredentials => "Email or password is incorrect.",
            Self::InvalidEmail(_) => "Please enter a valid email address.",
            Self::WeakPassword(_) => "Password must be at least 6 characters.",
            Self::SessionInvalid => "Your session has ended. Please sign in again.",
            Self::Hash(_) => "An error occurred. Please try again.",
        }
    }
}
