//! Billing Error Types

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, BillingError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// Gateway call failed
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Payment token unknown or already used
    #[error("Payment token not found: {0}")]
    TokenNotFound(String),

    /// Card details rejected before submission
    #[error("Invalid card details: {0}")]
    InvalidCard(String),

    /// Plan id not in the catalog
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),

    /// Requested amount differs from the catalog price
    #[error("Amount mismatch: expected {expected} {currency}, got {got}")]
    AmountMismatch {
        expected: Decimal,
        got: Decimal,
        currency: String,
    },

    /// Receipt signature verification failed
    #[error("Receipt signature invalid: {0}")]
    SignatureInvalid(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BillingError {
    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::Gateway(_) => "Payment processing failed. Please try again.",
            Self::TokenNotFound(_) => "This payment session has expired. Please start again.",
            Self::InvalidCard(_) => "Please fill in all card details correctly.",
            Self::UnknownPlan(_) => "That subscription plan does not exist.",
            Self::AmountMismatch { .. } => "The payment amount does not match the selected plan.",
            Self::SignatureInvalid(_) => "The payment could not be verified.",
            Self::Config(_) => "Service configuration error.",
        }
    }
}
