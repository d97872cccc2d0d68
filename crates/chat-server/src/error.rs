//! API Errors
//!
//! Every failure leaves the server as `{ "error": <user message>, "code": <CODE> }`
//! with a matching status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chat_accounts::AccountError;
use chat_billing::BillingError;
use chat_core::ChatError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            AccountError::SessionInvalid.user_message(),
        )
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, "{}", self.message);
        }

        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                code: self.code.into(),
            }),
        )
            .into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let (status, code) = match &err {
            ChatError::ChatNotFound(_) => (StatusCode::NOT_FOUND, "CHAT_NOT_FOUND"),
            ChatError::QuotaExceeded { .. } => (StatusCode::TOO_MANY_REQUESTS, "QUOTA_EXCEEDED"),
            ChatError::ImageNotAllowed => (StatusCode::FORBIDDEN, "IMAGE_NOT_ALLOWED"),
            ChatError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ChatError::Provider(_) | ChatError::ProviderUnavailable(_) => {
                (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR")
            }
            ChatError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CHAT_ERROR"),
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "Chat error");
        }
        Self::new(status, code, err.user_message())
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        let (status, code) = match &err {
            AccountError::UserNotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            AccountError::EmailTaken(_) => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
            AccountError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AccountError::InvalidEmail(_) => (StatusCode::BAD_REQUEST, "INVALID_EMAIL"),
            AccountError::WeakPassword(_) => (StatusCode::BAD_REQUEST, "WEAK_PASSWORD"),
            AccountError::SessionInvalid => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AccountError::Hash(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ACCOUNT_ERROR"),
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "Account error");
        }
        Self::new(status, code, err.user_message())
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        let (status, code) = match &err {
            BillingError::TokenNotFound(_) => (StatusCode::NOT_FOUND, "PAYMENT_NOT_FOUND"),
            BillingError::InvalidCard(_) => (StatusCode::BAD_REQUEST, "INVALID_CARD"),
            BillingError::UnknownPlan(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_PLAN"),
            BillingError::AmountMismatch { .. } => (StatusCode::BAD_REQUEST, "AMOUNT_MISMATCH"),
            BillingError::SignatureInvalid(_) => (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE"),
            BillingError::Gateway(_) => (StatusCode::BAD_GATEWAY, "PAYMENT_ERROR"),
            BillingError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PAYMENTS_DISABLED"),
        };
        tracing::warn!(error = %err, "Billing error");
        Self::new(status, code, err.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_maps_to_429() {
        let err = ApiError::from(ChatError::QuotaExceeded { used: 20, limit: 20 });
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.code, "QUOTA_EXCEEDED");
        assert!(err.message.contains("20"));
    }

    #[test]
    fn test_image_maps_to_403() {
        let err = ApiError::from(ChatError::ImageNotAllowed);
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, "IMAGE_NOT_ALLOWED");
    }

    #[test]
    fn test_config_error_is_internal() {
        let err = ApiError::from(ChatError::Config("OPENAI_API_KEY not set".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "CHAT_ERROR");
        assert!(!err.message.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_account_and_billing_codes() {
        assert_eq!(
            ApiError::from(AccountError::EmailTaken("a@b.co".into())).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(BillingError::TokenNotFound("pay_x".into())).code,
            "PAYMENT_NOT_FOUND"
        );
    }
}
