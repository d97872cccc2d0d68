//! Hosted Payment Gateway
//!
//! Request → redirect → callback flow against a hosted payment page:
//!
//! ```text
//! ┌─────────────┐ create  ┌──────────────────┐ card   ┌─────────────┐
//! │  Pricing    │────────▶│  Payment page     │───────▶│  Callback   │
//! │  (plan id)  │  token  │  (?token=&plan=)  │ receipt│  (upgrade)  │
//! └─────────────┘         └──────────────────┘        └─────────────┘
//! ```
//!
//! `MockGateway` stands in for the real processor: it never sees real money,
//! waits a configurable delay and always approves well-formed cards.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};
use crate::plan;
use crate::receipt::{PaymentReceipt, ReceiptSigner};

/// Request to start a payment
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub plan_id: String,
    pub user_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
    /// Where the payment page returns the user to
    pub callback_url: String,
}

/// A started payment
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub token: String,
    pub payment_page_url: String,
}

/// Card data as typed on the payment page
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvc: String,
    pub card_holder_name: String,
}

impl CardDetails {
    /// Reject incomplete or malformed card data before it reaches the gateway
    pub fn validate(&self) -> Result<()> {
        let fields = [
            &self.card_number,
            &self.expiry_month,
            &self.expiry_year,
            &self.cvc,
            &self.card_holder_name,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(BillingError::InvalidCard("all card fields are required".into()));
        }

        let digits: String = self.card_number.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(BillingError::InvalidCard("card number must be 16 digits".into()));
        }

        match self.expiry_month.trim().parse::<u8>() {
            Ok(1..=12) => {}
            _ => return Err(BillingError::InvalidCard("invalid expiry month".into())),
        }

        let cvc = self.cvc.trim();
        if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
            return Err(BillingError::InvalidCard("invalid CVC".into()));
        }

        Ok(())
    }

    /// Last four digits, safe to log
    pub fn last4(&self) -> String {
        let digits: Vec<char> = self.card_number.chars().filter(char::is_ascii_digit).collect();
        digits[digits.len().saturating_sub(4)..].iter().collect()
    }
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("last4", &self.last4())
            .finish_non_exhaustive()
    }
}

/// Result of submitting card data
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub success: bool,
    pub receipt: Option<PaymentReceipt>,
}

/// Payment processor port
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register a payment and get the hosted page to send the user to
    async fn create_payment_request(&self, request: PaymentRequest) -> Result<PaymentSession>;

    /// Charge a card against a token. Tokens are single-use.
    async fn process_payment(&self, token: &str, card: &CardDetails) -> Result<PaymentOutcome>;

    /// Stop renewals for a subscription
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<bool>;

    /// Look up what a token was created for, without consuming it
    fn pending(&self, token: &str) -> Option<PaymentRequest>;
}

/// Demo gateway
pub struct MockGateway {
    pending: RwLock<HashMap<String, PaymentRequest>>,
    signer: ReceiptSigner,
    page_base_url: String,
    delay: Duration,
}

impl MockGateway {
    pub fn new(signer: ReceiptSigner, page_base_url: impl Into<String>, delay: Duration) -> Self {
        Self {
            pending: RwLock::new(HashMap::new()),
            signer,
            page_base_url: page_base_url.into().trim_end_matches('/').to_string(),
            delay,
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment_request(&self, request: PaymentRequest) -> Result<PaymentSession> {
        let plan = plan::find(&request.plan_id)
            .ok_or_else(|| BillingError::UnknownPlan(request.plan_id.clone()))?;

        if plan.price != request.amount || plan.currency != request.currency {
            return Err(BillingError::AmountMismatch {
                expected: plan.price,
                got: request.amount,
                currency: plan.currency,
            });
        }

        let token = format!("pay_{}", uuid::Uuid::new_v4().simple());
        let payment_page_url = format!(
            "{}/payment?token={}&plan={}",
            self.page_base_url, token, request.plan_id
        );

        tracing::info!(
            user_id = %request.user_id,
            plan = %request.plan_id,
            amount = %request.amount,
            "Created payment request"
        );

        self.pending.write().insert(token.clone(), request);

        Ok(PaymentSession {
            token,
            payment_page_url,
        })
    }

    async fn process_payment(&self, token: &str, card: &CardDetails) -> Result<PaymentOutcome> {
        card.validate()?;

        let request = self
            .pending
            .write()
            .remove(token)
            .ok_or_else(|| BillingError::TokenNotFound(token.to_string()))?;

        tracing::info!(token = %token, card = ?card, "Processing payment");
        tokio::time::sleep(self.delay).await;

        let mut receipt = PaymentReceipt {
            token: token.to_string(),
            user_id: request.user_id,
            plan_id: request.plan_id,
            subscription_id: format!("sub_{}", uuid::Uuid::new_v4().simple()),
            amount: request.amount,
            currency: request.currency,
            paid_at: Utc::now(),
            signature: String::new(),
        };
        self.signer.sign(&mut receipt)?;

        Ok(PaymentOutcome {
            success: true,
            receipt: Some(receipt),
        })
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<bool> {
        tracing::info!(subscription_id = %subscription_id, "Cancelling subscription");
        tokio::time::sleep(self.delay / 2).await;
        Ok(true)
    }

    fn pending(&self, token: &str) -> Option<PaymentRequest> {
        self.pending.read().get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gateway() -> MockGateway {
        MockGateway::new(
            ReceiptSigner::new("secret").unwrap(),
            "http://localhost:3000/",
            Duration::ZERO,
        )
    }

    fn request() -> PaymentRequest {
        PaymentRequest {
            plan_id: "monthly".into(),
            user_id: "user-1".into(),
            amount: dec!(199),
            currency: "TRY".into(),
            callback_url: "http://localhost:3000/success".into(),
        }
    }

    fn card() -> CardDetails {
        CardDetails {
            card_number: "4242 4242 4242 4242".into(),
            expiry_month: "12".into(),
            expiry_year: "2030".into(),
            cvc: "123".into(),
            card_holder_name: "Ada Lovelace".into(),
        }
    }

    #[tokio::test]
    async fn test_payment_flow_produces_verifiable_receipt() {
        let gw = gateway();
        let session = gw.create_payment_request(request()).await.unwrap();
        assert!(session.token.starts_with("pay_"));
        assert_eq!(
            session.payment_page_url,
            format!("http://localhost:3000/payment?token={}&plan=monthly", session.token)
        );
        assert!(gw.pending(&session.token).is_some());

        let outcome = gw.process_payment(&session.token, &card()).await.unwrap();
        assert!(outcome.success);
        let receipt = outcome.receipt.unwrap();
        assert_eq!(receipt.user_id, "user-1");
        assert!(receipt.subscription_id.starts_with("sub_"));
        assert!(ReceiptSigner::new("secret").unwrap().verify(&receipt).is_ok());
    }

    #[tokio::test]
    async fn test_token_is_single_use() {
        let gw = gateway();
        let session = gw.create_payment_request(request()).await.unwrap();
        gw.process_payment(&session.token, &card()).await.unwrap();

        let again = gw.process_payment(&session.token, &card()).await;
        assert!(matches!(again, Err(BillingError::TokenNotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_card_keeps_token() {
        let gw = gateway();
        let session = gw.create_payment_request(request()).await.unwrap();

        let mut bad = card();
        bad.cvc = String::new();
        assert!(matches!(
            gw.process_payment(&session.token, &bad).await,
            Err(BillingError::InvalidCard(_))
        ));
        assert!(gw.process_payment(&session.token, &card()).await.is_ok());
    }

    #[tokio::test]
    async fn test_amount_must_match_catalog() {
        let gw = gateway();
        let mut req = request();
        req.amount = dec!(1);
        assert!(matches!(
            gw.create_payment_request(req).await,
            Err(BillingError::AmountMismatch { .. })
        ));

        let mut req = request();
        req.plan_id = "weekly".into();
        assert!(matches!(
            gw.create_payment_request(req).await,
            Err(BillingError::UnknownPlan(_))
        ));
    }

    #[test]
    fn test_card_validation() {
        assert!(card().validate().is_ok());

        let mut c = card();
        c.card_number = "4242".into();
        assert!(c.validate().is_err());

        let mut c = card();
        c.expiry_month = "13".into();
        assert!(c.validate().is_err());

        assert_eq!(card().last4(), "4242");
        assert!(!format!("{:?}", card()).contains("4242 4242"));
    }
}
