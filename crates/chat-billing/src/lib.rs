//! # chat-billing
//!
//! Subscription catalog and payment processing for sai-chat.
//!
//! ## Payment flow
//!
//! The app uses a hosted payment page: the server registers a payment
//! request, sends the user to the page with a one-time token, and upgrades
//! the account once the gateway hands back a signed receipt.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │  Your Site  │────▶│  Hosted Payment │────▶│  Your Site  │
//! │  (pricing)  │     │      Page       │     │  (success)  │
//! └─────────────┘     └─────────────────┘     └─────────────┘
//! ```
//!
//! Card data is never stored. The bundled `MockGateway` is demo-only: no PCI
//! handling, a simulated delay and an always-approve path.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chat_billing::{MockGateway, PaymentGateway, PaymentRequest, ReceiptSigner};
//!
//! let signer = ReceiptSigner::new("payment-secret")?;
//! let gateway = MockGateway::new(signer.clone(), "https://sai.example", Duration::from_secs(2));
//!
//! let session = gateway.create_payment_request(PaymentRequest {
//!     plan_id: "monthly".into(),
//!     user_id: user.id.clone(),
//!     amount: dec!(199),
//!     currency: "TRY".into(),
//!     callback_url: "https://sai.example/success".into(),
//! }).await?;
//!
//! // Redirect user to: session.payment_page_url
//! ```

mod error;
mod gateway;
mod plan;
mod receipt;

pub use error::{BillingError, Result};
pub use gateway::{
    CardDetails, MockGateway, PaymentGateway, PaymentOutcome, PaymentRequest, PaymentSession,
};
pub use plan::{BillingPeriod, Plan, SubscriptionPlan, SubscriptionStatus, catalog, find as find_plan};
pub use receipt::{PaymentReceipt, ReceiptSigner};
