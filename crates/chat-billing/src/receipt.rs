//! Payment Receipts
//!
//! The gateway signs every successful payment with a shared secret. The
//! server verifies the signature before it upgrades anyone to pro.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{BillingError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Proof of a completed payment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub token: String,
    pub user_id: String,
    pub plan_id: String,
    pub subscription_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
    pub paid_at: DateTime<Utc>,
    /// Hex HMAC-SHA256 over the fields above, `paid_at` as Unix seconds
    pub signature: String,
}

impl PaymentReceipt {
    fn signed_payload(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.token,
            self.user_id,
            self.plan_id,
            self.subscription_id,
            self.amount,
            self.currency,
            self.paid_at.timestamp()
        )
    }
}

/// Signs and verifies receipts with a shared secret
#[derive(Clone)]
pub struct ReceiptSigner {
    secret: Vec<u8>,
}

impl ReceiptSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(BillingError::Config("payment secret must not be empty".into()));
        }
        Ok(Self {
            secret: secret.to_vec(),
        })
    }

    fn mac(&self, receipt: &PaymentReceipt) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| BillingError::Config(e.to_string()))?;
        mac.update(receipt.signed_payload().as_bytes());
        Ok(mac)
    }

    /// Fill in the receipt's signature
    pub fn sign(&self, receipt: &mut PaymentReceipt) -> Result<()> {
        let mac = self.mac(receipt)?;
        receipt.signature = hex::encode(mac.finalize().into_bytes());
        Ok(())
    }

    /// Constant-time signature check
    pub fn verify(&self, receipt: &PaymentReceipt) -> Result<()> {
        let expected = hex::decode(&receipt.signature)
            .map_err(|e| BillingError::SignatureInvalid(e.to_string()))?;

        self.mac(receipt)?
            .verify_slice(&expected)
            .map_err(|_| BillingError::SignatureInvalid("signature mismatch".into()))
    }
}

impl std::fmt::Debug for ReceiptSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptSigner").finish_non_exhaustive()
    }
}
