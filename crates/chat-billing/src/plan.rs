//! Plans and Subscription Catalog
//!
//! The catalog is static configuration, not a runtime entity.

use std::str::FromStr;

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::BillingError;

/// Account plan tiers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
}

impl FromStr for Plan {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            other => Err(BillingError::UnknownPlan(other.to_string())),
        }
    }
}

impl Plan {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Free => Self::Pro,
            Self::Pro => Self::Free,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription state on a user record
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    #[default]
    Inactive,
    Cancelled,
}

/// Billing interval
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Monthly,
    Yearly,
}

impl BillingPeriod {
    /// How long one paid period keeps an account on pro
    pub fn duration(self) -> Duration {
        match self {
            Self::Monthly => Duration::days(30),
            Self::Yearly => Duration::days(365),
        }
    }
}

/// A purchasable subscription
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    /// Catalog key, used in payment URLs
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub currency: String,
    pub period: BillingPeriod,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::str_option"
    )]
    pub original_price: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::str_option"
    )]
    pub discount: Option<Decimal>,
    pub features: Vec<String>,
}

const PRO_FEATURES: [&str; 5] = [
    "Unlimited messages",
    "Unlimited image generation",
    "Priority support",
    "Advanced AI models",
    "Chat history export",
];

fn features(extra: &[&str]) -> Vec<String> {
    PRO_FEATURES
        .iter()
        .chain(extra)
        .map(ToString::to_string)
        .collect()
}

/// The full catalog
pub fn catalog() -> Vec<SubscriptionPlan> {
    let monthly_price = dec!(199);
    let yearly_price = dec!(1999);
    let twelve_months = monthly_price * dec!(12);

    vec![
        SubscriptionPlan {
            id: "monthly".into(),
            name: "Pro Monthly".into(),
            price: monthly_price,
            currency: "TRY".into(),
            period: BillingPeriod::Monthly,
            original_price: None,
            discount: None,
            features: features(&[]),
        },
        SubscriptionPlan {
            id: "yearly".into(),
            name: "Pro Yearly".into(),
            price: yearly_price,
            currency: "TRY".into(),
            period: BillingPeriod::Yearly,
            original_price: Some(twelve_months),
            discount: Some(twelve_months - yearly_price),
            features: features(&["16% discount (389 TRY saved)", "Best value annual membership"]),
        },
    ]
}

/// Look up a catalog entry by id
pub fn find(plan_id: &str) -> Option<SubscriptionPlan> {
    catalog().into_iter().find(|p| p.id == plan_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_prices() {
        let monthly = find("monthly").unwrap();
        assert_eq!(monthly.price, dec!(199));
        assert_eq!(monthly.period, BillingPeriod::Monthly);

        let yearly = find("yearly").unwrap();
        assert_eq!(yearly.price, dec!(1999));
        assert_eq!(yearly.original_price, Some(dec!(2388)));
        assert_eq!(yearly.discount, Some(dec!(389)));

        assert!(find("lifetime").is_none());
    }

    #[test]
    fn test_plan_parse_and_toggle() {
        assert_eq!("PRO".parse::<Plan>().unwrap(), Plan::Pro);
        assert_eq!(" free ".parse::<Plan>().unwrap(), Plan::Free);
        assert!(matches!(
            "team".parse::<Plan>(),
            Err(BillingError::UnknownPlan(p)) if p == "team"
        ));
        assert_eq!(Plan::Free.toggled(), Plan::Pro);
        assert_eq!(Plan::Pro.toggled(), Plan::Free);
    }

    #[test]
    fn test_period_durations() {
        assert_eq!(BillingPeriod::Monthly.duration().num_days(), 30);
        assert_eq!(BillingPeriod::Yearly.duration().num_days(), 365);
    }

    #[test]
    fn test_price_serialized_as_string() {
        let json = serde_json::to_value(find("monthly").unwrap()).unwrap();
        assert_eq!(json["price"], "199");
        assert_eq!(json["period"], "monthly");
        assert!(json.get("originalPrice").is_none());
    }
}
