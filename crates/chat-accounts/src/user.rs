//! User Records
//!
//! The per-user document: plan, daily usage and subscription state.

use chat_billing::{BillingPeriod, Plan, SubscriptionStatus};
use chat_core::{DailyCounter, QuotaDecision, QuotaGate, Tier};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// What the identity provider knows about a signed-in user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// A user document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Identity uid
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    pub name: String,

    pub plan: Plan,

    /// Messages sent on `last_usage_reset`
    pub daily_usage: u32,

    /// Calendar day `daily_usage` belongs to
    pub last_usage_reset: NaiveDate,

    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,

    pub subscription_status: SubscriptionStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_type: Option<BillingPeriod>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_end_date: Option<DateTime<Utc>>,

    pub is_admin: bool,
}

impl UserRecord {
    /// A fresh free-plan record for a first sign-in
    pub fn new(identity: &Identity, today: NaiveDate, now: DateTime<Utc>) -> Self {
        let name = identity
            .display_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "User".into());

        Self {
            id: identity.uid.clone(),
            email: identity.email.clone(),
            name,
            plan: Plan::Free,
            daily_usage: 0,
            last_usage_reset: today,
            created_at: now,
            subscription_id: None,
            subscription_status: SubscriptionStatus::Inactive,
            subscription_type: None,
            subscription_end_date: None,
            is_admin: false,
        }
    }

    pub const fn tier(&self) -> Tier {
        match self.plan {
            Plan::Free => Tier::Free,
            Plan::Pro => Tier::Pro,
        }
    }

    pub const fn counter(&self) -> DailyCounter {
        DailyCounter {
            date: self.last_usage_reset,
            count: self.daily_usage,
        }
    }

    fn store_counter(&mut self, counter: DailyCounter) {
        self.last_usage_reset = counter.date;
        self.daily_usage = counter.count;
    }

    /// Zero the counter if it belongs to an earlier day. Returns true if changed.
    pub fn apply_rollover(&mut self, today: NaiveDate) -> bool {
        let mut counter = self.counter();
        let rolled = counter.roll(today);
        self.store_counter(counter);
        rolled
    }

    /// Drop back to free once a paid period has ended. Returns true if changed.
    pub fn apply_expiry(&mut self, now: DateTime<Utc>) -> bool {
        match (self.plan, self.subscription_end_date) {
            (Plan::Pro, Some(end)) if end <= now => {
                self.plan = Plan::Free;
                self.subscription_status = SubscriptionStatus::Inactive;
                self.subscription_end_date = None;
                true
            }
            _ => false,
        }
    }

    /// Quota position as of `today`
    pub fn quota(&self, gate: &QuotaGate, today: NaiveDate) -> QuotaDecision {
        gate.check(self.tier(), self.counter().current(today))
    }

    /// Check and consume one message. Pro users pass without counting.
    pub fn consume(&mut self, gate: &QuotaGate, today: NaiveDate) -> QuotaDecision {
        let tier = self.tier();
        let Some(limit) = gate.limit_for(tier) else {
            self.apply_rollover(today);
            return gate.check(tier, self.daily_usage);
        };

        let mut counter = self.counter();
        let outcome = counter.try_consume(Some(limit), today);
        self.store_counter(counter);

        match outcome {
            Ok(used) => QuotaDecision {
                tier,
                allowed: true,
                used,
                limit: Some(limit),
                remaining: Some(limit.saturating_sub(used)),
            },
            Err(used) => gate.check(tier, used),
        }
    }

    /// Return one counted message, e.g. when the send it paid for failed
    pub fn refund(&mut self, today: NaiveDate) {
        let mut counter = self.counter();
        counter.refund(today);
        self.store_counter(counter);
    }

    /// Move to a plan. Usage restarts; pro runs for one billing period,
    /// added on top of any time an active pro subscription still has left.
    pub fn change_plan(
        &mut self,
        plan: Plan,
        period: BillingPeriod,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) {
        let remaining_until = self
            .subscription_end_date
            .filter(|end| self.plan == Plan::Pro && *end > now);

        self.plan = plan;
        self.daily_usage = 0;
        self.last_usage_reset = today;

        match plan {
            Plan::Pro => {
                self.subscription_status = SubscriptionStatus::Active;
                self.subscription_type = Some(period);
                self.subscription_end_date =
                    Some(remaining_until.unwrap_or(now) + period.duration());
            }
            Plan::Free => {
                self.subscription_status = SubscriptionStatus::Inactive;
                self.subscription_type = None;
                self.subscription_end_date = None;
                self.subscription_id = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn record() -> UserRecord {
        let identity = Identity {
            uid: "u1".into(),
            email: Some("ada@example.com".into()),
            display_name: Some("Ada".into()),
        };
        UserRecord::new(&identity, day(1), Utc::now())
    }

    #[test]
    fn test_new_record_defaults() {
        let r = record();
        assert_eq!(r.plan, Plan::Free);
        assert_eq!(r.daily_usage, 0);
        assert_eq!(r.subscription_status, SubscriptionStatus::Inactive);
        assert!(!r.is_admin);
    }

    #[test]
    fn test_consume_until_limit() {
        let gate = QuotaGate::default();
        let mut r = record();

        for n in 1..=20 {
            let d = r.consume(&gate, day(1));
            assert!(d.allowed);
            assert_eq!(d.used, n);
            assert_eq!(d.remaining, Some(20 - n));
        }

        let d = r.consume(&gate, day(1));
        assert!(!d.allowed);
        assert_eq!(d.used, 20);
        assert_eq!(r.daily_usage, 20);
    }

    #[test]
    fn test_consume_after_rollover() {
        let gate = QuotaGate::default();
        let mut r = record();
        r.daily_usage = 20;

        assert_eq!(r.quota(&gate, day(2)).used, 0);
        let d = r.consume(&gate, day(2));
        assert!(d.allowed);
        assert_eq!(r.daily_usage, 1);
        assert_eq!(r.last_usage_reset, day(2));
    }

    #[test]
    fn test_pro_not_counted() {
        let gate = QuotaGate::default();
        let mut r = record();
        r.change_plan(Plan::Pro, BillingPeriod::Monthly, Utc::now(), day(1));

        for _ in 0..50 {
            assert!(r.consume(&gate, day(1)).allowed);
        }
        assert_eq!(r.daily_usage, 0);
    }

    #[test]
    fn test_plan_change_resets_usage_and_sets_period() {
        let now = Utc::now();
        let mut r = record();
        r.daily_usage = 12;

        r.change_plan(Plan::Pro, BillingPeriod::Yearly, now, day(1));
        assert_eq!(r.daily_usage, 0);
        assert_eq!(r.subscription_status, SubscriptionStatus::Active);
        assert_eq!(r.subscription_end_date, Some(now + chrono::Duration::days(365)));

        r.change_plan(Plan::Free, BillingPeriod::Monthly, now, day(1));
        assert_eq!(r.subscription_status, SubscriptionStatus::Inactive);
        assert!(r.subscription_end_date.is_none());
    }

    #[test]
    fn test_renewal_keeps_remaining_time() {
        let start = Utc::now();
        let mut r = record();
        r.change_plan(Plan::Pro, BillingPeriod::Monthly, start, day(1));

        let later = start + chrono::Duration::days(20);
        r.change_plan(Plan::Pro, BillingPeriod::Monthly, later, day(21));
        assert_eq!(r.subscription_end_date, Some(start + chrono::Duration::days(60)));

        let lapsed = start + chrono::Duration::days(90);
        r.change_plan(Plan::Pro, BillingPeriod::Yearly, lapsed, day(1));
        assert_eq!(r.subscription_end_date, Some(lapsed + chrono::Duration::days(365)));
    }

    #[test]
    fn test_free_user_upgrade_starts_now() {
        let now = Utc::now();
        let mut r = record();
        r.subscription_end_date = Some(now + chrono::Duration::days(5));

        r.change_plan(Plan::Pro, BillingPeriod::Monthly, now, day(1));
        assert_eq!(r.subscription_end_date, Some(now + chrono::Duration::days(30)));
    }

    #[test]
    fn test_expired_pro_downgrades() {
        let now = Utc::now();
        let mut r = record();
        r.change_plan(Plan::Pro, BillingPeriod::Monthly, now, day(1));

        assert!(!r.apply_expiry(now));
        assert!(r.apply_expiry(now + chrono::Duration::days(31)));
        assert_eq!(r.plan, Plan::Free);
        assert_eq!(r.subscription_status, SubscriptionStatus::Inactive);
    }
}
