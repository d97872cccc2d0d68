//! User Store
//!
//! Port to the external per-user document store, plus an in-memory stand-in.
//! Reads normalize records lazily: a counter from an earlier day reads as
//! zero, and a lapsed pro subscription reads as free.

use std::collections::HashMap;
use std::sync::Arc;

use chat_billing::{BillingPeriod, Plan, SubscriptionStatus};
use chat_core::{Clock, QuotaDecision, QuotaGate};
use parking_lot::RwLock;

use crate::error::{AccountError, Result};
use crate::user::{Identity, UserRecord};

/// User document storage
pub trait UserStore: Send + Sync {
    /// Load the record for a signed-in identity, creating it on first sign-in
    fn ensure(&self, identity: &Identity, is_admin: bool) -> Result<UserRecord>;

    fn get(&self, uid: &str) -> Result<Option<UserRecord>>;

    /// All records, newest first
    fn list(&self) -> Result<Vec<UserRecord>>;

    /// Replace a record wholesale
    fn save(&self, record: &UserRecord) -> Result<()>;

    /// Returns false if there was nothing to delete
    fn delete(&self, uid: &str) -> Result<bool>;

    /// Check the quota and count one message in a single step
    fn try_consume(&self, uid: &str, gate: &QuotaGate) -> Result<QuotaDecision>;

    /// Give back one message counted today
    fn refund(&self, uid: &str) -> Result<UserRecord>;

    fn reset_usage(&self, uid: &str) -> Result<UserRecord>;

    /// Switch plan; usage restarts and pro runs for one `period`
    fn set_plan(
        &self,
        uid: &str,
        plan: Plan,
        period: BillingPeriod,
        subscription_id: Option<String>,
    ) -> Result<UserRecord>;

    /// Mark the subscription cancelled; pro stays until the period ends
    fn cancel_subscription(&self, uid: &str) -> Result<UserRecord>;
}

/// In-memory user store (for development and tests)
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
    clock: Arc<dyn Clock>,
}

impl MemoryUserStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            clock,
        }
    }

    fn normalize(&self, record: &mut UserRecord) -> bool {
        let expired = record.apply_expiry(self.clock.now());
        let rolled = record.apply_rollover(self.clock.today());
        expired || rolled
    }

    /// Run `f` on a normalized record under the write lock
    fn modify<T>(&self, uid: &str, f: impl FnOnce(&mut UserRecord) -> T) -> Result<T> {
        let mut users = self.users.write();
        let record = users
            .get_mut(uid)
            .ok_or_else(|| AccountError::UserNotFound(uid.to_string()))?;
        self.normalize(record);
        Ok(f(record))
    }
}

impl UserStore for MemoryUserStore {
    fn ensure(&self, identity: &Identity, is_admin: bool) -> Result<UserRecord> {
        let mut users = self.users.write();

        if let Some(record) = users.get_mut(&identity.uid) {
            if self.normalize(record) {
                tracing::debug!(uid = %identity.uid, "Normalized user record on sign-in");
            }
            if is_admin && !record.is_admin {
                record.is_admin = true;
            }
            return Ok(record.clone());
        }

        let mut record = UserRecord::new(identity, self.clock.today(), self.clock.now());
        record.is_admin = is_admin;
        users.insert(record.id.clone(), record.clone());

        tracing::info!(uid = %record.id, admin = is_admin, "Created user record");
        Ok(record)
    }

    fn get(&self, uid: &str) -> Result<Option<UserRecord>> {
        match self.modify(uid, |record| record.clone()) {
            Ok(record) => Ok(Some(record)),
            Err(AccountError::UserNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn list(&self) -> Result<Vec<UserRecord>> {
        let mut users = self.users.write();
        let mut result: Vec<_> = users
            .values_mut()
            .map(|record| {
                self.normalize(record);
                record.clone()
            })
            .collect();

        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    fn save(&self, record: &UserRecord) -> Result<()> {
        self.users.write().insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn delete(&self, uid: &str) -> Result<bool> {
        Ok(self.users.write().remove(uid).is_some())
    }

    fn try_consume(&self, uid: &str, gate: &QuotaGate) -> Result<QuotaDecision> {
        let today = self.clock.today();
        self.modify(uid, |record| record.consume(gate, today))
    }

    fn refund(&self, uid: &str) -> Result<UserRecord> {
        let today = self.clock.today();
        self.modify(uid, |record| {
            record.refund(today);
            record.clone()
        })
    }

    fn reset_usage(&self, uid: &str) -> Result<UserRecord> {
        let today = self.clock.today();
        self.modify(uid, |record| {
            record.daily_usage = 0;
            record.last_usage_reset = today;
            record.clone()
        })
    }

    fn set_plan(
        &self,
        uid: &str,
        plan: Plan,
        period: BillingPeriod,
        subscription_id: Option<String>,
    ) -> Result<UserRecord> {
        let (now, today) = (self.clock.now(), self.clock.today());
        self.modify(uid, |record| {
            record.change_plan(plan, period, now, today);
            if plan == Plan::Pro {
                record.subscription_id = subscription_id;
            }
            tracing::info!(uid = %record.id, plan = %plan, "User plan updated");
            record.clone()
        })
    }

    fn cancel_subscription(&self, uid: &str) -> Result<UserRecord> {
        self.modify(uid, |record| {
            if record.plan == Plan::Pro {
                record.subscription_status = SubscriptionStatus::Cancelled;
            }
            record.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::quota::FixedClock;
    use chrono::TimeZone;

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            chrono::Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn identity(uid: &str) -> Identity {
        Identity {
            uid: uid.into(),
            email: Some(format!("{uid}@example.com")),
            display_name: Some(uid.to_uppercase()),
        }
    }

    #[test]
    fn test_ensure_creates_once() {
        let store = MemoryUserStore::new(clock());
        let first = store.ensure(&identity("a"), false).unwrap();
        store.try_consume("a", &QuotaGate::default()).unwrap();

        let second = store.ensure(&identity("a"), false).unwrap();
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.daily_usage, 1);
    }

    #[test]
    fn test_free_user_capped_at_limit() {
        let store = MemoryUserStore::new(clock());
        let gate = QuotaGate::default();
        store.ensure(&identity("a"), false).unwrap();

        let granted = (0..25)
            .filter(|_| store.try_consume("a", &gate).unwrap().allowed)
            .count();
        assert_eq!(granted, 20);
        assert_eq!(store.get("a").unwrap().unwrap().daily_usage, 20);
    }

    #[test]
    fn test_yesterdays_count_reads_as_zero() {
        let clock = clock();
        let store = MemoryUserStore::new(clock.clone());
        let gate = QuotaGate::default();
        store.ensure(&identity("a"), false).unwrap();
        for _ in 0..7 {
            store.try_consume("a", &gate).unwrap();
        }

        clock.advance_days(1);
        let record = store.get("a").unwrap().unwrap();
        assert_eq!(record.daily_usage, 0);
        assert_eq!(record.last_usage_reset, clock.today());
    }

    #[test]
    fn test_concurrent_sessions_do_not_overspend() {
        let store = Arc::new(MemoryUserStore::new(clock()));
        let gate = QuotaGate::default();
        store.ensure(&identity("a"), false).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    (0..10)
                        .filter(|_| store.try_consume("a", &gate).unwrap().allowed)
                        .count()
                })
            })
            .collect();

        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, 20);
    }

    #[test]
    fn test_refund_returns_one_message() {
        let clock = clock();
        let store = MemoryUserStore::new(clock.clone());
        let gate = QuotaGate::default();
        store.ensure(&identity("a"), false).unwrap();
        while store.try_consume("a", &gate).unwrap().allowed {}

        assert_eq!(store.refund("a").unwrap().daily_usage, 19);
        assert!(store.try_consume("a", &gate).unwrap().allowed);
        assert!(!store.try_consume("a", &gate).unwrap().allowed);

        clock.advance_days(1);
        assert_eq!(store.refund("a").unwrap().daily_usage, 0);
    }

    #[test]
    fn test_subscription_lapses() {
        let clock = clock();
        let store = MemoryUserStore::new(clock.clone());
        store.ensure(&identity("a"), false).unwrap();
        store
            .set_plan("a", Plan::Pro, BillingPeriod::Monthly, Some("sub_1".into()))
            .unwrap();

        let cancelled = store.cancel_subscription("a").unwrap();
        assert_eq!(cancelled.plan, Plan::Pro);
        assert_eq!(cancelled.subscription_status, SubscriptionStatus::Cancelled);

        clock.advance_days(30);
        let record = store.get("a").unwrap().unwrap();
        assert_eq!(record.plan, Plan::Free);
        assert_eq!(record.subscription_status, SubscriptionStatus::Inactive);
    }

    #[test]
    fn test_list_newest_first_and_delete() {
        let clock = clock();
        let store = MemoryUserStore::new(clock.clone());
        store.ensure(&identity("old"), false).unwrap();
        clock.advance_days(1);
        store.ensure(&identity("new"), false).unwrap();

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, ["new", "old"]);

        assert!(store.delete("old").unwrap());
        assert!(!store.delete("old").unwrap());
        assert!(store.get("old").unwrap().is_none());
        assert!(matches!(
            store.try_consume("old", &QuotaGate::default()),
            Err(AccountError::UserNotFound(_))
        ));
    }
}
