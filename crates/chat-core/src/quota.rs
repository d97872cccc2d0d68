//! Quota Gate
//!
//! Daily message quotas per tier. Counters roll over lazily: the first read or
//! write on a new calendar day sees a count of zero. There is no sweeper.
//!
//! ```text
//!   tier      limit/day   images
//!   guest         2         no
//!   free         20         no
//!   pro          ∞          yes
//! ```

use chrono::{DateTime, Local, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Default daily limit for signed-in free users
pub const FREE_DAILY_LIMIT: u32 = 20;

/// Default daily limit for anonymous guests
pub const GUEST_DAILY_LIMIT: u32 = 2;

/// Who is sending
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Guest,
    Free,
    Pro,
}

/// Configured daily limits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaLimits {
    pub free_daily: u32,
    pub guest_daily: u32,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            free_daily: FREE_DAILY_LIMIT,
            guest_daily: GUEST_DAILY_LIMIT,
        }
    }
}

impl QuotaLimits {
    /// Daily limit for a tier, `None` meaning unlimited
    pub const fn limit_for(&self, tier: Tier) -> Option<u32> {
        match tier {
            Tier::Guest => Some(self.guest_daily),
            Tier::Free => Some(self.free_daily),
            Tier::Pro => None,
        }
    }
}

/// Outcome of a quota check
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaDecision {
    pub tier: Tier,
    pub allowed: bool,
    pub used: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

/// Stateless policy over tiers and limits
#[derive(Clone, Copy, Debug, Default)]
pub struct QuotaGate {
    limits: QuotaLimits,
}

impl QuotaGate {
    pub const fn new(limits: QuotaLimits) -> Self {
        Self { limits }
    }

    pub const fn limits(&self) -> QuotaLimits {
        self.limits
    }

    pub const fn limit_for(&self, tier: Tier) -> Option<u32> {
        self.limits.limit_for(tier)
    }

    /// May a caller of `tier` who has used `used` messages today send another?
    pub fn check(&self, tier: Tier, used: u32) -> QuotaDecision {
        let limit = self.limit_for(tier);
        QuotaDecision {
            tier,
            allowed: limit.is_none_or(|l| used < l),
            used,
            limit,
            remaining: limit.map(|l| l.saturating_sub(used)),
        }
    }

    /// Image generation is a pro-only feature
    pub fn can_generate_image(tier: Tier) -> bool {
        tier == Tier::Pro
    }
}

/// A count that belongs to one calendar day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounter {
    pub date: NaiveDate,
    pub count: u32,
}

impl DailyCounter {
    pub const fn new(today: NaiveDate) -> Self {
        Self { date: today, count: 0 }
    }

    /// Count as seen on `today`
    pub fn current(&self, today: NaiveDate) -> u32 {
        if self.date == today { self.count } else { 0 }
    }

    /// Reset the counter if it belongs to another day. Returns true on reset.
    pub fn roll(&mut self, today: NaiveDate) -> bool {
        if self.date == today {
            return false;
        }
        self.date = today;
        self.count = 0;
        true
    }

    /// Check and increment in one step.
    ///
    /// `Ok` carries the count after incrementing; `Err` the unchanged count
    /// when the limit is already reached.
    pub fn try_consume(&mut self, limit: Option<u32>, today: NaiveDate) -> Result<u32, u32> {
        self.roll(today);
        if let Some(limit) = limit {
            if self.count >= limit {
                return Err(self.count);
            }
        }
        self.count += 1;
        Ok(self.count)
    }

    /// Give back one count taken today
    pub fn refund(&mut self, today: NaiveDate) {
        if self.date == today {
            self.count = self.count.saturating_sub(1);
        }
    }
}

/// Source of "today" for day-keyed counters
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock; days follow the server's local calendar
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually driven clock for tests and demos
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance_days(&self, days: i64) {
        *self.now.lock() += chrono::Duration::days(days);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.now.lock().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_free_user_limited_to_twenty() {
        let mut counter = DailyCounter::new(day(1));
        let limit = QuotaLimits::default().limit_for(Tier::Free);

        for n in 1..=FREE_DAILY_LIMIT {
            assert_eq!(counter.try_consume(limit, day(1)), Ok(n));
        }
        assert_eq!(counter.try_consume(limit, day(1)), Err(FREE_DAILY_LIMIT));
        assert_eq!(counter.current(day(1)), FREE_DAILY_LIMIT);
    }

    #[test]
    fn test_rollover_is_lazy() {
        let counter = DailyCounter { date: day(1), count: 17 };
        assert_eq!(counter.current(day(1)), 17);
        assert_eq!(counter.current(day(2)), 0);

        let mut counter = counter;
        assert!(counter.roll(day(2)));
        assert!(!counter.roll(day(2)));
        assert_eq!(counter, DailyCounter::new(day(2)));
    }

    #[test]
    fn test_rejected_send_allowed_again_next_day() {
        let mut counter = DailyCounter::new(day(1));
        let limit = Some(GUEST_DAILY_LIMIT);
        counter.try_consume(limit, day(1)).unwrap();
        counter.try_consume(limit, day(1)).unwrap();
        assert!(counter.try_consume(limit, day(1)).is_err());
        assert_eq!(counter.try_consume(limit, day(2)), Ok(1));
    }

    #[test]
    fn test_refund_only_touches_today() {
        let mut counter = DailyCounter { date: day(1), count: 2 };
        counter.refund(day(1));
        assert_eq!(counter.count, 1);

        counter.refund(day(2));
        assert_eq!(counter.count, 1);

        counter.refund(day(1));
        counter.refund(day(1));
        assert_eq!(counter.count, 0);
    }

    #[test]
    fn test_gate_decisions() {
        let gate = QuotaGate::default();

        let guest = gate.check(Tier::Guest, 1);
        assert!(guest.allowed);
        assert_eq!(guest.remaining, Some(1));

        let guest = gate.check(Tier::Guest, 2);
        assert!(!guest.allowed);
        assert_eq!(guest.remaining, Some(0));

        let free = gate.check(Tier::Free, 19);
        assert!(free.allowed);
        assert!(!gate.check(Tier::Free, 20).allowed);
    }

    #[test]
    fn test_pro_always_allowed() {
        let gate = QuotaGate::default();
        let decision = gate.check(Tier::Pro, 10_000);
        assert!(decision.allowed);
        assert_eq!(decision.limit, None);
        assert!(QuotaGate::can_generate_image(Tier::Pro));
        assert!(!QuotaGate::can_generate_image(Tier::Free));
        assert!(!QuotaGate::can_generate_image(Tier::Guest));
    }

    #[test]
    fn test_fixed_clock_advances() {
        let start = day(1).and_hms_opt(12, 0, 0).unwrap().and_utc();
        let clock = FixedClock::new(start);
        assert_eq!(clock.today(), day(1));
        clock.advance_days(1);
        assert_eq!(clock.today(), day(2));
    }
}
