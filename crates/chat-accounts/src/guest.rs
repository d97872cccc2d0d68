//! Guest Usage
//!
//! Daily message counter for anonymous visitors, keyed by client address (or
//! a key the browser keeps locally). Same lazy rollover as signed-in users.

use std::collections::HashMap;
use std::sync::Arc;

use chat_core::{Clock, DailyCounter};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Prune stale days once the table grows past this many keys
const PRUNE_THRESHOLD: usize = 10_000;

/// Guest quota position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestUsage {
    pub used: u32,
    pub limit: u32,
    pub can_send: bool,
}

impl GuestUsage {
    const fn new(used: u32, limit: u32) -> Self {
        Self {
            used,
            limit,
            can_send: used < limit,
        }
    }
}

/// Per-key daily counters for guests
pub struct GuestUsageTracker {
    counters: RwLock<HashMap<String, DailyCounter>>,
    limit: u32,
    clock: Arc<dyn Clock>,
}

impl GuestUsageTracker {
    pub fn new(limit: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            limit,
            clock,
        }
    }

    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Usage for `key` today, without counting anything
    pub fn snapshot(&self, key: &str) -> GuestUsage {
        let today = self.clock.today();
        let used = self
            .counters
            .read()
            .get(key)
            .map_or(0, |counter| counter.current(today));
        GuestUsage::new(used, self.limit)
    }

    /// Count one message for `key`. `Err` carries the unchanged usage at the limit.
    pub fn try_increment(&self, key: &str) -> Result<GuestUsage, GuestUsage> {
        let today = self.clock.today();
        let mut counters = self.counters.write();

        if counters.len() >= PRUNE_THRESHOLD && !counters.contains_key(key) {
            let before = counters.len();
            counters.retain(|_, counter| counter.date == today);
            tracing::debug!(pruned = before - counters.len(), "Pruned stale guest counters");
        }

        let counter = counters
            .entry(key.to_string())
            .or_insert_with(|| DailyCounter::new(today));

        match counter.try_consume(Some(self.limit), today) {
            Ok(used) => Ok(GuestUsage::new(used, self.limit)),
            Err(used) => {
                tracing::info!(guest = key, used, "Guest daily limit reached");
                Err(GuestUsage::new(used, self.limit))
            }
        }
    }

    /// Give back one message counted today
    pub fn refund(&self, key: &str) {
        let today = self.clock.today();
        if let Some(counter) = self.counters.write().get_mut(key) {
            counter.refund(today);
        }
    }

    pub fn tracked(&self) -> usize {
        self.counters.read().len()
    }
}
