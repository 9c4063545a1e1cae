//! Per-route request counters.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

/// Key used when a request matched no route.
pub const UNKNOWN_ROUTE: &str = "Unknown";

/// Monotonic request counts keyed by route name.
///
/// Entries are created on first use and never removed.
#[derive(Debug, Clone, Default)]
pub struct RequestCounter {
    counters: Arc<DashMap<String, AtomicU64>>,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request for `route`, or for [`UNKNOWN_ROUTE`] when `None`.
    pub fn increment(&self, route: Option<&str>) {
        let route = route.unwrap_or(UNKNOWN_ROUTE);

        if let Some(counter) = self.counters.get(route) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.counters
            .entry(route.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, route: &str) -> u64 {
        self.counters
            .get(route)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Owned point-in-time copy of every counter.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counters
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect()
    }
}
