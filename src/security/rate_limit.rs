//! Fixed-window rate limiting with named partitions.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::{RateLimitConfig, WindowConfig};
use crate::observability::metrics;

/// Partition applied to every request.
pub const GLOBAL_PARTITION: &str = "global";
/// Partition applied to routes that opt in (the user listing).
pub const FIXED_PARTITION: &str = "fixed";

/// Limits for one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    pub permit_limit: u32,
    pub window: Duration,
    pub queue_limit: u32,
}

impl From<&WindowConfig> for WindowPolicy {
    fn from(config: &WindowConfig) -> Self {
        Self {
            permit_limit: config.permit_limit,
            window: Duration::from_secs(config.window_secs),
            queue_limit: config.queue_limit,
        }
    }
}

/// How a request was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Consumed a permit of the current window.
    Permitted,
    /// Took a queue slot; counted against the next window's permits.
    Queued,
}

/// A request refused by a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub partition: String,
    /// Time until the current window ends.
    pub retry_after: Duration,
}

/// Point-in-time view of a partition's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub permits_used: u32,
    pub queued: u32,
}

#[derive(Debug)]
struct Window {
    start: Instant,
    permits_used: u32,
    queued: u32,
}

impl Window {
    fn new(start: Instant) -> Self {
        Self {
            start,
            permits_used: 0,
            queued: 0,
        }
    }

    /// `None` when the end is beyond what `Instant` can represent.
    fn end(&self, policy: &WindowPolicy) -> Option<Instant> {
        self.start.checked_add(policy.window)
    }

    fn roll_if_elapsed(&mut self, policy: &WindowPolicy, now: Instant) {
        let Some(end) = self.end(policy) else {
            return;
        };
        if now < end {
            return;
        }
        // Queued admissions belong to the window right after theirs.
        let in_next_window = end
            .checked_add(policy.window)
            .map_or(true, |next_end| now < next_end);
        let carried = if in_next_window {
            self.queued.min(policy.permit_limit)
        } else {
            0
        };
        self.start = now;
        self.permits_used = carried;
        self.queued = 0;
    }

    fn try_admit(&mut self, policy: &WindowPolicy, now: Instant) -> Option<Admission> {
        self.roll_if_elapsed(policy, now);

        if self.permits_used < policy.permit_limit {
            self.permits_used += 1;
            Some(Admission::Permitted)
        } else if self.queued < policy.queue_limit {
            self.queued += 1;
            Some(Admission::Queued)
        } else {
            None
        }
    }

    fn remaining(&self, policy: &WindowPolicy, now: Instant) -> Duration {
        self.end(policy)
            .map_or(policy.window, |end| end.saturating_duration_since(now))
    }
}

/// Fixed-window limiter keyed by partition name.
///
/// Each partition's window lives in its own map entry, so partitions never
/// contend with each other. Within a partition the entry lock orders
/// admissions by arrival.
#[derive(Debug, Default)]
pub struct FixedWindowLimiter {
    policies: HashMap<String, WindowPolicy>,
    windows: DashMap<String, Window>,
}

impl FixedWindowLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the policy for `partition`.
    pub fn with_partition(mut self, partition: impl Into<String>, policy: WindowPolicy) -> Self {
        self.policies.insert(partition.into(), policy);
        self
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new()
            .with_partition(GLOBAL_PARTITION, WindowPolicy::from(&config.global))
            .with_partition(FIXED_PARTITION, WindowPolicy::from(&config.list_users))
    }

    pub fn policy(&self, partition: &str) -> Option<&WindowPolicy> {
        self.policies.get(partition)
    }

    pub fn try_acquire(&self, partition: &str) -> Result<Admission, Rejection> {
        self.try_acquire_at(partition, Instant::now())
    }

    /// Attempt to admit one request to `partition` at time `now`.
    ///
    /// Partitions without a registered policy admit everything.
    pub fn try_acquire_at(&self, partition: &str, now: Instant) -> Result<Admission, Rejection> {
        let Some(policy) = self.policies.get(partition) else {
            tracing::debug!(partition, "No policy for partition; admitting");
            return Ok(Admission::Permitted);
        };

        let mut window = self
            .windows
            .entry(partition.to_string())
            .or_insert_with(|| Window::new(now));

        match window.try_admit(policy, now) {
            Some(admission) => Ok(admission),
            None => {
                let retry_after = window.remaining(policy, now);
                drop(window);
                tracing::warn!(partition, ?retry_after, "Rate limit exceeded");
                metrics::record_rate_limited(partition);
                Err(Rejection {
                    partition: partition.to_string(),
                    retry_after,
                })
            }
        }
    }

    /// Admit against each partition in order, stopping at the first refusal.
    ///
    /// Permits taken from earlier partitions are not returned on refusal.
    pub fn try_acquire_all(&self, partitions: &[&str]) -> Result<(), Rejection> {
        let now = Instant::now();
        for partition in partitions {
            self.try_acquire_at(partition, now)?;
        }
        Ok(())
    }

    pub fn snapshot(&self, partition: &str) -> Option<WindowSnapshot> {
        self.windows.get(partition).map(|w| WindowSnapshot {
            permits_used: w.permits_used,
            queued: w.queued,
        })
    }
}
