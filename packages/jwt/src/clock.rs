//! Time source for issuance and validation

use arc_swap::ArcSwap;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Source of the current instant
pub trait Clock: Send + Sync + 'static {
    /// The current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
///
/// Shared between a manager and a test through `Arc`, so the test can move
/// time forward after a token was issued.
#[derive(Debug)]
pub struct FixedClock {
    now: ArcSwap<DateTime<Utc>>,
}

impl FixedClock {
    /// A clock frozen at `now`
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: ArcSwap::from_pointee(now),
        }
    }

    /// Jump to `now`
    pub fn set(&self, now: DateTime<Utc>) {
        self.now.store(Arc::new(now));
    }

    /// Move forward (or back, for negative values) by `by`
    pub fn advance(&self, by: Duration) {
        self.now.rcu(|current| **current + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        **self.now.load()
    }
}
