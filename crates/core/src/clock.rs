//! Clock abstraction for validity-interval bookkeeping
//!
//! The coordinator captures one instant per transition and uses it for
//! both halves: closing the outgoing row and opening its successor. Two
//! independent clock reads would silently degrade the contiguous-interval
//! invariant (I2) to "approximately contiguous", so the clock is injected
//! rather than read inline.
//!
//! `SystemClock` is the production implementation; `ManualClock` lets
//! tests pin and advance time deterministically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::timestamp::Timestamp;

/// Supplies the timestamps bounding validity intervals
///
/// Pure, no side effects, no failure modes. Implementations must be safe
/// to share across threads.
pub trait ClockSource: Send + Sync {
    /// Capture the current instant
    fn now(&self) -> Timestamp;
}

/// Wall-clock implementation backed by system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Deterministic clock for tests
///
/// Holds an explicit instant that tests set or advance. Reads never
/// mutate it, so repeated `now()` calls between adjustments return the
/// same instant.
#[derive(Debug)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    /// Create a manual clock pinned at the given instant
    pub fn new(at: Timestamp) -> Self {
        Self {
            micros: AtomicU64::new(at.as_micros()),
        }
    }

    /// Create a manual clock pinned at the current wall-clock instant
    pub fn starting_now() -> Self {
        Self::new(Timestamp::now())
    }

    /// Pin the clock to an exact instant
    pub fn set(&self, at: Timestamp) {
        self.micros.store(at.as_micros(), Ordering::SeqCst);
    }

    /// Advance the clock by a duration, returning the new instant
    pub fn advance(&self, by: Duration) -> Timestamp {
        let delta = by.as_micros() as u64;
        let new = self.micros.fetch_add(delta, Ordering::SeqCst) + delta;
        Timestamp::from_micros(new)
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.micros.load(Ordering::SeqCst))
    }
}
