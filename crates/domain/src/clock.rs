//! Server clock abstraction.
//!
//! The lock already gives bids a total order; the timestamp recorded on a
//! bid is audit metadata, not the ordering key. It still needs to be
//! strictly increasing within a process so that two bids accepted in the
//! same scheduler tick never compare equal.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// A source of server timestamps, injectable for deterministic tests.
pub trait Clock: Send + Sync {
    /// The current instant, guaranteed to be strictly greater than any
    /// value this same `Clock` has previously returned.
    fn now(&self) -> DateTime<Utc>;
}

/// The production clock: wall-clock time nudged forward by whole
/// microseconds when two calls land in the same tick.
#[derive(Default)]
pub struct SystemClock {
    last_micros: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let mut ordered = wall;
        let _ = self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                ordered = wall.max(prev + 1);
                Some(ordered)
            });
        DateTime::from_timestamp_micros(ordered).unwrap_or_else(Utc::now)
    }
}

/// A fixed, manually advanced clock for tests.
#[cfg(any(test, feature = "test-util"))]
pub struct FixedClock(std::sync::Mutex<DateTime<Utc>>);

#[cfg(any(test, feature = "test-util"))]
impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(std::sync::Mutex::new(at))
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut guard = self.0.lock().expect("fixed clock poisoned");
        *guard += duration;
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let mut guard = self.0.lock().expect("fixed clock poisoned");
        *guard += chrono::Duration::microseconds(1);
        *guard
    }
}
