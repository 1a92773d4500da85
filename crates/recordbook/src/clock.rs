//! Time source for `created_at` / `updated_at` stamps.

use std::cell::Cell;

use chrono::{DateTime, Duration, Utc};

/// Produces the timestamps written onto key files and notes.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock for tests and replays.
///
/// Each call to [`Clock::now`] returns the current instant and then advances
/// it by the configured step.
#[derive(Debug, Clone)]
pub struct FixedClock {
    current: Cell<DateTime<Utc>>,
    step: Duration,
}

impl FixedClock {
    /// A clock frozen at `at`.
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        Self::stepping(at, Duration::zero())
    }

    /// A clock that starts at `at` and moves forward `step` per reading.
    #[must_use]
    pub fn stepping(at: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Cell::new(at),
            step,
        }
    }

    /// Jump to `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        self.current.set(at);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let now = self.current.get();
        self.current.set(now + self.step);
        now
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
