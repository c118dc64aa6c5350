//! Logical time sources.
//!
//! The engine never reads the wall clock directly. Every timestamp is a
//! [`Duration`] since an arbitrary origin handed out by a [`Clock`], which
//! makes recognition replayable under a [`ManualClock`].

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of monotonic timestamps.
pub trait Clock: fmt::Debug {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Monotonic clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is the moment of construction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle while the arena
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Create a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Move time forward by whole milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Seconds elapsed between two timestamps, zero if `since` is in the future.
pub(crate) fn seconds_between(since: Duration, now: Duration) -> f32 {
    now.saturating_sub(since).as_secs_f32()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance_ms(250);
        assert_eq!(clock.now(), Duration::from_millis(250));

        clock.set(Duration::from_secs(3));
        assert_eq!(handle.now(), Duration::from_secs(3));
    }

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_seconds_between_saturates() {
        let early = Duration::from_millis(100);
        let late = Duration::from_millis(600);
        assert!((seconds_between(early, late) - 0.5).abs() < 1e-6);
        assert_eq!(seconds_between(late, early), 0.0);
    }
}
