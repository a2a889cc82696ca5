//! # Time source and drain budgets.
//!
//! The dispatcher never reads the wall clock directly. It asks an injected
//! [`Clock`] for monotonic elapsed time, both to stamp events
//! ([`Dispatcher::now`](crate::Dispatcher::now)) and to enforce the
//! per-`update` [`Budget`].
//!
//! - [`MonotonicClock`] elapsed time since construction (default).
//! - [`ManualClock`] advanced by hand; deterministic loops and tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic elapsed-time source.
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary, fixed origin. Never decreases.
    fn elapsed(&self) -> Duration;
}

/// [`Instant`]-backed clock measuring from its construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to.
///
/// Stored as nanoseconds; advancing saturates at `u64::MAX` ns.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock already showing `at`.
    #[must_use]
    pub fn starting_at(at: Duration) -> Self {
        Self {
            nanos: AtomicU64::new(to_nanos(at)),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let by = to_nanos(by);
        let _ = self
            .nanos
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_add(by))
            });
    }

    /// Jumps to `at`; ignored if `at` is earlier than the current reading.
    pub fn set(&self, at: Duration) {
        self.nanos.fetch_max(to_nanos(at), Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }
}

fn to_nanos(d: Duration) -> u64 {
    d.as_nanos().min(u128::from(u64::MAX)) as u64
}

/// Processing time allowed for one `update` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Budget {
    /// Drain until the snapshot is empty.
    #[default]
    Unlimited,
    /// Stop once this much clock time has elapsed since the drain began.
    ///
    /// The deadline is checked before each event, so `Within(Duration::ZERO)`
    /// delivers nothing.
    Within(Duration),
}

impl Budget {
    /// Shorthand for `Budget::Within(Duration::from_millis(ms))`.
    pub const fn millis(ms: u64) -> Self {
        Budget::Within(Duration::from_millis(ms))
    }

    #[inline]
    pub fn is_unlimited(self) -> bool {
        matches!(self, Budget::Unlimited)
    }

    /// Absolute deadline for a drain starting at `now`.
    ///
    /// `None` means no deadline (unlimited, or the sum overflowed).
    pub fn deadline(self, now: Duration) -> Option<Duration> {
        match self {
            Budget::Unlimited => None,
            Budget::Within(d) => now.checked_add(d),
        }
    }
}

impl From<Duration> for Budget {
    fn from(d: Duration) -> Self {
        Budget::Within(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_forward_only() {
        let clock = ManualClock::starting_at(Duration::from_millis(10));
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.elapsed(), Duration::from_millis(15));

        clock.set(Duration::from_millis(3));
        assert_eq!(clock.elapsed(), Duration::from_millis(15));

        clock.set(Duration::from_secs(1));
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn manual_clock_saturates() {
        let clock = ManualClock::new();
        clock.advance(Duration::MAX);
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.elapsed(), Duration::from_nanos(u64::MAX));
    }

    #[test]
    fn monotonic_clock_does_not_go_back() {
        let clock = MonotonicClock::new();
        let a = clock.elapsed();
        let b = clock.elapsed();
        assert!(b >= a);
    }

    #[test]
    fn budget_deadlines() {
        let now = Duration::from_millis(100);
        assert_eq!(Budget::Unlimited.deadline(now), None);
        assert_eq!(Budget::millis(5).deadline(now), Some(Duration::from_millis(105)));
        assert_eq!(Budget::Within(Duration::ZERO).deadline(now), Some(now));
        assert_eq!(Budget::Within(Duration::MAX).deadline(now), None);
        assert!(Budget::default().is_unlimited());
        assert_eq!(Budget::from(Duration::from_millis(2)), Budget::millis(2));
    }
}
