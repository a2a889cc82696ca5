//! # Dispatcher and pump configuration.
//!
//! Provides [`DispatcherConfig`] (delivery policies per path) and
//! [`PumpConfig`] (frame loop settings for [`Pump`](crate::Pump)).
//!
//! ## Sentinel values
//! - `PumpConfig::frame_budget = 0s` → unlimited budget per frame
//! - `PumpConfig::tick = 0s` → clamped to 1ms

use std::time::Duration;

use crate::clock::Budget;
use crate::events::Event;

/// What a delivery loop does once a listener marks the event handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandledPolicy {
    /// Stop at the first listener that marks the event handled.
    ///
    /// An event that arrives already handled reaches nobody.
    #[default]
    StopWhenHandled,
    /// Notify every registered listener regardless of the flag.
    Broadcast,
}

impl HandledPolicy {
    #[inline]
    pub(crate) fn should_stop(self, event: &dyn Event) -> bool {
        match self {
            HandledPolicy::StopWhenHandled => event.is_handled(),
            HandledPolicy::Broadcast => false,
        }
    }
}

/// Locking strategy of the thread-safe registry during delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadedDelivery {
    /// Copy the listener list under the lock, release it, then invoke.
    ///
    /// Listeners may re-enter the registry. A listener removed concurrently
    /// may still receive one more delivery.
    #[default]
    Snapshot,
    /// Hold the lock for the whole delivery loop.
    ///
    /// Deliveries are serialized across threads. A listener that touches the
    /// same registry from inside `on_event` deadlocks.
    Serialized,
}

/// Configuration of a [`Dispatcher`](crate::Dispatcher).
///
/// ## Field semantics
/// - `trigger_policy`: handled-policy of [`trigger`](crate::Dispatcher::trigger)
/// - `drain_policy`: handled-policy of queued delivery in [`update`](crate::Dispatcher::update)
/// - `threaded_policy`: handled-policy of [`trigger_threaded`](crate::Dispatcher::trigger_threaded)
/// - `threaded_delivery`: locking strategy of the thread-safe registry
/// - `prune_on_update`: drop handles of dead listeners from both registries at the start of each `update`
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    pub trigger_policy: HandledPolicy,
    pub drain_policy: HandledPolicy,
    pub threaded_policy: HandledPolicy,
    pub threaded_delivery: ThreadedDelivery,
    pub prune_on_update: bool,
}

impl DispatcherConfig {
    /// Same policy on every delivery path.
    pub fn with_policy(policy: HandledPolicy) -> Self {
        Self {
            trigger_policy: policy,
            drain_policy: policy,
            threaded_policy: policy,
            ..Self::default()
        }
    }
}

impl Default for DispatcherConfig {
    /// Default configuration:
    ///
    /// - every path `HandledPolicy::StopWhenHandled` (first handler wins)
    /// - `threaded_delivery = ThreadedDelivery::Snapshot`
    /// - `prune_on_update = true`
    fn default() -> Self {
        Self {
            trigger_policy: HandledPolicy::default(),
            drain_policy: HandledPolicy::default(),
            threaded_policy: HandledPolicy::default(),
            threaded_delivery: ThreadedDelivery::default(),
            prune_on_update: true,
        }
    }
}

/// Frame loop settings for [`Pump`](crate::Pump).
#[derive(Clone, Debug)]
pub struct PumpConfig {
    /// Interval between two `update` calls.
    pub tick: Duration,
    /// Time budget of each frame (`0s` = unlimited).
    pub frame_budget: Duration,
    /// Run one unlimited `update` after the loop stops.
    pub flush_on_stop: bool,
    /// Stop on SIGINT/SIGTERM (Ctrl-C on Windows) in addition to cancellation.
    pub stop_on_signal: bool,
}

impl PumpConfig {
    /// Returns the per-frame budget.
    ///
    /// - `Budget::Unlimited` when `frame_budget` is zero
    /// - `Budget::Within(frame_budget)` otherwise
    #[inline]
    pub fn budget(&self) -> Budget {
        if self.frame_budget == Duration::ZERO {
            Budget::Unlimited
        } else {
            Budget::Within(self.frame_budget)
        }
    }

    /// Returns the tick clamped to a minimum of 1ms.
    #[inline]
    pub fn tick_clamped(&self) -> Duration {
        self.tick.max(Duration::from_millis(1))
    }
}

impl Default for PumpConfig {
    /// Default configuration:
    ///
    /// - `tick = 16ms` (~60 frames per second)
    /// - `frame_budget = 0s` (unlimited)
    /// - `flush_on_stop = true`
    /// - `stop_on_signal = false`
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(16),
            frame_budget: Duration::ZERO,
            flush_on_stop: true,
            stop_on_signal: false,
        }
    }
}
