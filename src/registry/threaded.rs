//! # Thread-safe listener registry.
//!
//! [`ThreadSafeRegistry`] wraps a [`ListenerRegistry`] in a mutex so that
//! listeners can be registered and triggered from any thread. It is the only
//! dispatcher state shared across threads; share it as
//! `Arc<ThreadSafeRegistry>`.
//!
//! ## Delivery strategies
//! ```text
//! Snapshot (default):                 Serialized:
//!   lock ─► copy listeners ─► unlock    lock ─► deliver to every listener ─► unlock
//!   invoke listeners (no lock held)
//! ```
//! - **Snapshot**: listeners may call back into this registry. A listener
//!   removed while a delivery is in flight may still receive that one event.
//! - **Serialized**: at most one delivery runs at a time. A listener that
//!   calls `add`/`remove`/`trigger` on the same registry from inside
//!   `on_event` deadlocks.
//!
//! There is no threaded queue: cross-thread producers can only trigger.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use framevisor::{EventType, ThreadSafeRegistry};
//!
//! const TICK: EventType = EventType::from_name("tick");
//!
//! let registry = Arc::new(ThreadSafeRegistry::default());
//! let sub = registry.listen(TICK, |_event| {}).unwrap();
//! assert_eq!(registry.listener_count(TICK), 1);
//! drop(sub);
//! assert_eq!(registry.listener_count(TICK), 0);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::listeners::{ListenerRegistry, deliver_to};
use crate::config::{HandledPolicy, ThreadedDelivery};
use crate::error::DispatchError;
use crate::events::{EventRef, EventType, validate};
use crate::listeners::{Listener, ListenerHandle, ThreadedSubscription};

/// Mutex-guarded listener registry for cross-thread triggers.
#[derive(Debug, Default)]
pub struct ThreadSafeRegistry {
    inner: Mutex<ListenerRegistry>,
    policy: HandledPolicy,
    delivery: ThreadedDelivery,
}

impl ThreadSafeRegistry {
    pub fn new(policy: HandledPolicy, delivery: ThreadedDelivery) -> Self {
        Self {
            inner: Mutex::new(ListenerRegistry::new()),
            policy,
            delivery,
        }
    }

    pub fn policy(&self) -> HandledPolicy {
        self.policy
    }

    pub fn delivery(&self) -> ThreadedDelivery {
        self.delivery
    }

    /// A listener that panicked under `Serialized` delivery poisons the
    /// mutex; the registry itself is never left half-updated, so recover.
    fn lock(&self) -> MutexGuard<'_, ListenerRegistry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `handle` for `event_type`, rejecting an equal handle.
    pub fn add(&self, handle: ListenerHandle, event_type: EventType) -> Result<(), DispatchError> {
        self.lock().add(handle, event_type)
    }

    /// Removes the first handle equal to `handle` for `event_type`.
    pub fn remove(&self, handle: &ListenerHandle, event_type: EventType) -> Result<(), DispatchError> {
        self.lock().remove(handle, event_type)
    }

    pub fn contains(&self, handle: &ListenerHandle, event_type: EventType) -> bool {
        self.lock().contains(handle, event_type)
    }

    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.lock().listener_count(event_type)
    }

    /// Drops handles whose listener is gone.
    pub fn prune(&self) -> usize {
        self.lock().prune()
    }

    /// Registers `handle` and returns a guard that removes it on drop.
    pub fn subscribe(
        self: &Arc<Self>,
        handle: ListenerHandle,
        event_type: EventType,
    ) -> Result<ThreadedSubscription, DispatchError> {
        self.add(handle.clone(), event_type)?;
        Ok(ThreadedSubscription::new(handle, event_type, self, None))
    }

    /// Registers a closure; the returned guard owns it.
    pub fn listen<F>(self: &Arc<Self>, event_type: EventType, f: F) -> Result<ThreadedSubscription, DispatchError>
    where
        F: Fn(&EventRef) + Send + Sync + 'static,
    {
        let listener: Arc<dyn Listener> = Arc::new(f);
        let handle = ListenerHandle::from_dyn(&listener);
        self.add(handle.clone(), event_type)?;
        Ok(ThreadedSubscription::new(handle, event_type, self, Some(listener)))
    }

    /// Delivers `event` immediately on the calling thread.
    ///
    /// Returns `Ok(false)` when no listener was invoked (nobody listening,
    /// or the event arrived already handled).
    pub fn trigger(&self, event: &EventRef) -> Result<bool, DispatchError> {
        validate(event.as_ref())?;
        let invoked = match self.delivery {
            ThreadedDelivery::Serialized => self.lock().deliver(event, self.policy),
            ThreadedDelivery::Snapshot => {
                let listeners = self.lock().snapshot(event.event_type());
                deliver_to(&listeners, event, self.policy)
            }
        };
        if invoked == 0 {
            tracing::debug!(
                event = event.name(),
                event_type = %event.event_type(),
                "no threaded listener received event"
            );
        }
        Ok(invoked > 0)
    }
}
